use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mirror_fs::{checksum, io};
use std::fs;
use tempfile::tempdir;

fn write_atomic_benchmark(c: &mut Criterion) {
    c.bench_function("io::write_atomic", |b| {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_file.txt");
        let content = "hello world".as_bytes();

        b.iter(|| {
            io::write_atomic(black_box(&path), black_box(content)).unwrap();
        })
    });
}

fn file_checksum_benchmark(c: &mut Criterion) {
    c.bench_function("checksum::compute_file_checksum (1 MiB)", |b| {
        let dir = tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        fs::write(&path, vec![0x5a_u8; 1024 * 1024]).unwrap();

        b.iter(|| {
            let _ = checksum::compute_file_checksum(black_box(&path)).unwrap();
        })
    });
}

criterion_group!(benches, write_atomic_benchmark, file_checksum_benchmark);
criterion_main!(benches);
