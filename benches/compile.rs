//! Benchmarks for archive compilation and the LZF codec

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use zarchive::{codec, ArchiveBuilder, CompileOptions, WriteCursor};

fn asset_payload(seed: usize, len: usize) -> Vec<u8> {
    // Mildly repetitive, like serialized scene data
    (0..len)
        .map(|i| ((i / 7).wrapping_mul(seed + 31) % 251) as u8)
        .collect()
}

fn benchmark_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive_compile");

    for block_count in [8, 64, 256].iter() {
        let payloads: Vec<Vec<u8>> = (0..*block_count)
            .map(|i| asset_payload(i, 4096))
            .collect();
        let mut builder = ArchiveBuilder::new();
        for (i, payload) in payloads.iter().enumerate() {
            builder.add_block(&format!("assets/block-{}", i), payload);
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(block_count),
            block_count,
            |b, _| {
                b.iter(|| {
                    let mut out = WriteCursor::new();
                    builder
                        .compile(black_box(&CompileOptions::default()), &mut out)
                        .unwrap();
                    black_box(out.into_bytes())
                });
            },
        );
    }

    group.finish();
}

fn benchmark_load(c: &mut Criterion) {
    let payloads: Vec<Vec<u8>> = (0..64).map(|i| asset_payload(i, 4096)).collect();
    let mut builder = ArchiveBuilder::new();
    for (i, payload) in payloads.iter().enumerate() {
        builder.add_block(&format!("assets/block-{}", i), payload);
    }
    let mut out = WriteCursor::new();
    builder.compile(&CompileOptions::default(), &mut out).unwrap();
    let bytes = out.into_bytes();

    c.bench_function("archive_load", |b| {
        b.iter(|| {
            let mut loaded = ArchiveBuilder::new();
            loaded.load_archive(black_box(&bytes)).unwrap();
            black_box(loaded.len())
        });
    });
}

fn benchmark_codec(c: &mut Criterion) {
    let data = asset_payload(17, 64 * 1024);
    let compressed = codec::compress(&data);

    let mut group = c.benchmark_group("lzf");
    group.bench_function("compress_64k", |b| {
        b.iter(|| black_box(codec::compress(black_box(&data))));
    });
    group.bench_function("expand_64k", |b| {
        b.iter(|| black_box(codec::expand(black_box(&compressed), data.len()).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, benchmark_compile, benchmark_load, benchmark_codec);
criterion_main!(benches);
