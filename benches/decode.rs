//! Benchmarks for LZMA stream decoding.
//!
//! Run with: `cargo bench --features bench-support`
//! Compare with baseline: `cargo bench --features bench-support -- --save-baseline main`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lzma_stream::decompress::reference_encoder::ReferenceEncoder;
use lzma_stream::{DecodeStatus, LzmaDecoder};

const DICT: u32 = 1 << 20;

/// Mostly-literal stream (~64 KB of low-redundancy text).
fn literal_stream() -> (Vec<u8>, usize) {
    let mut enc = ReferenceEncoder::new();
    let mut seed = 0x2545_F491u32;
    for _ in 0..64 * 1024 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        enc.literal((seed >> 16) as u8);
    }
    let len = enc.plain().len();
    (enc.finish(), len)
}

/// Match-heavy stream (~1 MB built from long repeats).
fn match_stream() -> (Vec<u8>, usize) {
    let mut enc = ReferenceEncoder::new();
    enc.literals(b"0123456789abcdef0123456789abcdef");
    enc.match_at(32, 273);
    while enc.plain().len() < 1024 * 1024 {
        enc.long_rep(0, 273);
        enc.short_rep();
    }
    let len = enc.plain().len();
    (enc.finish(), len)
}

fn bench_literals(c: &mut Criterion) {
    let (stream, plain_len) = literal_stream();

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(plain_len as u64));

    group.bench_function("literals", |b| {
        b.iter(|| {
            let out = LzmaDecoder::decompress(black_box(&stream), DICT);
            black_box(out)
        });
    });

    group.finish();
}

fn bench_matches(c: &mut Criterion) {
    let (stream, plain_len) = match_stream();

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(plain_len as u64));

    group.bench_function("matches", |b| {
        b.iter(|| {
            let out = LzmaDecoder::decompress(black_box(&stream), DICT);
            black_box(out)
        });
    });

    group.finish();
}

/// Chunked decode: 4 KiB input feeds, eager drains, minimum dictionary.
fn bench_chunked(c: &mut Criterion) {
    let (stream, plain_len) = match_stream();

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(plain_len as u64));

    group.bench_function("chunked_4k", |b| {
        b.iter(|| {
            let mut decoder = LzmaDecoder::new(lzma_stream::MIN_DICT_SIZE).unwrap();
            let mut fed = 0;
            let mut out = 0usize;
            loop {
                match decoder.run().unwrap() {
                    DecodeStatus::NeedInput => {
                        let end = (fed + 4096).min(stream.len());
                        if end == fed {
                            decoder.finish();
                        } else {
                            decoder.feed(&stream[fed..end]);
                            fed = end;
                        }
                    }
                    DecodeStatus::NeedOutput => {
                        out += decoder.drain().len();
                    }
                    DecodeStatus::StreamEnd => break,
                }
            }
            out += decoder.drain().len();
            black_box(out)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_literals, bench_matches, bench_chunked);
criterion_main!(benches);
