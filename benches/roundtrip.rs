use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use relic::{persist_record, InArchive, OutArchive};

#[derive(Default, Clone)]
struct Sample {
    name: String,
    readings: Vec<f64>,
    tags: Vec<String>,
}
persist_record!(Sample { name, readings, tags });

fn sample(size: usize) -> Sample {
    Sample {
        name: "bench".to_string(),
        readings: (0..size).map(|i| i as f64 * 0.5).collect(),
        tags: (0..size / 8).map(|i| format!("tag-{i}")).collect(),
    }
}

fn encode_text(value: &Sample) -> Vec<u8> {
    let mut out = Vec::new();
    let mut ar = OutArchive::text(&mut out);
    ar.put("sample", value).expect("encode");
    ar.finish().expect("flush");
    out
}

fn encode_binary(value: &Sample) -> Vec<u8> {
    let mut out = Vec::new();
    let mut ar = OutArchive::binary(&mut out).expect("preamble");
    ar.put("sample", value).expect("encode");
    ar.finish().expect("flush");
    out
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for size in [64usize, 4096] {
        let value = sample(size);
        group.bench_with_input(BenchmarkId::new("text", size), &value, |b, value| {
            b.iter(|| encode_text(value))
        });
        group.bench_with_input(BenchmarkId::new("binary", size), &value, |b, value| {
            b.iter(|| encode_binary(value))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for size in [64usize, 4096] {
        let value = sample(size);
        let text = encode_text(&value);
        let binary = encode_binary(&value);

        group.bench_with_input(BenchmarkId::new("text", size), &text, |b, bytes| {
            b.iter(|| {
                let mut restored = Sample::default();
                let mut ar = InArchive::text(bytes.as_slice()).expect("parse");
                ar.take("sample", &mut restored).expect("decode");
                restored
            })
        });
        group.bench_with_input(BenchmarkId::new("binary", size), &binary, |b, bytes| {
            b.iter(|| {
                let mut restored = Sample::default();
                let mut ar = InArchive::binary(bytes.as_slice()).expect("preamble");
                ar.take("sample", &mut restored).expect("decode");
                restored
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
