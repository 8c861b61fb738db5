//! Engine benchmarks: lexing/parsing into the dynamic tree, serialization,
//! and the metadata-driven mapper against a typed record.
//!
//! Run with: cargo bench --bench engine

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vellum_core::{json_record, Mapper};

#[derive(Debug, Default)]
struct Event {
    id: i64,
    name: String,
    score: f64,
    active: bool,
    tags: Vec<String>,
}
json_record!(Event { id, name, score, active, tags });

/// A document with `n` heterogeneous records.
fn document(n: usize) -> String {
    let mut out = String::from("[");
    for i in 0..n {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!(
            r#"{{"id":{i},"name":"event-{i}","score":{}.25,"active":{},"tags":["a","b","c"]}}"#,
            i % 100,
            i % 2 == 0,
        ));
    }
    out.push(']');
    out
}

fn bench_parse_dynamic(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_dynamic");
    for n in [10usize, 100, 1000] {
        let text = document(n);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &text, |b, text| {
            b.iter(|| vellum_core::to_dynamic(black_box(text)).unwrap());
        });
    }
    group.finish();
}

fn bench_serialize_dynamic(c: &mut Criterion) {
    let text = document(100);
    let value = vellum_core::to_dynamic(&text).unwrap();
    c.bench_function("serialize_dynamic_100", |b| {
        b.iter(|| black_box(&value).to_json_pretty());
    });
}

fn bench_mapper_round_trip(c: &mut Criterion) {
    let mapper = Mapper::new();
    let text = document(100);
    let events: Vec<Event> = mapper.to_object(&text).unwrap();

    c.bench_function("mapper_to_object_100", |b| {
        b.iter(|| mapper.to_object::<Vec<Event>>(black_box(&text)).unwrap());
    });
    c.bench_function("mapper_to_json_100", |b| {
        b.iter(|| mapper.to_json(black_box(&events)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_parse_dynamic,
    bench_serialize_dynamic,
    bench_mapper_round_trip
);
criterion_main!(benches);
