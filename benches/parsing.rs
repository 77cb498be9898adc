use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

fn fixture(name: &str) -> Vec<u8> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read(path).unwrap()
}

fn bench_parse_headers(c: &mut Criterion) {
    let raw = fixture("infected.eml");

    c.bench_function("parse_headers_infected", |b| {
        b.iter(|| clamaction::parser::header::parse_headers(&raw).unwrap())
    });
}

fn bench_format_all(c: &mut Criterion) {
    let raw = fixture("long_headers.eml");
    let headers = clamaction::parser::header::parse_headers(&raw).unwrap();

    c.bench_function("format_all_long_headers", |b| {
        b.iter(|| clamaction::parser::header::format_all(&headers))
    });
}

criterion_group!(benches, bench_parse_headers, bench_format_all);
criterion_main!(benches);
