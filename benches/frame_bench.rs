// Benchmark for torque curve generation and frame encoding
// Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use torque_link::communication::frame::{encode, FrameHeader};
use torque_link::motion::shaper::{generate, ShapingFunction};
use torque_link::motion::trajectory::expand;

fn bench_generate(c: &mut Criterion) {
    c.bench_function("generate sinh+cubic curve", |b| {
        b.iter(|| generate(black_box(ShapingFunction::SinhPlusCubic), black_box(10), 0))
    });
}

fn bench_encode(c: &mut Criterion) {
    let curve = generate(ShapingFunction::Linear, 0, 0).expect("curve");
    let trajectory = expand(&["0", "360", "-360"]).expect("trajectory");
    c.bench_function("encode 1080 frames", |b| {
        b.iter(|| {
            let frames = encode(black_box(&trajectory), black_box(&curve), FrameHeader::default());
            assert_eq!(frames.len(), 1080);
        });
    });
}

criterion_group!(benches, bench_generate, bench_encode);
criterion_main!(benches);
