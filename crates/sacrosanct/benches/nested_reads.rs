//! Nested read throughput through guarded views

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sacrosanct::{Guard, GuardConfig, PropertyPath};
use sacrosanct_test_utils::{deep_chain, sample_object};

fn bench_shallow_read(c: &mut Criterion) {
    let guard = Guard::isolated(GuardConfig::default());
    let view = guard.protect(&sample_object(), false);

    c.bench_function("get primitive", |b| {
        b.iter(|| black_box(view.get(black_box("bar"))));
    });
    c.bench_function("get nested view", |b| {
        b.iter(|| black_box(view.get(black_box("foo"))));
    });
}

fn bench_deep_path(c: &mut Criterion) {
    let guard = Guard::isolated(GuardConfig::default());
    let view = guard.protect(&deep_chain(32), true);
    let path: PropertyPath = vec!["next".to_string(); 32].into();

    c.bench_function("get_path depth 32", |b| {
        b.iter(|| black_box(view.get_path(black_box(&path))));
    });
}

criterion_group!(benches, bench_shallow_read, bench_deep_path);
criterion_main!(benches);
