//! Benchmark for registration and the deferred validation pass.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use sinj::{Engine, Injectable};

fn build_engine(namespaces: usize) -> Engine {
    let mut engine = Engine::new();

    // каждое пространство ссылается на следующее (последнее объявлено позже)
    for i in 0..namespaces {
        let next = format!("ns{}", (i + 1) % namespaces);
        let mut handle = engine.create_module(&format!("ns{}", i), [next.as_str()]).unwrap();
        handle
            .controller("init", vec!["db".into(), json!(i).into()])
            .unwrap()
            .worker("sync", vec![Injectable::callable(|_| Ok(json!(null)))])
            .unwrap();
    }

    engine
}

fn benchmark_registration(c: &mut Criterion) {
    c.bench_function("register 100 namespaces", |b| {
        b.iter(|| black_box(build_engine(100)));
    });
}

fn benchmark_seal(c: &mut Criterion) {
    c.bench_function("register and seal 100 namespaces", |b| {
        b.iter(|| {
            let mut engine = build_engine(100);
            black_box(engine.seal().unwrap())
        });
    });
}

criterion_group!(benches, benchmark_registration, benchmark_seal);
criterion_main!(benches);
