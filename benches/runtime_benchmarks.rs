//! Criterion benchmarks for the core runtime paths: spawn/exit cycles,
//! mailbox throughput, and request/reply round trips.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use filament_rt::{self as rt, RuntimeConfig, Timeout};

fn bench_config() -> RuntimeConfig {
    RuntimeConfig::builder()
        .with_max_actors(64)
        .with_stack_arena_size(2 * 1024 * 1024)
        .build()
        .expect("valid bench config")
}

fn bench_spawn_exit_cycle(c: &mut Criterion) {
    c.bench_function("spawn_exit_cycle", |b| {
        b.iter(|| {
            rt::init(bench_config()).unwrap();
            for _ in 0..16 {
                rt::spawn(|| rt::exit()).unwrap();
            }
            rt::run().unwrap();
            rt::cleanup().unwrap();
        });
    });
}

fn bench_self_send_throughput(c: &mut Criterion) {
    c.bench_function("self_send_1000", |b| {
        b.iter(|| {
            rt::init(bench_config()).unwrap();
            rt::spawn(|| {
                let me = rt::current();
                for round in 0u32..1000 {
                    rt::notify(me, black_box(&round.to_le_bytes())).unwrap();
                    let msg = rt::recv(Timeout::Immediate).unwrap();
                    black_box(msg.data());
                }
                rt::exit();
            })
            .unwrap();
            rt::run().unwrap();
            rt::cleanup().unwrap();
        });
    });
}

fn bench_request_reply_round_trip(c: &mut Criterion) {
    c.bench_function("request_reply_100", |b| {
        b.iter(|| {
            rt::init(bench_config()).unwrap();
            let server = rt::spawn(|| loop {
                match rt::recv(Timeout::Infinite) {
                    Ok(msg) => {
                        let _ = rt::reply(&msg, msg.data());
                    }
                    Err(_) => rt::exit(),
                }
            })
            .unwrap();
            rt::spawn(move || {
                for _ in 0..100 {
                    let reply =
                        rt::request(server, b"ping", Timeout::after_millis(1000)).unwrap();
                    black_box(reply.len());
                }
                rt::shutdown().unwrap();
                rt::exit();
            })
            .unwrap();
            rt::run().unwrap();
            rt::cleanup().unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_spawn_exit_cycle,
    bench_self_send_throughput,
    bench_request_reply_round_trip
);
criterion_main!(benches);
