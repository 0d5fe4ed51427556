//! Benchmarks for line parsing and command dispatch

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tagmux::commands::register_builtins;
use tagmux::protocol::{parse_line, Reply};
use tagmux::Router;

fn parse_benchmarks(c: &mut Criterion) {
    c.bench_function("parse_tagged_command", |b| {
        b.iter(|| parse_line(black_box("A0042 FETCH 1:* (FLAGS BODY[HEADER])")))
    });

    c.bench_function("parse_invalid_tag", |b| {
        b.iter(|| parse_line(black_box("A.42 FETCH 1:*")))
    });
}

fn dispatch_benchmarks(c: &mut Criterion) {
    let router = Router::new();
    register_builtins(&router);
    for n in 0..64 {
        router.register_fn(&format!("x-cmd-{}", n), |_, reply| reply.write_response("OK"));
    }

    c.bench_function("dispatch_registered", |b| {
        b.iter(|| {
            let mut reply = Reply::new(false);
            router.dispatch(black_box("NOOP"), &mut reply);
            reply
        })
    });

    c.bench_function("dispatch_not_found", |b| {
        b.iter(|| {
            let mut reply = Reply::new(false);
            router.dispatch(black_box("frobnicate 1 2 3"), &mut reply);
            reply
        })
    });
}

criterion_group!(benches, parse_benchmarks, dispatch_benchmarks);
criterion_main!(benches);
