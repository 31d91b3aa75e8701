use criterion::{criterion_group, criterion_main, Criterion};
use pprof::criterion::{Output, PProfProfiler};
use rookery_lib::{lookup_tables, options::PerftOptions, perft::perft, GameBoard};

pub fn criterion_benchmark(c: &mut Criterion) {
    lookup_tables::init();

    let start = GameBoard::starting().unwrap();
    let kiwipete = GameBoard::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();

    c.bench_function("Perft speed test", |b| {
        b.iter(|| perft(&start, &PerftOptions::new(4)).unwrap())
    });
    c.bench_function("Perft speed test (parallel, kiwipete)", |b| {
        b.iter(|| perft(&kiwipete, &PerftOptions::new(3).parallel(true)).unwrap())
    });
    c.bench_function("GameBoard apply_move", |b| {
        let mv = "e2e4".parse().unwrap();
        b.iter(|| start.apply_move(mv).unwrap())
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = criterion_benchmark
);
criterion_main!(benches);
