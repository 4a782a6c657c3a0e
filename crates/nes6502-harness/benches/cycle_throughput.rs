//! Cycle throughput benchmark for the NES-shaped harness.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use nes6502_harness::Harness;

fn nop_rom() -> Vec<u8> {
    let mut prg = vec![0xEAu8; 0x4000];
    prg[0x3FFC] = 0x00;
    prg[0x3FFD] = 0x80;
    prg
}

fn bench_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("harness_cycle");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("10k_nop_cycles", |b| {
        b.iter(|| {
            let mut harness = Harness::new(nop_rom(), 1_790_000);
            harness.power_on();
            for _ in 0..10_000 {
                black_box(harness.cycle());
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_cycle);
criterion_main!(benches);
