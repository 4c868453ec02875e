use chip::{
    chip8::ChipSet,
    devices::Mute,
    opcode::{Opcode, Operation},
    resources::Rom,
};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::mock::StepRng;

/// Counts `V0` up, draws the matching glyph and loops back to the start.
const COUNTER: [Opcode; 6] = [0x00E0, 0x7001, 0xF029, 0x6100, 0xD115, 0x1200];

static BASE_ROM: once_cell::sync::Lazy<Rom> = once_cell::sync::Lazy::new(|| {
    let data = COUNTER.iter().flat_map(|op| op.to_be_bytes()).collect();
    Rom::new("COUNTER", data).expect("the counter rom fits into memory")
});

/// will setup the default configured chip
fn get_default_chip() -> ChipSet<Mute> {
    ChipSet::with_rng(BASE_ROM.clone(), Mute, Box::new(StepRng::new(0, 1)))
}

pub fn step_bench(c: &mut Criterion) {
    let mut chip = get_default_chip();
    c.bench_function("step_bench", |b| {
        b.iter(|| {
            let op = chip.next().expect("the counter rom never fails");
            criterion::black_box(op == Operation::Draw);
        });
    });
}

pub fn snapshot_bench(c: &mut Criterion) {
    let chip = get_default_chip();
    c.bench_function("snapshot_bench", |b| {
        b.iter(|| {
            let _ = format!("{}", chip.snapshot());
        });
    });
}

pub fn print_bench(c: &mut Criterion) {
    let chip = get_default_chip();
    c.bench_function("print_bench", |b| {
        b.iter(|| {
            let _ = format!("{}", chip);
        });
    });
}

criterion_group!(benches, step_bench, snapshot_bench, print_bench);
criterion_main!(benches);
