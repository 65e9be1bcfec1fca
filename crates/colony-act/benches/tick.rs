use colony_act::builder::{condition, for_loop, sequence, wait};
use colony_act::Act;
use colony_core::{Blackboard, TickContext, WorldMut, WorldView};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

#[derive(Default)]
struct World;

impl WorldView for World {
    type Agent = u64;
}

impl WorldMut for World {}

fn always_true(_ctx: &TickContext, _agent: u64, _world: &World, _bb: &Blackboard) -> bool {
    true
}

fn build_tree() -> Act<World> {
    let mut children = (0..32)
        .map(|_| condition("ok", always_true))
        .collect::<Vec<_>>();
    children.push(wait(u32::MAX));
    for_loop("root", sequence("guards", children), u32::MAX)
}

fn bench_act_tick(c: &mut Criterion) {
    let mut root = build_tree();
    let mut world = World;
    let mut blackboard = Blackboard::new();

    let mut ctx = TickContext::new(0, 0.1);
    c.bench_function("colony-act/step(conditions=32)", |b| {
        b.iter(|| {
            let status = root.step(&ctx, 1, &mut world, &mut blackboard);
            black_box(status.ok());
            ctx = ctx.next();
        })
    });
}

criterion_group!(benches, bench_act_tick);
criterion_main!(benches);
