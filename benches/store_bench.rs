use archetype_store::{Entities, World};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

#[derive(Debug, Default, Clone)]
struct Position(f32, f32, f32);

#[derive(Debug, Default, Clone)]
struct Velocity(f32, f32, f32);

#[derive(Debug, Default, Clone)]
struct Health(u32);

#[derive(Debug, Default, Clone)]
struct Name(String);

fn spawn_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn");

    group.bench_function("spawn_2_components", |b| {
        b.iter_batched(
            World::new,
            |mut world| {
                for _ in 0..10_000 {
                    world.spawn((Position(1.0, 2.0, 3.0), Velocity(1.0, 0.0, 0.0)));
                }
                world
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("spawn_4_components", |b| {
        b.iter_batched(
            World::new,
            |mut world| {
                for _ in 0..10_000 {
                    world.spawn((
                        Position(1.0, 2.0, 3.0),
                        Velocity(1.0, 0.0, 0.0),
                        Health(100),
                        Name("Entity".to_string()),
                    ));
                }
                world
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("spawn_batch_2_components", |b| {
        b.iter_batched(
            World::new,
            |mut world| {
                world.spawn_batch(
                    (0..10_000).map(|_| (Position(1.0, 2.0, 3.0), Velocity(1.0, 0.0, 0.0))),
                );
                world
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn destroy_benchmark(c: &mut Criterion) {
    c.bench_function("destroy_10k", |b| {
        b.iter_batched(
            || {
                let mut world = World::new();
                let entities: Vec<_> = (0..10_000)
                    .map(|_| world.spawn((Position::default(), Health(1))))
                    .collect();
                (world, entities)
            },
            |(mut world, entities)| {
                for entity in entities {
                    let _ = world.destroy_entity(entity);
                }
                world
            },
            BatchSize::LargeInput,
        )
    });
}

fn iterate_benchmark(c: &mut Criterion) {
    let mut world = World::new();
    for i in 0..10_000 {
        world.spawn((Position(i as f32, 0.0, 0.0), Velocity(1.0, 1.0, 1.0)));
    }
    let mut query = Entities::of::<(Position, Velocity), ()>();

    c.bench_function("iterate_10k_for_each", |b| {
        b.iter(|| {
            query.for_each::<Position>(&mut world, |_, position| position.0 += 1.0);
        })
    });

    c.bench_function("count_10k_cached", |b| b.iter(|| black_box(query.count(&world, false))));
}

criterion_group!(benches, spawn_benchmark, destroy_benchmark, iterate_benchmark);
criterion_main!(benches);
