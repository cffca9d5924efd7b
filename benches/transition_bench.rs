use archetype_store::World;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

#[derive(Debug, Default, Clone)]
struct Position(f32, f32, f32);

#[derive(Debug, Default, Clone)]
struct Velocity(f32, f32, f32);

#[derive(Debug, Default, Clone)]
struct Stunned;

fn setup(count: usize) -> (World, Vec<archetype_store::Entity>) {
    let mut world = World::new();
    let entities = (0..count)
        .map(|_| world.spawn((Position(0.0, 0.0, 0.0), Velocity(1.0, 0.0, 0.0))))
        .collect();
    (world, entities)
}

fn add_remove_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("transitions");

    group.bench_function("add_component_10k", |b| {
        b.iter_batched(
            || setup(10_000),
            |(mut world, entities)| {
                for &entity in &entities {
                    let _ = world.set_component(entity, Stunned);
                }
                world
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("add_remove_round_trip_10k", |b| {
        b.iter_batched(
            || setup(10_000),
            |(mut world, entities)| {
                for &entity in &entities {
                    let _ = world.set_component(entity, Stunned);
                    let _ = world.remove_component::<Stunned>(entity);
                }
                world
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("overwrite_in_place_10k", |b| {
        b.iter_batched(
            || setup(10_000),
            |(mut world, entities)| {
                for &entity in &entities {
                    let _ = world.set_component(entity, Position(1.0, 1.0, 1.0));
                }
                world
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, add_remove_benchmark);
criterion_main!(benches);
