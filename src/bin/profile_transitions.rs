#![allow(dead_code, unused_imports)]

use archetype_store::{Entities, World, WorldConfig};
use std::{fs::File, time::Instant};

#[derive(Debug, Default, Clone)]
struct Position(f32, f32, f32);

#[derive(Debug, Default, Clone)]
struct Velocity(f32, f32, f32);

#[derive(Debug, Default, Clone)]
struct Burning(u32);

#[cfg(feature = "profiling")]
#[tracing::instrument(skip(world))]
fn profile_transitions(world: &mut World, count: usize) {
    let entities = {
        let _span = tracing::info_span!("spawn_loop", count = count).entered();
        world.spawn_batch((0..count).map(|_| (Position(0.0, 0.0, 0.0), Velocity(1.0, 0.0, 0.0))))
    };

    let _span = tracing::info_span!("transition_loop", count = count).entered();
    for (i, &entity) in entities.iter().enumerate() {
        if i % 1_000 == 0 {
            tracing::info!("Transitioning entity {}/{}", i, count);
        }
        if let Err(err) = world.set_component(entity, Burning(3)) {
            tracing::warn!(%entity, %err, "transition failed");
        }
        if i % 2 == 0 {
            if let Err(err) = world.remove_component::<Velocity>(entity) {
                tracing::warn!(%entity, %err, "transition failed");
            }
        }
    }
}

#[cfg(feature = "profiling")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => WorldConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => WorldConfig::default(),
    };

    // Set up tracing subscriber to write to a file
    let file = File::create("trace.json")?;
    let (non_blocking, _guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .json()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::TRACE)
        .init();

    let mut world = World::with_config(config);

    println!("Profiling 10k add/remove transitions...");
    let start = Instant::now();
    profile_transitions(&mut world, 10_000);
    println!("Transitions complete in: {:?}", start.elapsed());

    let mut burning = Entities::of::<(Burning,), ()>();
    println!(
        "{} archetypes, {} burning entities",
        world.archetype_count(),
        burning.count(&world, true)
    );
    Ok(())
}

#[cfg(not(feature = "profiling"))]
fn main() {
    eprintln!("Run with --features profiling");
}
