//! # Mask / Store Coherence
//!
//! Drives the world through long random sequences of create, destroy,
//! add, remove and reset, auditing after every single step that a mask bit
//! is set exactly when the matching store holds a value.
//!
//! Run with: cargo test --package skyhop_core --test coherence

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skyhop_core::{
    Acceleration, Collidable, EntityId, OnGround, Position, Scale, Velocity, World,
};

const SEQUENCES: u64 = 64;
const STEPS_PER_SEQUENCE: usize = 400;

/// Picks an id in range, or slightly past the end.
fn pick_id(rng: &mut ChaCha8Rng, world: &World) -> EntityId {
    let upper = world.entity_count() as u32 + 2;
    EntityId::from_raw(rng.gen_range(0..upper))
}

fn random_step(rng: &mut ChaCha8Rng, world: &mut World) {
    match rng.gen_range(0..100) {
        0..=14 => {
            world.create_entity();
        }
        15..=24 => {
            let id = pick_id(rng, world);
            let was_alive = world.is_alive(id);
            assert_eq!(world.destroy_entity(id).is_ok(), was_alive);
        }
        25..=59 => {
            let id = pick_id(rng, world);
            let alive = world.is_alive(id);
            let added = match rng.gen_range(0..5) {
                0 => world.add_component(id, Position::new(rng.gen(), 0.0, 0.0)).is_ok(),
                1 => world.add_component(id, Velocity::new(0.0, rng.gen(), 0.0)).is_ok(),
                2 => world.add_component(id, Acceleration::default()).is_ok(),
                3 => world.add_component(id, Scale::new(2.0, 1.0, 2.0)).is_ok(),
                _ => world.add_component(id, OnGround).is_ok(),
            };
            assert_eq!(added, alive);
        }
        60..=97 => {
            let id = pick_id(rng, world);
            let alive = world.is_alive(id);
            let removed = match rng.gen_range(0..5) {
                0 => world.remove_component::<Position>(id).is_ok(),
                1 => world.remove_component::<Velocity>(id).is_ok(),
                2 => world.remove_component::<Acceleration>(id).is_ok(),
                3 => world.remove_component::<Collidable>(id).is_ok(),
                _ => world.remove_component::<OnGround>(id).is_ok(),
            };
            assert_eq!(removed, alive);
        }
        _ => world.reset(),
    }
}

#[test]
fn coherence_holds_after_every_step() {
    for seed in 0..SEQUENCES {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut world = World::new();

        for step in 0..STEPS_PER_SEQUENCE {
            random_step(&mut rng, &mut world);
            if let Err(err) = world.check_coherence() {
                panic!("seed {seed}, step {step}: {err}");
            }
        }
    }
}

#[test]
fn recycled_id_never_sees_old_components() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    let mut world = World::new();
    let ids: Vec<_> = (0..32).map(|_| world.create_entity()).collect();
    for id in &ids {
        world.add_component(*id, Position::new(1.0, 1.0, 1.0)).unwrap();
        world.add_component(*id, OnGround).unwrap();
    }

    for _ in 0..200 {
        let victim = ids[rng.gen_range(0..ids.len())];
        if world.destroy_entity(victim).is_ok() {
            let reborn = world.create_entity();
            assert_eq!(reborn, victim);
            assert!(world.mask(reborn).unwrap().is_empty());
            assert!(world.get_component::<Position>(reborn).is_none());
            assert!(world.get_component::<OnGround>(reborn).is_none());
        }
    }
    world.check_coherence().unwrap();
}

#[test]
fn reset_twice_leaves_nothing_behind() {
    let mut world = World::new();
    let ids: Vec<_> = (0..10).map(|_| world.create_entity()).collect();
    for id in &ids {
        world.add_component(*id, Velocity::new(1.0, 2.0, 3.0)).unwrap();
    }

    for _ in 0..2 {
        world.reset();
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.alive_count(), 0);
        for id in &ids {
            assert!(world.get_component::<Velocity>(*id).is_none());
            assert!(world.mask(*id).is_err());
        }
        world.check_coherence().unwrap();
    }
}
