use std::time::Duration;

use bevy::prelude::*;

use crate::common::config::CharacterTemplate;
use crate::common::test_utils::run_system_once;

use super::*;

// -----------------------------------------------------------------------------
// Ammo clips
// -----------------------------------------------------------------------------

#[test]
fn clips_are_fifo_per_category() {
    let mut ammo = AmmoClips::default();
    ammo.add(DiscardSet::METALLIC, 3);
    ammo.add(DiscardSet::PLASTIC, 1);
    ammo.add(DiscardSet::ORGANIC, 2);

    // Both metallic and plastic land in the recyclable clip, in order.
    ammo.set_current(DiscardSet::RECYCLABLE);
    assert!(ammo.has_ammo());
    assert_eq!(ammo.total(DiscardSet::RECYCLABLE), 4);
    assert_eq!(ammo.retrieve(), Some(3));
    assert_eq!(ammo.retrieve(), Some(1));
    assert_eq!(ammo.retrieve(), None);
    assert!(!ammo.has_ammo());

    ammo.set_current(DiscardSet::NON_RECYCLABLE);
    assert_eq!(ammo.retrieve(), Some(2));
}

#[test]
fn untyped_and_empty_deposits_are_dropped() {
    let mut ammo = AmmoClips::default();
    ammo.add(DiscardSet::NONE, 5);
    ammo.add(DiscardSet::METALLIC, 0);
    assert!(!ammo.has_ammo());
    assert_eq!(ammo.total(DiscardSet::RECYCLABLE), 0);

    // Selecting an untyped clip keeps the previous selection.
    ammo.set_current(DiscardSet::NON_RECYCLABLE);
    ammo.set_current(DiscardSet::NONE);
    assert_eq!(ammo.current(), DiscardSet::NON_RECYCLABLE);
}

// -----------------------------------------------------------------------------
// Cannon fire
// -----------------------------------------------------------------------------

fn cannon_world() -> (World, Entity) {
    let mut world = World::new();
    world.init_resource::<PlayerInput>();
    world.init_resource::<AmmoClips>();
    world.init_resource::<Tunables>();
    world.init_resource::<Messages<SpawnProjectileRequest>>();
    world.init_resource::<Messages<AmmoChanged>>();

    let cannon = world
        .spawn((Cannon, Transform::from_xyz(0.0, 120.0, 0.0)))
        .id();
    (world, cannon)
}

fn drain_shots(world: &mut World) -> Vec<SpawnProjectileRequest> {
    world
        .resource_mut::<Messages<SpawnProjectileRequest>>()
        .drain()
        .collect()
}

#[test]
fn trigger_pull_consumes_one_clip_entry_and_starts_a_burst() {
    let (mut world, cannon) = cannon_world();
    world.resource_mut::<AmmoClips>().add(DiscardSet::METALLIC, 3);
    world.resource_mut::<PlayerInput>().fire = true;

    run_system_once(&mut world, fire_cannon);

    let shots = drain_shots(&mut world);
    assert_eq!(shots.len(), 1);
    assert_eq!(shots[0].ty, DiscardSet::RECYCLABLE);
    // Facing +Y by default, so the muzzle sits above the cannon.
    assert!(shots[0].pos.y > 120.0);

    let burst = world.get::<BurstFire>(cannon).unwrap();
    assert_eq!(burst.remaining, 2);
    assert_eq!(world.resource::<AmmoClips>().total(DiscardSet::RECYCLABLE), 0);
}

#[test]
fn single_round_entry_fires_without_a_burst() {
    let (mut world, cannon) = cannon_world();
    world.resource_mut::<AmmoClips>().add(DiscardSet::PLASTIC, 1);
    world.resource_mut::<PlayerInput>().fire = true;

    run_system_once(&mut world, fire_cannon);

    assert_eq!(drain_shots(&mut world).len(), 1);
    assert!(world.get::<BurstFire>(cannon).is_none());
}

#[test]
fn empty_clip_blocks_the_trigger() {
    let (mut world, _) = cannon_world();
    world.resource_mut::<PlayerInput>().fire = true;

    run_system_once(&mut world, fire_cannon);

    assert!(drain_shots(&mut world).is_empty());
}

#[test]
fn a_burst_in_flight_blocks_the_trigger() {
    let (mut world, cannon) = cannon_world();
    world.entity_mut(cannon).insert(BurstFire {
        remaining: 2,
        ty: DiscardSet::RECYCLABLE,
        timer: Timer::from_seconds(0.125, TimerMode::Repeating),
    });
    world.resource_mut::<AmmoClips>().add(DiscardSet::METALLIC, 2);
    world.resource_mut::<PlayerInput>().fire = true;

    run_system_once(&mut world, fire_cannon);

    assert!(drain_shots(&mut world).is_empty());
    assert_eq!(world.resource::<AmmoClips>().total(DiscardSet::RECYCLABLE), 2);
}

#[test]
fn burst_staggers_the_remaining_rounds() {
    let (mut world, cannon) = cannon_world();
    world.entity_mut(cannon).insert(BurstFire {
        remaining: 2,
        ty: DiscardSet::NON_RECYCLABLE,
        timer: Timer::from_seconds(0.125, TimerMode::Repeating),
    });

    let mut time = Time::<()>::default();
    time.advance_by(Duration::from_secs_f32(0.13));
    world.insert_resource(time);
    run_system_once(&mut world, tick_burst);

    assert_eq!(drain_shots(&mut world).len(), 1);
    assert_eq!(world.get::<BurstFire>(cannon).unwrap().remaining, 1);

    let mut time = Time::<()>::default();
    time.advance_by(Duration::from_secs_f32(0.13));
    world.insert_resource(time);
    run_system_once(&mut world, tick_burst);

    assert_eq!(drain_shots(&mut world).len(), 1);
    assert!(world.get::<BurstFire>(cannon).is_none());
}

#[test]
fn cannon_clamps_aim_to_the_frontal_arc() {
    let (mut world, cannon) = cannon_world();
    world.insert_resource(CannonAim {
        // Directly behind the cannon.
        world_cursor: Some(Vec2::new(0.0, -1000.0)),
    });
    let mut time = Time::<()>::default();
    time.advance_by(Duration::from_secs(1));
    world.insert_resource(time);

    run_system_once(&mut world, rotate_cannon);

    // Clamped to straight right, never turned backwards.
    let facing = agents::facing(world.get::<Transform>(cannon).unwrap());
    assert!((facing - Vec2::X).length() < 1e-4, "facing was {facing:?}");
}

// -----------------------------------------------------------------------------
// Collect / deposit
// -----------------------------------------------------------------------------

fn collect_world() -> (World, Entity) {
    let mut world = World::new();
    world.init_resource::<PlayerInput>();
    world.init_resource::<AmmoClips>();
    world.init_resource::<Tunables>();
    world.init_resource::<Messages<AmmoChanged>>();
    world.resource_mut::<PlayerInput>().collect = true;

    let collector = world
        .spawn((
            Collector,
            CharacterStats::from_template(&CharacterTemplate::default(), DiscardSet::NONE),
            Transform::default(),
        ))
        .id();
    (world, collector)
}

fn loose_item(world: &mut World, pos: Vec2, ty: DiscardSet, size: u32) -> Entity {
    world
        .spawn((
            PooledCollectable,
            Collectable { size, ty },
            PooledState::Active,
            Transform::from_translation(pos.extend(0.5)),
        ))
        .id()
}

#[test]
fn probe_ahead_picks_up_a_loose_item() {
    let (mut world, collector) = collect_world();
    let item = loose_item(&mut world, Vec2::new(0.0, 60.0), DiscardSet::ORGANIC, 2);
    // Off-axis item outside the probe's half-width is not picked up.
    let off_axis = loose_item(&mut world, Vec2::new(80.0, 60.0), DiscardSet::ORGANIC, 2);

    run_system_once(&mut world, collect_action);

    assert_eq!(world.get::<Carried>(item).unwrap().by, collector);
    assert!(world.get::<Carried>(off_axis).is_none());
}

#[test]
fn deposit_into_a_matching_container_queues_ammo() {
    let (mut world, collector) = collect_world();
    let item = loose_item(&mut world, Vec2::ZERO, DiscardSet::ORGANIC, 2);
    world.entity_mut(item).insert(Carried { by: collector });
    world.spawn((
        Container { accepts: DiscardSet::NON_RECYCLABLE },
        Transform::from_xyz(0.0, 50.0, 0.0),
    ));

    run_system_once(&mut world, collect_action);

    assert!(world.get::<Carried>(item).is_none());
    assert_eq!(*world.get::<PooledState>(item).unwrap(), PooledState::PendingReturn);
    assert_eq!(world.resource::<AmmoClips>().total(DiscardSet::NON_RECYCLABLE), 2);
}

#[test]
fn mismatched_container_keeps_the_item_in_hand() {
    let (mut world, collector) = collect_world();
    let item = loose_item(&mut world, Vec2::ZERO, DiscardSet::ORGANIC, 2);
    world.entity_mut(item).insert(Carried { by: collector });
    world.spawn((
        Container { accepts: DiscardSet::RECYCLABLE },
        Transform::from_xyz(0.0, 50.0, 0.0),
    ));

    run_system_once(&mut world, collect_action);

    assert!(world.get::<Carried>(item).is_some());
    assert_eq!(world.resource::<AmmoClips>().total(DiscardSet::RECYCLABLE), 0);
}

#[test]
fn out_of_range_container_keeps_the_item_in_hand() {
    let (mut world, collector) = collect_world();
    let item = loose_item(&mut world, Vec2::ZERO, DiscardSet::METALLIC, 1);
    world.entity_mut(item).insert(Carried { by: collector });
    world.spawn((
        Container { accepts: DiscardSet::RECYCLABLE },
        Transform::from_xyz(0.0, 500.0, 0.0),
    ));

    run_system_once(&mut world, collect_action);

    assert!(world.get::<Carried>(item).is_some());
}
