use avian2d::prelude::*;
use bevy::prelude::*;

use super::*;
use crate::common::test_utils::run_system_once;

fn stats(affinity: DiscardSet) -> CharacterStats {
    CharacterStats {
        max_health: 5,
        speed: 100.0,
        max_speed: 150.0,
        interaction_range: 80.0,
        attack_range: 40.0,
        damage: 1,
        affinity,
    }
}

fn damage_world() -> World {
    let mut world = World::new();
    world.init_resource::<Messages<DamageInstance>>();
    world.init_resource::<Messages<HealthChanged>>();
    world
}

fn hit(world: &mut World, target: Entity, amount: i32, ty: DiscardSet) {
    world.write_message(DamageInstance { target, amount, ty });
    run_system_once(world, apply_damage);
}

#[test]
fn damage_decrements_health_and_notifies() {
    let mut world = damage_world();

    let e = world
        .spawn((Health { value: 5 }, stats(DiscardSet::ORGANIC), AgentKind::Enemy))
        .id();

    hit(&mut world, e, 2, DiscardSet::RECYCLABLE);

    assert_eq!(world.get::<Health>(e).unwrap().value, 3);
    let changed: Vec<_> = world
        .resource_mut::<Messages<HealthChanged>>()
        .drain()
        .collect();
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].value, 3);
    assert_eq!(changed[0].max, 5);
}

#[test]
fn same_category_damage_is_blocked() {
    let mut world = damage_world();

    let e = world
        .spawn((Health { value: 5 }, stats(DiscardSet::ORGANIC), AgentKind::Enemy))
        .id();

    hit(&mut world, e, 2, DiscardSet::NON_RECYCLABLE);

    assert_eq!(world.get::<Health>(e).unwrap().value, 5);
    assert_eq!(world.resource_mut::<Messages<HealthChanged>>().drain().count(), 0);
}

#[test]
fn damage_to_the_dead_is_a_noop() {
    let mut world = damage_world();

    let e = world
        .spawn((Health { value: 0 }, stats(DiscardSet::NONE), AgentKind::Collector))
        .id();

    hit(&mut world, e, 3, DiscardSet::ORGANIC);
    hit(&mut world, e, 3, DiscardSet::ORGANIC);

    assert_eq!(world.get::<Health>(e).unwrap().value, 0);
    assert_eq!(world.resource_mut::<Messages<HealthChanged>>().drain().count(), 0);
}

#[test]
fn health_may_go_negative_but_dies_only_once() {
    let mut world = damage_world();

    let e = world
        .spawn((Health { value: 1 }, stats(DiscardSet::NONE), AgentKind::City))
        .id();

    hit(&mut world, e, 4, DiscardSet::ORGANIC);
    assert_eq!(world.get::<Health>(e).unwrap().value, -3);

    // Already dead: no further change, no further notification.
    hit(&mut world, e, 4, DiscardSet::ORGANIC);
    assert_eq!(world.get::<Health>(e).unwrap().value, -3);
    assert_eq!(world.resource_mut::<Messages<HealthChanged>>().drain().count(), 1);
}

#[test]
fn steer_ignores_zero_direction() {
    let mut vel = LinearVelocity(Vec2::new(3.0, 4.0));
    steer(&mut vel, Vec2::ZERO, 100.0);
    assert_eq!(vel.0, Vec2::new(3.0, 4.0));

    steer(&mut vel, Vec2::new(0.0, 2.0), 100.0);
    assert_eq!(vel.0, Vec2::new(0.0, 100.0));
}

#[test]
fn rotate_toward_blends_instead_of_snapping() {
    let mut tf = Transform::default();
    rotate_toward(&mut tf, Vec2::X, 0.15);

    let heading = facing(&tf);
    // Moved toward +X, but not all the way there in one tick.
    assert!(heading.x > 0.05);
    assert!(heading.y > 0.5);

    // Zero direction leaves rotation untouched.
    let before = tf.rotation;
    rotate_toward(&mut tf, Vec2::ZERO, 0.15);
    assert_eq!(tf.rotation, before);
}

#[test]
fn forward_probe_returns_nearest_qualifying_hit() {
    let mut world = World::new();
    let near = world.spawn_empty().id();
    let far = world.spawn_empty().id();
    let behind = world.spawn_empty().id();
    let wide = world.spawn_empty().id();

    let hits = [
        (near, Vec2::new(0.0, 30.0)),
        (far, Vec2::new(0.0, 60.0)),
        (behind, Vec2::new(0.0, -10.0)),
        (wide, Vec2::new(50.0, 20.0)),
    ];

    let hit = forward_probe(Vec2::ZERO, Vec2::Y, 100.0, 10.0, hits);
    assert_eq!(hit, Some((near, 30.0)));
}

#[test]
fn forward_probe_misses_out_of_range_targets() {
    let mut world = World::new();
    let e = world.spawn_empty().id();

    assert_eq!(
        forward_probe(Vec2::ZERO, Vec2::Y, 20.0, 10.0, [(e, Vec2::new(0.0, 30.0))]),
        None
    );
    // Facing with no magnitude probes nothing.
    assert_eq!(
        forward_probe(Vec2::ZERO, Vec2::ZERO, 20.0, 10.0, [(e, Vec2::new(0.0, 5.0))]),
        None
    );
}
