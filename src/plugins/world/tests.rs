use bevy::prelude::*;

use crate::common::test_utils::run_system_once;
use crate::plugins::player::{Cannon, Collector};

use super::*;

#[test]
fn world_refs_fill_incrementally() {
    let mut world = World::new();
    world.init_resource::<WorldRefs>();

    let collector = world.spawn(Collector).id();
    run_system_once(&mut world, ensure_world_refs);

    let refs = *world.resource::<WorldRefs>();
    assert_eq!(refs.collector, Some(collector));
    assert_eq!(refs.cannon, None);
    assert_eq!(refs.city, None);

    let cannon = world.spawn(Cannon).id();
    let city = world.spawn(City).id();
    run_system_once(&mut world, ensure_world_refs);

    let refs = *world.resource::<WorldRefs>();
    assert_eq!(refs.collector, Some(collector));
    assert_eq!(refs.cannon, Some(cannon));
    assert_eq!(refs.city, Some(city));
}

#[test]
fn spawn_anchors_sample_stays_in_set() {
    let anchors = SpawnAnchors(vec![Vec2::splat(5.0), Vec2::splat(-5.0)]);
    let mut rng = rand::thread_rng();
    for _ in 0..32 {
        let p = anchors.sample(&mut rng);
        assert!(anchors.0.contains(&p));
    }
}
