//! Collision resolve: physics contacts -> typed damage + pool returns.
//!
//! Exactly one side of a contact may be a projectile; projectile-projectile
//! and non-projectile contacts are ignored. The resolver never writes
//! `Health` itself, it emits [`DamageInstance`]s for the single damage
//! consumer to apply (affinity gate included).

use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::common::layers::Layer;
use crate::plugins::agents::DamageInstance;
use crate::plugins::pooling::PooledState;

use super::{PooledProjectile, Projectile};

#[derive(Clone, Copy, Debug)]
struct CollisionTarget {
    collider: Entity,
    body: Option<Entity>,
}

impl CollisionTarget {
    #[inline]
    fn gameplay_owner(self) -> Entity {
        self.body.unwrap_or(self.collider)
    }
}

#[inline]
fn targets(ev: &CollisionStart) -> (CollisionTarget, CollisionTarget) {
    (
        CollisionTarget {
            collider: ev.collider1,
            body: ev.body1,
        },
        CollisionTarget {
            collider: ev.collider2,
            body: ev.body2,
        },
    )
}

#[inline]
fn is_in_layer(layers: &CollisionLayers, layer: Layer) -> bool {
    layers.memberships.has_all(layer)
}

pub fn process_projectile_collisions(
    mut started: MessageReader<CollisionStart>,
    q_is_projectile: Query<(), With<PooledProjectile>>,
    mut q_projectiles: Query<(&Projectile, &mut PooledState), With<PooledProjectile>>,
    q_layers: Query<&CollisionLayers>,
    mut damage: MessageWriter<DamageInstance>,
    // Per-frame dedupe
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        let (t1, t2) = targets(ev);

        let p1 = q_is_projectile.contains(t1.collider);
        let p2 = q_is_projectile.contains(t2.collider);
        if !(p1 ^ p2) {
            continue;
        }
        let (shot_side, other_side) = if p1 { (t1, t2) } else { (t2, t1) };

        if !seen.insert(shot_side.collider) {
            continue;
        }

        let Ok(other_layers) = q_layers.get(other_side.collider) else {
            continue;
        };
        let Ok((projectile, mut state)) = q_projectiles.get_mut(shot_side.collider) else {
            continue;
        };

        // A contact delivered after the shot was already spent is stale.
        if *state != PooledState::Active {
            continue;
        }

        if is_in_layer(other_layers, Layer::Enemy) {
            damage.write(DamageInstance {
                target: other_side.gameplay_owner(),
                amount: projectile.damage,
                ty: projectile.ty,
            });
            *state = PooledState::PendingReturn;
            continue;
        }

        if is_in_layer(other_layers, Layer::World) {
            *state = PooledState::PendingReturn;
        }
    }
}
