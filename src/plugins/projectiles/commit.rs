//! Return commit: recycle projectiles back into the pool.
//!
//! Inactive invariants are owned here: hidden, velocity zero, empty
//! collision filters, neutral payload.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::time::Fixed;

use crate::common::discard::DiscardSet;
use crate::plugins::agents::ScaleIn;
use crate::plugins::pooling::{EntityPool, PooledState};

use super::{inactive_projectile_layers, Lifetime, PooledProjectile, Projectile};

/// Tick flight budgets; an expired shot returns without a contact.
pub fn expire_projectiles(
    time: Res<Time<Fixed>>,
    mut q: Query<(&mut Lifetime, &mut PooledState), With<PooledProjectile>>,
) {
    for (mut lifetime, mut state) in &mut q {
        if *state != PooledState::Active {
            continue;
        }
        lifetime.timer.tick(time.delta());
        if lifetime.timer.is_finished() {
            *state = PooledState::PendingReturn;
        }
    }
}

pub fn return_projectiles_to_pool(
    mut commands: Commands,
    mut pool: ResMut<EntityPool<PooledProjectile>>,
    mut q: Query<
        (
            Entity,
            &mut PooledState,
            &mut Projectile,
            &mut Visibility,
            &mut LinearVelocity,
            &mut Transform,
            &mut CollisionLayers,
        ),
        With<PooledProjectile>,
    >,
) {
    for (entity, mut state, mut projectile, mut vis, mut vel, mut tf, mut layers) in &mut q {
        if *state != PooledState::PendingReturn {
            continue;
        }

        *state = PooledState::Inactive;
        projectile.damage = 0;
        projectile.ty = DiscardSet::NONE;
        *vis = Visibility::Hidden;
        vel.0 = Vec2::ZERO;
        tf.scale = Vec3::ZERO;
        *layers = inactive_projectile_layers();
        commands.entity(entity).remove::<ScaleIn>();

        pool.release(entity);
    }
}
