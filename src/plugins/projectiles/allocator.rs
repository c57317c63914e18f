//! Spawn consumer: activate projectiles from the pool.
//!
//! The free list contains only valid pooled projectile entities, so a pooled
//! entity must match the activation query; a miss is an invariant violation
//! and crashes loudly.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::config::GameConfig;
use crate::common::discard::TypePalette;
use crate::plugins::agents::ScaleIn;
use crate::plugins::pooling::{EntityPool, PooledState};

use super::messages::SpawnProjectileRequest;
use super::{
    active_projectile_layers, inactive_projectile_layers, Lifetime, PooledProjectile, Projectile,
    PROJECTILE_RADIUS,
};

/// Pre-spawn the projectile population, idle and hidden.
pub fn init_projectile_pool(
    mut commands: Commands,
    mut pool: ResMut<EntityPool<PooledProjectile>>,
) {
    for i in 0..pool.policy().prewarm {
        let entity = commands
            .spawn((
                Name::new(format!("PooledProjectile{i}")),
                PooledProjectile,
                Projectile::default(),
                Lifetime::new(1.0),
                PooledState::Inactive,
                Sprite {
                    color: Color::WHITE,
                    custom_size: Some(Vec2::splat(PROJECTILE_RADIUS * 2.0)),
                    ..default()
                },
                Transform::from_scale(Vec3::ZERO),
                Visibility::Hidden,
                RigidBody::Kinematic,
                Collider::circle(PROJECTILE_RADIUS),
                LinearVelocity::ZERO,
                CollisionEventsEnabled,
                inactive_projectile_layers(),
            ))
            .id();
        pool.insert_idle(entity);
    }
}

pub fn allocate_projectiles(
    mut commands: Commands,
    mut reader: MessageReader<SpawnProjectileRequest>,
    mut pool: ResMut<EntityPool<PooledProjectile>>,
    config: Res<GameConfig>,
    palette: Res<TypePalette>,
    mut q: Query<
        (
            &mut PooledState,
            &mut Projectile,
            &mut Lifetime,
            &mut Transform,
            &mut LinearVelocity,
            &mut Visibility,
            &mut Sprite,
            &mut CollisionLayers,
        ),
        With<PooledProjectile>,
    >,
) {
    for req in reader.read() {
        let Some(dir) = req.dir.try_normalize() else {
            continue;
        };
        let Some(entity) = pool.acquire(|| None) else {
            // Capacity decision, not a correctness failure.
            continue;
        };

        let (mut state, mut projectile, mut lifetime, mut tf, mut vel, mut vis, mut sprite, mut layers) =
            q.get_mut(entity)
                .expect("pool contained an entity missing pooled projectile components");

        *state = PooledState::Active;
        projectile.damage = config.projectile.damage;
        projectile.ty = req.ty;
        *lifetime = Lifetime::new(config.projectile.lifetime);

        tf.translation = req.pos.extend(2.0);
        tf.scale = Vec3::ZERO;
        vel.0 = dir * config.projectile.speed;
        sprite.color = palette.get(req.ty).color;
        *vis = Visibility::Visible;
        *layers = active_projectile_layers();
        commands.entity(entity).insert(ScaleIn::new(0.1, 1.0));
    }
}
