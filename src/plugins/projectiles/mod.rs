//! Projectiles plugin: message-based producer -> consumer spawning over the
//! shared entity pool.
//!
//! Producers (the cannon) never touch the pool; they enqueue
//! [`messages::SpawnProjectileRequest`] intent. The allocator is the single
//! writer that activates pooled entities, the collision resolver translates
//! physics contacts into typed [`DamageInstance`]s and flips spent shots to
//! `PendingReturn`, and the commit system owns the inactive invariants
//! (hidden, zero velocity, empty collision filters).

pub mod allocator;
pub mod collision;
pub mod commit;
pub mod messages;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::discard::DiscardSet;
use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::plugins::pooling::{EntityPool, PoolPolicy};

const PROJECTILE_POOL: PoolPolicy = PoolPolicy {
    prewarm: 64,
    max_size: 64,
    allow_exceed_max: false,
};

pub const PROJECTILE_RADIUS: f32 = 5.0;

/// Pool membership marker; also the pool's type key.
#[derive(Component, Debug, Clone, Copy)]
pub struct PooledProjectile;

/// Live projectile payload.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Projectile {
    pub damage: i32,
    pub ty: DiscardSet,
}

/// Flight-time budget; expiry returns the shot without a contact.
#[derive(Component, Debug, Clone)]
pub struct Lifetime {
    pub timer: Timer,
}

impl Lifetime {
    pub fn new(secs: f32) -> Self {
        Self {
            timer: Timer::from_seconds(secs.max(0.01), TimerMode::Once),
        }
    }
}

#[inline]
pub fn inactive_projectile_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Projectile, [] as [Layer; 0])
}

#[inline]
pub fn active_projectile_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Projectile, [Layer::World, Layer::Enemy])
}

pub fn plugin(app: &mut App) {
    app.insert_resource(EntityPool::<PooledProjectile>::new(PROJECTILE_POOL));
    app.add_message::<messages::SpawnProjectileRequest>();

    app.add_systems(Startup, allocator::init_projectile_pool);

    app.add_systems(
        Update,
        allocator::allocate_projectiles.run_if(in_state(GameState::InGame)),
    );

    app.add_systems(FixedUpdate, commit::expire_projectiles);

    app.add_systems(
        FixedPostUpdate,
        (
            collision::process_projectile_collisions.after(CollisionEventSystems),
            commit::return_projectiles_to_pool.after(collision::process_projectile_collisions),
        ),
    );
}
