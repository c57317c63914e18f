//! Collectables plugin: pooled typed pickups.
//!
//! Enemies drop them on death, and an initial batch is scattered when the
//! run starts. Collectables carry no physics at all; pickup is the
//! collector's forward probe and carrying is a transform follow, so the
//! entities are plain pooled sprites.

use bevy::prelude::*;
use rand::Rng;

use crate::common::discard::{DiscardSet, TypePalette};
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::agents::ScaleIn;
use crate::plugins::core::GameRng;
use crate::plugins::player::Collector;
use crate::plugins::pooling::{EntityPool, PoolPolicy, PooledState};

const COLLECTABLE_POOL: PoolPolicy = PoolPolicy {
    prewarm: 48,
    max_size: 48,
    allow_exceed_max: false,
};

const SCATTER_MIN: u32 = 10;
const SCATTER_MAX: u32 = 14;
const SCATTER_HALF_EXTENT: Vec2 = Vec2::new(900.0, 480.0);

/// Pool membership marker; also the pool's type key.
#[derive(Component, Debug, Clone, Copy)]
pub struct PooledCollectable;

/// A typed pickup worth `size` rounds of ammo.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Collectable {
    pub size: u32,
    pub ty: DiscardSet,
}

/// Attached while the collector carries this pickup around.
#[derive(Component, Debug, Clone, Copy)]
pub struct Carried {
    pub by: Entity,
}

/// Request to materialize one pickup.
#[derive(Message, Clone, Copy, Debug)]
pub struct DropCollectableRequest {
    pub pos: Vec2,
    pub ty: DiscardSet,
}

fn init_collectable_pool(
    mut commands: Commands,
    mut pool: ResMut<EntityPool<PooledCollectable>>,
) {
    for i in 0..pool.policy().prewarm {
        let entity = commands
            .spawn((
                Name::new(format!("PooledCollectable{i}")),
                PooledCollectable,
                Collectable::default(),
                PooledState::Inactive,
                Sprite {
                    color: Color::WHITE,
                    custom_size: Some(Vec2::splat(18.0)),
                    ..default()
                },
                Transform::from_scale(Vec3::ZERO),
                Visibility::Hidden,
            ))
            .id();
        pool.insert_idle(entity);
    }
}

/// Seed the arena with a random batch of random-typed pickups.
fn scatter_initial_collectables(
    mut rng: ResMut<GameRng>,
    mut drops: MessageWriter<DropCollectableRequest>,
) {
    let count = rng.0.gen_range(SCATTER_MIN..=SCATTER_MAX);
    for _ in 0..count {
        let pos = Vec2::new(
            rng.0.gen_range(-SCATTER_HALF_EXTENT.x..=SCATTER_HALF_EXTENT.x),
            rng.0.gen_range(-SCATTER_HALF_EXTENT.y..=SCATTER_HALF_EXTENT.y),
        );
        drops.write(DropCollectableRequest {
            pos,
            ty: DiscardSet::random_base(&mut rng.0),
        });
    }
}

fn allocate_collectables(
    mut reader: MessageReader<DropCollectableRequest>,
    mut pool: ResMut<EntityPool<PooledCollectable>>,
    mut rng: ResMut<GameRng>,
    palette: Res<TypePalette>,
    mut commands: Commands,
    mut q: Query<
        (
            &mut PooledState,
            &mut Collectable,
            &mut Transform,
            &mut Visibility,
            &mut Sprite,
        ),
        With<PooledCollectable>,
    >,
) {
    for req in reader.read() {
        if req.ty.is_empty() {
            continue;
        }
        let Some(entity) = pool.acquire(|| None) else {
            warn!("collectable pool exhausted, dropping pickup");
            continue;
        };

        let (mut state, mut item, mut tf, mut vis, mut sprite) = q
            .get_mut(entity)
            .expect("pool contained an entity missing pooled collectable components");

        *state = PooledState::Active;
        item.ty = req.ty;
        item.size = rng.0.gen_range(1..=3);
        tf.translation = req.pos.extend(0.5);
        tf.scale = Vec3::ZERO;
        sprite.color = palette.get(req.ty).color;
        *vis = Visibility::Visible;

        commands.entity(entity).insert(ScaleIn::new(0.2, 1.0));
    }
}

/// Carried pickups track the collector with a fixed offset.
fn carry_follow(
    tunables: Res<Tunables>,
    q_carrier: Query<&Transform, (With<Collector>, Without<PooledCollectable>)>,
    mut q_carried: Query<(&Carried, &mut Transform), With<PooledCollectable>>,
) {
    for (carried, mut tf) in &mut q_carried {
        let Ok(carrier_tf) = q_carrier.get(carried.by) else {
            continue;
        };
        let anchor = carrier_tf.translation.truncate()
            + (carrier_tf.rotation * tunables.carry_offset.extend(0.0)).truncate();
        tf.translation = anchor.extend(tf.translation.z);
    }
}

fn return_collectables_to_pool(
    mut pool: ResMut<EntityPool<PooledCollectable>>,
    mut commands: Commands,
    mut q: Query<
        (
            Entity,
            &mut PooledState,
            &mut Collectable,
            &mut Visibility,
            &mut Transform,
        ),
        With<PooledCollectable>,
    >,
) {
    for (entity, mut state, mut item, mut vis, mut tf) in &mut q {
        if *state != PooledState::PendingReturn {
            continue;
        }

        *state = PooledState::Inactive;
        *item = Collectable::default();
        *vis = Visibility::Hidden;
        tf.scale = Vec3::ZERO;
        commands.entity(entity).remove::<Carried>();
        commands.entity(entity).remove::<ScaleIn>();

        pool.release(entity);
    }
}

pub fn plugin(app: &mut App) {
    app.insert_resource(EntityPool::<PooledCollectable>::new(COLLECTABLE_POOL));
    app.add_message::<DropCollectableRequest>();

    app.add_systems(Startup, init_collectable_pool);
    app.add_systems(OnEnter(GameState::InGame), scatter_initial_collectables);

    app.add_systems(
        Update,
        allocate_collectables.run_if(in_state(GameState::InGame)),
    );
    app.add_systems(PostUpdate, (carry_follow, return_collectables_to_pool));
}
