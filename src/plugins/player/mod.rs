//! Player plugin: the collector (walks, gathers, deposits) and the cannon
//! (aims at the cursor inside a frontal arc, fires typed bursts).
//!
//! Pipeline:
//! - Update: sample input into `PlayerInput`, aim, fire, collect/deposit
//! - FixedUpdate: apply collector velocity to the kinematic body
//!
//! The cannon never touches the projectile pool; firing writes
//! `SpawnProjectileRequest` messages. Ammo is two FIFO clips (one per
//! top-level discard category): deposits push whole pickups, each shot pops
//! one entry and fires that many projectiles as a staggered burst.

use std::collections::VecDeque;
use std::f32::consts::FRAC_PI_2;

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::config::GameConfig;
use crate::common::discard::{DiscardSet, TypePalette};
use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::agents::{self, AgentKind, CharacterStats, Health};
use crate::plugins::collectables::{Carried, Collectable, PooledCollectable};
use crate::plugins::pooling::PooledState;
use crate::plugins::projectiles::messages::SpawnProjectileRequest;

const CANNON_MUZZLE_OFFSET: f32 = 26.0;
const CANNON_TURN_RATE: f32 = 6.0;

// -----------------------------------------------------------------------------
// Components
// -----------------------------------------------------------------------------

#[derive(Component, Debug, Clone, Copy)]
pub struct Collector;

#[derive(Component, Debug, Clone, Copy)]
pub struct Cannon;

/// A deposit point that accepts one top-level discard category.
#[derive(Component, Debug, Clone, Copy)]
pub struct Container {
    pub accepts: DiscardSet,
}

/// In-flight burst: one projectile every `timer` tick until `remaining`
/// runs out. Present on the cannon only while a burst is live; its presence
/// is also the "cannot fire again yet" gate.
#[derive(Component, Debug, Clone)]
pub struct BurstFire {
    pub remaining: u32,
    pub ty: DiscardSet,
    pub timer: Timer,
}

// -----------------------------------------------------------------------------
// Resources and messages
// -----------------------------------------------------------------------------

#[derive(Resource, Default, Debug)]
pub struct PlayerInput {
    pub move_axis: Vec2,
    pub fire: bool,
    pub collect: bool,
    pub select: Option<DiscardSet>,
}

/// Cursor aim in world space; `None` while the cursor is unavailable.
#[derive(Resource, Default, Debug)]
pub struct CannonAim {
    pub world_cursor: Option<Vec2>,
}

/// Two FIFO ammo clips keyed by top-level category. Entries are whole
/// deposited pickups; a shot pops the front entry and fires that many
/// projectiles.
#[derive(Resource, Debug)]
pub struct AmmoClips {
    recyclable: VecDeque<u32>,
    non_recyclable: VecDeque<u32>,
    current: DiscardSet,
}

impl Default for AmmoClips {
    fn default() -> Self {
        Self {
            recyclable: VecDeque::new(),
            non_recyclable: VecDeque::new(),
            current: DiscardSet::RECYCLABLE,
        }
    }
}

impl AmmoClips {
    fn clip(&self, ty: DiscardSet) -> Option<&VecDeque<u32>> {
        match ty.top_level() {
            DiscardSet::RECYCLABLE => Some(&self.recyclable),
            DiscardSet::NON_RECYCLABLE => Some(&self.non_recyclable),
            _ => None,
        }
    }

    fn clip_mut(&mut self, ty: DiscardSet) -> Option<&mut VecDeque<u32>> {
        match ty.top_level() {
            DiscardSet::RECYCLABLE => Some(&mut self.recyclable),
            DiscardSet::NON_RECYCLABLE => Some(&mut self.non_recyclable),
            _ => None,
        }
    }

    pub fn current(&self) -> DiscardSet {
        self.current
    }

    pub fn set_current(&mut self, ty: DiscardSet) {
        if !ty.is_empty() {
            self.current = ty.top_level();
        }
    }

    /// Queue a deposited pickup. Untyped or zero-sized deposits are dropped.
    pub fn add(&mut self, ty: DiscardSet, amount: u32) {
        if amount == 0 {
            return;
        }
        if let Some(clip) = self.clip_mut(ty) {
            clip.push_back(amount);
        }
    }

    /// Front entry of the selected clip, left in place.
    pub fn peek(&self) -> Option<u32> {
        self.clip(self.current).and_then(|clip| clip.front()).copied()
    }

    pub fn has_ammo(&self) -> bool {
        self.peek().is_some_and(|n| n > 0)
    }

    /// Pop the front entry of the selected clip.
    pub fn retrieve(&mut self) -> Option<u32> {
        let current = self.current;
        self.clip_mut(current)?.pop_front()
    }

    /// Rounds remaining in one clip, for HUDs.
    pub fn total(&self, ty: DiscardSet) -> u32 {
        self.clip(ty).map_or(0, |clip| clip.iter().sum())
    }
}

/// Ammo-state notification for external HUDs.
#[derive(Message, Clone, Copy, Debug)]
pub struct AmmoChanged {
    pub ty: DiscardSet,
    pub total: u32,
}

// -----------------------------------------------------------------------------
// Spawn
// -----------------------------------------------------------------------------

fn spawn(mut commands: Commands, config: Res<GameConfig>, palette: Res<TypePalette>) {
    let collector_layers = CollisionLayers::new(
        Layer::Collector,
        [Layer::World, Layer::Enemy],
    );

    commands.spawn((
        Name::new("Collector"),
        Collector,
        AgentKind::Collector,
        CharacterStats::from_template(&config.collector, DiscardSet::NONE),
        Health { value: config.collector.max_health },
        Sprite {
            color: Color::srgb(0.2, 0.75, 0.9),
            custom_size: Some(Vec2::splat(26.0)),
            ..default()
        },
        Transform::from_xyz(0.0, -80.0, 1.0),
        RigidBody::Kinematic,
        Collider::circle(13.0),
        collector_layers,
        LinearVelocity::ZERO,
        DespawnOnExit(GameState::InGame),
    ));

    // The cannon sits in front of the city; it only rotates.
    commands.spawn((
        Name::new("Cannon"),
        Cannon,
        AgentKind::Cannon,
        CharacterStats::from_template(&config.cannon, DiscardSet::NONE),
        Health { value: config.cannon.max_health },
        Sprite {
            color: Color::srgb(0.4, 0.44, 0.52),
            custom_size: Some(Vec2::new(22.0, 40.0)),
            ..default()
        },
        Transform::from_xyz(0.0, 120.0, 1.2),
        RigidBody::Static,
        Collider::rectangle(22.0, 40.0),
        CollisionLayers::new(Layer::Cannon, [] as [Layer; 0]),
        DespawnOnExit(GameState::InGame),
    ));

    for (x, accepts) in [
        (-120.0, DiscardSet::RECYCLABLE),
        (120.0, DiscardSet::NON_RECYCLABLE),
    ] {
        commands.spawn((
            Name::new(format!("Container{accepts:?}")),
            Container { accepts },
            Sprite {
                color: palette.get(accepts).color,
                custom_size: Some(Vec2::new(44.0, 44.0)),
                ..default()
            },
            Transform::from_xyz(x, 160.0, 0.8),
            DespawnOnExit(GameState::InGame),
        ));
    }
}

// -----------------------------------------------------------------------------
// Input
// -----------------------------------------------------------------------------

fn gather_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    buttons: Option<Res<ButtonInput<MouseButton>>>,
    mut input: ResMut<PlayerInput>,
) {
    let Some(keys) = keys else {
        return;
    };

    let mut axis = Vec2::ZERO;
    if keys.pressed(KeyCode::KeyW) {
        axis.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        axis.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        axis.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        axis.x += 1.0;
    }
    input.move_axis = axis.normalize_or_zero();

    let mouse_fire = buttons.is_some_and(|b| b.just_pressed(MouseButton::Left));
    input.fire = keys.just_pressed(KeyCode::Space) || mouse_fire;
    input.collect = keys.just_pressed(KeyCode::KeyE);

    input.select = if keys.just_pressed(KeyCode::Digit1) {
        Some(DiscardSet::RECYCLABLE)
    } else if keys.just_pressed(KeyCode::Digit2) {
        Some(DiscardSet::NON_RECYCLABLE)
    } else {
        None
    };
}

fn apply_clip_selection(
    input: Res<PlayerInput>,
    mut ammo: ResMut<AmmoClips>,
    mut changed: MessageWriter<AmmoChanged>,
) {
    let Some(ty) = input.select else {
        return;
    };
    ammo.set_current(ty);
    changed.write(AmmoChanged {
        ty: ammo.current(),
        total: ammo.total(ammo.current()),
    });
}

// -----------------------------------------------------------------------------
// Collector movement
// -----------------------------------------------------------------------------

fn move_collector(
    tunables: Res<Tunables>,
    input: Res<PlayerInput>,
    mut q: Query<(&mut Transform, &mut LinearVelocity, &CharacterStats), With<Collector>>,
) {
    let Ok((mut tf, mut vel, stats)) = q.single_mut() else {
        return;
    };

    if input.move_axis == Vec2::ZERO {
        vel.0 = Vec2::ZERO;
        return;
    }
    agents::steer(&mut vel, input.move_axis, stats.speed);
    agents::rotate_toward(&mut tf, input.move_axis, tunables.rotate_blend);
}

// -----------------------------------------------------------------------------
// Cannon aim + fire
// -----------------------------------------------------------------------------

/// Project the cursor into world space. Headless or cursor-less runs leave
/// the aim as `None` and the cannon holds its heading.
fn update_cannon_aim(
    windows: Query<&Window>,
    q_camera: Query<(&Camera, &GlobalTransform), With<Camera2d>>,
    mut aim: ResMut<CannonAim>,
) {
    aim.world_cursor = None;

    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_tf)) = q_camera.single() else {
        return;
    };
    aim.world_cursor = camera.viewport_to_world_2d(camera_tf, cursor).ok();
}

/// Rotate toward the aim, clamped to a frontal half circle: the cannon never
/// turns back past straight left/right.
fn rotate_cannon(
    time: Res<Time>,
    aim: Res<CannonAim>,
    mut q: Query<&mut Transform, With<Cannon>>,
) {
    let Some(cursor) = aim.world_cursor else {
        return;
    };
    let Ok(mut tf) = q.single_mut() else {
        return;
    };

    let Some(dir) = (cursor - tf.translation.truncate()).try_normalize() else {
        return;
    };
    // Angle from +Y, clockwise positive, clamped to the frontal arc.
    let angle = dir.x.atan2(dir.y).clamp(-FRAC_PI_2, FRAC_PI_2);
    let target = Quat::from_rotation_z(-angle);
    let blend = (CANNON_TURN_RATE * time.delta_secs()).clamp(0.0, 1.0);
    tf.rotation = tf.rotation.slerp(target, blend);
}

/// Fire producer. Guards, in order: a burst already in flight wins, then
/// the selected clip must have a loaded front entry. One ammo entry is
/// consumed per trigger pull; entries larger than one continue as a burst.
fn fire_cannon(
    input: Res<PlayerInput>,
    mut ammo: ResMut<AmmoClips>,
    mut commands: Commands,
    q_cannon: Query<(Entity, &Transform, Option<&BurstFire>), With<Cannon>>,
    tunables: Res<Tunables>,
    mut shots: MessageWriter<SpawnProjectileRequest>,
    mut changed: MessageWriter<AmmoChanged>,
) {
    if !input.fire {
        return;
    }
    let Ok((cannon, tf, burst)) = q_cannon.single() else {
        return;
    };
    if burst.is_some() {
        return;
    }
    if !ammo.has_ammo() {
        return;
    }
    let Some(rounds) = ammo.retrieve() else {
        return;
    };

    let ty = ammo.current();
    let dir = agents::facing(tf);
    shots.write(SpawnProjectileRequest {
        pos: tf.translation.truncate() + dir * CANNON_MUZZLE_OFFSET,
        dir,
        ty,
    });

    if rounds > 1 {
        commands.entity(cannon).insert(BurstFire {
            remaining: rounds - 1,
            ty,
            timer: Timer::from_seconds(tunables.burst_shot_interval, TimerMode::Repeating),
        });
    }

    changed.write(AmmoChanged {
        ty,
        total: ammo.total(ty),
    });
}

fn tick_burst(
    time: Res<Time>,
    mut commands: Commands,
    mut q: Query<(Entity, &Transform, &mut BurstFire), With<Cannon>>,
    mut shots: MessageWriter<SpawnProjectileRequest>,
) {
    let Ok((cannon, tf, mut burst)) = q.single_mut() else {
        return;
    };

    burst.timer.tick(time.delta());
    for _ in 0..burst.timer.times_finished_this_tick() {
        if burst.remaining == 0 {
            break;
        }
        let dir = agents::facing(tf);
        shots.write(SpawnProjectileRequest {
            pos: tf.translation.truncate() + dir * CANNON_MUZZLE_OFFSET,
            dir,
            ty: burst.ty,
        });
        burst.remaining -= 1;
    }

    if burst.remaining == 0 {
        commands.entity(cannon).remove::<BurstFire>();
    }
}

// -----------------------------------------------------------------------------
// Collect / deposit
// -----------------------------------------------------------------------------

/// One key, two meanings: carrying nothing probes ahead for a pickup;
/// carrying something deposits it into a matching container in range.
/// A mismatched or out-of-range deposit keeps the item in hand.
#[allow(clippy::too_many_arguments)]
fn collect_action(
    input: Res<PlayerInput>,
    tunables: Res<Tunables>,
    mut ammo: ResMut<AmmoClips>,
    mut commands: Commands,
    q_collector: Query<(Entity, &Transform, &CharacterStats), With<Collector>>,
    q_containers: Query<(&Container, &Transform), Without<Collector>>,
    q_items: Query<
        (Entity, &Collectable, &Transform, &PooledState, Option<&Carried>),
        With<PooledCollectable>,
    >,
    mut changed: MessageWriter<AmmoChanged>,
) {
    if !input.collect {
        return;
    }
    let Ok((collector, collector_tf, stats)) = q_collector.single() else {
        return;
    };
    let origin = collector_tf.translation.truncate();

    let carried: Option<(Entity, Collectable)> = q_items
        .iter()
        .find(|(_, _, _, _, carried)| carried.is_some_and(|c| c.by == collector))
        .map(|(e, item, _, _, _)| (e, *item));

    if let Some((item_entity, item)) = carried {
        // Deposit: nearest container in range whose category matches.
        let target = q_containers
            .iter()
            .filter(|(container, tf)| {
                item.ty.intersects(container.accepts)
                    && tf.translation.truncate().distance(origin) <= stats.interaction_range
            })
            .min_by(|(_, a), (_, b)| {
                let da = a.translation.truncate().distance_squared(origin);
                let db = b.translation.truncate().distance_squared(origin);
                da.total_cmp(&db)
            });

        let Some((container, _)) = target else {
            return;
        };

        ammo.add(container.accepts, item.size);
        commands.entity(item_entity).remove::<Carried>();
        commands.entity(item_entity).insert(PooledState::PendingReturn);
        changed.write(AmmoChanged {
            ty: container.accepts,
            total: ammo.total(container.accepts),
        });
        return;
    }

    // Pickup: forward probe over loose active pickups.
    let candidates = q_items
        .iter()
        .filter(|(_, _, _, state, carried)| {
            **state == PooledState::Active && carried.is_none()
        })
        .map(|(e, _, tf, _, _)| (e, tf.translation.truncate()));

    let hit = agents::forward_probe(
        origin,
        agents::facing(collector_tf),
        stats.interaction_range,
        tunables.probe_half_width,
        candidates,
    );
    if let Some((item_entity, _)) = hit {
        commands.entity(item_entity).insert(Carried { by: collector });
    }
}

// -----------------------------------------------------------------------------
// Plugin wiring
// -----------------------------------------------------------------------------

pub fn plugin(app: &mut App) {
    app.init_resource::<PlayerInput>();
    app.init_resource::<CannonAim>();
    app.init_resource::<AmmoClips>();
    app.add_message::<AmmoChanged>();

    app.add_systems(OnEnter(GameState::InGame), spawn);

    app.add_systems(
        Update,
        (
            gather_input,
            apply_clip_selection.after(gather_input),
            update_cannon_aim,
            rotate_cannon.after(update_cannon_aim),
            fire_cannon.after(apply_clip_selection),
            tick_burst.after(fire_cannon),
            collect_action.after(gather_input),
        )
            .run_if(in_state(GameState::InGame)),
    );

    app.add_systems(FixedUpdate, move_collector);
}

#[cfg(test)]
mod tests;
