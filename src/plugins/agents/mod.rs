//! Character/agent model shared by enemies, the player sub-controllers and
//! the city.
//!
//! Instead of an inheritance chain there is one concrete data set
//! ([`CharacterStats`] + [`Health`] + [`AgentKind`]); behavior is dispatched
//! by systems per kind. Damage follows the producer → consumer message
//! design: anything may write a [`DamageInstance`], and `apply_damage` is
//! the single writer of `Health`. That keeps the affinity gate, the
//! dead-guard and the change notification in one place.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::config::{CharacterTemplate, EnemyTemplate};
use crate::common::discard::DiscardSet;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Collector,
    Cannon,
    City,
    Enemy,
}

#[derive(Component, Debug, Clone)]
pub struct CharacterStats {
    pub max_health: i32,
    pub speed: f32,
    pub max_speed: f32,
    pub interaction_range: f32,
    pub attack_range: f32,
    pub damage: i32,
    /// What top-level damage category this agent shrugs off.
    pub affinity: DiscardSet,
}

impl CharacterStats {
    pub fn from_template(t: &CharacterTemplate, affinity: DiscardSet) -> Self {
        Self {
            max_health: t.max_health,
            speed: t.speed,
            max_speed: t.max_speed,
            interaction_range: t.interaction_range,
            attack_range: t.attack_range,
            damage: t.damage,
            affinity,
        }
    }

    pub fn from_enemy_template(t: &EnemyTemplate, affinity: DiscardSet) -> Self {
        Self {
            max_health: t.max_health,
            speed: t.speed,
            max_speed: t.max_speed,
            interaction_range: t.interaction_range,
            attack_range: t.attack_range,
            damage: t.damage,
            affinity,
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct Health {
    pub value: i32,
}

impl Health {
    /// Dead is any value below one; the value itself may go negative.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.value < 1
    }
}

/// Typed damage aimed at one agent.
#[derive(Message, Clone, Copy, Debug)]
pub struct DamageInstance {
    pub target: Entity,
    pub amount: i32,
    pub ty: DiscardSet,
}

/// Change notification for external HUDs.
#[derive(Message, Clone, Copy, Debug)]
pub struct HealthChanged {
    pub entity: Entity,
    pub kind: AgentKind,
    pub value: i32,
    pub max: i32,
}

/// Single consumer of [`DamageInstance`] messages.
///
/// Order of guards matters: affinity first (a blocked hit is not "damage"),
/// then the dead-guard so a corpse absorbs nothing and `HealthChanged`
/// fires only for real changes.
pub fn apply_damage(
    mut reader: MessageReader<DamageInstance>,
    mut q: Query<(&mut Health, &CharacterStats, &AgentKind)>,
    mut changed: MessageWriter<HealthChanged>,
) {
    for hit in reader.read() {
        let Ok((mut health, stats, kind)) = q.get_mut(hit.target) else {
            continue;
        };

        if !DiscardSet::damage_applies(hit.ty, stats.affinity) {
            continue;
        }
        if health.is_dead() {
            continue;
        }

        health.value -= hit.amount;
        changed.write(HealthChanged {
            entity: hit.target,
            kind: *kind,
            value: health.value,
            max: stats.max_health,
        });
    }
}

// -----------------------------------------------------------------------------
// Movement helpers
// -----------------------------------------------------------------------------

/// Kinematic steering: zero-magnitude directions are no-ops.
#[inline]
pub fn steer(vel: &mut LinearVelocity, direction: Vec2, speed: f32) {
    let Some(dir) = direction.try_normalize() else {
        return;
    };
    vel.0 = dir * speed;
}

/// Smoothed rotation toward a heading (sprites face local +Y).
/// Fixed blend factor per tick, no instant snapping.
#[inline]
pub fn rotate_toward(transform: &mut Transform, direction: Vec2, blend: f32) {
    let Some(dir) = direction.try_normalize() else {
        return;
    };
    let target = Quat::from_rotation_arc_2d(Vec2::Y, dir);
    transform.rotation = transform.rotation.slerp(target, blend);
}

/// The world-space direction an agent is facing.
#[inline]
pub fn facing(transform: &Transform) -> Vec2 {
    (transform.rotation * Vec3::Y).truncate()
}

/// Forward volume probe: a box of `2 * half_width` cast along `facing`,
/// bounded by `range`. The caller's candidate set is the category filter.
/// Returns the nearest qualifying hit and its distance along the facing
/// axis, or `None`.
pub fn forward_probe(
    origin: Vec2,
    facing: Vec2,
    range: f32,
    half_width: f32,
    candidates: impl IntoIterator<Item = (Entity, Vec2)>,
) -> Option<(Entity, f32)> {
    let facing = facing.try_normalize()?;
    if range <= 0.0 {
        return None;
    }

    let mut best: Option<(Entity, f32)> = None;
    for (entity, pos) in candidates {
        let offset = pos - origin;
        let along = offset.dot(facing);
        if along < 0.0 || along > range {
            continue;
        }
        if facing.perp_dot(offset).abs() > half_width {
            continue;
        }
        if best.is_none_or(|(_, d)| along < d) {
            best = Some((entity, along));
        }
    }
    best
}

// -----------------------------------------------------------------------------
// Spawn-in visual hook
// -----------------------------------------------------------------------------

/// Fire-and-forget scale-in played when a pooled agent activates.
#[derive(Component, Debug, Clone)]
pub struct ScaleIn {
    pub timer: Timer,
    pub target: f32,
}

impl ScaleIn {
    pub fn new(duration: f32, target: f32) -> Self {
        Self {
            timer: Timer::from_seconds(duration, TimerMode::Once),
            target,
        }
    }
}

pub fn advance_scale_in(
    time: Res<Time>,
    mut commands: Commands,
    mut q: Query<(Entity, &mut ScaleIn, &mut Transform)>,
) {
    for (e, mut anim, mut tf) in &mut q {
        anim.timer.tick(time.delta());

        let dur = anim.timer.duration().as_secs_f32().max(0.0001);
        let t = (anim.timer.elapsed_secs() / dur).clamp(0.0, 1.0);
        tf.scale = Vec3::splat(anim.target * t);

        if anim.timer.is_finished() {
            tf.scale = Vec3::splat(anim.target);
            commands.entity(e).remove::<ScaleIn>();
        }
    }
}

pub fn plugin(app: &mut App) {
    app.add_message::<DamageInstance>();
    app.add_message::<HealthChanged>();

    app.add_systems(Update, advance_scale_in);

    // Combat results are consumed in the fixed phase, after collision
    // resolution has produced its DamageInstances.
    app.add_systems(
        FixedPostUpdate,
        apply_damage.after(crate::plugins::projectiles::collision::process_projectile_collisions),
    );
}

#[cfg(test)]
mod tests;
