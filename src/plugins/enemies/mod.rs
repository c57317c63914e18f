//! Enemies plugin: pooled melee attackers driven by a three-state machine
//! (seek the city, seek the collector, attack) and ticked through the sliced
//! scheduler so only one bucket of enemies thinks per frame.
//!
//! Gameplay truth lives in components (`EnemyState`, `EnemyLifeState`,
//! `EnemyType`, `AttackCooldown`); this module reads distances/health and
//! transitions those states. Death is a two-phase lifecycle: the trigger
//! system flips Alive -> Dying and severs the enemy from the world
//! (velocity, layers, registries), the progress system animates the shrink
//! and marks the entity `PendingReturn` for the pool commit. No structural
//! spawn/despawn happens on the combat path.

use avian2d::prelude::*;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use bevy::time::Fixed;
use rand::Rng;

use crate::common::config::GameConfig;
use crate::common::discard::{DiscardSet, TypePalette};
use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::agents::{
    self, AgentKind, CharacterStats, DamageInstance, Health, ScaleIn,
};
use crate::plugins::collectables::DropCollectableRequest;
use crate::plugins::core::GameRng;
use crate::plugins::pooling::{EntityPool, PoolPolicy, PooledState};
use crate::plugins::scheduler::FrameSlices;
use crate::plugins::world::WorldRefs;

const ENEMY_POOL: PoolPolicy = PoolPolicy {
    prewarm: 32,
    max_size: 32,
    allow_exceed_max: false,
};

const DEATH_SHRINK_SECS: f32 = 0.35;
const ENEMY_RADIUS: f32 = 16.0;

// -----------------------------------------------------------------------------
// Components
// -----------------------------------------------------------------------------

/// Marker for enemy agents.
#[derive(Component, Debug, Clone, Copy)]
pub struct Enemy;

/// Pool membership marker; also the pool's type key.
#[derive(Component, Debug, Clone, Copy)]
pub struct PooledEnemy;

/// Behavioral state. Exhaustively matched everywhere, so an enemy is always
/// in exactly one of these.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnemyState {
    #[default]
    SeekCity,
    SeekPlayer,
    Attack,
}

/// Lifecycle state machine. `Dying` carries its own shrink timer; `Dead`
/// is terminal until the pool re-activates the entity.
#[derive(Component, Debug, Clone, Default)]
pub enum EnemyLifeState {
    #[default]
    Alive,
    /// `from` is the scale at the moment of death, so bosses shrink from 2x.
    Dying { timer: Timer, from: f32 },
    Dead,
}

/// The discard category this enemy is made of. Doubles as its damage
/// affinity and the type of the collectable it may drop.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct EnemyType(pub DiscardSet);

/// Latch-style attack gate: `ready` until an attack lands, then a delay
/// timer re-arms it. Ticked every frame regardless of slice membership so
/// the re-arm is not slowed down by slicing.
#[derive(Component, Debug, Clone)]
pub struct AttackCooldown {
    timer: Timer,
    ready: bool,
}

impl AttackCooldown {
    pub fn new(delay: f32) -> Self {
        Self {
            timer: Timer::from_seconds(delay.max(0.01), TimerMode::Once),
            ready: true,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn start(&mut self) {
        self.ready = false;
        self.timer.reset();
    }

    fn tick(&mut self, delta: std::time::Duration) {
        if !self.ready {
            self.timer.tick(delta);
            if self.timer.is_finished() {
                self.ready = true;
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Resources and messages
// -----------------------------------------------------------------------------

/// Last known enemy-to-collector distances, refreshed as each enemy's slice
/// comes due. Values may be up to one slice cycle stale; the nearest-enemy
/// gate tolerates that.
#[derive(Resource, Debug, Default)]
pub struct EnemyDistances {
    to_player: HashMap<Entity, f32>,
}

impl EnemyDistances {
    pub fn record(&mut self, enemy: Entity, distance: f32) {
        self.to_player.insert(enemy, distance);
    }

    pub fn forget(&mut self, enemy: Entity) {
        self.to_player.remove(&enemy);
    }

    pub fn len(&self) -> usize {
        self.to_player.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_player.is_empty()
    }

    /// The enemy closest to the collector, if any distance is on record.
    pub fn nearest(&self) -> Option<Entity> {
        self.to_player
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(e, _)| *e)
    }
}

/// Request to activate one pooled enemy.
#[derive(Message, Clone, Copy, Debug)]
pub struct SpawnEnemyRequest {
    pub ty: DiscardSet,
    pub pos: Vec2,
    pub boss: bool,
}

// -----------------------------------------------------------------------------
// Collision layer presets
// -----------------------------------------------------------------------------

/// Membership stays `Enemy`, filters are cleared: the entity stops
/// interacting without a structural change.
#[inline]
fn inactive_enemy_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Enemy, [] as [Layer; 0])
}

#[inline]
fn active_enemy_layers() -> CollisionLayers {
    CollisionLayers::new(
        Layer::Enemy,
        [Layer::World, Layer::Collector, Layer::City, Layer::Projectile],
    )
}

// -----------------------------------------------------------------------------
// Pool lifecycle
// -----------------------------------------------------------------------------

/// Pre-spawn the whole enemy population, idle and hidden. Activation later
/// only mutates component values.
fn init_enemy_pool(mut commands: Commands, mut pool: ResMut<EntityPool<PooledEnemy>>) {
    for i in 0..pool.policy().prewarm {
        let entity = commands
            .spawn((
                Name::new(format!("PooledEnemy{i}")),
                PooledEnemy,
                Enemy,
                AgentKind::Enemy,
                EnemyType::default(),
                CharacterStats::from_enemy_template(
                    &crate::common::config::EnemyTemplate::default(),
                    DiscardSet::NONE,
                ),
                Health { value: 0 },
                EnemyLifeState::Dead,
                EnemyState::default(),
                AttackCooldown::new(1.0),
                PooledState::Inactive,
                Sprite {
                    color: Color::WHITE,
                    custom_size: Some(Vec2::splat(ENEMY_RADIUS * 2.0)),
                    ..default()
                },
                Transform::from_scale(Vec3::ZERO),
                Visibility::Hidden,
                (
                    RigidBody::Kinematic,
                    Collider::circle(ENEMY_RADIUS),
                    LinearVelocity::ZERO,
                    inactive_enemy_layers(),
                ),
            ))
            .id();
        pool.insert_idle(entity);
    }
}

/// Activate pooled enemies for pending spawn requests. Pool exhaustion skips
/// the request with a warning; the wave keeps going.
#[allow(clippy::too_many_arguments)]
fn allocate_enemies(
    mut reader: MessageReader<SpawnEnemyRequest>,
    mut pool: ResMut<EntityPool<PooledEnemy>>,
    mut slices: ResMut<FrameSlices>,
    mut next_slice: Local<usize>,
    config: Res<GameConfig>,
    palette: Res<TypePalette>,
    mut commands: Commands,
    mut q: Query<
        (
            &mut Transform,
            &mut Visibility,
            &mut Sprite,
            &mut CollisionLayers,
            &mut LinearVelocity,
            &mut EnemyType,
            &mut CharacterStats,
            &mut Health,
            &mut EnemyLifeState,
            &mut EnemyState,
            &mut AttackCooldown,
            &mut PooledState,
        ),
        With<PooledEnemy>,
    >,
) {
    for request in reader.read() {
        let Some(entity) = pool.acquire(|| None) else {
            warn!("enemy pool exhausted, dropping spawn request");
            continue;
        };

        // Pooled entities are pre-spawned with the full component set.
        let (
            mut tf,
            mut vis,
            mut sprite,
            mut layers,
            mut vel,
            mut ty,
            mut stats,
            mut health,
            mut life,
            mut state,
            mut cooldown,
            mut pooled,
        ) = q.get_mut(entity).expect("pooled enemy lost its components");

        *ty = EnemyType(request.ty);
        *stats = CharacterStats::from_enemy_template(&config.enemy, request.ty);
        health.value = stats.max_health;
        *life = EnemyLifeState::Alive;
        *state = EnemyState::SeekCity;
        *cooldown = AttackCooldown::new(config.enemy.attack_delay);
        *pooled = PooledState::Active;

        tf.translation = request.pos.extend(1.0);
        tf.rotation = Quat::IDENTITY;
        tf.scale = Vec3::ZERO;
        vel.0 = Vec2::ZERO;
        sprite.color = palette.get(request.ty).color;
        *vis = Visibility::Visible;
        *layers = active_enemy_layers();

        // A boss is a scaled-up regular enemy.
        let target_scale = if request.boss { 2.0 } else { 1.0 };
        commands.entity(entity).insert(ScaleIn::new(0.25, target_scale));

        slices.0.register(entity, *next_slice);
        *next_slice = next_slice.wrapping_add(1);
    }
}

// -----------------------------------------------------------------------------
// Think phase
// -----------------------------------------------------------------------------

fn tick_attack_cooldowns(time: Res<Time>, mut q: Query<&mut AttackCooldown, With<Enemy>>) {
    for mut cooldown in &mut q {
        cooldown.tick(time.delta());
    }
}

/// Per-frame think pass over the due slice bucket.
///
/// Target priority: attack whatever is in attack range, otherwise chase the
/// collector if it is inside interaction range, otherwise head for the city.
/// Only the enemy nearest to the collector may actually land a hit, and the
/// hit itself is a forward box probe, so an enemy facing the wrong way whiffs.
#[allow(clippy::too_many_arguments)]
fn enemy_think_slice(
    mut slices: ResMut<FrameSlices>,
    refs: Res<WorldRefs>,
    tunables: Res<Tunables>,
    mut distances: ResMut<EnemyDistances>,
    mut damage: MessageWriter<DamageInstance>,
    mut q_enemies: Query<
        (
            &mut Transform,
            &mut LinearVelocity,
            &CharacterStats,
            &EnemyLifeState,
            &mut EnemyState,
            &mut AttackCooldown,
        ),
        With<PooledEnemy>,
    >,
    q_ctx: Query<(&Transform, Option<&Health>), Without<PooledEnemy>>,
) {
    let due = slices.0.start_frame();
    if due.is_empty() {
        return;
    }

    let (Some(collector), Some(city)) = (refs.collector, refs.city) else {
        return;
    };
    let (Ok((collector_tf, collector_health)), Ok((city_tf, _))) =
        (q_ctx.get(collector), q_ctx.get(city))
    else {
        return;
    };
    let collector_pos = collector_tf.translation.truncate();
    let city_pos = city_tf.translation.truncate();
    // A downed collector stops drawing aggro; everyone reverts to the city.
    let player_alive = collector_health.is_none_or(|h| !h.is_dead());

    for entity in due {
        // Deregistered earlier this same pass (or despawned) means skip.
        if !slices.0.is_registered(entity) {
            continue;
        }
        let Ok((mut tf, mut vel, stats, life, mut state, mut cooldown)) =
            q_enemies.get_mut(entity)
        else {
            continue;
        };
        if !matches!(life, EnemyLifeState::Alive) {
            continue;
        }

        let pos = tf.translation.truncate();
        let d_player = pos.distance(collector_pos);
        let d_city = pos.distance(city_pos);
        distances.record(entity, d_player);

        // State selection.
        let player_in = |range: f32| player_alive && d_player <= range;
        *state = if player_in(stats.attack_range) || d_city <= stats.attack_range {
            EnemyState::Attack
        } else if player_in(stats.interaction_range) {
            EnemyState::SeekPlayer
        } else if d_city <= stats.interaction_range {
            EnemyState::SeekCity
        } else if distances.len() < 2 || d_city <= d_player || !player_alive {
            EnemyState::SeekCity
        } else {
            EnemyState::SeekPlayer
        };

        match *state {
            EnemyState::SeekCity => {
                pursue(&mut tf, &mut vel, pos, city_pos, stats, tunables.rotate_blend);
            }
            EnemyState::SeekPlayer => {
                pursue(&mut tf, &mut vel, pos, collector_pos, stats, tunables.rotate_blend);
            }
            EnemyState::Attack => {
                vel.0 = Vec2::ZERO;
                let target_pos = if player_alive && d_player <= d_city {
                    collector_pos
                } else {
                    city_pos
                };
                agents::rotate_toward(&mut tf, target_pos - pos, tunables.rotate_blend);

                if !cooldown.is_ready() || distances.nearest() != Some(entity) {
                    continue;
                }

                let mut candidates = vec![(city, city_pos)];
                if player_alive {
                    candidates.push((collector, collector_pos));
                }
                let hit = agents::forward_probe(
                    pos,
                    agents::facing(&tf),
                    stats.attack_range,
                    tunables.probe_half_width,
                    candidates,
                );
                if let Some((victim, _)) = hit {
                    damage.write(DamageInstance {
                        target: victim,
                        amount: stats.damage,
                        ty: stats.affinity,
                    });
                    cooldown.start();
                }
            }
        }
    }
}

#[inline]
fn pursue(
    tf: &mut Transform,
    vel: &mut LinearVelocity,
    pos: Vec2,
    target: Vec2,
    stats: &CharacterStats,
    blend: f32,
) {
    let dir = target - pos;
    agents::steer(vel, dir, stats.speed);
    agents::rotate_toward(tf, dir, blend);
}

// -----------------------------------------------------------------------------
// Death lifecycle
// -----------------------------------------------------------------------------

/// Alive -> Dying once health drops below one. Severs the enemy from every
/// registry in the same tick so nothing else targets or ticks it.
fn enemy_death_trigger(
    mut slices: ResMut<FrameSlices>,
    mut distances: ResMut<EnemyDistances>,
    mut rng: ResMut<GameRng>,
    config: Res<GameConfig>,
    mut commands: Commands,
    mut drops: MessageWriter<DropCollectableRequest>,
    mut q: Query<
        (
            Entity,
            &Health,
            &EnemyType,
            &Transform,
            &mut EnemyLifeState,
            &mut LinearVelocity,
            &mut CollisionLayers,
        ),
        With<PooledEnemy>,
    >,
) {
    for (entity, health, ty, tf, mut life, mut vel, mut layers) in &mut q {
        if !matches!(*life, EnemyLifeState::Alive) || !health.is_dead() {
            continue;
        }

        *life = EnemyLifeState::Dying {
            timer: Timer::from_seconds(DEATH_SHRINK_SECS, TimerMode::Once),
            from: tf.scale.x.max(0.0001),
        };
        vel.0 = Vec2::ZERO;
        *layers = inactive_enemy_layers();
        slices.0.deregister(entity);
        distances.forget(entity);
        // An enemy killed mid-spawn must not keep growing while it shrinks.
        commands.entity(entity).remove::<ScaleIn>();

        if rng.0.gen_bool(f64::from(config.enemy.drop_chance.clamp(0.0, 1.0))) {
            drops.write(DropCollectableRequest {
                pos: tf.translation.truncate(),
                ty: ty.0,
            });
        }
    }
}

/// Shrink-and-fade the Dying state, then hand the entity to the pool commit.
fn enemy_death_progress(
    time: Res<Time<Fixed>>,
    mut q: Query<
        (&mut EnemyLifeState, &mut Sprite, &mut Transform, &mut PooledState),
        With<PooledEnemy>,
    >,
) {
    for (mut life, mut sprite, mut tf, mut pooled) in &mut q {
        let EnemyLifeState::Dying { timer, from } = &mut *life else {
            continue;
        };

        timer.tick(time.delta());

        let dur = timer.duration().as_secs_f32().max(0.0001);
        let t = (timer.elapsed_secs() / dur).clamp(0.0, 1.0);

        tf.scale = Vec3::splat(*from * (1.0 - t));

        let mut c = sprite.color.to_srgba();
        c.alpha = 1.0 - t;
        sprite.color = c.into();

        if timer.is_finished() {
            *life = EnemyLifeState::Dead;
            *pooled = PooledState::PendingReturn;
        }
    }
}

/// Commit pending returns: restore the inactive invariants and hand the
/// entity back to the free list.
fn return_enemies_to_pool(
    mut pool: ResMut<EntityPool<PooledEnemy>>,
    mut q: Query<
        (
            Entity,
            &mut PooledState,
            &mut Visibility,
            &mut LinearVelocity,
            &mut CollisionLayers,
            &mut EnemyType,
            &mut Health,
            &mut Transform,
            &mut Sprite,
        ),
        With<PooledEnemy>,
    >,
) {
    for (entity, mut pooled, mut vis, mut vel, mut layers, mut ty, mut health, mut tf, mut sprite) in
        &mut q
    {
        if *pooled != PooledState::PendingReturn {
            continue;
        }

        *vis = Visibility::Hidden;
        vel.0 = Vec2::ZERO;
        *layers = inactive_enemy_layers();
        *ty = EnemyType(DiscardSet::NONE);
        health.value = 0;
        tf.scale = Vec3::ZERO;
        let mut c = sprite.color.to_srgba();
        c.alpha = 1.0;
        sprite.color = c.into();

        pool.release(entity);
        *pooled = PooledState::Inactive;
    }
}

// -----------------------------------------------------------------------------
// Plugin wiring
// -----------------------------------------------------------------------------

pub fn plugin(app: &mut App) {
    app.insert_resource(EntityPool::<PooledEnemy>::new(ENEMY_POOL));
    app.init_resource::<EnemyDistances>();
    app.add_message::<SpawnEnemyRequest>();

    app.add_systems(Startup, init_enemy_pool);

    app.add_systems(
        Update,
        (
            allocate_enemies,
            tick_attack_cooldowns,
            enemy_think_slice.after(allocate_enemies),
        )
            .run_if(in_state(GameState::InGame)),
    );

    // Death runs after combat results are applied so it sees updated Health.
    app.add_systems(
        FixedPostUpdate,
        (
            enemy_death_trigger.after(agents::apply_damage),
            enemy_death_progress.after(enemy_death_trigger),
        ),
    );

    app.add_systems(PostUpdate, return_enemies_to_pool);
}
