//! Wave director: spawn cadence, inter-wave countdown, boss finale, win
//! check.
//!
//! The director is a pure timer state machine ([`WaveDirector`]): feed it
//! elapsed seconds, get back [`WaveCommand`]s. No coroutines, no hidden
//! clocks; the ECS wrapper translates commands into spawn requests and HUD
//! messages. A wave first emits its spawns on the spawn cadence, then runs
//! the countdown; the countdown after the final wave ends in a single boss
//! spawn instead of a new wave.

use bevy::prelude::*;

use crate::common::config::{GameConfig, WaveData};
use crate::common::discard::DiscardSet;
use crate::common::state::GameState;
use crate::plugins::core::GameRng;
use crate::plugins::enemies::{PooledEnemy, SpawnEnemyRequest};
use crate::plugins::pooling::EntityPool;
use crate::plugins::scheduler::FixedSlices;
use crate::plugins::world::SpawnAnchors;

// -----------------------------------------------------------------------------
// Pure state machine
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum WavePhase {
    Idle,
    Running {
        spawns_left: u32,
        spawn_timer: f32,
        countdown: f32,
        last_announced: u32,
    },
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveCommand {
    Spawn,
    SpawnBoss,
    WaveStarted(u32),
    Countdown(u32),
}

/// Drives wave progression from elapsed time alone.
#[derive(Resource, Debug, Clone)]
pub struct WaveDirector {
    data: WaveData,
    wave_index: u32,
    phase: WavePhase,
}

impl Default for WaveDirector {
    fn default() -> Self {
        Self {
            data: WaveData::default(),
            wave_index: 0,
            phase: WavePhase::Idle,
        }
    }
}

impl WaveDirector {
    pub fn new(data: WaveData) -> Self {
        Self {
            data,
            wave_index: 0,
            phase: WavePhase::Idle,
        }
    }

    pub fn wave_index(&self) -> u32 {
        self.wave_index
    }

    pub fn is_finished(&self) -> bool {
        self.phase == WavePhase::Finished
    }

    fn running_phase(&self) -> WavePhase {
        WavePhase::Running {
            spawns_left: self.data.enemies_per_wave,
            spawn_timer: 0.0,
            countdown: self.data.wave_delay.max(0.0),
            last_announced: self.data.wave_delay.max(0.0).ceil() as u32,
        }
    }

    /// (Re)start from wave zero. Any in-flight run is cancelled.
    pub fn start(&mut self) -> Vec<WaveCommand> {
        self.wave_index = 0;
        self.phase = self.running_phase();
        vec![WaveCommand::WaveStarted(0)]
    }

    /// Advance by `dt` seconds. Spawns drain first on the spawn cadence;
    /// only then does the countdown run. Oversized `dt` catches up without
    /// losing spawns.
    pub fn tick(&mut self, dt: f32) -> Vec<WaveCommand> {
        let mut out = Vec::new();

        let WavePhase::Running {
            spawns_left,
            spawn_timer,
            countdown,
            last_announced,
        } = &mut self.phase
        else {
            return out;
        };

        if *spawns_left > 0 {
            *spawn_timer -= dt;
            while *spawns_left > 0 && *spawn_timer <= 0.0 {
                out.push(WaveCommand::Spawn);
                *spawns_left -= 1;
                *spawn_timer += self.data.spawn_delay.max(f32::EPSILON);
            }
            return out;
        }

        *countdown -= dt;
        let secs = countdown.max(0.0).ceil() as u32;
        if secs != *last_announced {
            *last_announced = secs;
            out.push(WaveCommand::Countdown(secs));
        }
        if *countdown > 0.0 {
            return out;
        }

        self.wave_index += 1;
        if self.wave_index < self.data.total_waves {
            self.phase = self.running_phase();
            out.push(WaveCommand::WaveStarted(self.wave_index));
        } else {
            self.phase = WavePhase::Finished;
            out.push(WaveCommand::SpawnBoss);
        }
        out
    }
}

// -----------------------------------------------------------------------------
// ECS wrapper
// -----------------------------------------------------------------------------

/// Wave progress notification for external HUDs.
#[derive(Message, Clone, Copy, Debug)]
pub struct WaveChanged {
    pub wave: u32,
}

/// Whole-second countdown notification.
#[derive(Message, Clone, Copy, Debug)]
pub struct CountdownChanged {
    pub seconds_left: u32,
}

/// Marker for the registered game-flow agent; its fixed-step turn runs the
/// win check.
#[derive(Component, Debug, Clone, Copy)]
pub struct GameFlow;

fn start_waves(
    config: Res<GameConfig>,
    mut director: ResMut<WaveDirector>,
    mut slices: ResMut<FixedSlices>,
    mut commands: Commands,
    mut waves: MessageWriter<WaveChanged>,
) {
    *director = WaveDirector::new(config.wave);
    for command in director.start() {
        if let WaveCommand::WaveStarted(wave) = command {
            waves.write(WaveChanged { wave });
        }
    }

    let flow = commands.spawn((Name::new("GameFlow"), GameFlow)).id();
    slices.0.register(flow, 0);
}

#[allow(clippy::too_many_arguments)]
fn advance_wave_director(
    time: Res<Time>,
    mut director: ResMut<WaveDirector>,
    anchors: Res<SpawnAnchors>,
    mut rng: ResMut<GameRng>,
    mut spawns: MessageWriter<SpawnEnemyRequest>,
    mut waves: MessageWriter<WaveChanged>,
    mut countdowns: MessageWriter<CountdownChanged>,
) {
    for command in director.tick(time.delta_secs()) {
        match command {
            WaveCommand::Spawn => {
                spawns.write(SpawnEnemyRequest {
                    ty: DiscardSet::random_base(&mut rng.0),
                    pos: anchors.sample(&mut rng.0),
                    boss: false,
                });
            }
            WaveCommand::SpawnBoss => {
                spawns.write(SpawnEnemyRequest {
                    ty: DiscardSet::random_base(&mut rng.0),
                    pos: anchors.sample(&mut rng.0),
                    boss: true,
                });
            }
            WaveCommand::WaveStarted(wave) => {
                info!("wave {wave} started");
                waves.write(WaveChanged { wave });
            }
            WaveCommand::Countdown(seconds_left) => {
                countdowns.write(CountdownChanged { seconds_left });
            }
        }
    }
}

/// Fixed-step turn of the game-flow agent: the run is won once the director
/// has played out and the last pooled enemy is back on the free list.
fn check_win(
    mut slices: ResMut<FixedSlices>,
    director: Res<WaveDirector>,
    pool: Res<EntityPool<PooledEnemy>>,
    q_flow: Query<(), With<GameFlow>>,
    mut next: ResMut<NextState<GameState>>,
) {
    for entity in slices.0.start_frame() {
        if !slices.0.is_registered(entity) || q_flow.get(entity).is_err() {
            continue;
        }
        if director.is_finished() && pool.active_count() == 0 {
            next.set(GameState::Won);
        }
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<WaveDirector>();
    app.add_message::<WaveChanged>();
    app.add_message::<CountdownChanged>();

    app.add_systems(OnEnter(GameState::InGame), start_waves);
    app.add_systems(
        Update,
        advance_wave_director.run_if(in_state(GameState::InGame)),
    );
    app.add_systems(FixedUpdate, check_win.run_if(in_state(GameState::InGame)));
}

#[cfg(test)]
mod tests;
