//! World plugin: arena walls, the city, spawn-point anchors and the shared
//! context handles.
//!
//! `WorldRefs` replaces scene-wide singleton lookups: it is filled once by
//! `ensure_world_refs` (retrying until the entities exist, startup ordering
//! is not guaranteed) and every AI/think system reads targets through it.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use rand::Rng;

use crate::common::config::GameConfig;
use crate::common::discard::DiscardSet;
use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::plugins::agents::{AgentKind, CharacterStats, Health};
use crate::plugins::player::{Cannon, Collector};

const HALF_W: f32 = 1024.0;
const HALF_H: f32 = 576.0;

#[derive(Component)]
pub struct City;

/// Cached entity handles for the fixed cast of the scene.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct WorldRefs {
    pub collector: Option<Entity>,
    pub cannon: Option<Entity>,
    pub city: Option<Entity>,
}

/// Externally provided world positions enemies spawn at; the core only
/// samples them uniformly.
#[derive(Resource, Debug, Clone)]
pub struct SpawnAnchors(pub Vec<Vec2>);

impl SpawnAnchors {
    pub fn sample(&self, rng: &mut impl Rng) -> Vec2 {
        self.0[rng.gen_range(0..self.0.len())]
    }
}

impl Default for SpawnAnchors {
    fn default() -> Self {
        Self(vec![
            Vec2::new(-HALF_W + 60.0, HALF_H - 60.0),
            Vec2::new(HALF_W - 60.0, HALF_H - 60.0),
            Vec2::new(-HALF_W + 60.0, -HALF_H + 60.0),
            Vec2::new(HALF_W - 60.0, -HALF_H + 60.0),
        ])
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<WorldRefs>();
    app.init_resource::<SpawnAnchors>();
    app.add_systems(OnEnter(GameState::InGame), (spawn_arena, spawn_city));
    app.add_systems(Update, ensure_world_refs.run_if(in_state(GameState::InGame)));
}

fn spawn_arena(mut commands: Commands) {
    let wall_color = Color::srgb(0.25, 0.27, 0.33);
    let thickness = 30.0;

    let wall_layers = CollisionLayers::new(
        Layer::World,
        [Layer::Collector, Layer::Enemy, Layer::Projectile],
    );

    let mut spawn_wall = |name: String, pos: Vec3, size: Vec2| {
        commands.spawn((
            Name::new(name),
            Sprite {
                color: wall_color,
                custom_size: Some(size),
                ..default()
            },
            Transform::from_translation(pos),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            wall_layers,
            DespawnOnExit(GameState::InGame),
        ));
    };

    spawn_wall(
        "WallTop".into(),
        Vec3::new(0.0, HALF_H + thickness * 0.5, 0.0),
        Vec2::new(HALF_W * 2.0 + thickness * 2.0, thickness),
    );
    spawn_wall(
        "WallBottom".into(),
        Vec3::new(0.0, -HALF_H - thickness * 0.5, 0.0),
        Vec2::new(HALF_W * 2.0 + thickness * 2.0, thickness),
    );
    spawn_wall(
        "WallLeft".into(),
        Vec3::new(-HALF_W - thickness * 0.5, 0.0, 0.0),
        Vec2::new(thickness, HALF_H * 2.0),
    );
    spawn_wall(
        "WallRight".into(),
        Vec3::new(HALF_W + thickness * 0.5, 0.0, 0.0),
        Vec2::new(thickness, HALF_H * 2.0),
    );
}

/// The city: a stationary agent with untyped affinity, so every typed
/// attack hurts it.
fn spawn_city(mut commands: Commands, config: Res<GameConfig>) {
    commands.spawn((
        Name::new("City"),
        City,
        AgentKind::City,
        CharacterStats::from_template(&config.city, DiscardSet::NONE),
        Health { value: config.city.max_health },
        Sprite {
            color: Color::srgb(0.55, 0.5, 0.42),
            custom_size: Some(Vec2::new(120.0, 120.0)),
            ..default()
        },
        Transform::from_xyz(0.0, 220.0, 1.0),
        RigidBody::Static,
        Collider::rectangle(120.0, 120.0),
        CollisionLayers::new(Layer::City, [Layer::Enemy]),
        DespawnOnExit(GameState::InGame),
    ));
}

/// Fill `WorldRefs` once; keep trying until every handle resolves.
fn ensure_world_refs(
    mut refs: ResMut<WorldRefs>,
    q_collector: Query<Entity, With<Collector>>,
    q_cannon: Query<Entity, With<Cannon>>,
    q_city: Query<Entity, With<City>>,
) {
    if refs.collector.is_some() && refs.cannon.is_some() && refs.city.is_some() {
        return;
    }

    if refs.collector.is_none() {
        refs.collector = q_collector.single().ok();
    }
    if refs.cannon.is_none() {
        refs.cannon = q_cannon.single().ok();
    }
    if refs.city.is_none() {
        refs.city = q_city.single().ok();
    }
}

#[cfg(test)]
mod tests;
