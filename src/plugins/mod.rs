//! Feature plugins.

use bevy::prelude::*;

use crate::plugins::ui::debug_hud;

pub mod agents;
pub mod collectables;
pub mod core;
pub mod enemies;
pub mod physics;
pub mod player;
pub mod pooling;
pub mod projectiles;
pub mod scheduler;
pub mod ui;
pub mod waves;
pub mod world;

// Render-only
pub mod camera;

/// Register gameplay plugins that work in headless tests.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    scheduler::plugin(app);
    physics::plugin(app);
    world::plugin(app);
    agents::plugin(app);
    player::plugin(app);
    enemies::plugin(app);
    projectiles::plugin(app);
    collectables::plugin(app);
    waves::plugin(app);
    debug_hud::plugin(app);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    camera::plugin(app);
}

/// Register all plugins (full app).
pub fn register_all(app: &mut App) {
    register_gameplay(app);
    register_render(app);
}
