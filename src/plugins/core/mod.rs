//! Core plugin: shared resources and global settings.
//!
//! Configuration is layered: built-in defaults, overridden by whatever
//! subset of fields `assets/trashfall.toml` provides. A missing or broken
//! file logs and falls back; it never aborts the game.

use std::path::Path;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::common::config::GameConfig;
use crate::common::discard::TypePalette;
use crate::common::tunables::Tunables;

const CONFIG_PATH: &str = "assets/trashfall.toml";

/// The single gameplay RNG. Seed it explicitly in tests for determinism.
#[derive(Resource, Debug)]
pub struct GameRng(pub StdRng);

impl Default for GameRng {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}

pub(crate) fn load_config(path: &Path) -> GameConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            info!("no config at {}, using defaults ({err})", path.display());
            return GameConfig::default();
        }
    };
    match GameConfig::from_toml_str(&text) {
        Ok(config) => config,
        Err(err) => {
            warn!("invalid config at {}, using defaults: {err}", path.display());
            GameConfig::default()
        }
    }
}

pub fn plugin(app: &mut App) {
    app.insert_resource(Tunables::default());
    app.insert_resource(TypePalette::default());
    app.init_resource::<GameRng>();
    app.insert_resource(load_config(Path::new(CONFIG_PATH)));
    app.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)));
}
