//! Data templates.
//!
//! Named configuration records for character stats, projectiles and wave
//! parameters. They are consumed as immutable input: the core never writes
//! them back. A TOML file can override any subset of fields; everything else
//! falls back to the built-in defaults, so a missing or partial file is not
//! an error.

use bevy::prelude::*;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CharacterTemplate {
    pub max_health: i32,
    pub speed: f32,
    pub max_speed: f32,
    pub interaction_range: f32,
    pub attack_range: f32,
    pub damage: i32,
}

impl Default for CharacterTemplate {
    fn default() -> Self {
        Self {
            max_health: 10,
            speed: 220.0,
            max_speed: 300.0,
            interaction_range: 90.0,
            attack_range: 0.0,
            damage: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnemyTemplate {
    pub max_health: i32,
    pub speed: f32,
    pub max_speed: f32,
    pub interaction_range: f32,
    pub attack_range: f32,
    pub damage: i32,
    /// Seconds between attacks once one has landed.
    pub attack_delay: f32,
    /// Probability of dropping a collectable on death.
    pub drop_chance: f32,
}

impl Default for EnemyTemplate {
    fn default() -> Self {
        Self {
            max_health: 3,
            speed: 140.0,
            max_speed: 200.0,
            interaction_range: 600.0,
            attack_range: 90.0,
            damage: 1,
            attack_delay: 1.2,
            drop_chance: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectileTemplate {
    pub speed: f32,
    pub damage: i32,
    pub lifetime: f32,
}

impl Default for ProjectileTemplate {
    fn default() -> Self {
        Self { speed: 900.0, damage: 1, lifetime: 3.0 }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WaveData {
    pub total_waves: u32,
    pub enemies_per_wave: u32,
    /// Seconds between spawns within a wave.
    pub spawn_delay: f32,
    /// Seconds of countdown before the next wave begins.
    pub wave_delay: f32,
}

impl Default for WaveData {
    fn default() -> Self {
        Self {
            total_waves: 3,
            enemies_per_wave: 5,
            spawn_delay: 1.0,
            wave_delay: 20.0,
        }
    }
}

#[derive(Resource, Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub collector: CharacterTemplate,
    pub cannon: CharacterTemplate,
    pub city: CharacterTemplate,
    pub enemy: EnemyTemplate,
    pub projectile: ProjectileTemplate,
    pub wave: WaveData,
}

impl GameConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = GameConfig::default();
        assert!(config.enemy.max_health > 0);
        assert!(config.enemy.attack_range <= config.enemy.interaction_range);
        assert!((0.0..=1.0).contains(&config.enemy.drop_chance));
        assert_eq!(config.wave.total_waves, 3);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = GameConfig::from_toml_str(
            r#"
            [wave]
            total_waves = 7
            spawn_delay = 0.25

            [enemy]
            max_health = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.wave.total_waves, 7);
        assert_eq!(config.wave.spawn_delay, 0.25);
        assert_eq!(config.wave.enemies_per_wave, WaveData::default().enemies_per_wave);
        assert_eq!(config.enemy.max_health, 12);
        assert_eq!(config.projectile.damage, 1);
    }

    #[test]
    fn garbage_toml_is_an_error() {
        assert!(GameConfig::from_toml_str("wave = \"no\"").is_err());
    }
}
