//! Debug HUD: drains the gameplay notification messages into structured
//! logs. A real HUD would subscribe to the same messages.

use bevy::prelude::*;

use crate::plugins::agents::HealthChanged;
use crate::plugins::player::AmmoChanged;
use crate::plugins::waves::{CountdownChanged, WaveChanged};

fn log_health(mut reader: MessageReader<HealthChanged>) {
    for change in reader.read() {
        debug!(
            "{:?} {:?} health {}/{}",
            change.kind, change.entity, change.value, change.max
        );
    }
}

fn log_ammo(mut reader: MessageReader<AmmoChanged>) {
    for change in reader.read() {
        debug!("ammo {:?}: {} rounds", change.ty, change.total);
    }
}

fn log_waves(
    mut waves: MessageReader<WaveChanged>,
    mut countdowns: MessageReader<CountdownChanged>,
) {
    for change in waves.read() {
        debug!("wave {}", change.wave);
    }
    for change in countdowns.read() {
        debug!("next wave in {}s", change.seconds_left);
    }
}

pub fn plugin(app: &mut App) {
    app.add_systems(PostUpdate, (log_health, log_ammo, log_waves));
}
