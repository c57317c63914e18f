//! Camera plugin (render-only): a main camera that eases after the
//! collector.
//!
//! Disjointness between the camera transform query and the collector
//! transform query is encoded with `Without<...>` filters.

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::state::GameState;
use crate::plugins::player::Collector;

#[derive(Component)]
pub struct MainCamera {
    pub responsiveness: f32,
}

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_camera)
        .add_systems(
            PostUpdate,
            follow_collector
                .before(TransformSystems::Propagate)
                .run_if(in_state(GameState::InGame)),
        );
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("MainCamera"),
        Camera2d,
        MainCamera { responsiveness: 5.0 },
        Transform::from_xyz(0.0, 0.0, 999.0),
        DespawnOnExit(GameState::InGame),
    ));
}

fn follow_collector(
    time: Res<Time>,
    q_collector: Query<&Transform, (With<Collector>, Without<MainCamera>)>,
    mut q_cam: Query<(&mut Transform, &MainCamera), Without<Collector>>,
) {
    let Ok(tf_collector) = q_collector.single() else {
        return;
    };
    let Ok((mut tf_cam, cam)) = q_cam.single_mut() else {
        return;
    };

    let alpha = 1.0 - (-cam.responsiveness * time.delta_secs()).exp();
    tf_cam.translation.x += (tf_collector.translation.x - tf_cam.translation.x) * alpha;
    tf_cam.translation.y += (tf_collector.translation.y - tf_cam.translation.y) * alpha;
}
