//! UI plugins. Only the debug HUD exists today; it is the sole consumer of
//! the gameplay change notifications.

pub mod debug_hud;
