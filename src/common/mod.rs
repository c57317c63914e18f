//! Common, shared types.

pub mod config;
pub mod discard;
pub mod layers;
pub mod state;
pub mod tunables;

#[cfg(test)]
pub mod test_utils;
