//! Buffered spawn requests: producers enqueue intent, the allocator applies
//! it. Nothing but the allocator borrows the pool.

use bevy::prelude::*;

use crate::common::discard::DiscardSet;

#[derive(Message, Clone, Copy, Debug)]
pub struct SpawnProjectileRequest {
    pub pos: Vec2,
    /// Flight direction; normalized by the allocator.
    pub dir: Vec2,
    pub ty: DiscardSet,
}
