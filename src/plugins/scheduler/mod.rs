//! Batched update scheduler.
//!
//! A central registry of agents whose "think" work is spread across frames:
//! agents live in one of several slice buckets, and each frame only one
//! bucket is due. With N agents over K buckets each agent updates at ~1/K of
//! the frame rate, staggered, which bounds worst-case per-frame AI cost when
//! the population is large.
//!
//! Two registries exist: `FrameSlices` for the per-frame think phase, and
//! `FixedSlices` for the physics-step phase (only the game-flow check uses
//! it today). Both are purely single-threaded and cooperative; "suspended"
//! just means "this agent's bucket isn't due this frame".
//!
//! Register/deregister are safe mid-iteration:
//! - `start_frame` hands out a *copy* of the due bucket, so the underlying
//!   storage may change while a system walks it.
//! - adds are queued and applied at the next `start_frame`.
//! - removals go to a tombstone set; callers consult `is_registered` so an
//!   agent deregistered earlier in the same pass is skipped without
//!   affecting any other agent's turn.

use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::common::tunables::Tunables;

#[derive(Debug, Default)]
pub struct SliceSchedule {
    buckets: Vec<Vec<Entity>>,
    members: HashSet<Entity>,
    removed: HashSet<Entity>,
    pending_add: Vec<(Entity, usize)>,
    cursor: usize,
}

impl SliceSchedule {
    pub fn new(slice_count: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); slice_count.max(1)],
            members: HashSet::default(),
            removed: HashSet::default(),
            pending_add: Vec::new(),
            cursor: 0,
        }
    }

    pub fn slice_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of agents currently registered (tombstoned agents excluded).
    pub fn registered_count(&self) -> usize {
        self.members.len() - self.removed.len()
    }

    /// Queue an agent for the bucket hinted at (wrapped into range).
    /// Takes effect at the next `start_frame`. Re-registering a live agent
    /// is a no-op; registering one deregistered this frame revives it.
    pub fn register(&mut self, agent: Entity, slice_hint: usize) {
        self.pending_add.push((agent, slice_hint));
    }

    /// Queue an agent for removal. Safe to call while a tick pass iterates
    /// the current frame's bucket copy.
    pub fn deregister(&mut self, agent: Entity) {
        if self.members.contains(&agent) {
            self.removed.insert(agent);
        }
        self.pending_add.retain(|(e, _)| *e != agent);
    }

    /// Whether the agent should still be ticked this pass.
    pub fn is_registered(&self, agent: Entity) -> bool {
        self.members.contains(&agent) && !self.removed.contains(&agent)
    }

    /// Apply deferred changes, advance the cursor, and return a copy of the
    /// bucket that is due this frame. Call exactly once per tick phase.
    pub fn start_frame(&mut self) -> Vec<Entity> {
        if !self.removed.is_empty() {
            for bucket in &mut self.buckets {
                bucket.retain(|e| !self.removed.contains(e));
            }
            for e in self.removed.drain() {
                self.members.remove(&e);
            }
        }

        for (agent, hint) in std::mem::take(&mut self.pending_add) {
            if self.members.insert(agent) {
                let slot = hint % self.buckets.len();
                self.buckets[slot].push(agent);
            }
        }

        let due = self.cursor;
        self.cursor = (self.cursor + 1) % self.buckets.len();
        self.buckets[due].clone()
    }
}

/// Per-frame think registry.
#[derive(Resource, Debug)]
pub struct FrameSlices(pub SliceSchedule);

/// Physics-step registry.
#[derive(Resource, Debug)]
pub struct FixedSlices(pub SliceSchedule);

pub fn plugin(app: &mut App) {
    let slices = app.world().resource::<Tunables>().enemy_slice_count;
    app.insert_resource(FrameSlices(SliceSchedule::new(slices)));
    app.insert_resource(FixedSlices(SliceSchedule::new(1)));
}
