//! Generic object pooling over pre-spawned entities.
//!
//! The pool owns a free list plus an active set; consumers only borrow
//! entities while active. No structural changes happen on the acquire path:
//! pooled entities keep their full component set for life, and activation /
//! deactivation just mutate component values (visibility, collision layers,
//! velocity) in the per-kind allocator and commit systems.
//!
//! Items signal their own release through the shared [`PooledState`]
//! component: anything may flip an active item to `PendingReturn`, and the
//! kind's commit system restores the inactive invariants and hands the
//! entity back to the pool. The pool never observes item internals directly.
//!
//! Capacity is policy-driven: acquiring past `max_size` either soft-fails
//! with a warning (`allow_exceed_max`) or yields `None`. Exhaustion never
//! panics; callers skip their spawn for the tick.

use std::marker::PhantomData;

use bevy::platform::collections::HashSet;
use bevy::prelude::*;

#[derive(Clone, Copy, Debug)]
pub struct PoolPolicy {
    /// Instances created up front, idle.
    pub prewarm: usize,
    /// Soft or hard cap on total instances, per `allow_exceed_max`.
    pub max_size: usize,
    pub allow_exceed_max: bool,
}

/// Lifecycle state of a pooled entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PooledState {
    #[default]
    Inactive,
    Active,
    /// Deactivation requested; the kind's commit system finishes the return.
    PendingReturn,
}

#[derive(Resource, Debug)]
pub struct EntityPool<M: Component> {
    free: Vec<Entity>,
    active: HashSet<Entity>,
    created: usize,
    policy: PoolPolicy,
    _marker: PhantomData<M>,
}

impl<M: Component> EntityPool<M> {
    pub fn new(policy: PoolPolicy) -> Self {
        Self {
            free: Vec::with_capacity(policy.prewarm),
            active: HashSet::default(),
            created: 0,
            policy,
            _marker: PhantomData,
        }
    }

    pub fn policy(&self) -> PoolPolicy {
        self.policy
    }

    /// Add a freshly created idle instance (pre-warm path).
    pub fn insert_idle(&mut self, entity: Entity) {
        self.created += 1;
        self.free.push(entity);
    }

    /// Take an instance, preferring idle ones. `create` is invoked only when
    /// the free list is empty and policy still permits growth; it may itself
    /// decline by returning `None`. Exhaustion yields `None`, never a panic.
    pub fn acquire(&mut self, create: impl FnOnce() -> Option<Entity>) -> Option<Entity> {
        if let Some(entity) = self.free.pop() {
            self.active.insert(entity);
            return Some(entity);
        }

        if self.created >= self.policy.max_size {
            if !self.policy.allow_exceed_max {
                return None;
            }
            warn!(
                "pool over capacity: {} instances exist, max_size is {}",
                self.created, self.policy.max_size
            );
        }

        let entity = create()?;
        self.created += 1;
        self.active.insert(entity);
        Some(entity)
    }

    /// Return an instance to the idle set. Idempotent: releasing an entity
    /// that is not tracked as active is a no-op.
    pub fn release(&mut self, entity: Entity) -> bool {
        if self.active.remove(&entity) {
            self.free.push(entity);
            return true;
        }
        false
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn idle_count(&self) -> usize {
        self.free.len()
    }

    pub fn total_created(&self) -> usize {
        self.created
    }

    /// Tear down: forget every instance and hand the IDs to the caller for
    /// despawning.
    pub fn drain(&mut self) -> Vec<Entity> {
        let mut all: Vec<Entity> = self.free.drain(..).collect();
        all.extend(self.active.drain());
        self.created = 0;
        all
    }
}
