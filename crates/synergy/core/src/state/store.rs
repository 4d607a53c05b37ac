//! Actor-partitioned store of [`EntityRuntimeState`].
//!
//! The outer map is written only when an actor is first seen or removed; each
//! actor's state sits behind its own lock, so dispatches for different actors
//! never contend on the same state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::history::TickSample;
use super::runtime::EntityRuntimeState;
use crate::clock::SimTime;
use crate::config::EngineConstants;
use crate::provider::ActorId;

pub type SharedState = Arc<Mutex<EntityRuntimeState>>;

#[derive(Debug, Default)]
pub struct StateStore {
    constants: EngineConstants,
    states: RwLock<HashMap<ActorId, SharedState>>,
}

impl StateStore {
    /// Empty store; new states use `constants`.
    pub fn new(constants: EngineConstants) -> Self {
        Self {
            constants,
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Tuning applied to new states.
    pub fn constants(&self) -> &EngineConstants {
        &self.constants
    }

    /// Returns the actor's state, creating it on first access.
    pub fn handle(&self, actor: ActorId) -> SharedState {
        if let Some(state) = self
            .states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&actor)
        {
            return Arc::clone(state);
        }

        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(states.entry(actor).or_insert_with(|| {
            Arc::new(Mutex::new(EntityRuntimeState::new(
                actor,
                self.constants.clone(),
            )))
        }))
    }

    /// Runs `f` with exclusive access to the actor's state.
    ///
    /// `f` must not call back into the store for the same actor.
    pub fn with_state<R>(&self, actor: ActorId, f: impl FnOnce(&mut EntityRuntimeState) -> R) -> R {
        let handle = self.handle(actor);
        let mut state = handle.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Like [`Self::with_state`] but never creates a state.
    pub fn peek<R>(&self, actor: ActorId, f: impl FnOnce(&EntityRuntimeState) -> R) -> Option<R> {
        let handle = self
            .states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&actor)
            .cloned()?;
        let state = handle.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&state))
    }

    /// Per-tick update for one actor; returns the expired timed-state ids.
    pub fn tick(&self, actor: ActorId, sample: &TickSample, now: SimTime) -> Vec<String> {
        self.with_state(actor, |state| state.tick(sample, now))
    }

    /// Evicts the actor's state (disconnect/unload).
    pub fn remove(&self, actor: ActorId) -> bool {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&actor)
            .is_some()
    }

    /// Whether `actor` has state.
    pub fn contains(&self, actor: ActorId) -> bool {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&actor)
    }

    pub fn len(&self) -> usize {
        self.states.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every actor's state.
    pub fn clear(&self) {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
