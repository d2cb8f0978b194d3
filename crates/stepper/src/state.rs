use crate::actions::{self, Action};
use crate::effects::{self, Effect};
use crate::store::Store;
use std::time::Instant;

pub struct State {
    pub store: Store,
    action_queue: Vec<Action>,
    effect_queue: Vec<Effect>,
}

impl State {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            action_queue: Vec::new(),
            effect_queue: Vec::new(),
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        self.action_queue.push(action);
    }

    pub fn flush_actions(&mut self) {
        let actions = std::mem::take(&mut self.action_queue);
        for action in actions {
            let mut effects = actions::update(&mut self.store, action);
            self.effect_queue.append(&mut effects);
        }
        self.store.ensure_steps_fresh();
    }

    pub fn flush_effects(&mut self) {
        let effects = std::mem::take(&mut self.effect_queue);
        for effect in effects {
            effects::run(&mut self.store, effect);
        }
        self.store.ensure_steps_fresh();
    }

    /// Drain both queues until nothing is pending.
    pub fn flush(&mut self) {
        while !self.action_queue.is_empty() || !self.effect_queue.is_empty() {
            self.flush_actions();
            self.flush_effects();
        }
    }

    /// Advance timed playback. Returns whether a step was applied.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.store.runner.tick(now)
    }
}
