use std::cell::RefCell;
use std::rc::{Rc, Weak};

use mosaic_core::{Component, ComponentHandle};

/// A host subsystem that drives one capability of many components.
///
/// Broadphases are fed through the factory's created callbacks and hold
/// their components weakly, so dropping an entity is enough to stop
/// driving its components.
pub trait Broadphase {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Start driving `component`.
    fn register_component(&mut self, component: &ComponentHandle);

    /// Stop driving `component`. Unknown components are ignored.
    fn remove_component(&mut self, component: &ComponentHandle);

    /// Called once per host tick with the seconds since the previous tick.
    fn execute(&mut self, elapsed: f32);

    /// Minimum seconds between two executions. 0 = every tick.
    fn execution_frequency(&self) -> f32;

    /// Change the execution frequency.
    fn set_execution_frequency(&mut self, seconds: f32);

    /// Whether the last execution came more than twice the frequency
    /// after the one before it.
    fn executing_too_slowly(&self) -> bool;

    /// Number of live registered components.
    fn len(&self) -> usize;

    /// Whether no live components are registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rate limiting shared by the broadphases.
#[derive(Debug, Clone, Default)]
pub(crate) struct Pacer {
    frequency: f32,
    timer: f32,
    too_slow: bool,
    executions: u64,
}

impl Pacer {
    pub(crate) fn new(frequency: f32) -> Self {
        Self {
            frequency,
            ..Self::default()
        }
    }

    /// Accumulate `elapsed`. When an execution is due, returns the time
    /// since the previous one.
    pub(crate) fn tick(&mut self, elapsed: f32) -> Option<f32> {
        self.timer += elapsed;
        if self.timer < self.frequency {
            return None;
        }
        self.too_slow = self.frequency > 0.0 && self.timer > self.frequency * 2.0;
        self.executions += 1;
        Some(std::mem::take(&mut self.timer))
    }

    pub(crate) fn frequency(&self) -> f32 {
        self.frequency
    }

    pub(crate) fn set_frequency(&mut self, seconds: f32) {
        self.frequency = seconds;
    }

    pub(crate) fn too_slow(&self) -> bool {
        self.too_slow
    }

    pub(crate) fn executions(&self) -> u64 {
        self.executions
    }
}

/// Weak component list with identity-based removal.
#[derive(Default)]
pub(crate) struct Members {
    items: Vec<Weak<RefCell<dyn Component>>>,
}

impl Members {
    /// Add `component` unless it is already present.
    pub(crate) fn insert(&mut self, component: &ComponentHandle) -> bool {
        let weak = Rc::downgrade(component);
        if self.items.iter().any(|w| Weak::ptr_eq(w, &weak)) {
            return false;
        }
        self.items.push(weak);
        true
    }

    pub(crate) fn remove(&mut self, component: &ComponentHandle) {
        let weak = Rc::downgrade(component);
        self.items.retain(|w| !Weak::ptr_eq(w, &weak));
    }

    /// Strong handles to the live members, in registration order. Dead
    /// entries are pruned.
    pub(crate) fn live(&mut self) -> Vec<ComponentHandle> {
        self.items.retain(|w| w.strong_count() > 0);
        self.items.iter().filter_map(Weak::upgrade).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.iter().filter(|w| w.strong_count() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacer_zero_frequency_runs_every_tick() {
        let mut pacer = Pacer::new(0.0);
        assert_eq!(pacer.tick(0.1), Some(0.1));
        assert_eq!(pacer.tick(0.0), Some(0.0));
        assert!(!pacer.too_slow());
        assert_eq!(pacer.executions(), 2);
    }

    #[test]
    fn pacer_accumulates_until_due() {
        let mut pacer = Pacer::new(0.5);
        assert_eq!(pacer.tick(0.25), None);
        assert_eq!(pacer.tick(0.25), Some(0.5));
        assert!(!pacer.too_slow());
        assert_eq!(pacer.tick(0.25), None);
    }

    #[test]
    fn pacer_flags_slow_execution() {
        let mut pacer = Pacer::new(0.5);
        assert_eq!(pacer.tick(1.5), Some(1.5));
        assert!(pacer.too_slow());
        assert_eq!(pacer.tick(0.5), Some(0.5));
        assert!(!pacer.too_slow());
    }
}
