use mosaic_core::ComponentHandle;

use crate::broadphase::{Broadphase, Members, Pacer};

/// Drives [`Updatable`](mosaic_core::Updatable) components, in
/// registration order.
#[derive(Default)]
pub struct UpdateScheduler {
    members: Members,
    pacer: Pacer,
}

impl UpdateScheduler {
    /// A scheduler executing at most every `frequency` seconds.
    pub fn new(frequency: f32) -> Self {
        Self {
            members: Members::default(),
            pacer: Pacer::new(frequency),
        }
    }

    /// Number of update passes run so far.
    pub fn executions(&self) -> u64 {
        self.pacer.executions()
    }
}

impl Broadphase for UpdateScheduler {
    fn name(&self) -> &str {
        "update"
    }

    fn register_component(&mut self, component: &ComponentHandle) {
        self.members.insert(component);
    }

    fn remove_component(&mut self, component: &ComponentHandle) {
        self.members.remove(component);
    }

    fn execute(&mut self, elapsed: f32) {
        let Some(elapsed) = self.pacer.tick(elapsed) else {
            return;
        };
        for handle in self.members.live() {
            let Ok(mut component) = handle.try_borrow_mut() else {
                log::trace!("update: skipping a component that is already borrowed");
                continue;
            };
            if let Some(updatable) = component.as_updatable() {
                updatable.update(elapsed);
            }
        }
    }

    fn execution_frequency(&self) -> f32 {
        self.pacer.frequency()
    }

    fn set_execution_frequency(&mut self, seconds: f32) {
        self.pacer.set_frequency(seconds);
    }

    fn executing_too_slowly(&self) -> bool {
        self.pacer.too_slow()
    }

    fn len(&self) -> usize {
        self.members.len()
    }
}
