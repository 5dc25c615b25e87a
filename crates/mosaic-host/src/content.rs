use mosaic_core::{ComponentHandle, ContentSource};

use crate::broadphase::{Broadphase, Members, Pacer};

/// Hands a [`ContentSource`] to [`ContentConsumer`](mosaic_core::ContentConsumer)
/// components.
///
/// Components registered before [`load_all`](Self::load_all) load then;
/// components registered afterwards load immediately.
pub struct ContentLoader {
    members: Members,
    pacer: Pacer,
    source: Box<dyn ContentSource>,
    loaded: bool,
    loads: usize,
}

impl ContentLoader {
    /// A loader reading from `source`.
    pub fn new(source: Box<dyn ContentSource>) -> Self {
        Self {
            members: Members::default(),
            pacer: Pacer::default(),
            source,
            loaded: false,
            loads: 0,
        }
    }

    /// Load every registered component. Later registrations load on arrival.
    pub fn load_all(&mut self) {
        let members = self.members.live();
        log::info!("loading content for {} components", members.len());
        for handle in &members {
            self.load_one(handle);
        }
        self.loaded = true;
    }

    /// Whether the initial load has run.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of component loads performed.
    pub fn loads(&self) -> usize {
        self.loads
    }

    fn load_one(&mut self, handle: &ComponentHandle) {
        let Ok(mut component) = handle.try_borrow_mut() else {
            log::warn!("content: component is busy, not loading it");
            return;
        };
        if let Some(consumer) = component.as_content() {
            consumer.load(self.source.as_mut());
            self.loads += 1;
        }
    }
}

impl Broadphase for ContentLoader {
    fn name(&self) -> &str {
        "content"
    }

    fn register_component(&mut self, component: &ComponentHandle) {
        if self.members.insert(component) && self.loaded {
            self.load_one(component);
        }
    }

    fn remove_component(&mut self, component: &ComponentHandle) {
        self.members.remove(component);
    }

    /// Loading is event driven; this only keeps the pacing bookkeeping.
    fn execute(&mut self, elapsed: f32) {
        self.pacer.tick(elapsed);
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
