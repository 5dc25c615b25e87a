use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use mosaic_core::{
    Capability, ComponentFactory, ComponentHandle, ContentSource, Entity, EntityId, RenderTarget,
    Registry, Vector2,
};
use serde::Serialize;

use crate::broadphase::Broadphase;
use crate::components::{ACTIVE_CAMERA, SCREEN_DIMENSIONS, ZOOM_BOUNDS};
use crate::config::HostConfig;
use crate::content::ContentLoader;
use crate::error::{HostError, HostResult};
use crate::render::RenderPass;
use crate::update::UpdateScheduler;

/// Counters describing a host run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HostStats {
    /// Ticks run.
    pub ticks: u64,
    /// Simulated seconds.
    pub elapsed: f32,
    /// Update broadphase executions.
    pub updates: u64,
    /// Frames rendered.
    pub frames: u64,
    /// Sprites drawn across all frames.
    pub sprites: u64,
    /// Component content loads.
    pub loads: usize,
}

/// The tick driver.
///
/// Owns the three broadphases and subscribes them to the registry's
/// factory, so every component created after [`Host::new`] is driven
/// according to its capabilities. Content is loaded on the first tick.
pub struct Host {
    config: HostConfig,
    updates: Rc<RefCell<UpdateScheduler>>,
    content: Rc<RefCell<ContentLoader>>,
    render: Rc<RefCell<RenderPass>>,
    ticks: u64,
    elapsed: f32,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("ticks", &self.ticks)
            .field("updates", &self.updates.borrow().len())
            .field("content", &self.content.borrow().len())
            .field("render", &self.render.borrow().len())
            .finish()
    }
}

impl Host {
    /// Publish the configuration as globals and subscribe the broadphases
    /// to `registry`'s factory.
    pub fn new(
        registry: &mut Registry,
        config: HostConfig,
        target: Box<dyn RenderTarget>,
        content: Box<dyn ContentSource>,
    ) -> HostResult<Self> {
        config.validate()?;

        let globals = registry.globals().clone();
        globals
            .add(SCREEN_DIMENSIONS, Vector2::ZERO)?
            .set(config.screen_dimensions);
        globals.add(ZOOM_BOUNDS, Vector2::ZERO)?.set(config.zoom_bounds);
        let active_camera = globals.add(ACTIVE_CAMERA, None::<EntityId>)?;

        let updates = Rc::new(RefCell::new(UpdateScheduler::new(config.update_frequency)));
        let content = Rc::new(RefCell::new(ContentLoader::new(content)));
        let mut render = RenderPass::new(target, active_camera);
        render.set_execution_frequency(config.render_frequency);
        let render = Rc::new(RefCell::new(render));

        let factory = registry.factory_mut();
        subscribe(factory, Capability::Update, &updates);
        subscribe(factory, Capability::Content, &content);
        subscribe(factory, Capability::Render, &render);
        let cameras = Rc::downgrade(&render);
        factory.register_created_callback(Capability::Transform, move |handle: &ComponentHandle| {
            if let Some(render) = cameras.upgrade() {
                render.borrow_mut().register_transformer(handle);
            }
        });

        log::info!(
            "host ready: {}x{} screen, update every {}s, render every {}s",
            config.screen_dimensions.x,
            config.screen_dimensions.y,
            config.update_frequency,
            config.render_frequency
        );
        Ok(Self {
            config,
            updates,
            content,
            render,
            ticks: 0,
            elapsed: 0.0,
        })
    }

    /// The configuration the host was built with.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Load content for every component registered so far. Runs on the
    /// first tick if not called before.
    pub fn load(&mut self) {
        self.content.borrow_mut().load_all();
    }

    /// Advance by `elapsed` seconds: update, content, then render.
    pub fn tick(&mut self, elapsed: f32) -> HostResult<()> {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(HostError::InvalidTimeStep(elapsed));
        }
        if !self.content.borrow().is_loaded() {
            self.load();
        }
        for broadphase in self.broadphases() {
            let mut broadphase = broadphase.borrow_mut();
            broadphase.execute(elapsed);
            if broadphase.executing_too_slowly() {
                log::debug!("{} broadphase is executing too slowly", broadphase.name());
            }
        }
        self.ticks += 1;
        self.elapsed += elapsed;
        Ok(())
    }

    /// Run `ticks` ticks of `dt` seconds each.
    pub fn run(&mut self, ticks: u64, dt: f32) -> HostResult<HostStats> {
        log::info!("running {ticks} ticks of {dt}s");
        for _ in 0..ticks {
            self.tick(dt)?;
        }
        Ok(self.stats())
    }

    /// Counters so far.
    pub fn stats(&self) -> HostStats {
        let render = self.render.borrow();
        HostStats {
            ticks: self.ticks,
            elapsed: self.elapsed,
            updates: self.updates.borrow().executions(),
            frames: render.frames(),
            sprites: render.sprites(),
            loads: self.content.borrow().loads(),
        }
    }

    /// Stop driving every component of `entity`.
    pub fn remove_entity(&self, entity: &Entity) {
        for (_, handle) in entity.components() {
            for broadphase in self.broadphases() {
                broadphase.borrow_mut().remove_component(handle);
            }
        }
    }

    /// The update broadphase.
    pub fn update_scheduler(&self) -> Ref<'_, UpdateScheduler> {
        self.updates.borrow()
    }

    /// The content broadphase.
    pub fn content_loader(&self) -> Ref<'_, ContentLoader> {
        self.content.borrow()
    }

    /// The render broadphase.
    pub fn render_pass(&self) -> Ref<'_, RenderPass> {
        self.render.borrow()
    }

    /// Mutable access to the render broadphase, to declare passes.
    pub fn render_pass_mut(&self) -> RefMut<'_, RenderPass> {
        self.render.borrow_mut()
    }

    fn broadphases(&self) -> [Rc<RefCell<dyn Broadphase>>; 3] {
        let updates: Rc<RefCell<dyn Broadphase>> = self.updates.clone();
        let content: Rc<RefCell<dyn Broadphase>> = self.content.clone();
        let render: Rc<RefCell<dyn Broadphase>> = self.render.clone();
        [updates, content, render]
    }
}

/// Feed every new component with `capability` to `broadphase`.
fn subscribe<B: Broadphase + 'static>(
    factory: &mut ComponentFactory,
    capability: Capability,
    broadphase: &Rc<RefCell<B>>,
) {
    let weak = Rc::downgrade(broadphase);
    factory.register_created_callback(capability, move |handle: &ComponentHandle| {
        if let Some(broadphase) = weak.upgrade() {
            broadphase.borrow_mut().register_component(handle);
        }
    });
}

#[cfg(test)]
mod tests {
    use mosaic_core::{Node, PropertyContainer, Vector3};

    use super::*;
    use crate::backend::{AssetDirectory, DrawLog};
    use crate::components::{Camera, Follower, StaticRenderable, register_builtin};

    fn setup(config: HostConfig) -> (Registry, Host, DrawLog) {
        let mut registry = Registry::new();
        register_builtin(&mut registry);
        let log = DrawLog::new();
        let host = Host::new(
            &mut registry,
            config,
            Box::new(log.clone()),
            Box::new(AssetDirectory::virtual_assets()),
        )
        .unwrap();
        (registry, host, log)
    }

    fn sprite_entity(registry: &Registry, name: &str, position: Vector3) -> Entity {
        let mut entity = Entity::new(name);
        let handle = entity
            .add_component(registry.factory(), "StaticRenderable", None)
            .unwrap();
        let node = Node::new("component").with_attr("file", format!("{name}.png"));
        handle.borrow_mut().parse(&node, &mut entity).unwrap();
        entity.get_property::<Vector3>("Position").unwrap().set(position);
        entity
    }

    #[test]
    fn publishes_config_globals() {
        let (registry, _host, _log) = setup(HostConfig::default().with_screen_dimensions(320.0, 200.0));
        let screen = registry.globals().get::<Vector2>(SCREEN_DIMENSIONS).unwrap();
        assert_eq!(screen.get(), Vector2::new(320.0, 200.0));
        assert!(registry.globals().has::<Option<EntityId>>(ACTIVE_CAMERA));
    }

    #[test]
    fn rejects_invalid_config_and_time_step() {
        let mut registry = Registry::new();
        let err = Host::new(
            &mut registry,
            HostConfig::default().with_update_frequency(-1.0),
            Box::new(DrawLog::new()),
            Box::new(AssetDirectory::virtual_assets()),
        )
        .unwrap_err();
        assert!(matches!(err, HostError::InvalidConfig(_)));

        let (_registry, mut host, _log) = setup(HostConfig::default());
        assert!(matches!(host.tick(-0.5), Err(HostError::InvalidTimeStep(_))));
    }

    #[test]
    fn components_are_routed_by_capability() {
        let (registry, host, _log) = setup(HostConfig::default());
        let mut entity = sprite_entity(&registry, "crate", Vector3::ZERO);
        entity.add_component(registry.factory(), "Follower", None).unwrap();
        entity.add_component(registry.factory(), "Camera", None).unwrap();
        entity.add_component(registry.factory(), "Selectable", None).unwrap();

        assert_eq!(host.update_scheduler().len(), 1);
        assert_eq!(host.content_loader().len(), 1);
        assert_eq!(host.render_pass().len(), 1);

        host.remove_entity(&entity);
        assert!(host.update_scheduler().is_empty());
        assert!(host.render_pass().is_empty());
        drop(entity);
    }

    #[test]
    fn run_loads_updates_and_renders() {
        let (registry, mut host, log) = setup(HostConfig::default().with_render_frequency(0.0));
        let near = sprite_entity(&registry, "near", Vector3::new(1.0, 2.0, 1.0));
        let far = sprite_entity(&registry, "far", Vector3::new(0.0, 0.0, 3.0));
        let mut dog = Entity::new("Dog");
        dog.add_component(registry.factory(), "Follower", None).unwrap();
        dog.get_property::<Vector3>("Target").unwrap().set(Vector3::new(10.0, 0.0, 0.0));

        let stats = host.run(3, 0.1).unwrap();
        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.updates, 3);
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.sprites, 6);
        assert_eq!(stats.loads, 2);

        let textures: Vec<_> = log.sprites().into_iter().take(2).map(|s| s.texture).collect();
        assert_eq!(textures, vec!["near.png", "far.png"]);
        assert!(dog.get_property::<Vector3>("Position").unwrap().get().x > 0.0);
        assert!(dog.component::<Follower>("Follower").is_some());
        drop((near, far));
    }

    #[test]
    fn late_entities_load_on_arrival() {
        let (registry, mut host, log) = setup(HostConfig::default().with_render_frequency(0.0));
        host.tick(0.1).unwrap();
        let late = sprite_entity(&registry, "late", Vector3::ZERO);
        assert_eq!(host.content_loader().loads(), 1);
        // The file attribute is parsed after the content callback, so the
        // texture resolves on the next explicit load.
        assert!(late.component::<StaticRenderable>("StaticRenderable").unwrap().texture().is_none());
        host.load();
        host.tick(0.1).unwrap();
        assert_eq!(log.sprites()[0].texture, "late.png");
    }

    #[test]
    fn active_camera_moves_sprites() {
        let (registry, mut host, log) = setup(HostConfig::default().with_render_frequency(0.0));
        let _sprite = sprite_entity(&registry, "crate", Vector3::new(10.0, 10.0, 1.0));
        let mut cam = Entity::new("Cam");
        let handle = cam.add_component(registry.factory(), "Camera", None).unwrap();
        cam.get_property::<Vector3>("Position")
            .unwrap()
            .set(Vector3::new(10.0, 10.0, 0.0));

        host.tick(0.1).unwrap();
        assert_eq!(log.sprites()[0].position, Vector3::new(10.0, 10.0, 1.0));

        cam.invoke_event("SetActiveCamera", &());
        assert!(handle.borrow().as_any().downcast_ref::<Camera>().unwrap().is_active());
        host.tick(0.1).unwrap();
        assert_eq!(log.sprites()[1].position, Vector3::new(400.0, 300.0, 1.0));
    }
}
