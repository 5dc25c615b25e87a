use mosaic_core::{
    ComponentHandle, EntityId, Property, RenderTarget, Sprite, Transformer, Vector3,
};

use crate::broadphase::{Broadphase, Members, Pacer};

/// Name of the pass renderables draw in unless they say otherwise.
pub const DEFAULT_PASS: &str = "Unsorted";

/// Draws [`Renderable`](mosaic_core::Renderable) components.
///
/// A frame draws pass by pass, in pass order, and within a pass by
/// ascending layer. Passes are ordered by [`add_pass`](Self::add_pass);
/// a pass first seen on a component is appended. Sprites go through the
/// transform of the active camera, the [`Transformer`] component whose
/// owner is named by the `ActiveCamera` global.
pub struct RenderPass {
    members: Members,
    transformers: Members,
    pacer: Pacer,
    target: Box<dyn RenderTarget>,
    passes: Vec<String>,
    active_camera: Property<Option<EntityId>>,
    frames: u64,
    sprites: u64,
}

impl RenderPass {
    /// A render pass drawing into `target`, through the camera named by `active_camera`.
    pub fn new(target: Box<dyn RenderTarget>, active_camera: Property<Option<EntityId>>) -> Self {
        Self {
            members: Members::default(),
            transformers: Members::default(),
            pacer: Pacer::default(),
            target,
            passes: vec![DEFAULT_PASS.to_string()],
            active_camera,
            frames: 0,
            sprites: 0,
        }
    }

    /// Declare a pass, drawn after every pass declared before it.
    pub fn add_pass(&mut self, name: &str) {
        self.pass_index(name);
    }

    /// Pass names in draw order.
    pub fn pass_names(&self) -> &[String] {
        &self.passes
    }

    /// Make a [`Transformer`] component available as a camera.
    pub fn register_transformer(&mut self, component: &ComponentHandle) {
        self.transformers.insert(component);
    }

    /// Stop using a component as a camera.
    pub fn remove_transformer(&mut self, component: &ComponentHandle) {
        self.transformers.remove(component);
    }

    /// Frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Sprites drawn so far, over all frames.
    pub fn sprites(&self) -> u64 {
        self.sprites
    }

    fn pass_index(&mut self, name: &str) -> usize {
        match self.passes.iter().position(|p| p == name) {
            Some(index) => index,
            None => {
                log::debug!("render: new pass {name}");
                self.passes.push(name.to_string());
                self.passes.len() - 1
            }
        }
    }

    fn active_transformer(&mut self) -> Option<ComponentHandle> {
        let active = self.active_camera.get()?;
        self.transformers
            .live()
            .into_iter()
            .find(|handle| handle.try_borrow().is_ok_and(|c| c.owner() == active))
    }

    /// Draw one frame now, ignoring the frequency.
    pub fn render_frame(&mut self) {
        let mut ordered: Vec<(usize, f32, ComponentHandle)> = Vec::new();
        for handle in self.members.live() {
            let key = match handle.try_borrow() {
                Ok(component) => component
                    .as_renderable()
                    .map(|r| (r.pass().to_string(), r.layer())),
                Err(_) => None,
            };
            if let Some((pass, layer)) = key {
                let index = self.pass_index(&pass);
                ordered.push((index, layer, handle));
            }
        }
        ordered.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

        let camera = self.active_transformer();
        let camera_ref = camera.as_ref().and_then(|h| h.try_borrow().ok());
        let mut target = Transformed {
            inner: self.target.as_mut(),
            transformer: camera_ref.as_deref().and_then(|c| c.as_transformer()),
            drawn: 0,
        };
        for (_, _, handle) in &ordered {
            let Ok(component) = handle.try_borrow() else {
                continue;
            };
            if let Some(renderable) = component.as_renderable() {
                renderable.render(&mut target);
            }
        }
        let drawn = target.drawn;
        self.sprites += drawn;
        self.frames += 1;
        log::trace!("render: frame {} drew {drawn} sprites", self.frames);
    }
}

impl Broadphase for RenderPass {
    fn name(&self) -> &str {
        "render"
    }

    fn register_component(&mut self, component: &ComponentHandle) {
        self.members.insert(component);
    }

    fn remove_component(&mut self, component: &ComponentHandle) {
        self.members.remove(component);
        self.transformers.remove(component);
    }

    fn execute(&mut self, elapsed: f32) {
        if self.pacer.tick(elapsed).is_some() {
            self.render_frame();
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

/// Applies the camera transform to every sprite on its way to the target.
struct Transformed<'a> {
    inner: &'a mut dyn RenderTarget,
    transformer: Option<&'a dyn Transformer>,
    drawn: u64,
}

impl RenderTarget for Transformed<'_> {
    fn draw(&mut self, sprite: &Sprite) {
        self.drawn += 1;
        let Some(transformer) = self.transformer else {
            self.inner.draw(sprite);
            return;
        };
        let transform = transformer.transformation(sprite.position.z);
        let screen = transform.apply(sprite.position.xy());
        let sprite = Sprite {
            position: Vector3::new(screen.x, screen.y, sprite.position.z),
            scale: sprite.scale * transform.scale,
            ..sprite.clone()
        };
        self.inner.draw(&sprite);
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use mosaic_core::{Component, Renderable, Transform, Vector2, into_handle};

    use super::*;
    use crate::backend::DrawLog;

    struct Dot {
        owner: EntityId,
        texture: &'static str,
        layer: f32,
        pass: &'static str,
    }

    impl Renderable for Dot {
        fn render(&self, target: &mut dyn RenderTarget) {
            target.draw(&Sprite {
                texture: self.texture.to_string(),
                position: Vector3::new(10.0, 20.0, self.layer),
                origin: Vector2::ZERO,
                scale: 1.0,
                highlighted: false,
            });
        }
        fn layer(&self) -> f32 {
            self.layer
        }
        fn pass(&self) -> &str {
            self.pass
        }
    }

    impl Component for Dot {
        fn name(&self) -> &str {
            "Dot"
        }
        fn owner(&self) -> EntityId {
            self.owner
        }
        fn as_renderable(&self) -> Option<&dyn Renderable> {
            Some(self)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct Lens {
        owner: EntityId,
    }

    impl Transformer for Lens {
        fn transformation(&self, _layer: f32) -> Transform {
            Transform {
                translation: Vector2::new(-10.0, -20.0),
                scale: 2.0,
                offset: Vector2::new(100.0, 100.0),
            }
        }
    }

    impl Component for Lens {
        fn name(&self) -> &str {
            "Lens"
        }
        fn owner(&self) -> EntityId {
            self.owner
        }
        fn as_transformer(&self) -> Option<&dyn Transformer> {
            Some(self)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn dot(texture: &'static str, layer: f32, pass: &'static str) -> ComponentHandle {
        into_handle(Dot { owner: EntityId::new(), texture, layer, pass })
    }

    fn textures(log: &DrawLog) -> Vec<String> {
        log.sprites().into_iter().map(|s| s.texture).collect()
    }

    #[test]
    fn draws_by_pass_then_layer() {
        let log = DrawLog::new();
        let mut render = RenderPass::new(Box::new(log.clone()), Property::new(None));
        render.add_pass("Background");
        let handles = [
            dot("hud", 0.0, "Hud"),
            dot("far", 5.0, DEFAULT_PASS),
            dot("sky", 1.0, "Background"),
            dot("near", 1.0, DEFAULT_PASS),
        ];
        for handle in &handles {
            render.register_component(handle);
        }
        render.render_frame();
        assert_eq!(textures(&log), vec!["near", "far", "sky", "hud"]);
        assert_eq!(render.pass_names(), [DEFAULT_PASS, "Background", "Hud"]);
        assert_eq!(render.sprites(), 4);
    }

    #[test]
    fn active_camera_transforms_sprites() {
        let log = DrawLog::new();
        let active = Property::new(None);
        let mut render = RenderPass::new(Box::new(log.clone()), active.clone());
        let lens_owner = EntityId::new();
        let lens = into_handle(Lens { owner: lens_owner });
        let sprite = dot("crate", 1.0, DEFAULT_PASS);
        render.register_transformer(&lens);
        render.register_component(&sprite);

        render.render_frame();
        assert_eq!(log.sprites()[0].position, Vector3::new(10.0, 20.0, 1.0));

        active.set(Some(lens_owner));
        render.render_frame();
        let moved = &log.sprites()[1];
        assert_eq!(moved.position, Vector3::new(100.0, 100.0, 1.0));
        assert_eq!(moved.scale, 2.0);
    }

    #[test]
    fn execute_respects_frequency() {
        let log = DrawLog::new();
        let mut render = RenderPass::new(Box::new(log.clone()), Property::new(None));
        render.set_execution_frequency(0.1);
        let sprite = dot("crate", 0.0, DEFAULT_PASS);
        render.register_component(&sprite);
        render.execute(0.05);
        assert_eq!(render.frames(), 0);
        render.execute(0.05);
        assert_eq!(render.frames(), 1);
        render.execute(0.3);
        assert!(render.executing_too_slowly());

        render.remove_component(&sprite);
        assert!(render.is_empty());
    }
}
