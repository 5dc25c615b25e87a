use std::any::Any;

use mosaic_core::{
    Asset, Component, ContentConsumer, ContentSource, CoreResult, Entity, EntityId, Node, Property,
    RenderTarget, Renderable, Sprite, Vector2, Vector3,
};

use super::{attribute, entity_property};
use crate::render::DEFAULT_PASS;

/// Draws one texture at the entity's `Position`, on layer `Position.z`.
///
/// The texture path is the `Graphics.Filename` property, which a `file`
/// attribute overrides; `pass` selects the render pass.
pub struct StaticRenderable {
    name: String,
    owner: EntityId,
    filename: Property<String>,
    position: Property<Vector3>,
    origin: Property<Vector2>,
    scale: Property<f32>,
    selected: Property<bool>,
    pass: String,
    texture: Option<Asset>,
}

impl StaticRenderable {
    /// Factory name.
    pub const TYPE_NAME: &'static str = "StaticRenderable";

    /// Bind to `entity`'s properties.
    pub fn new(entity: &mut Entity, name: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: entity.id(),
            filename: entity_property(entity, "Graphics.Filename", String::new()),
            position: entity_property(entity, "Position", Vector3::ZERO),
            origin: entity_property(entity, "Origin", Vector2::ZERO),
            scale: entity_property(entity, "Scale", 1.0_f32),
            selected: entity_property(entity, "Selected", false),
            pass: DEFAULT_PASS.to_string(),
            texture: None,
        }
    }

    /// The loaded texture, once content has been loaded.
    pub fn texture(&self) -> Option<&Asset> {
        self.texture.as_ref()
    }

    /// Current `Graphics.Filename`.
    pub fn filename(&self) -> String {
        self.filename.get()
    }
}

impl Renderable for StaticRenderable {
    fn render(&self, target: &mut dyn RenderTarget) {
        let Some(texture) = &self.texture else {
            return;
        };
        target.draw(&Sprite {
            texture: texture.path.clone(),
            position: self.position.get(),
            origin: self.origin.get(),
            scale: self.scale.get(),
            highlighted: self.selected.get(),
        });
    }

    fn layer(&self) -> f32 {
        self.position.get().z
    }

    fn pass(&self) -> &str {
        &self.pass
    }
}

impl ContentConsumer for StaticRenderable {
    fn load(&mut self, content: &mut dyn ContentSource) {
        let filename = self.filename.get();
        self.texture = content.load(&filename);
        if self.texture.is_none() {
            log::warn!("{}: texture {filename:?} could not be loaded", self.name);
        }
    }
}

impl Component for StaticRenderable {
    fn name(&self) -> &str {
        &self.name
    }

    fn owner(&self) -> EntityId {
        self.owner
    }

    fn parse(&mut self, node: &Node, _entity: &mut Entity) -> CoreResult<()> {
        if let Some(file) = attribute::<String>(&self.name, node, "file")? {
            self.filename.set(file);
        }
        if let Some(pass) = node.attr("pass") {
            self.pass = pass.to_string();
        }
        Ok(())
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }

    fn as_content(&mut self) -> Option<&mut dyn ContentConsumer> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use mosaic_core::PropertyContainer;

    use super::*;
    use crate::backend::{AssetDirectory, DrawLog};

    fn renderable(node: &Node) -> (Entity, StaticRenderable) {
        let mut entity = Entity::new("Crate");
        let mut component = StaticRenderable::new(&mut entity, "Sprite");
        component.parse(node, &mut entity).unwrap();
        (entity, component)
    }

    #[test]
    fn parse_reads_file_and_pass() {
        let node = Node::new("component").with_attr("file", "crate.png").with_attr("pass", "Props");
        let (entity, component) = renderable(&node);
        assert_eq!(component.filename(), "crate.png");
        assert_eq!(component.pass(), "Props");
        assert_eq!(
            entity.get_property::<String>("Graphics.Filename").unwrap().get(),
            "crate.png"
        );
    }

    #[test]
    fn draws_only_after_loading() {
        let (entity, mut component) = renderable(&Node::new("component").with_attr("file", "crate.png"));
        entity
            .get_property::<Vector3>("Position")
            .unwrap()
            .set(Vector3::new(4.0, 5.0, 2.0));
        let log = DrawLog::new();
        let mut target = log.clone();

        component.render(&mut target);
        assert!(log.is_empty());

        component.load(&mut AssetDirectory::virtual_assets());
        component.render(&mut target);
        let sprite = &log.sprites()[0];
        assert_eq!(sprite.texture, "crate.png");
        assert_eq!(sprite.position, Vector3::new(4.0, 5.0, 2.0));
        assert_eq!(sprite.scale, 1.0);
        assert_eq!(component.layer(), 2.0);
    }

    #[test]
    fn missing_texture_is_not_drawn() {
        let (_entity, mut component) = renderable(&Node::new("component"));
        component.load(&mut AssetDirectory::virtual_assets());
        assert!(component.texture().is_none());
    }
}
