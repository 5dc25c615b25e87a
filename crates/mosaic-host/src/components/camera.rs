use std::any::Any;

use mosaic_core::{
    Component, CoreResult, Entity, EntityId, GlobalProperties, Node, Property, Transform,
    Transformer, Vector2, Vector3,
};

use super::{ACTIVE_CAMERA, SCREEN_DIMENSIONS, ZOOM_BOUNDS, attribute, entity_property, global_property};

/// A 2D parallax camera.
///
/// Reads the entity's `Position` (z ignored) and `Zoom`, and the
/// `ScreenDimensions` and `ZoomBounds` globals. The `SetActiveCamera` event,
/// or `active="true"` in the definition, makes it the camera the render
/// pass draws through.
pub struct Camera {
    name: String,
    owner: EntityId,
    position: Property<Vector3>,
    zoom: Property<f32>,
    screen: Property<Vector2>,
    zoom_bounds: Property<Vector2>,
    active_camera: Property<Option<EntityId>>,
}

impl Camera {
    /// Factory name.
    pub const TYPE_NAME: &'static str = "Camera";

    /// Bind the camera to `entity`'s properties and the host globals.
    pub fn new(entity: &mut Entity, name: &str, globals: &GlobalProperties) -> Self {
        let owner = entity.id();
        let active_camera = global_property(globals, ACTIVE_CAMERA, None::<EntityId>);
        let activate = active_camera.clone();
        entity.add_event("SetActiveCamera", move |_: &dyn Any| activate.set(Some(owner)));

        Self {
            name: name.to_string(),
            owner,
            position: entity_property(entity, "Position", Vector3::ZERO),
            zoom: entity_property(entity, "Zoom", 1.0_f32),
            screen: global_property(globals, SCREEN_DIMENSIONS, Vector2::ZERO),
            zoom_bounds: global_property(globals, ZOOM_BOUNDS, Vector2::ZERO),
            active_camera,
        }
    }

    /// Make this the camera the render pass draws through.
    pub fn activate(&self) {
        self.active_camera.set(Some(self.owner));
    }

    /// Whether this is the active camera.
    pub fn is_active(&self) -> bool {
        self.active_camera.get() == Some(self.owner)
    }

    /// `Zoom`, clamped to `ZoomBounds` when the bounds form a valid range.
    pub fn zoom(&self) -> f32 {
        let zoom = self.zoom.get();
        let bounds = self.zoom_bounds.get();
        if bounds.x > 0.0 && bounds.x <= bounds.y {
            zoom.clamp(bounds.x, bounds.y)
        } else {
            zoom
        }
    }

    /// Map a world point on `layer` to the screen.
    pub fn world_to_screen(&self, point: Vector2, layer: f32) -> Vector2 {
        self.transformation(layer).apply(point)
    }

    /// Map a screen point back to the world on `layer`.
    pub fn screen_to_world(&self, point: Vector2, layer: f32) -> Vector2 {
        self.transformation(layer).invert(point)
    }
}

impl Transformer for Camera {
    /// Layers further away scroll slower: the camera offset is divided by
    /// the layer. Layer 0 is treated as 1.
    fn transformation(&self, layer: f32) -> Transform {
        let layer = if layer == 0.0 { 1.0 } else { layer };
        Transform {
            translation: -(self.position.get().xy() / layer),
            scale: self.zoom(),
            offset: self.screen.get() / 2.0,
        }
    }
}

impl Component for Camera {
    fn name(&self) -> &str {
        &self.name
    }

    fn owner(&self) -> EntityId {
        self.owner
    }

    fn parse(&mut self, node: &Node, _entity: &mut Entity) -> CoreResult<()> {
        if attribute::<bool>(&self.name, node, "active")?.unwrap_or(false) {
            self.activate();
        }
        Ok(())
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
