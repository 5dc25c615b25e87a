use std::any::Any;

use mosaic_core::{Component, CoreResult, Entity, EntityId, Node, Property, Vector2, Vector3};

use super::{attribute, entity_property};

/// Makes an entity selectable by area.
///
/// The selection box is `Bounds * Scale`, centered on `Position`. `Select`
/// and `Deselect` events toggle the `Selected` property. Selection tools
/// find these components through the custom `Selectable` capability.
pub struct Selectable {
    name: String,
    owner: EntityId,
    selected: Property<bool>,
    position: Property<Vector3>,
    bounds: Property<Vector2>,
    scale: Property<f32>,
    layer: Property<i32>,
}

impl Selectable {
    /// Factory name.
    pub const TYPE_NAME: &'static str = "Selectable";

    /// Bind to `entity`'s properties and add `Select` and `Deselect`.
    pub fn new(entity: &mut Entity, name: &str) -> Self {
        let selected = entity_property(entity, "Selected", false);
        let on_select = selected.clone();
        entity.add_event("Select", move |_: &dyn Any| on_select.set(true));
        let on_deselect = selected.clone();
        entity.add_event("Deselect", move |_: &dyn Any| on_deselect.set(false));

        Self {
            name: name.to_string(),
            owner: entity.id(),
            selected,
            position: entity_property(entity, "Position", Vector3::ZERO),
            bounds: entity_property(entity, "Bounds", Vector2::ZERO),
            scale: entity_property(entity, "Scale", 1.0_f32),
            layer: entity_property(entity, "Layer", 1_i32),
        }
    }

    /// Current `Selected` value.
    pub fn is_selected(&self) -> bool {
        self.selected.get()
    }

    /// Set `Selected`.
    pub fn set_selected(&self, selected: bool) {
        self.selected.set(selected);
    }

    /// Selection priority; higher wins.
    pub fn layer(&self) -> i32 {
        self.layer.get()
    }

    /// Corners of the selection box, minimum first.
    pub fn boundary(&self) -> (Vector2, Vector2) {
        let half = self.bounds.get() * self.scale.get() / 2.0;
        let center = self.position.get().xy();
        (center - half, center + half)
    }

    /// Whether `point` lies in the selection box.
    pub fn contains(&self, point: Vector2) -> bool {
        let (min, max) = self.boundary();
        (min.x..=max.x).contains(&point.x) && (min.y..=max.y).contains(&point.y)
    }

    /// Whether the selection box overlaps the rectangle spanned by `a` and
    /// `b`, in any corner order.
    pub fn intersects(&self, a: Vector2, b: Vector2) -> bool {
        let (min, max) = self.boundary();
        let lo = Vector2::new(a.x.min(b.x), a.y.min(b.y));
        let hi = Vector2::new(a.x.max(b.x), a.y.max(b.y));
        min.x <= hi.x && lo.x <= max.x && min.y <= hi.y && lo.y <= max.y
    }
}

impl Component for Selectable {
    fn name(&self) -> &str {
        &self.name
    }

    fn owner(&self) -> EntityId {
        self.owner
    }

    fn parse(&mut self, node: &Node, _entity: &mut Entity) -> CoreResult<()> {
        if let Some(selected) = attribute::<bool>(&self.name, node, "selected")? {
            self.set_selected(selected);
        }
        Ok(())
    }

    fn custom_capabilities(&self) -> &[&str] {
        &["Selectable"]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
