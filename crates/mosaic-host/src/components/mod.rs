//! Built-in component types.
//!
//! Nothing is registered implicitly: call [`register_builtin`] once on a
//! registry before producing entities that use these types.

mod camera;
mod follower;
mod selectable;
mod sound;
mod static_renderable;

pub use camera::Camera;
pub use follower::Follower;
pub use selectable::Selectable;
pub use sound::{Playback, Sound};
pub use static_renderable::StaticRenderable;

use mosaic_core::{
    CoreError, CoreResult, Entity, FromNode, GlobalProperties, Node, Property, PropertyContainer,
    PropertyValue, Registry,
};

/// Global holding the screen size in pixels (`Vector2`).
pub const SCREEN_DIMENSIONS: &str = "ScreenDimensions";
/// Global holding the camera zoom range (`Vector2`, min and max).
pub const ZOOM_BOUNDS: &str = "ZoomBounds";
/// Global holding the owner of the active camera (`Option<EntityId>`).
pub const ACTIVE_CAMERA: &str = "ActiveCamera";

/// Register every built-in component type with `registry`'s factory.
/// Types that are already registered keep their existing constructor.
pub fn register_builtin(registry: &mut Registry) {
    let globals = registry.globals().clone();
    let factory = registry.factory_mut();

    let camera_globals = globals.clone();
    let registered = [
        factory.register_component_type(Camera::TYPE_NAME, move |entity: &mut Entity, name: &str| {
            Camera::new(entity, name, &camera_globals)
        }),
        factory.register_component_type(StaticRenderable::TYPE_NAME, StaticRenderable::new),
        factory.register_component_type(Sound::TYPE_NAME, Sound::new),
        factory.register_component_type(Selectable::TYPE_NAME, Selectable::new),
        factory.register_component_type(Follower::TYPE_NAME, Follower::new),
    ];
    log::debug!(
        "registered {} built-in component types",
        registered.iter().filter(|r| **r).count()
    );
}

/// Add a property a component depends on. A name already taken by another
/// type leaves the component with a private cell instead.
pub(crate) fn entity_property<T: PropertyValue>(
    entity: &mut Entity,
    name: &str,
    default: T,
) -> Property<T> {
    match entity.add_property(name, default.clone()) {
        Ok(property) => property,
        Err(err) => {
            log::warn!("{}: {err}; using an unshared cell", entity.name());
            Property::new(default)
        }
    }
}

pub(crate) fn global_property<T: PropertyValue>(
    globals: &GlobalProperties,
    name: &str,
    default: T,
) -> Property<T> {
    match globals.add(name, default.clone()) {
        Ok(property) => property,
        Err(err) => {
            log::warn!("{err}; using an unshared cell");
            Property::new(default)
        }
    }
}

/// Parse attribute `key` of `node` with the property value parser.
pub(crate) fn attribute<T: FromNode>(
    component: &str,
    node: &Node,
    key: &str,
) -> CoreResult<Option<T>> {
    let Some(value) = node.attr(key) else {
        return Ok(None);
    };
    T::from_node(&Node::new(key).with_text(value))
        .map(Some)
        .map_err(|reason| CoreError::ComponentParse {
            component: component.to_string(),
            reason: format!("attribute {key}: {reason}"),
        })
}
