//! Behavior components and the capabilities they can expose to the host.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};
use crate::error::CoreResult;
use crate::math::{Transform, Vector2, Vector3};
use crate::node::Node;

/// Shared handle to a component. The owning [`Entity`] holds the strong
/// reference; host subsystems keep `Weak` ones.
pub type ComponentHandle = Rc<RefCell<dyn Component>>;

/// Wrap a concrete component into a [`ComponentHandle`].
pub fn into_handle<C: Component>(component: C) -> ComponentHandle {
    Rc::new(RefCell::new(component))
}

/// Capability tags observers can subscribe to through the factory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Advances every tick ([`Updatable`]).
    Update,
    /// Draws ([`Renderable`]).
    Render,
    /// Loads assets before first use ([`ContentConsumer`]).
    Content,
    /// Provides a view transform ([`Transformer`]).
    Transform,
    /// An application-defined tag, see [`Component::custom_capabilities`].
    Custom(String),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update => write!(f, "update"),
            Self::Render => write!(f, "render"),
            Self::Content => write!(f, "content"),
            Self::Transform => write!(f, "transform"),
            Self::Custom(tag) => write!(f, "{tag}"),
        }
    }
}

/// A named behavior module owned by exactly one entity.
///
/// Components are built by constructors registered with the
/// [`ComponentFactory`](crate::ComponentFactory), which receive the owning
/// entity so they can add the properties and events they depend on.
/// Capabilities are reported through the `as_*` accessors; the defaults
/// report none.
pub trait Component: Any {
    /// The name the component is registered under on its entity.
    fn name(&self) -> &str;

    /// The owning entity.
    fn owner(&self) -> EntityId;

    /// Configure from the definition node, right after construction.
    fn parse(&mut self, _node: &Node, _entity: &mut Entity) -> CoreResult<()> {
        Ok(())
    }

    /// The update capability, if the component has one.
    fn as_updatable(&mut self) -> Option<&mut dyn Updatable> {
        None
    }

    /// The render capability, if the component has one.
    fn as_renderable(&self) -> Option<&dyn Renderable> {
        None
    }

    /// The content capability, if the component has one.
    fn as_content(&mut self) -> Option<&mut dyn ContentConsumer> {
        None
    }

    /// The transform capability, if the component has one.
    fn as_transformer(&self) -> Option<&dyn Transformer> {
        None
    }

    /// Tags matched against [`Capability::Custom`].
    fn custom_capabilities(&self) -> &[&str] {
        &[]
    }

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable counterpart of [`as_any`](Self::as_any).
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Whether `component` exposes `capability`.
pub fn implements(component: &mut dyn Component, capability: &Capability) -> bool {
    match capability {
        Capability::Update => component.as_updatable().is_some(),
        Capability::Render => component.as_renderable().is_some(),
        Capability::Content => component.as_content().is_some(),
        Capability::Transform => component.as_transformer().is_some(),
        Capability::Custom(tag) => component.custom_capabilities().contains(&tag.as_str()),
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Runs once per update tick.
pub trait Updatable {
    /// `elapsed` is the time since the previous update, in seconds.
    fn update(&mut self, elapsed: f32);
}

/// Draws through a [`RenderTarget`].
pub trait Renderable {
    /// Draw this component's sprites.
    fn render(&self, target: &mut dyn RenderTarget);

    /// Draw order within a pass; lower layers draw first.
    fn layer(&self) -> f32 {
        0.0
    }

    /// Name of the render pass this component draws in.
    fn pass(&self) -> &str {
        "Unsorted"
    }
}

/// Loads assets once, before the first update.
pub trait ContentConsumer {
    /// Load the assets this component needs.
    fn load(&mut self, content: &mut dyn ContentSource);
}

/// Supplies a view transform for a parallax layer.
pub trait Transformer {
    /// The view transform for parallax layer `layer`.
    fn transformation(&self, layer: f32) -> Transform;
}

/// A drawing surface supplied by the host.
pub trait RenderTarget {
    /// Draw one sprite.
    fn draw(&mut self, sprite: &Sprite);
}

/// An asset loader supplied by the host.
pub trait ContentSource {
    /// Load an asset by path. `None` if it does not exist.
    fn load(&mut self, asset: &str) -> Option<Asset>;
}

/// What the host knows about a loaded asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Path the asset was requested under.
    pub path: String,
    /// Pixel size for images, zero for sounds.
    pub size: Vector2,
    /// Playback length in seconds for sounds, zero for images.
    pub duration: f32,
}

/// One draw call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    /// Texture path.
    pub texture: String,
    /// World position; `z` is the layer.
    pub position: Vector3,
    /// Pivot within the texture, in pixels.
    pub origin: Vector2,
    /// Uniform scale factor.
    pub scale: f32,
    /// Drawn with selection highlight.
    pub highlighted: bool,
}
