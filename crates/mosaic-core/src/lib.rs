//! Core types for Mosaic: entities assembled at runtime from typed
//! properties, behavior components and named events.
//!
//! This crate is independent of the definition format. Entities can be built
//! programmatically through a [`Registry`], or produced from templates by
//! `mosaic-dsl`.

/// Behavior components and capability traits.
pub mod component;
/// Entities and their identifiers.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Named multicast events.
pub mod event;
/// Component construction and capability broadcast.
pub mod factory;
/// The shared global property store.
pub mod global;
/// Vector and transform value types.
pub mod math;
/// The definition node tree.
pub mod node;
/// Observable property cells and stores.
pub mod property;
/// The registry context and property type table.
pub mod registry;
/// Parsing property values from nodes.
pub mod value;

/// Re-export component types.
pub use component::{
    Asset, Capability, Component, ComponentHandle, ContentConsumer, ContentSource, RenderTarget,
    Renderable, Sprite, Transformer, Updatable, into_handle,
};
/// Re-export entity types.
pub use entity::{Entity, EntityId};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export event types.
pub use event::{Event, EventCallback, EventRegistry};
/// Re-export the factory.
pub use factory::ComponentFactory;
/// Re-export global properties.
pub use global::GlobalProperties;
/// Re-export math types.
pub use math::{Transform, Vector2, Vector3};
/// Re-export the node tree.
pub use node::{Node, Span};
/// Re-export property types.
pub use property::{AnyProperty, Property, PropertyContainer, PropertyStore, PropertyValue};
/// Re-export the registry.
pub use registry::{PropertyTypes, Registry};
/// Re-export value parsing.
pub use value::FromNode;
