//! Runtime host for Mosaic entities.
//!
//! A [`Host`] subscribes three broadphases to a registry's component
//! factory and drives them from a fixed tick: the [`UpdateScheduler`]
//! advances updatable components, the [`ContentLoader`] hands assets to
//! content consumers and the [`RenderPass`] draws renderables through the
//! active camera. The built-in component types live in [`components`].

/// Headless render target and asset source.
pub mod backend;
/// The broadphase trait and shared pacing.
pub mod broadphase;
/// Built-in component types.
pub mod components;
/// Host configuration.
pub mod config;
/// The content loading broadphase.
pub mod content;
/// Error types for the host crate.
pub mod error;
/// The tick driver.
pub mod host;
/// The render broadphase.
pub mod render;
/// The update broadphase.
pub mod update;

/// Re-exports of [`backend::AssetDirectory`] and [`backend::DrawLog`].
pub use backend::{AssetDirectory, DrawLog};
/// Re-export of [`broadphase::Broadphase`].
pub use broadphase::Broadphase;
/// Re-export of the built-in registration entry point.
pub use components::register_builtin;
/// Re-export of [`config::HostConfig`].
pub use config::HostConfig;
/// Re-export of [`content::ContentLoader`].
pub use content::ContentLoader;
/// Re-exports of [`error::HostError`] and [`error::HostResult`].
pub use error::{HostError, HostResult};
/// Re-exports of [`host::Host`] and [`host::HostStats`].
pub use host::{Host, HostStats};
/// Re-export of [`render::RenderPass`].
pub use render::{DEFAULT_PASS, RenderPass};
/// Re-export of [`update::UpdateScheduler`].
pub use update::UpdateScheduler;
