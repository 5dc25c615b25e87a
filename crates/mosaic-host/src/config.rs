use mosaic_core::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostResult};

/// Configuration for a [`Host`](crate::Host).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Minimum seconds between update passes. 0 = every tick.
    pub update_frequency: f32,
    /// Minimum seconds between render passes. 0 = every tick.
    pub render_frequency: f32,
    /// Screen size in pixels, published as the `ScreenDimensions` global.
    pub screen_dimensions: Vector2,
    /// Lowest and highest camera zoom, published as the `ZoomBounds` global.
    pub zoom_bounds: Vector2,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            update_frequency: 0.0,
            render_frequency: 1.0 / 60.0,
            screen_dimensions: Vector2::new(800.0, 600.0),
            zoom_bounds: Vector2::new(0.1, 10.0),
        }
    }
}

impl HostConfig {
    /// Set the minimum seconds between update passes.
    pub fn with_update_frequency(mut self, seconds: f32) -> Self {
        self.update_frequency = seconds;
        self
    }

    /// Set the minimum seconds between render passes.
    pub fn with_render_frequency(mut self, seconds: f32) -> Self {
        self.render_frequency = seconds;
        self
    }

    /// Set the screen size in pixels.
    pub fn with_screen_dimensions(mut self, width: f32, height: f32) -> Self {
        self.screen_dimensions = Vector2::new(width, height);
        self
    }

    /// Set the camera zoom range.
    pub fn with_zoom_bounds(mut self, min: f32, max: f32) -> Self {
        self.zoom_bounds = Vector2::new(min, max);
        self
    }

    /// Reject negative or non-finite frequencies and an inverted zoom range.
    pub fn validate(&self) -> HostResult<()> {
        for (name, value) in [
            ("update_frequency", self.update_frequency),
            ("render_frequency", self.render_frequency),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(HostError::InvalidConfig(format!(
                    "{name} must be a non-negative number of seconds, got {value}"
                )));
            }
        }
        if self.zoom_bounds.x <= 0.0 || self.zoom_bounds.x > self.zoom_bounds.y {
            return Err(HostError::InvalidConfig(format!(
                "zoom_bounds must satisfy 0 < min <= max, got {}",
                self.zoom_bounds
            )));
        }
        Ok(())
    }
}
