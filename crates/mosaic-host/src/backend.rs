//! Headless stand-ins for a real renderer and asset pipeline.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use mosaic_core::{Asset, ContentSource, RenderTarget, Sprite};

/// A render target that records every sprite drawn. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct DrawLog {
    sprites: Rc<RefCell<Vec<Sprite>>>,
}

impl DrawLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything drawn so far.
    pub fn sprites(&self) -> Vec<Sprite> {
        self.sprites.borrow().clone()
    }

    /// Number of sprites drawn.
    pub fn len(&self) -> usize {
        self.sprites.borrow().len()
    }

    /// Whether nothing was drawn.
    pub fn is_empty(&self) -> bool {
        self.sprites.borrow().is_empty()
    }

    /// Forget everything drawn.
    pub fn clear(&self) {
        self.sprites.borrow_mut().clear();
    }
}

impl RenderTarget for DrawLog {
    fn draw(&mut self, sprite: &Sprite) {
        self.sprites.borrow_mut().push(sprite.clone());
    }
}

/// Resolves assets against a directory, or accepts every path when
/// built with [`virtual_assets`](Self::virtual_assets).
#[derive(Debug, Clone, Default)]
pub struct AssetDirectory {
    root: Option<PathBuf>,
    requested: Vec<String>,
}

impl AssetDirectory {
    /// Resolve assets under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            requested: Vec::new(),
        }
    }

    /// Accept every path without touching the filesystem.
    pub fn virtual_assets() -> Self {
        Self::default()
    }

    /// Every path asked for, in order.
    pub fn requested(&self) -> &[String] {
        &self.requested
    }
}

impl ContentSource for AssetDirectory {
    fn load(&mut self, asset: &str) -> Option<Asset> {
        self.requested.push(asset.to_string());
        if asset.is_empty() {
            return None;
        }
        let missing = self
            .root
            .as_ref()
            .map(|root| root.join(asset))
            .filter(|path| !path.is_file());
        if let Some(path) = missing {
            log::warn!("asset not found: {}", path.display());
            return None;
        }
        Some(Asset {
            path: asset.to_string(),
            ..Asset::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use mosaic_core::{Vector2, Vector3};

    use super::*;

    #[test]
    fn draw_log_clones_share_sprites() {
        let log = DrawLog::new();
        let mut target = log.clone();
        target.draw(&Sprite {
            texture: "crate.png".to_string(),
            position: Vector3::ZERO,
            origin: Vector2::ZERO,
            scale: 1.0,
            highlighted: false,
        });
        assert_eq!(log.len(), 1);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn asset_directory_checks_files() {
        let mut assets = AssetDirectory::new(env!("CARGO_MANIFEST_DIR"));
        assert!(assets.load("Cargo.toml").is_some());
        assert!(assets.load("missing.png").is_none());
        assert_eq!(assets.requested(), ["Cargo.toml", "missing.png"]);

        let mut all = AssetDirectory::virtual_assets();
        assert_eq!(all.load("anything.wav").unwrap().path, "anything.wav");
        assert!(all.load("").is_none());
    }
}
