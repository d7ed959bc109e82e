//! Serde-backed scene description: render settings, tilesets and layers.

use crate::error::LayerError;
use crate::layer::{EntityLifetime, LayerDescriptor, TileLayer};
use crate::spatial::TileGrid;
use crate::tileset::{TextureId, Tileset, TilesetCatalog};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_true() -> bool {
    true
}

/// Frame-wide drawing options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// When off, the camera translation is snapped to whole pixels.
    #[serde(default = "default_true")]
    pub anti_aliasing: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            anti_aliasing: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilesetConfig {
    pub first_id: u32,
    pub tile_count: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub image_width: u32,
    pub image_height: u32,
    #[serde(default)]
    pub margin: u32,
    #[serde(default)]
    pub spacing: u32,
    /// Image path, resolved by whoever loads textures.
    #[serde(default)]
    pub image: String,
}

impl TilesetConfig {
    pub fn to_tileset(&self, texture: TextureId) -> Tileset {
        Tileset::new(
            self.first_id,
            self.tile_count,
            (self.tile_width, self.tile_height),
            (self.image_width, self.image_height),
            texture,
        )
        .with_layout(self.margin, self.spacing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub id: String,
    #[serde(default)]
    pub z: i32,
    #[serde(default)]
    pub sublayer: i32,
    #[serde(default = "default_true")]
    pub visible: bool,
    pub width: u32,
    pub height: u32,
    /// Row-major tile ids (`x + y * width`), flip bits allowed.
    #[serde(default)]
    pub data: Vec<u32>,
    #[serde(default)]
    pub entity_lifetime: EntityLifetime,
}

impl LayerConfig {
    /// Unbuilt layer holding this config's tiles.
    pub fn to_layer(&self) -> Result<TileLayer, LayerError> {
        let grid = if self.data.is_empty() {
            TileGrid::empty(self.width, self.height)
        } else {
            TileGrid::from_row_major(self.width, self.height, &self.data, &self.id)?
        };
        let descriptor = LayerDescriptor::new(self.id.clone())
            .with_depth(self.z, self.sublayer)
            .with_visible(self.visible);
        Ok(TileLayer::new(descriptor, grid).with_entity_lifetime(self.entity_lifetime))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub tilesets: Vec<TilesetConfig>,
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

impl SceneConfig {
    pub fn from_json_str(txt: &str) -> anyhow::Result<Self> {
        serde_json::from_str(txt).context("Parsing scene config")
    }

    /// Reads a `.json` scene config from disk.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let p = path.as_ref();
        if p.extension().and_then(|e| e.to_str()) != Some("json") {
            anyhow::bail!("Scene config must be a JSON file: {}", p.display());
        }
        let txt = std::fs::read_to_string(p)
            .with_context(|| format!("Reading scene config {}", p.display()))?;
        serde_json::from_str(&txt).with_context(|| format!("Parsing scene config {}", p.display()))
    }

    /// Catalog of every tileset; texture ids follow list order.
    pub fn catalog(&self) -> Result<TilesetCatalog, LayerError> {
        let mut catalog = TilesetCatalog::new();
        for (i, ts) in self.tilesets.iter().enumerate() {
            catalog.insert(ts.to_tileset(TextureId(i as u32)))?;
        }
        Ok(catalog)
    }
}
