#![warn(missing_docs)]

//! Incremental tile-layer compositor for Macroquad.
//!
//! A [`TileLayer`] turns a grid of tile ids into one packed quad buffer per
//! tileset, patches single cells in place when tiles change, binds animation,
//! collider and entity state to occupied cells, and draws only the columns the
//! camera can see.

#[allow(missing_docs)]
mod config;
mod error;
mod layer;
mod scene;
mod tileset;

#[allow(missing_docs)]
pub mod attach;
#[allow(missing_docs)]
pub mod render;
pub mod spatial;

pub use attach::{
    AnimationFrame, AnimationHandle, AnimationRegistry, ColliderId, ColliderRegistry,
    ColliderShape, ColliderTemplate, ColliderWorld, EntityId, EntityRegistry, EntityTemplate,
    EntityWorld, FrameUpdate, LayerKey, QuadRef, SpawnRequest, TileAnimations, TileContext,
};
pub use config::{LayerConfig, RenderConfig, SceneConfig, TilesetConfig};
pub use error::{AttachError, LayerError};
pub use layer::{CellAttachments, EntityLifetime, LayerDescriptor, TileLayer};
pub use render::{
    visible_span, BatchDraw, Camera, Camera2d, DrawSurface, MacroquadSurface, TileVertex,
    VertexBatch, VisibleSpan,
};
pub use scene::TileScene;
pub use spatial::{CellCoord, Orientation, TileGrid, TileId};
pub use tileset::{TextureId, Tileset, TilesetCatalog, TilesetDirectory};
