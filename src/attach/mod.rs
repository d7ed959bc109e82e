//! Non-rendering state bound to occupied cells.
//!
//! The compositor never reaches for global registries; everything it may
//! attach comes through a [`TileContext`] built by the caller.

pub mod animation;
pub mod collider;
pub mod entity;

use crate::spatial::{CellCoord, TileId};
use crate::tileset::TilesetDirectory;
use std::sync::atomic::{AtomicU32, Ordering};

pub use animation::{AnimationFrame, AnimationHandle, AnimationRegistry, FrameUpdate, TileAnimations};
pub use collider::{ColliderId, ColliderInstance, ColliderRegistry, ColliderShape, ColliderTemplate, ColliderWorld};
pub use entity::{EntityId, EntityRegistry, EntityTemplate, EntityWorld, SpawnRequest, SpawnedEntity, INDEX_TOKEN};

static NEXT_LAYER_KEY: AtomicU32 = AtomicU32::new(0);

/// Identifies a layer to the registries it shares with other layers.
///
/// Every [`TileLayer`](crate::TileLayer) draws a fresh key when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerKey(pub u32);

impl LayerKey {
    pub(crate) fn unique() -> Self {
        LayerKey(NEXT_LAYER_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// Address of one placed quad, handed to animation collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuadRef {
    pub layer: LayerKey,
    pub cell: CellCoord,
    /// Tile the quad was placed with, orientation bits included.
    pub tile: TileId,
}

/// Collaborators consulted while placing and clearing tiles.
pub struct TileContext<'a> {
    pub tilesets: &'a dyn TilesetDirectory,
    pub animations: &'a mut dyn AnimationRegistry,
    pub colliders: &'a mut dyn ColliderRegistry,
    pub entities: &'a mut dyn EntityRegistry,
}

impl<'a> TileContext<'a> {
    pub fn new(
        tilesets: &'a dyn TilesetDirectory,
        animations: &'a mut dyn AnimationRegistry,
        colliders: &'a mut dyn ColliderRegistry,
        entities: &'a mut dyn EntityRegistry,
    ) -> Self {
        Self {
            tilesets,
            animations,
            colliders,
            entities,
        }
    }
}
