use thiserror::Error;

/// Failures surfaced by layer and scene operations.
///
/// Every error is local to the single cell (or layer) operation that produced
/// it; nothing here is retried internally.
#[derive(Debug, Error)]
pub enum LayerError {
    /// A coordinate fell outside `[0, width) x [0, height)`.
    #[error("tile position ({x}, {y}) is outside of layer bounds {width}x{height}")]
    OutOfBounds {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
        /// Layer width in cells.
        width: u32,
        /// Layer height in cells.
        height: u32,
    },
    /// A non-empty tile id that no tileset covers.
    #[error("no tileset covers tile id {tile}")]
    UnknownTile {
        /// Tile id with flip bits stripped.
        tile: u32,
    },
    /// An animation, collider or entity collaborator refused an attachment.
    #[error("attaching tile {tile} at ({x}, {y}) failed: {source}")]
    AttachmentFailure {
        /// Column of the cell.
        x: u32,
        /// Row of the cell.
        y: u32,
        /// Raw tile id being placed.
        tile: u32,
        /// What the collaborator reported.
        #[source]
        source: AttachError,
    },
    /// The cell holds no quad to update.
    #[error("cell ({x}, {y}) holds no tile")]
    EmptyCell {
        /// Column of the cell.
        x: u32,
        /// Row of the cell.
        y: u32,
    },
    /// A texture update tried to move a quad into another tileset's batch.
    #[error("tile {tile} belongs to tileset {found}, but the quad at ({x}, {y}) lives in tileset {expected}")]
    TilesetMismatch {
        /// Column of the cell.
        x: u32,
        /// Row of the cell.
        y: u32,
        /// Raw tile id of the update.
        tile: u32,
        /// First id of the batch owning the quad.
        expected: u32,
        /// First id of the tileset covering `tile`.
        found: u32,
    },
    /// Initial tile data does not match the layer extents.
    #[error("layer `{layer}` has {actual} tiles, expected {expected}")]
    DataSizeMismatch {
        /// Layer id.
        layer: String,
        /// `width * height`.
        expected: usize,
        /// Length of the supplied data.
        actual: usize,
    },
    /// A tileset definition is unusable or collides with another one.
    #[error("invalid tileset starting at id {first_id}: {reason}")]
    InvalidTileset {
        /// First id of the rejected tileset.
        first_id: u32,
        /// Human readable cause.
        reason: String,
    },
    /// No layer with this id exists in the scene.
    #[error("no layer named `{0}`")]
    UnknownLayer(String),
    /// A layer with this id is already part of the scene.
    #[error("layer `{0}` already exists")]
    DuplicateLayer(String),
}

/// Error reported by an attachment collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachError {
    /// The animation registry rejected the quad.
    #[error("animation: {0}")]
    Animation(String),
    /// The collider registry could not instantiate a template.
    #[error("collider: {0}")]
    Collider(String),
    /// The entity registry could not spawn a template.
    #[error("entity: {0}")]
    Entity(String),
}
