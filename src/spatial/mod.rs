//! Grid coordinates, tile ids and their orientation bits.

mod grid;
mod tile_id;

pub use grid::{CellCoord, TileGrid};
pub use tile_id::{Orientation, TileId, FLIP_D, FLIP_H, FLIP_V, GID_MASK};
