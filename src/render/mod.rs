//! Vertex batches, camera culling and batch submission.

pub mod batch;
pub mod cull;
pub mod frame;
pub mod macroquad_surface;

pub use batch::{TileVertex, VertexBatch};
pub use cull::{visible_span, VisibleSpan};
pub use frame::{view_transform, BatchDraw, Camera, Camera2d, DrawSurface};
pub use macroquad_surface::MacroquadSurface;
