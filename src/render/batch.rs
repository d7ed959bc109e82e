//! Per-tileset vertex buffers.

use super::VisibleSpan;
use crate::spatial::{CellCoord, TileId};
use crate::tileset::Tileset;
use macroquad::math::{vec2, Vec2};

/// One corner of a tile quad. Texture coordinates are in texels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TileVertex {
    pub position: Vec2,
    pub tex_coords: Vec2,
}

/// Packed quads of one tileset for a whole layer.
///
/// The buffer holds a slot for every cell (4 vertices each), occupied or not,
/// and never changes size after allocation.
#[derive(Debug, Clone)]
pub struct VertexBatch {
    first_id: u32,
    vertices: Vec<TileVertex>,
    span: VisibleSpan,
}

impl VertexBatch {
    pub fn new(first_id: u32, quads: usize) -> Self {
        let len = quads * 4;
        Self {
            first_id,
            vertices: vec![TileVertex::default(); len],
            span: VisibleSpan::full(len),
        }
    }

    /// First tile id of the owning tileset.
    pub fn first_id(&self) -> u32 {
        self.first_id
    }

    pub fn vertices(&self) -> &[TileVertex] {
        &self.vertices
    }

    /// Vertex count.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The four vertices of `slot`, or `None` past the end of the buffer.
    pub fn quad(&self, slot: usize) -> Option<&[TileVertex]> {
        let start = slot.checked_mul(4)?;
        self.vertices.get(start..start.checked_add(4)?)
    }

    pub(crate) fn write_quad(&mut self, slot: usize, positions: [Vec2; 4], tex_coords: [Vec2; 4]) {
        for (i, v) in self.vertices[slot * 4..slot * 4 + 4].iter_mut().enumerate() {
            v.position = positions[i];
            v.tex_coords = tex_coords[i];
        }
    }

    pub(crate) fn write_tex_coords(&mut self, slot: usize, tex_coords: [Vec2; 4]) {
        for (i, v) in self.vertices[slot * 4..slot * 4 + 4].iter_mut().enumerate() {
            v.tex_coords = tex_coords[i];
        }
    }

    pub(crate) fn clear_quad(&mut self, slot: usize) {
        self.vertices[slot * 4..slot * 4 + 4].fill(TileVertex::default());
    }

    pub fn span(&self) -> VisibleSpan {
        self.span
    }

    /// Sets the sub-range submitted for drawing, clamped to the buffer.
    pub fn set_span(&mut self, span: VisibleSpan) {
        self.span = span.clamped(self.vertices.len());
    }

    pub fn visible_vertices(&self) -> &[TileVertex] {
        &self.vertices[self.span.range()]
    }
}

/// Corner positions of cell `(x, y)`: top-left, top-right, bottom-right, bottom-left.
pub(crate) fn quad_positions(cell: CellCoord, tile_size: Vec2) -> [Vec2; 4] {
    let x0 = cell.x as f32 * tile_size.x;
    let y0 = cell.y as f32 * tile_size.y;
    let x1 = x0 + tile_size.x;
    let y1 = y0 + tile_size.y;
    [vec2(x0, y0), vec2(x1, y0), vec2(x1, y1), vec2(x0, y1)]
}

/// Texture corners for `id`, permuted by its orientation bits.
pub(crate) fn quad_tex_coords(tileset: &Tileset, id: TileId) -> [Vec2; 4] {
    let origin = tileset.source_origin(id);
    let size = tileset.tile_size();
    let corners = [
        origin,
        origin + vec2(size.x, 0.0),
        origin + size,
        origin + vec2(0.0, size.y),
    ];
    let order = id.orientation().corner_order();
    [
        corners[order[0]],
        corners[order[1]],
        corners[order[2]],
        corners[order[3]],
    ]
}
