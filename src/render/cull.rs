//! Column culling against the camera.

use std::ops::Range;

/// Contiguous vertex range of a batch submitted to the draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibleSpan {
    pub start: usize,
    pub end: usize,
}

impl VisibleSpan {
    pub fn full(len: usize) -> Self {
        Self { start: 0, end: len }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Both ends inside `[0, len]` and `start <= end`.
    pub fn clamped(self, len: usize) -> Self {
        let end = self.end.min(len);
        let start = self.start.min(end);
        Self { start, end }
    }
}

/// Vertex range holding the columns that may intersect `[camera_left, camera_right]`.
///
/// Only columns are culled; every row of a visible column is submitted. One
/// extra column of margin is kept on the right so tiles do not pop in at the
/// edge. A camera entirely outside the grid yields an empty span.
pub fn visible_span(
    tile_width: u32,
    camera_left: f32,
    camera_right: f32,
    grid_height: u32,
    buffer_len: usize,
) -> VisibleSpan {
    let tw = f64::from(tile_width.max(1));
    let column_len = 4 * i64::from(grid_height);

    let left_col = (f64::from(camera_left) / tw).floor().max(0.0) as i64;
    let right_col = ((f64::from(camera_right) / tw).ceil() as i64).saturating_add(1);

    let clamp = |v: i64| v.clamp(0, buffer_len as i64) as usize;
    let start = clamp(left_col.saturating_mul(column_len));
    let end = clamp(right_col.saturating_mul(column_len));

    VisibleSpan {
        start: start.min(end),
        end,
    }
}
