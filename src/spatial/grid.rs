use super::TileId;
use crate::error::LayerError;

/// Integer cell position inside a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl CellCoord {
    /// Cell at column `x`, row `y`.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Fixed-extent grid of tile ids.
///
/// Storage is column-major: cell `(x, y)` lives at `x * height + y`. The same
/// index is the cell's quad slot inside every tileset batch, so a run of
/// columns is one contiguous vertex range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<TileId>,
}

impl TileGrid {
    /// An all-empty grid.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![TileId::EMPTY; width as usize * height as usize],
        }
    }

    /// Builds a grid from ids already in column-major order.
    pub fn from_columns(
        width: u32,
        height: u32,
        tiles: Vec<TileId>,
        layer: &str,
    ) -> Result<Self, LayerError> {
        let expected = width as usize * height as usize;
        if tiles.len() != expected {
            return Err(LayerError::DataSizeMismatch {
                layer: layer.to_owned(),
                expected,
                actual: tiles.len(),
            });
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    /// Builds a grid from row-major ids (`x + y * width`), the order map
    /// editors export.
    pub fn from_row_major(
        width: u32,
        height: u32,
        data: &[u32],
        layer: &str,
    ) -> Result<Self, LayerError> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(LayerError::DataSizeMismatch {
                layer: layer.to_owned(),
                expected,
                actual: data.len(),
            });
        }
        let mut grid = Self::empty(width, height);
        for (i, raw) in data.iter().enumerate() {
            let x = (i % width as usize) as u32;
            let y = (i / width as usize) as u32;
            let idx = grid.index_unchecked(x, y);
            grid.tiles[idx] = TileId(*raw);
        }
        Ok(grid)
    }

    /// Columns.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Rows.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells, which is also the quad count of every batch.
    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True for a zero-sized grid.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Linear index of `(x, y)`, or `OutOfBounds`.
    pub fn index(&self, x: u32, y: u32) -> Result<usize, LayerError> {
        if x >= self.width || y >= self.height {
            return Err(LayerError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.index_unchecked(x, y))
    }

    #[inline]
    fn index_unchecked(&self, x: u32, y: u32) -> usize {
        x as usize * self.height as usize + y as usize
    }

    /// Inverse of [`TileGrid::index`].
    pub fn coord(&self, index: usize) -> CellCoord {
        let h = self.height.max(1) as usize;
        CellCoord {
            x: (index / h) as u32,
            y: (index % h) as u32,
        }
    }

    /// Tile at `(x, y)`; fails `OutOfBounds` outside the grid.
    pub fn get(&self, x: u32, y: u32) -> Result<TileId, LayerError> {
        let idx = self.index(x, y)?;
        Ok(self.tiles[idx])
    }

    pub(crate) fn set(&mut self, x: u32, y: u32, id: TileId) -> Result<TileId, LayerError> {
        let idx = self.index(x, y)?;
        Ok(std::mem::replace(&mut self.tiles[idx], id))
    }

    /// Every cell with its id, column by column.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, TileId)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, id)| (self.coord(i), *id))
    }
}
