use crate::error::LayerError;
use crate::spatial::{TileId, GID_MASK};
use macroquad::math::{vec2, Vec2};

/// Opaque handle a draw surface resolves to a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// One atlas image cut into same-sized tiles, covering
/// `[first_id, first_id + tile_count)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    /// Id of the first tile in the image.
    pub first_id: u32,
    /// Number of tiles, so ids run up to `first_id + tile_count - 1`.
    pub tile_count: u32,
    /// Tile width in texels, also the cell width in world pixels.
    pub tile_width: u32,
    /// Tile height in texels.
    pub tile_height: u32,
    /// Atlas width in texels.
    pub image_width: u32,
    /// Atlas height in texels.
    pub image_height: u32,
    /// Border around the whole atlas.
    pub margin: u32,  // 0 if not used
    /// Gap between neighbouring tiles.
    pub spacing: u32, // 0 if not used
    /// Texture the draw surface binds for this tileset.
    pub texture: TextureId,
}

impl Tileset {
    /// Tileset without margin or spacing.
    pub fn new(
        first_id: u32,
        tile_count: u32,
        tile_size: (u32, u32),
        image_size: (u32, u32),
        texture: TextureId,
    ) -> Self {
        Self {
            first_id,
            tile_count,
            tile_width: tile_size.0,
            tile_height: tile_size.1,
            image_width: image_size.0,
            image_height: image_size.1,
            margin: 0,
            spacing: 0,
            texture,
        }
    }

    /// Sets margin and spacing.
    pub fn with_layout(mut self, margin: u32, spacing: u32) -> Self {
        self.margin = margin;
        self.spacing = spacing;
        self
    }

    /// True when the base id of `id` falls in this tileset.
    #[inline]
    pub fn contains(&self, id: TileId) -> bool {
        let clean = id.clean();
        clean >= self.first_id && clean - self.first_id < self.tile_count
    }

    /// Tiles per image row.
    pub fn columns(&self) -> u32 {
        let usable = (self.image_width + self.spacing).saturating_sub(2 * self.margin);
        (usable / (self.tile_width + self.spacing)).max(1)
    }

    /// Tile extent as a vector.
    pub fn tile_size(&self) -> Vec2 {
        vec2(self.tile_width as f32, self.tile_height as f32)
    }

    /// Top-left texel of the sub-image for `id`.
    pub fn source_origin(&self, id: TileId) -> Vec2 {
        let local = id.clean().saturating_sub(self.first_id);
        let cols = self.columns();
        let col = local % cols;
        let row = local / cols;
        let sx = self.margin + col * (self.tile_width + self.spacing);
        let sy = self.margin + row * (self.tile_height + self.spacing);
        vec2(sx as f32, sy as f32)
    }

    fn validate(&self) -> Result<(), LayerError> {
        let reason = if self.first_id == 0 {
            "first id 0 is reserved for the empty tile"
        } else if self.tile_count == 0 {
            "tile count is zero"
        } else if self.tile_width == 0 || self.tile_height == 0 {
            "tile size is zero"
        } else if self.image_width < self.tile_width || self.image_height < self.tile_height {
            "image is smaller than one tile"
        } else if self.first_id > GID_MASK || self.tile_count - 1 > GID_MASK - self.first_id {
            "id range reaches into the flip bits"
        } else {
            return Ok(());
        };
        Err(LayerError::InvalidTileset {
            first_id: self.first_id,
            reason: reason.to_owned(),
        })
    }
}

/// Resolves tile ids to the tileset owning them.
pub trait TilesetDirectory {
    /// Owning tileset, or `UnknownTile`.
    fn tileset_for(&self, id: TileId) -> Result<&Tileset, LayerError>;

    /// First ids of every tileset, ascending. One batch is allocated per entry.
    fn first_ids(&self) -> Vec<u32>;
}

/// In-memory directory backed by a dense id lookup table.
#[derive(Debug, Clone, Default)]
pub struct TilesetCatalog {
    tilesets: Vec<Tileset>, // sorted by first_id
    gid_lut: Vec<u16>,
}

impl TilesetCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tileset; rejects invalid geometry and overlapping id ranges.
    pub fn insert(&mut self, tileset: Tileset) -> Result<(), LayerError> {
        tileset.validate()?;
        let end = tileset.first_id + tileset.tile_count;
        if let Some(other) = self
            .tilesets
            .iter()
            .find(|t| tileset.first_id < t.first_id + t.tile_count && t.first_id < end)
        {
            return Err(LayerError::InvalidTileset {
                first_id: tileset.first_id,
                reason: format!("id range overlaps tileset starting at {}", other.first_id),
            });
        }
        if self.tilesets.len() >= u16::MAX as usize {
            return Err(LayerError::InvalidTileset {
                first_id: tileset.first_id,
                reason: "too many tilesets".to_owned(),
            });
        }

        self.tilesets.push(tileset);
        self.tilesets.sort_unstable_by_key(|t| t.first_id);
        self.rebuild_lut();
        Ok(())
    }

    /// Builder form of [`TilesetCatalog::insert`].
    pub fn with(mut self, tileset: Tileset) -> Result<Self, LayerError> {
        self.insert(tileset)?;
        Ok(self)
    }

    /// Registered tilesets ordered by first id.
    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    fn rebuild_lut(&mut self) {
        let max_gid = self
            .tilesets
            .iter()
            .map(|t| t.first_id + t.tile_count - 1)
            .max()
            .unwrap_or(0);

        let mut gid_lut = vec![u16::MAX; (max_gid + 1) as usize];
        for (i, t) in self.tilesets.iter().enumerate() {
            for gid in t.first_id..(t.first_id + t.tile_count) {
                gid_lut[gid as usize] = i as u16;
            }
        }
        self.gid_lut = gid_lut;
    }
}

impl TilesetDirectory for TilesetCatalog {
    fn tileset_for(&self, id: TileId) -> Result<&Tileset, LayerError> {
        let clean = id.clean();
        self.gid_lut
            .get(clean as usize)
            .filter(|&&idx| idx != u16::MAX)
            .map(|&idx| &self.tilesets[idx as usize])
            .ok_or(LayerError::UnknownTile { tile: clean })
    }

    fn first_ids(&self) -> Vec<u32> {
        self.tilesets.iter().map(|t| t.first_id).collect()
    }
}
