/// Horizontal flip flag.
pub const FLIP_H: u32 = 0x8000_0000; // bit 31
/// Vertical flip flag.
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
/// Anti-diagonal flip flag.
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
/// Bits carrying the base tile id.
pub const GID_MASK: u32 = 0x1FFF_FFFF; // keep lower 29 bits (bit 28 is free)

/// Raw tile identifier as stored in a layer: base id plus orientation bits.
///
/// `TileId(0)` is the empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileId(pub u32);

impl TileId {
    /// The empty tile.
    pub const EMPTY: TileId = TileId(0);

    /// Id with its flip bits.
    #[inline] pub fn raw(self) -> u32 { self.0 }
    /// Base id, flip bits stripped.
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    /// Horizontal flip bit.
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    /// Vertical flip bit.
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    /// Anti-diagonal flip bit.
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }
    /// True for any id whose base is 0.
    #[inline] pub fn is_empty(self) -> bool { self.clean() == 0 }

    /// Orientation encoded in the high bits.
    pub fn orientation(self) -> Orientation {
        Orientation {
            flip_h: self.flip_h(),
            flip_v: self.flip_v(),
            flip_d: self.flip_d(),
        }
    }

    /// Same orientation bits, different base id.
    pub fn with_base(self, base: u32) -> TileId {
        TileId((self.0 & !GID_MASK) | (base & GID_MASK))
    }
}

impl From<u32> for TileId {
    fn from(raw: u32) -> Self {
        TileId(raw)
    }
}

/// Flip flags of a placed tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation {
    /// Mirror left to right.
    pub flip_h: bool,
    /// Mirror top to bottom.
    pub flip_v: bool,
    /// Anti-diagonal swap, applied before the two axis flips.
    pub flip_d: bool,
}

impl Orientation {
    /// Texture corner shown at each position corner.
    ///
    /// Corners are numbered top-left, top-right, bottom-right, bottom-left.
    /// Entry `v` is the source-rect corner whose texel lands on position
    /// corner `v`.
    pub fn corner_order(self) -> [usize; 4] {
        let mut order = [0, 1, 2, 3];
        if self.flip_d {
            order.swap(1, 3);
        }
        if self.flip_h {
            order.swap(0, 1);
            order.swap(2, 3);
        }
        if self.flip_v {
            order.swap(0, 3);
            order.swap(1, 2);
        }
        order
    }
}
