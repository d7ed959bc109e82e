//! Animated tiles: the registry seam and an in-memory frame ticker.

use super::QuadRef;
use crate::error::AttachError;
use crate::spatial::TileId;
use std::collections::HashMap;
use tracing::trace;

// keeps `advance` terminating when a frame is declared with zero length
const MIN_FRAME_SECONDS: f32 = 1.0e-3;

/// Handle to one registered tile animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationHandle(pub u32);

/// Source of animated-quad handles, keyed by tile id.
pub trait AnimationRegistry {
    /// Animation driving tiles with this base id, if any.
    fn animation_for(&self, id: TileId) -> Option<AnimationHandle>;

    /// Starts driving `quad`'s texture coordinates.
    fn attach(&mut self, handle: AnimationHandle, quad: QuadRef) -> Result<(), AttachError>;

    /// Stops driving `quad`. Unknown quads are ignored.
    fn detach(&mut self, handle: AnimationHandle, quad: QuadRef);
}

/// A single frame in a tile animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    /// Base tile id to display for this frame.
    pub tile: u32,
    /// How long to display this frame, in seconds.
    pub duration: f32,
}

impl AnimationFrame {
    pub fn new(tile: u32, duration: f32) -> Self {
        Self { tile, duration }
    }

    fn step(&self) -> f32 {
        self.duration.max(MIN_FRAME_SECONDS)
    }
}

/// Texture change for one attached quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameUpdate {
    pub quad: QuadRef,
    /// Frame tile carrying the quad's orientation bits.
    pub tile: TileId,
}

#[derive(Debug, Clone)]
struct TileAnimation {
    frames: Vec<AnimationFrame>,
    current: usize,
    elapsed: f32,
    quads: Vec<QuadRef>,
}

impl TileAnimation {
    /// Returns true when the displayed frame changed.
    fn advance(&mut self, dt: f32) -> bool {
        let start = self.current;
        self.elapsed += dt.max(0.0);

        let cycle: f32 = self.frames.iter().map(AnimationFrame::step).sum();
        if self.elapsed >= cycle {
            self.elapsed %= cycle;
        }
        while self.elapsed >= self.frames[self.current].step() {
            self.elapsed -= self.frames[self.current].step();
            self.current = (self.current + 1) % self.frames.len();
        }
        self.current != start
    }
}

/// In-memory animation registry with frame ticking.
#[derive(Debug, Clone, Default)]
pub struct TileAnimations {
    animations: Vec<TileAnimation>,
    by_tile: HashMap<u32, AnimationHandle>,
}

impl TileAnimations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the frame sequence shown for tiles with base id `tile`.
    /// Registering the same tile twice replaces its frames.
    pub fn insert(
        &mut self,
        tile: u32,
        frames: Vec<AnimationFrame>,
    ) -> Result<AnimationHandle, AttachError> {
        if frames.is_empty() {
            return Err(AttachError::Animation(format!(
                "animation for tile {tile} has no frames"
            )));
        }
        if let Some(&handle) = self.by_tile.get(&tile) {
            let anim = &mut self.animations[handle.0 as usize];
            anim.frames = frames;
            anim.current = 0;
            anim.elapsed = 0.0;
            return Ok(handle);
        }

        let handle = AnimationHandle(self.animations.len() as u32);
        self.animations.push(TileAnimation {
            frames,
            current: 0,
            elapsed: 0.0,
            quads: Vec::new(),
        });
        self.by_tile.insert(tile, handle);
        Ok(handle)
    }

    /// Quads currently driven by `handle`.
    pub fn attached(&self, handle: AnimationHandle) -> &[QuadRef] {
        self.animations
            .get(handle.0 as usize)
            .map(|a| a.quads.as_slice())
            .unwrap_or(&[])
    }

    /// Base tile id of the frame currently shown.
    pub fn current_tile(&self, handle: AnimationHandle) -> Option<u32> {
        self.animations
            .get(handle.0 as usize)
            .map(|a| a.frames[a.current].tile)
    }

    /// Advances every animation by `dt` seconds and reports the quads whose
    /// texture must change.
    pub fn advance(&mut self, dt: f32) -> Vec<FrameUpdate> {
        let mut updates = Vec::new();
        for anim in &mut self.animations {
            if !anim.advance(dt) {
                continue;
            }
            let frame = anim.frames[anim.current].tile;
            updates.extend(anim.quads.iter().map(|quad| FrameUpdate {
                quad: *quad,
                tile: quad.tile.with_base(frame),
            }));
        }
        if !updates.is_empty() {
            trace!(count = updates.len(), "animation frame updates");
        }
        updates
    }
}

impl AnimationRegistry for TileAnimations {
    fn animation_for(&self, id: TileId) -> Option<AnimationHandle> {
        self.by_tile.get(&id.clean()).copied()
    }

    fn attach(&mut self, handle: AnimationHandle, quad: QuadRef) -> Result<(), AttachError> {
        let anim = self
            .animations
            .get_mut(handle.0 as usize)
            .ok_or_else(|| AttachError::Animation(format!("unknown handle {}", handle.0)))?;
        anim.quads
            .retain(|q| !(q.layer == quad.layer && q.cell == quad.cell));
        anim.quads.push(quad);
        Ok(())
    }

    fn detach(&mut self, handle: AnimationHandle, quad: QuadRef) {
        if let Some(anim) = self.animations.get_mut(handle.0 as usize) {
            anim.quads
                .retain(|q| !(q.layer == quad.layer && q.cell == quad.cell));
        }
    }
}
