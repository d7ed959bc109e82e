//! Camera, view transform and the draw-surface seam.

use super::{TileVertex, VisibleSpan};
use crate::tileset::TextureId;
use macroquad::math::{Affine2, Vec2};

/// View onto the world, in world pixels.
pub trait Camera {
    /// Centre of the view.
    fn position(&self) -> Vec2;

    /// Full visible extent.
    fn size(&self) -> Vec2;

    fn left(&self) -> f32 {
        self.position().x - self.size().x * 0.5
    }

    fn right(&self) -> f32 {
        self.position().x + self.size().x * 0.5
    }
}

/// Plain centre-and-extent camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2d {
    pub center: Vec2,
    pub size: Vec2,
}

impl Camera2d {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Camera showing exactly the rectangle `[min, max]`.
    pub fn from_rect(min: Vec2, max: Vec2) -> Self {
        Self {
            center: (min + max) * 0.5,
            size: (max - min).abs(),
        }
    }
}

impl Camera for Camera2d {
    fn position(&self) -> Vec2 {
        self.center
    }

    fn size(&self) -> Vec2 {
        self.size
    }
}

/// World-to-screen transform for one frame.
///
/// Scales by `screen_height / camera_height` and centres the camera on the
/// screen. With `snap` the translation is rounded to whole pixels.
pub fn view_transform(camera: &dyn Camera, screen: Vec2, snap: bool) -> Affine2 {
    let camera_h = camera.size().y;
    let zoom = if camera_h > 0.0 && camera_h.is_finite() {
        screen.y / camera_h
    } else {
        1.0
    };
    let mut translation = screen * 0.5 - camera.position() * zoom;
    if snap {
        translation = translation.round();
    }
    Affine2::from_scale_angle_translation(Vec2::splat(zoom), 0.0, translation)
}

/// One batch submission.
#[derive(Debug, Clone, Copy)]
pub struct BatchDraw<'a> {
    pub texture: TextureId,
    /// Whole batch buffer; only `span` is meant to be drawn.
    pub vertices: &'a [TileVertex],
    pub span: VisibleSpan,
    pub transform: Affine2,
}

impl<'a> BatchDraw<'a> {
    pub fn visible(&self) -> &'a [TileVertex] {
        &self.vertices[self.span.clamped(self.vertices.len()).range()]
    }
}

/// Backend accepting packed quad buffers.
pub trait DrawSurface {
    /// Render target size in pixels.
    fn screen_size(&self) -> Vec2;

    fn draw_batch(&mut self, draw: BatchDraw<'_>);
}
