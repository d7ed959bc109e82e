//! Draw surface backed by macroquad meshes.

use super::{BatchDraw, DrawSurface, TileVertex};
use crate::tileset::TextureId;
use macroquad::color::WHITE;
use macroquad::math::{vec2, Vec2};
use macroquad::models::{draw_mesh, Mesh, Vertex};
use macroquad::texture::{FilterMode, Texture2D};
use macroquad::window::{screen_height, screen_width};
use std::collections::{HashMap, HashSet};
use tracing::warn;

// macroquad clamps a single geometry call to 5000 indices
const MAX_QUADS_PER_MESH: usize = 800;

/// Submits batches through macroquad meshes on the default screen camera.
#[derive(Default)]
pub struct MacroquadSurface {
    textures: HashMap<TextureId, Texture2D>,
    missing: HashSet<TextureId>,
}

impl MacroquadSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_texture(&mut self, id: TextureId, texture: Texture2D) {
        texture.set_filter(FilterMode::Nearest);
        self.missing.remove(&id);
        self.textures.insert(id, texture);
    }
}

impl DrawSurface for MacroquadSurface {
    fn screen_size(&self) -> Vec2 {
        vec2(screen_width(), screen_height())
    }

    fn draw_batch(&mut self, draw: BatchDraw<'_>) {
        let Some(texture) = self.textures.get(&draw.texture) else {
            if self.missing.insert(draw.texture) {
                warn!(texture = draw.texture.0, "no texture bound for tileset batch");
            }
            return;
        };
        let texel = vec2(1.0 / texture.width().max(1.0), 1.0 / texture.height().max(1.0));

        for chunk in draw.visible().chunks(MAX_QUADS_PER_MESH * 4) {
            let mut vertices = Vec::with_capacity(chunk.len());
            let mut indices = Vec::with_capacity(chunk.len() / 4 * 6);

            for quad in chunk.chunks_exact(4) {
                if quad.iter().all(|v| *v == TileVertex::default()) {
                    continue;
                }
                let base = vertices.len() as u16;
                for v in quad {
                    let p = draw.transform.transform_point2(v.position);
                    let uv = v.tex_coords * texel;
                    vertices.push(Vertex::new(p.x, p.y, 0.0, uv.x, uv.y, WHITE));
                }
                indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
            }

            if indices.is_empty() {
                continue;
            }
            draw_mesh(&Mesh {
                vertices,
                indices,
                texture: Some(texture.clone()),
            });
        }
    }
}
