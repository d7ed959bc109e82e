use crate::attach::{
    AnimationRegistry, ColliderRegistry, ColliderWorld, EntityRegistry, EntityWorld, LayerKey,
    TileAnimations, TileContext,
};
use crate::config::{RenderConfig, SceneConfig};
use crate::error::LayerError;
use crate::layer::TileLayer;
use crate::render::{Camera, DrawSurface};
use crate::spatial::TileId;
use crate::tileset::{Tileset, TilesetCatalog};
use tracing::{debug, warn};

/// Tilesets, attachment registries and an ordered stack of tile layers.
///
/// Layers are kept sorted by `(z, sublayer)` and drawn back to front; layers
/// with equal depth keep their insertion order.
pub struct TileScene<A = TileAnimations, C = ColliderWorld, E = EntityWorld> {
    tilesets: TilesetCatalog,
    animations: A,
    colliders: C,
    entities: E,
    render: RenderConfig,
    layers: Vec<TileLayer>,
}

impl TileScene {
    /// Scene using the in-memory registries.
    pub fn new(tilesets: TilesetCatalog) -> Self {
        Self::with_registries(
            tilesets,
            TileAnimations::new(),
            ColliderWorld::new(),
            EntityWorld::new(),
        )
    }
}

impl<A, C, E> TileScene<A, C, E>
where
    A: AnimationRegistry,
    C: ColliderRegistry,
    E: EntityRegistry,
{
    /// Scene over caller-supplied registries.
    pub fn with_registries(tilesets: TilesetCatalog, animations: A, colliders: C, entities: E) -> Self {
        Self {
            tilesets,
            animations,
            colliders,
            entities,
            render: RenderConfig::default(),
            layers: Vec::new(),
        }
    }

    /// Catalog, render settings and unbuilt layers from `config`.
    pub fn from_config(
        config: &SceneConfig,
        animations: A,
        colliders: C,
        entities: E,
    ) -> Result<Self, LayerError> {
        let mut scene = Self::with_registries(config.catalog()?, animations, colliders, entities)
            .with_render_config(config.render.clone());
        for layer in &config.layers {
            scene.add_layer(layer.to_layer()?)?;
        }
        Ok(scene)
    }

    /// Replaces the render settings.
    pub fn with_render_config(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    /// Current render settings.
    pub fn render_config(&self) -> &RenderConfig {
        &self.render
    }

    /// Turns pixel snapping off (`true`) or on (`false`).
    pub fn set_anti_aliasing(&mut self, enabled: bool) {
        self.render.anti_aliasing = enabled;
    }

    /// Registered tilesets.
    pub fn tilesets(&self) -> &TilesetCatalog {
        &self.tilesets
    }

    /// Registers a tileset; built layers allocate its batch on first use.
    pub fn add_tileset(&mut self, tileset: Tileset) -> Result<(), LayerError> {
        self.tilesets.insert(tileset)
    }

    /// Animation registry.
    pub fn animations(&self) -> &A {
        &self.animations
    }

    /// Animation registry, for registering frames.
    pub fn animations_mut(&mut self) -> &mut A {
        &mut self.animations
    }

    /// Collider registry.
    pub fn colliders(&self) -> &C {
        &self.colliders
    }

    /// Collider registry, for registering templates.
    pub fn colliders_mut(&mut self) -> &mut C {
        &mut self.colliders
    }

    /// Entity registry.
    pub fn entities(&self) -> &E {
        &self.entities
    }

    /// Entity registry, for registering templates.
    pub fn entities_mut(&mut self) -> &mut E {
        &mut self.entities
    }

    /// Adds `layer` at its depth. Ids must be unique.
    pub fn add_layer(&mut self, layer: TileLayer) -> Result<LayerKey, LayerError> {
        if self.layers.iter().any(|l| l.id() == layer.id()) {
            return Err(LayerError::DuplicateLayer(layer.id().to_owned()));
        }
        let key = layer.key();

        let depth = (layer.descriptor().z, layer.descriptor().sublayer);
        let at = self
            .layers
            .partition_point(|l| (l.descriptor().z, l.descriptor().sublayer) <= depth);
        self.layers.insert(at, layer);
        Ok(key)
    }

    /// Removes a layer, tearing down its attachments.
    pub fn remove_layer(&mut self, id: &str) -> Result<TileLayer, LayerError> {
        let pos = self
            .layers
            .iter()
            .position(|l| l.id() == id)
            .ok_or_else(|| LayerError::UnknownLayer(id.to_owned()))?;
        let mut layer = self.layers.remove(pos);
        let mut ctx = TileContext::new(
            &self.tilesets,
            &mut self.animations,
            &mut self.colliders,
            &mut self.entities,
        );
        layer.release(&mut ctx);
        Ok(layer)
    }

    /// Layers in draw order.
    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    /// Layer named `id`.
    pub fn layer(&self, id: &str) -> Result<&TileLayer, LayerError> {
        self.layers
            .iter()
            .find(|l| l.id() == id)
            .ok_or_else(|| LayerError::UnknownLayer(id.to_owned()))
    }

    fn layer_mut(&mut self, id: &str) -> Result<&mut TileLayer, LayerError> {
        self.layers
            .iter_mut()
            .find(|l| l.id() == id)
            .ok_or_else(|| LayerError::UnknownLayer(id.to_owned()))
    }

    /// Shows or hides the layer named `id`.
    pub fn set_layer_visible(&mut self, id: &str, visible: bool) -> Result<(), LayerError> {
        self.layer_mut(id)?.set_visible(visible);
        Ok(())
    }

    /// Builds every layer. Each layer is attempted; the first error is returned.
    pub fn build(&mut self) -> Result<(), LayerError> {
        let mut ctx = TileContext::new(
            &self.tilesets,
            &mut self.animations,
            &mut self.colliders,
            &mut self.entities,
        );
        let mut first_failure = None;
        for layer in &mut self.layers {
            if let Err(err) = layer.build(&mut ctx) {
                first_failure.get_or_insert(err);
            }
        }
        debug!(layers = self.layers.len(), "scene built");
        first_failure.map_or(Ok(()), Err)
    }

    /// Places `id` at `(x, y)` in the named layer. See [`TileLayer::set_tile`].
    pub fn set_tile(
        &mut self,
        layer: &str,
        x: u32,
        y: u32,
        id: impl Into<TileId>,
    ) -> Result<(), LayerError> {
        let target = self
            .layers
            .iter_mut()
            .find(|l| l.id() == layer)
            .ok_or_else(|| LayerError::UnknownLayer(layer.to_owned()))?;
        let mut ctx = TileContext::new(
            &self.tilesets,
            &mut self.animations,
            &mut self.colliders,
            &mut self.entities,
        );
        target.set_tile(x, y, id.into(), &mut ctx)
    }

    /// Tile at `(x, y)` in the named layer.
    pub fn get_tile(&self, layer: &str, x: u32, y: u32) -> Result<TileId, LayerError> {
        self.layer(layer)?.get_tile(x, y)
    }

    /// Draws every visible layer back to front.
    pub fn draw(&mut self, surface: &mut dyn DrawSurface, camera: &dyn Camera) -> Result<(), LayerError> {
        let snap = !self.render.anti_aliasing;
        for layer in &mut self.layers {
            layer.draw(surface, camera, &self.tilesets, snap)?;
        }
        Ok(())
    }
}

impl<C, E> TileScene<TileAnimations, C, E>
where
    C: ColliderRegistry,
    E: EntityRegistry,
{
    /// Ticks tile animations and rewrites the texture of every quad whose
    /// frame changed. Returns the number of quads updated.
    pub fn advance_animations(&mut self, dt: f32) -> usize {
        let mut applied = 0;
        for update in self.animations.advance(dt) {
            let quad = update.quad;
            let Some(layer) = self.layers.iter_mut().find(|l| l.key() == quad.layer) else {
                warn!(layer = quad.layer.0, "animation update for a layer no longer in the scene");
                continue;
            };
            match layer.update_quad_texture(quad.cell.x, quad.cell.y, update.tile, &self.tilesets) {
                Ok(()) => applied += 1,
                Err(err) => warn!(
                    layer = %layer.id(),
                    x = quad.cell.x,
                    y = quad.cell.y,
                    error = %err,
                    "stale animation update"
                ),
            }
        }
        applied
    }
}
