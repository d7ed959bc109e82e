//! Tile layer: grid ownership, incremental quad composition and attachment
//! bookkeeping.
//!
//! The layer is the only writer of its grid. Every change goes through
//! [`TileLayer::set_tile`], which tears down the old cell state, writes the
//! new id and composes the new quad in place; nothing is ever laid out again
//! from scratch except by [`TileLayer::build`].

use crate::attach::{
    AnimationHandle, ColliderId, ColliderTemplate, EntityId, EntityTemplate, LayerKey, QuadRef,
    TileContext,
};
use crate::error::{AttachError, LayerError};
use crate::render::batch::{quad_positions, quad_tex_coords};
use crate::render::{
    view_transform, visible_span, BatchDraw, Camera, DrawSurface, TileVertex, VertexBatch,
};
use crate::spatial::{CellCoord, TileGrid, TileId};
use crate::tileset::TilesetDirectory;
use macroquad::math::{vec2, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace, warn};

/// What happens to entities spawned by a tile when that tile goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityLifetime {
    /// Entities outlive the tile; the layer only forgets them.
    #[default]
    Detached,
    /// Clearing the cell despawns its entities.
    FollowTile,
}

/// Identity and draw ordering of a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDescriptor {
    /// Unique name within a scene.
    pub id: String,
    /// Draw depth; lower is drawn first.
    pub z: i32,
    /// Tie-breaker between layers at the same `z`.
    pub sublayer: i32,
    /// Hidden layers are skipped when drawing.
    pub visible: bool,
}

impl LayerDescriptor {
    /// Visible layer at depth `(0, 0)`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            z: 0,
            sublayer: 0,
            visible: true,
        }
    }

    /// Sets `z` and `sublayer`.
    pub fn with_depth(mut self, z: i32, sublayer: i32) -> Self {
        self.z = z;
        self.sublayer = sublayer;
        self
    }

    /// Sets the initial visibility.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// Non-rendering state owned by one occupied cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellAttachments {
    /// Animation driving the quad.
    pub animation: Option<AnimationHandle>,
    /// Collider spawned for the tile.
    pub collider: Option<ColliderId>,
    /// Entities spawned for the current tile.
    pub entities: Vec<EntityId>,
}

#[derive(Debug, Clone)]
struct PlacedTile {
    tile: TileId,
    batch: u32,
    attachments: CellAttachments,
}

/// Everything `place` decided before any state is touched.
struct Placement {
    cell: CellCoord,
    tile: TileId,
    batch: u32,
    origin: Vec2,
    positions: [Vec2; 4],
    tex_coords: [Vec2; 4],
    animation: Option<AnimationHandle>,
    collider: Option<ColliderTemplate>,
    entities: Vec<EntityTemplate>,
}

/// A grid of tiles drawn as one vertex batch per tileset.
///
/// Not `Clone`: a copy would share the key and attachment records of a live
/// layer.
#[derive(Debug)]
pub struct TileLayer {
    key: LayerKey,
    descriptor: LayerDescriptor,
    grid: TileGrid,
    batches: BTreeMap<u32, VertexBatch>,
    placed: HashMap<usize, PlacedTile>,
    entity_lifetime: EntityLifetime,
    built: bool,
}

impl TileLayer {
    /// Layer over `grid`. Nothing is composed until [`TileLayer::build`].
    pub fn new(descriptor: LayerDescriptor, grid: TileGrid) -> Self {
        Self {
            key: LayerKey::unique(),
            descriptor,
            grid,
            batches: BTreeMap::new(),
            placed: HashMap::new(),
            entity_lifetime: EntityLifetime::default(),
            built: false,
        }
    }

    /// Sets what clearing a cell does to its entities.
    pub fn with_entity_lifetime(mut self, lifetime: EntityLifetime) -> Self {
        self.entity_lifetime = lifetime;
        self
    }

    /// Process-unique key identifying this layer's quads to the registries.
    pub fn key(&self) -> LayerKey {
        self.key
    }

    /// Layer name.
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    /// Identity and depth.
    pub fn descriptor(&self) -> &LayerDescriptor {
        &self.descriptor
    }

    /// Whether [`TileLayer::draw`] submits anything.
    pub fn is_visible(&self) -> bool {
        self.descriptor.visible
    }

    /// Shows or hides the layer.
    pub fn set_visible(&mut self, visible: bool) {
        self.descriptor.visible = visible;
    }

    /// Current entity policy.
    pub fn entity_lifetime(&self) -> EntityLifetime {
        self.entity_lifetime
    }

    /// Columns.
    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    /// Rows.
    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    /// Tile ids, including those not composed yet.
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// True once [`TileLayer::build`] succeeded its validation pass.
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Batch of the tileset starting at `first_id`.
    pub fn batch(&self, first_id: u32) -> Option<&VertexBatch> {
        self.batches.get(&first_id)
    }

    /// Every batch, ordered by first id.
    pub fn batches(&self) -> impl Iterator<Item = &VertexBatch> {
        self.batches.values()
    }

    /// Quad slot of `(x, y)` inside any batch.
    pub fn slot(&self, x: u32, y: u32) -> Result<usize, LayerError> {
        self.grid.index(x, y)
    }

    /// Quad currently drawn for `(x, y)`, if the cell is occupied.
    pub fn quad(&self, x: u32, y: u32) -> Result<Option<&[TileVertex]>, LayerError> {
        let index = self.grid.index(x, y)?;
        Ok(self
            .placed
            .get(&index)
            .and_then(|p| self.batches.get(&p.batch))
            .and_then(|batch| batch.quad(index)))
    }

    /// Attachments of `(x, y)`, if the cell is occupied.
    pub fn attachments(&self, x: u32, y: u32) -> Result<Option<&CellAttachments>, LayerError> {
        let index = self.grid.index(x, y)?;
        Ok(self.placed.get(&index).map(|p| &p.attachments))
    }

    /// Number of cells with a composed quad.
    pub fn occupied(&self) -> usize {
        self.placed.len()
    }

    /// Tile at `(x, y)`, orientation bits included.
    pub fn get_tile(&self, x: u32, y: u32) -> Result<TileId, LayerError> {
        self.grid.get(x, y)
    }

    /// Replaces the tile at `(x, y)`.
    ///
    /// The new id is resolved before anything is torn down, so `UnknownTile`
    /// leaves the cell exactly as it was. If an attachment fails after the old
    /// tile was cleared, the cell is left empty and the error is returned.
    pub fn set_tile(
        &mut self,
        x: u32,
        y: u32,
        id: TileId,
        ctx: &mut TileContext<'_>,
    ) -> Result<(), LayerError> {
        let index = self.grid.index(x, y)?;
        let id = if id.is_empty() { TileId::EMPTY } else { id };
        if !id.is_empty() {
            ctx.tilesets.tileset_for(id)?;
        }

        if !self.built {
            self.grid.set(x, y, id)?;
            return Ok(());
        }

        let old = self.grid.get(x, y)?;
        if !old.is_empty() {
            self.clear(index, ctx);
        }
        self.grid.set(x, y, id)?;

        if let Err(err) = self.place(CellCoord::new(x, y), id, ctx) {
            self.grid.set(x, y, TileId::EMPTY)?;
            warn!(layer = %self.descriptor.id, x, y, tile = id.raw(), error = %err, "tile placement rolled back");
            return Err(err);
        }
        Ok(())
    }

    /// Empties `(x, y)`, tearing down its attachments.
    pub fn clear_tile(&mut self, x: u32, y: u32, ctx: &mut TileContext<'_>) -> Result<(), LayerError> {
        self.set_tile(x, y, TileId::EMPTY, ctx)
    }

    /// Allocates one full-size batch per tileset in the directory and
    /// composes every cell.
    ///
    /// Every id is checked before anything changes. A cell whose attachments
    /// fail is left empty; the remaining cells are still composed and the
    /// first failure is returned.
    pub fn build(&mut self, ctx: &mut TileContext<'_>) -> Result<(), LayerError> {
        for (_, id) in self.grid.iter() {
            if !id.is_empty() {
                ctx.tilesets.tileset_for(id)?;
            }
        }

        if self.built {
            self.release(ctx);
        }
        let quads = self.grid.len();
        self.batches = ctx
            .tilesets
            .first_ids()
            .into_iter()
            .map(|first_id| (first_id, VertexBatch::new(first_id, quads)))
            .collect();
        self.built = true;

        let mut first_failure = None;
        for index in 0..quads {
            let cell = self.grid.coord(index);
            let id = self.grid.get(cell.x, cell.y)?;
            if id.is_empty() {
                continue;
            }
            if let Err(err) = self.place(cell, id, ctx) {
                warn!(layer = %self.descriptor.id, x = cell.x, y = cell.y, error = %err, "tile dropped while building layer");
                self.grid.set(cell.x, cell.y, TileId::EMPTY)?;
                first_failure.get_or_insert(err);
            }
        }

        debug!(
            layer = %self.descriptor.id,
            batches = self.batches.len(),
            occupied = self.placed.len(),
            "layer built"
        );
        first_failure.map_or(Ok(()), Err)
    }

    /// Tears down every attachment and zeroes every quad. The grid keeps its ids.
    pub fn release(&mut self, ctx: &mut TileContext<'_>) {
        let mut occupied: Vec<usize> = self.placed.keys().copied().collect();
        occupied.sort_unstable();
        for index in occupied {
            self.clear(index, ctx);
        }
    }

    /// Rewrites only the texture coordinates of the quad at `(x, y)`.
    ///
    /// Position, slot and attachments are untouched, and the grid keeps the id
    /// the cell was placed with. `id` must belong to the quad's tileset.
    pub fn update_quad_texture(
        &mut self,
        x: u32,
        y: u32,
        id: TileId,
        tilesets: &dyn TilesetDirectory,
    ) -> Result<(), LayerError> {
        let index = self.grid.index(x, y)?;
        if id.is_empty() {
            return Ok(());
        }
        let batch_id = self
            .placed
            .get(&index)
            .map(|p| p.batch)
            .ok_or(LayerError::EmptyCell { x, y })?;

        let tileset = tilesets.tileset_for(id)?;
        if tileset.first_id != batch_id {
            return Err(LayerError::TilesetMismatch {
                x,
                y,
                tile: id.raw(),
                expected: batch_id,
                found: tileset.first_id,
            });
        }
        if let Some(batch) = self.batches.get_mut(&batch_id) {
            batch.write_tex_coords(index, quad_tex_coords(tileset, id));
        }
        Ok(())
    }

    /// Submits one draw per batch, limited to the columns `camera` can see.
    pub fn draw(
        &mut self,
        surface: &mut dyn DrawSurface,
        camera: &dyn Camera,
        tilesets: &dyn TilesetDirectory,
        snap: bool,
    ) -> Result<(), LayerError> {
        if !self.descriptor.visible {
            return Ok(());
        }
        let transform = view_transform(camera, surface.screen_size(), snap);
        let (left, right) = (camera.left(), camera.right());
        let height = self.grid.height();

        for (first_id, batch) in &mut self.batches {
            let tileset = tilesets.tileset_for(TileId(*first_id))?;
            batch.set_span(visible_span(tileset.tile_width, left, right, height, batch.len()));
            surface.draw_batch(BatchDraw {
                texture: tileset.texture,
                vertices: batch.vertices(),
                span: batch.span(),
                transform,
            });
        }
        Ok(())
    }

    fn place(&mut self, cell: CellCoord, id: TileId, ctx: &mut TileContext<'_>) -> Result<(), LayerError> {
        if id.is_empty() {
            return Ok(());
        }
        let index = self.grid.index(cell.x, cell.y)?;
        let placement = self.resolve(cell, id, ctx)?;
        let attachments =
            self.attach(&placement, ctx)
                .map_err(|source| LayerError::AttachmentFailure {
                    x: cell.x,
                    y: cell.y,
                    tile: id.raw(),
                    source,
                })?;

        let quads = self.grid.len();
        let batch = self.batches.entry(placement.batch).or_insert_with(|| {
            debug!(first_id = placement.batch, "allocating batch for tileset added after build");
            VertexBatch::new(placement.batch, quads)
        });
        batch.write_quad(index, placement.positions, placement.tex_coords);

        trace!(x = cell.x, y = cell.y, tile = id.raw(), "tile placed");
        self.placed.insert(
            index,
            PlacedTile {
                tile: id,
                batch: placement.batch,
                attachments,
            },
        );
        Ok(())
    }

    fn resolve(&self, cell: CellCoord, id: TileId, ctx: &TileContext<'_>) -> Result<Placement, LayerError> {
        let tileset = ctx.tilesets.tileset_for(id)?;
        let tile_size = tileset.tile_size();

        let mut colliders = ctx.colliders.collider_templates_for(id);
        if colliders.len() > 1 {
            warn!(
                tile = id.clean(),
                templates = colliders.len(),
                "several collider templates match one tile; only the first is instantiated"
            );
        }
        colliders.truncate(1);

        Ok(Placement {
            cell,
            tile: id,
            batch: tileset.first_id,
            origin: vec2(cell.x as f32 * tile_size.x, cell.y as f32 * tile_size.y),
            positions: quad_positions(cell, tile_size),
            tex_coords: quad_tex_coords(tileset, id),
            animation: ctx.animations.animation_for(id),
            collider: colliders.pop(),
            entities: ctx.entities.entity_templates_for(id),
        })
    }

    /// Applies collider, entity and animation side effects; on failure every
    /// effect applied so far is undone.
    fn attach(&self, p: &Placement, ctx: &mut TileContext<'_>) -> Result<CellAttachments, AttachError> {
        let mut done = CellAttachments::default();

        if let Some(template) = &p.collider {
            done.collider = Some(ctx.colliders.spawn_collider(template, p.origin + template.offset)?);
        }

        for template in &p.entities {
            let spawn_index = ctx.entities.next_spawn_index();
            match ctx.entities.spawn_entity(template.request(p.origin, spawn_index)) {
                Ok(entity) => done.entities.push(entity),
                Err(err) => {
                    Self::rollback(&done, ctx);
                    return Err(err);
                }
            }
        }

        if let Some(handle) = p.animation {
            let quad = QuadRef {
                layer: self.key,
                cell: p.cell,
                tile: p.tile,
            };
            if let Err(err) = ctx.animations.attach(handle, quad) {
                Self::rollback(&done, ctx);
                return Err(err);
            }
            done.animation = Some(handle);
        }
        Ok(done)
    }

    fn rollback(done: &CellAttachments, ctx: &mut TileContext<'_>) {
        for entity in done.entities.iter().rev() {
            ctx.entities.despawn_entity(*entity);
        }
        if let Some(collider) = done.collider {
            ctx.colliders.remove_collider(collider);
        }
    }

    fn clear(&mut self, index: usize, ctx: &mut TileContext<'_>) {
        let Some(placed) = self.placed.remove(&index) else {
            return;
        };
        let cell = self.grid.coord(index);
        let attachments = &placed.attachments;

        if let Some(handle) = attachments.animation {
            let quad = QuadRef {
                layer: self.key,
                cell,
                tile: placed.tile,
            };
            ctx.animations.detach(handle, quad);
        }
        if let Some(collider) = attachments.collider {
            ctx.colliders.remove_collider(collider);
        }
        match self.entity_lifetime {
            EntityLifetime::FollowTile => {
                for entity in &attachments.entities {
                    ctx.entities.despawn_entity(*entity);
                }
            }
            EntityLifetime::Detached if !attachments.entities.is_empty() => {
                debug!(
                    x = cell.x,
                    y = cell.y,
                    entities = attachments.entities.len(),
                    "entities outlive their cleared tile"
                );
            }
            EntityLifetime::Detached => {}
        }

        if let Some(batch) = self.batches.get_mut(&placed.batch) {
            batch.clear_quad(index);
        }
        trace!(x = cell.x, y = cell.y, tile = placed.tile.raw(), "tile cleared");
    }
}
