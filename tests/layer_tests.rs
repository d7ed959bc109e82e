// tests/layer_tests.rs

use macroquad::math::vec2;
use tile_compositor::{
    AnimationFrame, AnimationHandle, AnimationRegistry, AttachError, ColliderShape,
    ColliderTemplate, ColliderWorld, EntityLifetime, EntityTemplate, EntityWorld,
    LayerDescriptor, LayerError, QuadRef, TextureId, TileAnimations, TileContext, TileGrid,
    TileId, TileLayer, TileVertex, Tileset, TilesetCatalog,
};

const TILE: f32 = 32.0;
const ANIMATED: u32 = 2;
const SOLID: u32 = 3;
const COIN: u32 = 4;

struct Fixture {
    tilesets: TilesetCatalog,
    animations: TileAnimations,
    colliders: ColliderWorld,
    entities: EntityWorld,
    anim: AnimationHandle,
}

impl Fixture {
    /// One 64x64 tileset with ids 1..=4; tile 2 animates, tile 3 is solid,
    /// tile 4 spawns a coin.
    fn new() -> Self {
        let tilesets = TilesetCatalog::new()
            .with(Tileset::new(1, 4, (32, 32), (64, 64), TextureId(0)))
            .unwrap();

        let mut animations = TileAnimations::new();
        let anim = animations
            .insert(
                ANIMATED,
                vec![AnimationFrame::new(2, 0.5), AnimationFrame::new(1, 0.5)],
            )
            .unwrap();

        let mut colliders = ColliderWorld::new();
        colliders.add_template(ColliderTemplate {
            id: "wall".into(),
            tile: SOLID,
            offset: vec2(4.0, 4.0),
            shape: ColliderShape::Rectangle {
                size: vec2(24.0, 24.0),
            },
        });

        let mut entities = EntityWorld::new();
        entities.add_template(EntityTemplate {
            tile: COIN,
            kind: "Coin".into(),
            id_pattern: "coin_{index}".into(),
            offset: vec2(8.0, 8.0),
        });

        Self {
            tilesets,
            animations,
            colliders,
            entities,
            anim,
        }
    }

    fn ctx(&mut self) -> TileContext<'_> {
        TileContext::new(
            &self.tilesets,
            &mut self.animations,
            &mut self.colliders,
            &mut self.entities,
        )
    }

    fn built_layer(&mut self, width: u32, height: u32) -> TileLayer {
        let mut layer = TileLayer::new(LayerDescriptor::new("ground"), TileGrid::empty(width, height));
        layer.build(&mut self.ctx()).unwrap();
        layer
    }
}

fn zeroed(quad: &[TileVertex]) -> bool {
    quad.iter().all(|v| *v == TileVertex::default())
}

#[test]
fn first_quad_covers_first_cell() {
    let mut fx = Fixture::new();
    let mut layer = fx.built_layer(2, 2);
    layer.set_tile(0, 0, TileId(1), &mut fx.ctx()).unwrap();

    let batch = layer.batch(1).expect("tileset batch");
    assert_eq!(batch.len(), 2 * 2 * 4);
    assert_eq!(layer.slot(0, 0).unwrap(), 0);
    let quad = batch.quad(0).unwrap();
    assert_eq!(quad[0].position, vec2(0.0, 0.0));
    assert_eq!(quad[1].position, vec2(TILE, 0.0));
    assert_eq!(quad[2].position, vec2(TILE, TILE));
    assert_eq!(quad[3].position, vec2(0.0, TILE));
    assert_eq!(quad[0].tex_coords, vec2(0.0, 0.0));
    assert_eq!(quad[2].tex_coords, vec2(TILE, TILE));
}

#[test]
fn clearing_zeroes_the_slot() {
    let mut fx = Fixture::new();
    let mut layer = fx.built_layer(2, 2);
    layer.set_tile(1, 1, TileId(2), &mut fx.ctx()).unwrap();
    assert!(!zeroed(layer.quad(1, 1).unwrap().unwrap()));

    layer.set_tile(1, 1, TileId(0), &mut fx.ctx()).unwrap();
    assert_eq!(layer.get_tile(1, 1).unwrap(), TileId::EMPTY);
    assert!(layer.quad(1, 1).unwrap().is_none());
    let slot = layer.slot(1, 1).unwrap();
    assert!(zeroed(layer.batch(1).unwrap().quad(slot).unwrap()));
    assert_eq!(layer.occupied(), 0);
}

#[test]
fn collider_sits_at_cell_plus_offset() {
    let mut fx = Fixture::new();
    let mut layer = fx.built_layer(2, 2);
    layer.set_tile(1, 0, TileId(SOLID), &mut fx.ctx()).unwrap();

    assert_eq!(fx.colliders.len(), 1);
    let (id, collider) = fx.colliders.iter().next().unwrap();
    assert_eq!(collider.position, vec2(36.0, 4.0));
    assert_eq!(collider.template, "wall");
    let attachments = layer.attachments(1, 0).unwrap().unwrap();
    assert_eq!(attachments.collider, Some(id));
}

#[test]
fn bounds_are_enforced_on_both_axes() {
    let mut fx = Fixture::new();
    let mut layer = fx.built_layer(3, 2);

    for (x, y) in [(3, 0), (0, 2), (3, 2), (u32::MAX, 0)] {
        assert!(matches!(
            layer.get_tile(x, y),
            Err(LayerError::OutOfBounds { width: 3, height: 2, .. })
        ));
        let err = layer.set_tile(x, y, TileId(1), &mut fx.ctx()).unwrap_err();
        assert!(matches!(err, LayerError::OutOfBounds { x: ex, y: ey, .. } if ex == x && ey == y));
    }
    for x in 0..3 {
        for y in 0..2 {
            layer.set_tile(x, y, TileId(1), &mut fx.ctx()).unwrap();
            assert_eq!(layer.get_tile(x, y).unwrap(), TileId(1));
        }
    }
}

#[test]
fn set_then_get_round_trips_orientation_bits() {
    let mut fx = Fixture::new();
    let mut layer = fx.built_layer(2, 2);
    let flipped = TileId(1 | tile_compositor::spatial::FLIP_H);
    layer.set_tile(1, 0, flipped, &mut fx.ctx()).unwrap();
    assert_eq!(layer.get_tile(1, 0).unwrap(), flipped);

    let quad = layer.quad(1, 0).unwrap().unwrap();
    assert_eq!(quad[0].tex_coords, vec2(TILE, 0.0));
    assert_eq!(quad[1].tex_coords, vec2(0.0, 0.0));
}

#[test]
fn clearing_an_empty_cell_changes_nothing() {
    let mut fx = Fixture::new();
    let mut layer = fx.built_layer(2, 2);
    layer.set_tile(0, 0, TileId(SOLID), &mut fx.ctx()).unwrap();

    let before = layer.batch(1).unwrap().vertices().to_vec();
    let colliders = fx.colliders.len();

    layer.set_tile(1, 1, TileId(0), &mut fx.ctx()).unwrap();
    layer.clear_tile(1, 1, &mut fx.ctx()).unwrap();

    assert_eq!(layer.batch(1).unwrap().vertices(), before.as_slice());
    assert_eq!(fx.colliders.len(), colliders);
    assert!(layer.attachments(1, 1).unwrap().is_none());
}

#[test]
fn attachments_always_track_the_current_tile() {
    let mut fx = Fixture::new();
    let mut layer = fx.built_layer(2, 2);

    for tile in [SOLID, ANIMATED, SOLID, SOLID, ANIMATED, ANIMATED, 1, SOLID] {
        layer.set_tile(0, 1, TileId(tile), &mut fx.ctx()).unwrap();
        let att = layer.attachments(0, 1).unwrap().unwrap();

        let expected_colliders = usize::from(tile == SOLID);
        assert_eq!(fx.colliders.len(), expected_colliders);
        assert_eq!(att.collider.is_some(), tile == SOLID);

        let driven = fx.animations.attached(fx.anim);
        assert_eq!(driven.len(), usize::from(tile == ANIMATED));
        assert_eq!(att.animation.is_some(), tile == ANIMATED);
        if let Some(quad) = driven.first() {
            assert_eq!(quad.tile, TileId(ANIMATED));
        }
    }

    layer.clear_tile(0, 1, &mut fx.ctx()).unwrap();
    assert!(fx.colliders.is_empty());
    assert!(fx.animations.attached(fx.anim).is_empty());
}

#[test]
fn unknown_tile_leaves_cell_untouched() {
    let mut fx = Fixture::new();
    let mut layer = fx.built_layer(2, 2);
    layer.set_tile(1, 1, TileId(SOLID), &mut fx.ctx()).unwrap();
    let before = layer.quad(1, 1).unwrap().unwrap().to_vec();

    let err = layer.set_tile(1, 1, TileId(99), &mut fx.ctx()).unwrap_err();
    assert!(matches!(err, LayerError::UnknownTile { tile: 99 }));
    assert_eq!(layer.get_tile(1, 1).unwrap(), TileId(SOLID));
    assert_eq!(layer.quad(1, 1).unwrap().unwrap(), before.as_slice());
    assert_eq!(fx.colliders.len(), 1);
}

#[test]
fn entities_spawn_with_counter_and_offset() {
    let mut fx = Fixture::new();
    let mut layer = fx.built_layer(3, 3);
    layer.set_tile(1, 1, TileId(COIN), &mut fx.ctx()).unwrap();
    layer.set_tile(2, 0, TileId(COIN), &mut fx.ctx()).unwrap();

    let (_, first) = fx.entities.find("coin_0").unwrap();
    assert_eq!(first.kind, "Coin");
    assert_eq!(first.position, vec2(40.0, 40.0));
    let (_, second) = fx.entities.find("coin_1").unwrap();
    assert_eq!(second.position, vec2(72.0, 8.0));
}

#[test]
fn detached_entities_outlive_their_tile() {
    let mut fx = Fixture::new();
    let mut layer = fx.built_layer(2, 2);
    layer.set_tile(0, 0, TileId(COIN), &mut fx.ctx()).unwrap();
    layer.clear_tile(0, 0, &mut fx.ctx()).unwrap();
    assert_eq!(fx.entities.len(), 1);
}

#[test]
fn follow_tile_entities_are_despawned_on_clear() {
    let mut fx = Fixture::new();
    let mut layer = TileLayer::new(LayerDescriptor::new("items"), TileGrid::empty(2, 2))
        .with_entity_lifetime(EntityLifetime::FollowTile);
    layer.build(&mut fx.ctx()).unwrap();

    layer.set_tile(0, 0, TileId(COIN), &mut fx.ctx()).unwrap();
    let spawned = layer.attachments(0, 0).unwrap().unwrap().entities.clone();
    assert_eq!(spawned.len(), 1);

    layer.set_tile(0, 0, TileId(1), &mut fx.ctx()).unwrap();
    assert!(fx.entities.is_empty());
    assert!(fx.entities.get(spawned[0]).is_none());
}

#[test]
fn failed_entity_spawn_rolls_back_collider() {
    let mut fx = Fixture::new();
    // tile 1 spawns a collider and a uniquely named chest
    fx.colliders.add_template(ColliderTemplate {
        id: "chest_box".into(),
        tile: 1,
        offset: vec2(0.0, 0.0),
        shape: ColliderShape::Circle { radius: 8.0 },
    });
    fx.entities.add_template(EntityTemplate {
        tile: 1,
        kind: "Chest".into(),
        id_pattern: "chest".into(),
        offset: vec2(0.0, 0.0),
    });
    let mut layer = fx.built_layer(2, 2);
    layer.set_tile(0, 0, TileId(1), &mut fx.ctx()).unwrap();
    layer.set_tile(1, 0, TileId(SOLID), &mut fx.ctx()).unwrap();
    assert_eq!(fx.colliders.len(), 2);

    let err = layer.set_tile(1, 0, TileId(1), &mut fx.ctx()).unwrap_err();
    assert!(matches!(
        err,
        LayerError::AttachmentFailure { x: 1, y: 0, tile: 1, source: AttachError::Entity(_) }
    ));

    // the wall was cleared, the new chest collider rolled back
    assert_eq!(fx.colliders.len(), 1);
    assert_eq!(fx.entities.len(), 1);
    assert_eq!(layer.get_tile(1, 0).unwrap(), TileId::EMPTY);
    assert!(layer.quad(1, 0).unwrap().is_none());
    let slot = layer.slot(1, 0).unwrap();
    assert!(zeroed(layer.batch(1).unwrap().quad(slot).unwrap()));
}

struct RefusingAnimations;

impl AnimationRegistry for RefusingAnimations {
    fn animation_for(&self, id: TileId) -> Option<AnimationHandle> {
        (id.clean() == SOLID).then_some(AnimationHandle(0))
    }

    fn attach(&mut self, _: AnimationHandle, _: QuadRef) -> Result<(), AttachError> {
        Err(AttachError::Animation("registry is read-only".into()))
    }

    fn detach(&mut self, _: AnimationHandle, _: QuadRef) {}
}

#[test]
fn failed_animation_attach_undoes_collider_and_entities() {
    let mut fx = Fixture::new();
    fx.entities.add_template(EntityTemplate {
        tile: SOLID,
        kind: "Marker".into(),
        id_pattern: "marker_{index}".into(),
        offset: vec2(0.0, 0.0),
    });
    let mut animations = RefusingAnimations;
    let mut ctx = TileContext::new(
        &fx.tilesets,
        &mut animations,
        &mut fx.colliders,
        &mut fx.entities,
    );
    let mut layer = TileLayer::new(LayerDescriptor::new("l"), TileGrid::empty(1, 1));
    layer.build(&mut ctx).unwrap();

    let err = layer.set_tile(0, 0, TileId(SOLID), &mut ctx).unwrap_err();
    assert!(matches!(
        err,
        LayerError::AttachmentFailure { source: AttachError::Animation(_), .. }
    ));
    drop(ctx);
    assert!(fx.colliders.is_empty());
    assert!(fx.entities.is_empty());
    assert_eq!(layer.get_tile(0, 0).unwrap(), TileId::EMPTY);
}

#[test]
fn texture_update_keeps_position_and_attachments() {
    let mut fx = Fixture::new();
    let mut layer = fx.built_layer(2, 2);
    layer.set_tile(1, 0, TileId(ANIMATED), &mut fx.ctx()).unwrap();
    let before = layer.quad(1, 0).unwrap().unwrap().to_vec();
    let attachments = layer.attachments(1, 0).unwrap().cloned();

    layer
        .update_quad_texture(1, 0, TileId(3), &fx.tilesets)
        .unwrap();

    let after = layer.quad(1, 0).unwrap().unwrap();
    for (a, b) in before.iter().zip(after) {
        assert_eq!(a.position, b.position);
    }
    assert_eq!(after[0].tex_coords, vec2(0.0, TILE));
    assert_eq!(layer.get_tile(1, 0).unwrap(), TileId(ANIMATED));
    assert_eq!(layer.attachments(1, 0).unwrap().cloned(), attachments);
    assert_eq!(layer.batch(1).unwrap().len(), 16);
}

#[test]
fn texture_update_errors() {
    let mut fx = Fixture::new();
    fx.tilesets
        .insert(Tileset::new(10, 2, (32, 32), (64, 32), TextureId(1)))
        .unwrap();
    let mut layer = fx.built_layer(2, 2);
    layer.set_tile(0, 0, TileId(1), &mut fx.ctx()).unwrap();

    assert!(matches!(
        layer.update_quad_texture(1, 1, TileId(2), &fx.tilesets),
        Err(LayerError::EmptyCell { x: 1, y: 1 })
    ));
    assert!(matches!(
        layer.update_quad_texture(0, 0, TileId(10), &fx.tilesets),
        Err(LayerError::TilesetMismatch { expected: 1, found: 10, .. })
    ));
    assert!(matches!(
        layer.update_quad_texture(0, 0, TileId(50), &fx.tilesets),
        Err(LayerError::UnknownTile { tile: 50 })
    ));
    assert!(layer.update_quad_texture(0, 0, TileId(0), &fx.tilesets).is_ok());
}

#[test]
fn build_allocates_a_batch_per_tileset() {
    let mut fx = Fixture::new();
    fx.tilesets
        .insert(Tileset::new(10, 2, (16, 16), (32, 16), TextureId(1)))
        .unwrap();
    let grid = TileGrid::from_row_major(3, 2, &[1, 0, SOLID, 0, 0, 0], "ground").unwrap();
    let mut layer = TileLayer::new(LayerDescriptor::new("ground"), grid);

    layer.build(&mut fx.ctx()).unwrap();
    assert!(layer.is_built());
    assert_eq!(layer.batches().count(), 2);
    assert!(layer.batches().all(|b| b.len() == 3 * 2 * 4));
    assert!(zeroed(layer.batch(10).unwrap().vertices()));
    assert_eq!(layer.occupied(), 2);
    assert_eq!(fx.colliders.len(), 1);
    let (_, wall) = fx.colliders.iter().next().unwrap();
    assert_eq!(wall.position, vec2(2.0 * TILE + 4.0, 4.0));
}

#[test]
fn tiles_set_before_build_are_composed_by_build() {
    let mut fx = Fixture::new();
    let mut layer = TileLayer::new(LayerDescriptor::new("ground"), TileGrid::empty(2, 2));
    layer.set_tile(1, 1, TileId(SOLID), &mut fx.ctx()).unwrap();
    assert!(fx.colliders.is_empty());
    assert_eq!(layer.occupied(), 0);

    layer.build(&mut fx.ctx()).unwrap();
    assert_eq!(fx.colliders.len(), 1);
    assert!(layer.quad(1, 1).unwrap().is_some());
}

#[test]
fn build_with_unknown_tile_changes_nothing() {
    let mut fx = Fixture::new();
    let grid = TileGrid::from_row_major(2, 1, &[SOLID, 42], "ground").unwrap();
    let mut layer = TileLayer::new(LayerDescriptor::new("ground"), grid);

    let err = layer.build(&mut fx.ctx()).unwrap_err();
    assert!(matches!(err, LayerError::UnknownTile { tile: 42 }));
    assert!(!layer.is_built());
    assert!(fx.colliders.is_empty());
}

#[test]
fn rebuilding_does_not_duplicate_attachments() {
    let mut fx = Fixture::new();
    let grid = TileGrid::from_row_major(2, 1, &[SOLID, ANIMATED], "ground").unwrap();
    let mut layer = TileLayer::new(LayerDescriptor::new("ground"), grid);
    layer.build(&mut fx.ctx()).unwrap();
    layer.build(&mut fx.ctx()).unwrap();

    assert_eq!(fx.colliders.len(), 1);
    assert_eq!(fx.animations.attached(fx.anim).len(), 1);
    assert_eq!(layer.occupied(), 2);
}

#[test]
fn release_tears_everything_down_but_keeps_ids() {
    let mut fx = Fixture::new();
    let grid = TileGrid::from_row_major(2, 1, &[SOLID, ANIMATED], "ground").unwrap();
    let mut layer = TileLayer::new(LayerDescriptor::new("ground"), grid);
    layer.build(&mut fx.ctx()).unwrap();

    layer.release(&mut fx.ctx());
    assert!(fx.colliders.is_empty());
    assert!(fx.animations.attached(fx.anim).is_empty());
    assert!(zeroed(layer.batch(1).unwrap().vertices()));
    assert_eq!(layer.get_tile(0, 0).unwrap(), TileId(SOLID));
}

#[test]
fn tileset_registered_after_build_gets_a_batch() {
    let mut fx = Fixture::new();
    let mut layer = fx.built_layer(2, 2);
    assert!(layer.batch(10).is_none());

    fx.tilesets
        .insert(Tileset::new(10, 2, (32, 32), (64, 32), TextureId(1)))
        .unwrap();
    layer.set_tile(1, 0, TileId(11), &mut fx.ctx()).unwrap();

    let batch = layer.batch(10).expect("lazily allocated batch");
    assert_eq!(batch.len(), 16);
    let quad = layer.quad(1, 0).unwrap().unwrap();
    assert_eq!(quad[0].tex_coords, vec2(32.0, 0.0));
}

#[test]
fn moving_a_cell_between_tilesets_clears_the_old_batch() {
    let mut fx = Fixture::new();
    fx.tilesets
        .insert(Tileset::new(10, 2, (32, 32), (64, 32), TextureId(1)))
        .unwrap();
    let mut layer = fx.built_layer(2, 2);
    layer.set_tile(0, 1, TileId(1), &mut fx.ctx()).unwrap();
    layer.set_tile(0, 1, TileId(10), &mut fx.ctx()).unwrap();

    let slot = layer.slot(0, 1).unwrap();
    assert!(zeroed(layer.batch(1).unwrap().quad(slot).unwrap()));
    assert!(!zeroed(layer.batch(10).unwrap().quad(slot).unwrap()));
}

#[test]
fn collider_registry_errors_surface_as_attachment_failures() {
    let mut fx = Fixture::new();
    fx.colliders.add_template(ColliderTemplate {
        id: "broken".into(),
        tile: 1,
        offset: vec2(0.0, 0.0),
        shape: ColliderShape::Polygon(vec![vec2(0.0, 0.0)]),
    });
    let mut layer = fx.built_layer(1, 1);
    let err = layer.set_tile(0, 0, TileId(1), &mut fx.ctx()).unwrap_err();
    assert!(matches!(
        err,
        LayerError::AttachmentFailure { source: AttachError::Collider(_), .. }
    ));
    assert_eq!(layer.get_tile(0, 0).unwrap(), TileId::EMPTY);
    assert!(fx.colliders.is_empty());
}

#[test]
fn standalone_layers_sharing_registries_keep_their_own_quads() {
    let mut fx = Fixture::new();
    let mut a = fx.built_layer(2, 2);
    let mut b = fx.built_layer(2, 2);
    assert_ne!(a.key(), b.key());

    a.set_tile(0, 0, TileId(ANIMATED), &mut fx.ctx()).unwrap();
    b.set_tile(0, 0, TileId(ANIMATED), &mut fx.ctx()).unwrap();

    let driven = fx.animations.attached(fx.anim);
    assert_eq!(driven.len(), 2);
    assert!(driven.iter().any(|q| q.layer == a.key()));
    assert!(driven.iter().any(|q| q.layer == b.key()));

    a.clear_tile(0, 0, &mut fx.ctx()).unwrap();
    let driven = fx.animations.attached(fx.anim);
    assert_eq!(driven.len(), 1);
    assert_eq!(driven[0].layer, b.key());
    assert!(b.attachments(0, 0).unwrap().unwrap().animation.is_some());
}
