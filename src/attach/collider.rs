//! Collision geometry spawned for solid tiles.

use crate::error::AttachError;
use crate::spatial::TileId;
use macroquad::math::Vec2;
use std::collections::{BTreeMap, HashMap};

/// Instance handle returned by a collider registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(pub u64);

/// Collision geometry carried by a template, in local tile pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    Rectangle { size: Vec2 },
    Circle { radius: f32 },
    Capsule { radius: f32, height: f32 },
    Polygon(Vec<Vec2>),
}

/// Collider prototype attached to every placement of one tile id.
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderTemplate {
    pub id: String,
    pub tile: u32,
    /// Offset from the cell's top-left corner.
    pub offset: Vec2,
    pub shape: ColliderShape,
}

/// Collider prototypes keyed by tile id, and the live instances spawned from them.
pub trait ColliderRegistry {
    fn collider_templates_for(&self, id: TileId) -> Vec<ColliderTemplate>;

    /// Instantiates `template` with its top-left at `position` (world pixels,
    /// template offset already applied).
    fn spawn_collider(
        &mut self,
        template: &ColliderTemplate,
        position: Vec2,
    ) -> Result<ColliderId, AttachError>;

    fn remove_collider(&mut self, id: ColliderId);
}

/// A positioned collider.
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderInstance {
    pub template: String,
    pub position: Vec2,
    pub shape: ColliderShape,
}

/// In-memory collider registry.
#[derive(Debug, Clone, Default)]
pub struct ColliderWorld {
    templates: HashMap<u32, Vec<ColliderTemplate>>,
    live: BTreeMap<ColliderId, ColliderInstance>,
    next_id: u64,
}

impl ColliderWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_template(&mut self, template: ColliderTemplate) {
        self.templates
            .entry(template.tile)
            .or_default()
            .push(template);
    }

    pub fn get(&self, id: ColliderId) -> Option<&ColliderInstance> {
        self.live.get(&id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColliderId, &ColliderInstance)> {
        self.live.iter().map(|(id, c)| (*id, c))
    }
}

impl ColliderRegistry for ColliderWorld {
    fn collider_templates_for(&self, id: TileId) -> Vec<ColliderTemplate> {
        self.templates
            .get(&id.clean())
            .cloned()
            .unwrap_or_default()
    }

    fn spawn_collider(
        &mut self,
        template: &ColliderTemplate,
        position: Vec2,
    ) -> Result<ColliderId, AttachError> {
        if let ColliderShape::Polygon(points) = &template.shape {
            if points.len() < 3 {
                return Err(AttachError::Collider(format!(
                    "polygon `{}` needs at least 3 points",
                    template.id
                )));
            }
        }
        let id = ColliderId(self.next_id);
        self.next_id += 1;
        self.live.insert(
            id,
            ColliderInstance {
                template: template.id.clone(),
                position,
                shape: template.shape.clone(),
            },
        );
        Ok(id)
    }

    fn remove_collider(&mut self, id: ColliderId) {
        self.live.remove(&id);
    }
}
