//! Entities spawned when a tile is placed.

use crate::error::AttachError;
use crate::spatial::TileId;
use macroquad::math::Vec2;
use std::collections::{BTreeMap, HashMap};

/// Placeholder replaced by the spawn counter in entity id patterns.
pub const INDEX_TOKEN: &str = "{index}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Entity spawned whenever a given tile id is placed.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityTemplate {
    pub tile: u32,
    pub kind: String,
    /// Id to give the entity; `{index}` is substituted with the spawn counter.
    pub id_pattern: String,
    /// Offset from the cell's top-left corner.
    pub offset: Vec2,
}

impl EntityTemplate {
    /// Resolves the template into a request at `cell_origin`.
    pub fn request(&self, cell_origin: Vec2, index: u64) -> SpawnRequest {
        SpawnRequest {
            kind: self.kind.clone(),
            id: self.id_pattern.replace(INDEX_TOKEN, &index.to_string()),
            position: cell_origin + self.offset,
        }
    }
}

/// Fully resolved spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub kind: String,
    pub id: String,
    pub position: Vec2,
}

pub trait EntityRegistry {
    fn entity_templates_for(&self, id: TileId) -> Vec<EntityTemplate>;

    /// Monotonically increasing counter used for `{index}` substitution.
    fn next_spawn_index(&mut self) -> u64;

    fn spawn_entity(&mut self, request: SpawnRequest) -> Result<EntityId, AttachError>;

    fn despawn_entity(&mut self, id: EntityId);
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedEntity {
    pub kind: String,
    pub name: String,
    pub position: Vec2,
}

/// In-memory entity registry. Entity names must be unique.
#[derive(Debug, Clone, Default)]
pub struct EntityWorld {
    templates: HashMap<u32, Vec<EntityTemplate>>,
    live: BTreeMap<EntityId, SpawnedEntity>,
    spawn_counter: u64,
    next_id: u64,
}

impl EntityWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_template(&mut self, template: EntityTemplate) {
        self.templates
            .entry(template.tile)
            .or_default()
            .push(template);
    }

    pub fn get(&self, id: EntityId) -> Option<&SpawnedEntity> {
        self.live.get(&id)
    }

    pub fn find(&self, name: &str) -> Option<(EntityId, &SpawnedEntity)> {
        self.live
            .iter()
            .find(|(_, e)| e.name == name)
            .map(|(id, e)| (*id, e))
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl EntityRegistry for EntityWorld {
    fn entity_templates_for(&self, id: TileId) -> Vec<EntityTemplate> {
        self.templates
            .get(&id.clean())
            .cloned()
            .unwrap_or_default()
    }

    fn next_spawn_index(&mut self) -> u64 {
        let index = self.spawn_counter;
        self.spawn_counter += 1;
        index
    }

    fn spawn_entity(&mut self, request: SpawnRequest) -> Result<EntityId, AttachError> {
        if self.find(&request.id).is_some() {
            return Err(AttachError::Entity(format!(
                "an entity named `{}` already exists",
                request.id
            )));
        }
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.live.insert(
            id,
            SpawnedEntity {
                kind: request.kind,
                name: request.id,
                position: request.position,
            },
        );
        Ok(id)
    }

    fn despawn_entity(&mut self, id: EntityId) {
        self.live.remove(&id);
    }
}
