/// ECS World and entity query boundary
///
/// This module provides:
/// - The `EntityQuery` capability evaluators use to read live positions
/// - A `hecs`-backed world implementing it
/// - A fixed-position query for previews and tests

pub mod components;
pub mod hierarchy;
pub mod init;

use std::collections::HashMap;

use glam::Vec2;
use hecs::{Entity, World};
use thiserror::Error;

use crate::config::KinematicsConfig;
use components::{Facing, HitboxOffset, Player, Position};

/// Stale-reference errors raised by entity lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("entity {0:?} not found")]
    NotFound(Entity),

    #[error("no player entity exists")]
    NoPlayer,
}

/// Read-only access to live entity state
///
/// Evaluators receive this at call time and never hold on to it across frames.
pub trait EntityQuery {
    fn position(&self, entity: Entity) -> Result<Vec2, QueryError>;

    fn hitbox_offset(&self, entity: Entity) -> Result<Vec2, QueryError>;

    fn hitbox_center(&self, entity: Entity) -> Result<Vec2, QueryError> {
        Ok(self.position(entity)? + self.hitbox_offset(entity)?)
    }
}

/// The main ECS world containing all moving objects
pub struct EcsWorld {
    /// hecs World - stores all entities and components
    pub world: World,

    /// Upper bound on a single simulation step, in seconds
    pub max_physics_step: f32,
}

impl EcsWorld {
    pub fn new() -> Self {
        Self::with_config(&KinematicsConfig::default())
    }

    pub fn with_config(config: &KinematicsConfig) -> Self {
        Self {
            world: World::new(),
            max_physics_step: config.max_physics_step,
        }
    }

    /// The first entity tagged as the player
    pub fn player(&self) -> Result<Entity, QueryError> {
        self.world
            .query::<&Player>()
            .iter()
            .map(|(entity, _)| entity)
            .next()
            .ok_or(QueryError::NoPlayer)
    }

    /// Facing angle of an entity; entities without a `Facing` component face 0
    pub fn facing(&self, entity: Entity) -> Result<f32, QueryError> {
        if !self.world.contains(entity) {
            return Err(QueryError::NotFound(entity));
        }
        Ok(self.world.get::<&Facing>(entity).map(|f| f.0).unwrap_or(0.0))
    }

    pub fn set_position(&mut self, entity: Entity, position: Vec2) -> Result<(), QueryError> {
        let mut pos = self
            .world
            .get::<&mut Position>(entity)
            .map_err(|_| QueryError::NotFound(entity))?;
        pos.0 = position;
        Ok(())
    }

    /// Get the number of entities
    pub fn entity_count(&self) -> u32 {
        self.world.len()
    }
}

impl Default for EcsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityQuery for EcsWorld {
    fn position(&self, entity: Entity) -> Result<Vec2, QueryError> {
        self.world
            .get::<&Position>(entity)
            .map(|p| p.0)
            .map_err(|_| QueryError::NotFound(entity))
    }

    fn hitbox_offset(&self, entity: Entity) -> Result<Vec2, QueryError> {
        if !self.world.contains(entity) {
            return Err(QueryError::NotFound(entity));
        }
        Ok(self
            .world
            .get::<&HitboxOffset>(entity)
            .map(|h| h.0)
            .unwrap_or(Vec2::ZERO))
    }
}

/// Fixed entity positions, independent of any live world
#[derive(Debug, Clone, Default)]
pub struct StaticQuery {
    positions: HashMap<Entity, Vec2>,
}

impl StaticQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, entity: Entity, position: Vec2) -> Self {
        self.positions.insert(entity, position);
        self
    }

    pub fn set(&mut self, entity: Entity, position: Vec2) {
        self.positions.insert(entity, position);
    }

    pub fn remove(&mut self, entity: Entity) {
        self.positions.remove(&entity);
    }
}

impl EntityQuery for StaticQuery {
    fn position(&self, entity: Entity) -> Result<Vec2, QueryError> {
        self.positions
            .get(&entity)
            .copied()
            .ok_or(QueryError::NotFound(entity))
    }

    fn hitbox_offset(&self, entity: Entity) -> Result<Vec2, QueryError> {
        self.position(entity).map(|_| Vec2::ZERO)
    }
}
