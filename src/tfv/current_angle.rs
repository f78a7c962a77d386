/// Live angle between two entities
///
/// Time-invariant: the value depends only on where the entities are when it
/// is sampled. Used by homing motion, never serialized.

use glam::Vec2;
use hecs::Entity;
use tracing::warn;

use crate::ecs::{EntityQuery, QueryError};
use crate::format::FormatError;

/// What the angle points toward
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleTarget {
    /// Hitbox center of a live entity
    Entity(Entity),
    /// A fixed world position
    Point(Vec2),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentAngleTfv {
    from: Entity,
    to: AngleTarget,
    last_angle: f32,
}

impl CurrentAngleTfv {
    pub const NAME: &'static str = "CurrentAngleTFV";

    pub fn new(from: Entity, to: AngleTarget) -> Self {
        Self {
            from,
            to,
            last_angle: 0.0,
        }
    }

    pub fn from_entity(&self) -> Entity {
        self.from
    }

    pub fn target(&self) -> AngleTarget {
        self.to
    }

    /// Angle from `from` to the target right now
    pub fn try_evaluate(&self, query: &dyn EntityQuery) -> Result<f32, QueryError> {
        let from = query.hitbox_center(self.from)?;
        let to = match self.to {
            AngleTarget::Entity(entity) => query.hitbox_center(entity)?,
            AngleTarget::Point(point) => point,
        };
        Ok((to.y - from.y).atan2(to.x - from.x))
    }

    /// Like `try_evaluate`, but a missing entity yields the last angle
    /// successfully sampled
    pub fn evaluate(&mut self, query: &dyn EntityQuery) -> f32 {
        match self.try_evaluate(query) {
            Ok(angle) => {
                self.last_angle = angle;
                angle
            }
            Err(e) => {
                warn!("Current angle unavailable ({}), reusing {}", e, self.last_angle);
                self.last_angle
            }
        }
    }

    pub fn last_angle(&self) -> f32 {
        self.last_angle
    }

    /// Always fails: live entity handles have no textual form
    pub fn format(&self) -> Result<String, FormatError> {
        Err(FormatError::NotSerializable(Self::NAME))
    }

    /// Always fails: live entity handles have no textual form
    pub fn load(_text: &str) -> Result<Self, FormatError> {
        Err(FormatError::NotSerializable(Self::NAME))
    }
}
