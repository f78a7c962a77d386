/// Angle offsets for movable-point actions
///
/// An offset is sampled exactly once when its action starts and then held
/// for the action's whole duration, even if the things it was computed from
/// move afterwards.

use glam::Vec2;
use hecs::Entity;
use tracing::warn;

use crate::ecs::{EcsWorld, EntityQuery, QueryError};
use crate::format::{FormatError, Record, RecordWriter, TextFormat};

/// Where an angle offset reads its inputs from
pub trait AngleContext {
    /// Absolute position of the object the action runs on
    fn evaluator_position(&self) -> Result<Vec2, QueryError>;

    fn player_position(&self) -> Result<Vec2, QueryError>;

    fn player_facing(&self) -> Result<f32, QueryError>;
}

/// Reads live state from the world for `entity`
pub struct WorldAngleContext<'a> {
    pub world: &'a EcsWorld,
    pub entity: Entity,
}

impl AngleContext for WorldAngleContext<'_> {
    fn evaluator_position(&self) -> Result<Vec2, QueryError> {
        self.world.hitbox_center(self.entity)
    }

    fn player_position(&self) -> Result<Vec2, QueryError> {
        self.world.hitbox_center(self.world.player()?)
    }

    fn player_facing(&self) -> Result<f32, QueryError> {
        self.world.facing(self.world.player()?)
    }
}

/// Fixed inputs for editor previews
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandaloneContext {
    pub position: Vec2,
    pub player: Vec2,
    pub player_facing: f32,
}

impl StandaloneContext {
    pub fn new(position: Vec2, player: Vec2, player_facing: f32) -> Self {
        Self {
            position,
            player,
            player_facing,
        }
    }
}

impl AngleContext for StandaloneContext {
    fn evaluator_position(&self) -> Result<Vec2, QueryError> {
        Ok(self.position)
    }

    fn player_position(&self) -> Result<Vec2, QueryError> {
        Ok(self.player)
    }

    fn player_facing(&self) -> Result<f32, QueryError> {
        Ok(self.player_facing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AngleOffset {
    #[default]
    Zero,
    Constant { value: f32 },
    /// Angle toward the player's hitbox, shifted by an offset
    ToPlayer { x_offset: f32, y_offset: f32 },
    ToGlobalPosition { x: f32, y: f32 },
    /// Whatever direction the player is currently facing
    PlayerFacing,
}

fn angle_between(from: Vec2, to: Vec2) -> f32 {
    (to.y - from.y).atan2(to.x - from.x)
}

impl AngleOffset {
    pub fn try_evaluate(&self, ctx: &dyn AngleContext) -> Result<f32, QueryError> {
        Ok(match *self {
            AngleOffset::Zero => 0.0,
            AngleOffset::Constant { value } => value,
            AngleOffset::ToPlayer { x_offset, y_offset } => {
                let player = ctx.player_position()?;
                angle_between(ctx.evaluator_position()?, player + Vec2::new(x_offset, y_offset))
            }
            AngleOffset::ToGlobalPosition { x, y } => {
                angle_between(ctx.evaluator_position()?, Vec2::new(x, y))
            }
            AngleOffset::PlayerFacing => ctx.player_facing()?,
        })
    }

    /// Sample the offset; missing entities fall back to 0
    pub fn evaluate(&self, ctx: &dyn AngleContext) -> f32 {
        self.try_evaluate(ctx).unwrap_or_else(|e| {
            warn!("{} angle offset unavailable ({}), using 0", self.name(), e);
            0.0
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            AngleOffset::Zero => "No offset",
            AngleOffset::Constant { .. } => "Constant",
            AngleOffset::ToPlayer { .. } => "Toward player",
            AngleOffset::ToGlobalPosition { .. } => "Toward position",
            AngleOffset::PlayerFacing => "Player facing",
        }
    }

    const ZERO_TAG: &'static str = "EMPAAngleOffsetZero";
    const CONSTANT_TAG: &'static str = "EMPAAngleOffsetConstant";
    const TO_PLAYER_TAG: &'static str = "EMPAAngleOffsetToPlayer";
    const TO_GLOBAL_TAG: &'static str = "EMPAAngleOffsetToGlobalPosition";
    const PLAYER_FACING_TAG: &'static str = "EMPAAngleOffsetPlayerSpriteAngle";
}

impl TextFormat for AngleOffset {
    fn format(&self) -> String {
        match *self {
            AngleOffset::Zero => RecordWriter::new(Self::ZERO_TAG),
            AngleOffset::Constant { value } => RecordWriter::new(Self::CONSTANT_TAG).f32(value),
            AngleOffset::ToPlayer { x_offset, y_offset } => {
                RecordWriter::new(Self::TO_PLAYER_TAG).f32(x_offset).f32(y_offset)
            }
            AngleOffset::ToGlobalPosition { x, y } => RecordWriter::new(Self::TO_GLOBAL_TAG).f32(x).f32(y),
            AngleOffset::PlayerFacing => RecordWriter::new(Self::PLAYER_FACING_TAG),
        }
        .finish()
    }

    fn load(text: &str) -> Result<Self, FormatError> {
        let record = Record::parse(text)?;
        match record.tag() {
            Self::ZERO_TAG => {
                record.expect_fields(0)?;
                Ok(AngleOffset::Zero)
            }
            Self::CONSTANT_TAG => {
                record.expect_fields(1)?;
                Ok(AngleOffset::Constant { value: record.f32(0)? })
            }
            Self::TO_PLAYER_TAG => {
                record.expect_fields(2)?;
                Ok(AngleOffset::ToPlayer {
                    x_offset: record.f32(0)?,
                    y_offset: record.f32(1)?,
                })
            }
            Self::TO_GLOBAL_TAG => {
                record.expect_fields(2)?;
                Ok(AngleOffset::ToGlobalPosition {
                    x: record.f32(0)?,
                    y: record.f32(1)?,
                })
            }
            Self::PLAYER_FACING_TAG => {
                record.expect_fields(0)?;
                Ok(AngleOffset::PlayerFacing)
            }
            other => Err(FormatError::UnknownTag {
                family: "angle offset",
                tag: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Facing, Player, Position};
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn test_standalone_offsets() {
        let ctx = StandaloneContext::new(Vec2::new(1.0, 1.0), Vec2::new(1.0, 5.0), 0.25);

        assert_eq!(AngleOffset::Zero.evaluate(&ctx), 0.0);
        assert_eq!(AngleOffset::Constant { value: 2.0 }.evaluate(&ctx), 2.0);
        assert_relative_eq!(
            AngleOffset::ToPlayer { x_offset: 0.0, y_offset: 0.0 }.evaluate(&ctx),
            FRAC_PI_2
        );
        assert_relative_eq!(
            AngleOffset::ToPlayer { x_offset: 4.0, y_offset: 0.0 }.evaluate(&ctx),
            FRAC_PI_4
        );
        assert_relative_eq!(
            AngleOffset::ToGlobalPosition { x: -1.0, y: 1.0 }.evaluate(&ctx),
            PI
        );
        assert_eq!(AngleOffset::PlayerFacing.evaluate(&ctx), 0.25);
    }

    #[test]
    fn test_world_offsets_and_missing_player() {
        let mut ecs = EcsWorld::new();
        let enemy = ecs.world.spawn((Position(Vec2::ZERO),));
        let ctx = WorldAngleContext { world: &ecs, entity: enemy };
        assert!(AngleOffset::PlayerFacing.try_evaluate(&ctx).is_err());
        assert_eq!(AngleOffset::PlayerFacing.evaluate(&ctx), 0.0);

        ecs.world.spawn((Position(Vec2::new(0.0, -3.0)), Player, Facing(1.25)));
        let ctx = WorldAngleContext { world: &ecs, entity: enemy };
        assert_relative_eq!(
            AngleOffset::ToPlayer { x_offset: 0.0, y_offset: 0.0 }.evaluate(&ctx),
            -FRAC_PI_2
        );
        assert_eq!(AngleOffset::PlayerFacing.evaluate(&ctx), 1.25);
    }

    #[test]
    fn test_unknown_offset_tag() {
        assert!(matches!(
            AngleOffset::load("EMPAAngleOffsetSpin(1)"),
            Err(FormatError::UnknownTag { .. })
        ));
        assert!(matches!(
            AngleOffset::load("EMPAAngleOffsetConstant"),
            Err(FormatError::FieldCount { .. })
        ));
    }
}
