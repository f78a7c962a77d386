/// Enemy movable-point actions (EMPAs)
///
/// An EMPA is one authored step of an object's movement. Running it against
/// the world produces the `Motion` the object follows for the step, and
/// possibly a new reference entity to move relative to.

pub mod angle_offset;
pub mod moves;

pub use angle_offset::{AngleContext, AngleOffset, StandaloneContext, WorldAngleContext};
pub use moves::{
    DetachFromParentEmpa, MoveCustomBezierEmpa, MoveCustomPolarEmpa, MoveGlobalHomingEmpa, MovePlayerHomingEmpa,
    StayStillAtLastPositionEmpa,
};

use glam::Vec2;
use hecs::Entity;
use thiserror::Error;

use crate::config::KinematicsConfig;
use crate::ecs::{EcsWorld, QueryError};
use crate::format::{FormatError, Record, RecordFormat, TextFormat};
use crate::mp::{MotionError, MotionEvaluator, Motion, MovablePoint, SampledPathMp};
use crate::tfv::TfvError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Motion(#[from] MotionError),

    #[error(transparent)]
    Tfv(#[from] TfvError),

    #[error("preview step must be positive, got {0}")]
    InvalidPreviewStep(f32),
}

/// The result of starting an action on one object
#[derive(Debug)]
pub struct ActionExecution {
    pub motion: Motion,
    /// Entity the object should move relative to from now on, if it changed
    pub new_reference: Option<Entity>,
    /// Local time the motion starts at, to absorb scheduling lag
    pub start_time: f32,
}

pub trait MovementAction {
    /// Duration in seconds
    fn time(&self) -> f32;

    /// Change the duration, stretching any owned curves to match
    fn set_time(&mut self, time: f32);

    fn execute(&self, world: &mut EcsWorld, entity: Entity, time_lag: f32) -> Result<ActionExecution, ActionError>;

    /// The motion a preview would show, from fixed positions
    fn standalone(&self, ctx: &StandaloneContext, preview_step: f32) -> Result<MovablePoint, ActionError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmpAction {
    DetachFromParent(DetachFromParentEmpa),
    StayStillAtLastPosition(StayStillAtLastPositionEmpa),
    MoveCustomPolar(MoveCustomPolarEmpa),
    MoveCustomBezier(MoveCustomBezierEmpa),
    MovePlayerHoming(MovePlayerHomingEmpa),
    MoveGlobalHoming(MoveGlobalHomingEmpa),
}

impl EmpAction {
    fn as_action(&self) -> &dyn MovementAction {
        match self {
            EmpAction::DetachFromParent(a) => a,
            EmpAction::StayStillAtLastPosition(a) => a,
            EmpAction::MoveCustomPolar(a) => a,
            EmpAction::MoveCustomBezier(a) => a,
            EmpAction::MovePlayerHoming(a) => a,
            EmpAction::MoveGlobalHoming(a) => a,
        }
    }

    fn as_action_mut(&mut self) -> &mut dyn MovementAction {
        match self {
            EmpAction::DetachFromParent(a) => a,
            EmpAction::StayStillAtLastPosition(a) => a,
            EmpAction::MoveCustomPolar(a) => a,
            EmpAction::MoveCustomBezier(a) => a,
            EmpAction::MovePlayerHoming(a) => a,
            EmpAction::MoveGlobalHoming(a) => a,
        }
    }

    /// Preview motion starting at `(x, y)` with the player at `(player_x, player_y)`,
    /// using default facing and preview step
    pub fn generate_standalone_mp(
        &self,
        x: f32,
        y: f32,
        player_x: f32,
        player_y: f32,
    ) -> Result<MovablePoint, ActionError> {
        let config = KinematicsConfig::default();
        let ctx = StandaloneContext::new(
            Vec2::new(x, y),
            Vec2::new(player_x, player_y),
            config.default_player_facing,
        );
        self.standalone(&ctx, config.preview_step)
    }
}

impl MovementAction for EmpAction {
    fn time(&self) -> f32 {
        self.as_action().time()
    }

    fn set_time(&mut self, time: f32) {
        self.as_action_mut().set_time(time)
    }

    fn execute(&self, world: &mut EcsWorld, entity: Entity, time_lag: f32) -> Result<ActionExecution, ActionError> {
        self.as_action().execute(world, entity, time_lag)
    }

    fn standalone(&self, ctx: &StandaloneContext, preview_step: f32) -> Result<MovablePoint, ActionError> {
        self.as_action().standalone(ctx, preview_step)
    }

    fn name(&self) -> &'static str {
        self.as_action().name()
    }
}

impl TextFormat for EmpAction {
    fn format(&self) -> String {
        match self {
            EmpAction::DetachFromParent(a) => a.format(),
            EmpAction::StayStillAtLastPosition(a) => a.format(),
            EmpAction::MoveCustomPolar(a) => a.format(),
            EmpAction::MoveCustomBezier(a) => a.format(),
            EmpAction::MovePlayerHoming(a) => a.format(),
            EmpAction::MoveGlobalHoming(a) => a.format(),
        }
    }

    fn load(text: &str) -> Result<Self, FormatError> {
        let record = Record::parse(text)?;
        Ok(match record.tag() {
            DetachFromParentEmpa::TAG => EmpAction::DetachFromParent(DetachFromParentEmpa::read_fields(&record)?),
            StayStillAtLastPositionEmpa::TAG => {
                EmpAction::StayStillAtLastPosition(StayStillAtLastPositionEmpa::read_fields(&record)?)
            }
            MoveCustomPolarEmpa::TAG => EmpAction::MoveCustomPolar(MoveCustomPolarEmpa::read_fields(&record)?),
            MoveCustomBezierEmpa::TAG => EmpAction::MoveCustomBezier(MoveCustomBezierEmpa::read_fields(&record)?),
            MovePlayerHomingEmpa::TAG => EmpAction::MovePlayerHoming(MovePlayerHomingEmpa::read_fields(&record)?),
            MoveGlobalHomingEmpa::TAG => EmpAction::MoveGlobalHoming(MoveGlobalHomingEmpa::read_fields(&record)?),
            other => {
                return Err(FormatError::UnknownTag {
                    family: "EMPA",
                    tag: other.to_string(),
                })
            }
        })
    }
}

/// Combined duration of a sequence of actions
pub fn total_time(actions: &[EmpAction]) -> f32 {
    actions.iter().map(|a| a.time()).sum()
}

/// Bake the path an object starting at `ctx.position` would follow through
/// `actions`, relative to that start
///
/// Each action picks up where the previous one ended.
pub fn preview_path(
    actions: &[EmpAction],
    ctx: &StandaloneContext,
    preview_step: f32,
) -> Result<SampledPathMp, ActionError> {
    if preview_step <= 0.0 {
        return Err(ActionError::InvalidPreviewStep(preview_step));
    }

    let query = crate::ecs::StaticQuery::new();
    let mut samples = vec![(0.0, Vec2::ZERO)];
    let mut start_time = 0.0;
    let mut position = ctx.position;

    for action in actions {
        let action_ctx = StandaloneContext { position, ..*ctx };
        let mp = action.standalone(&action_ctx, preview_step)?;
        let duration = action.time();

        let mut local = 0.0;
        while local < duration {
            local = (local + preview_step).min(duration);
            let sample = mp.compute(&query, position, local)?;
            samples.push((start_time + local, sample - ctx.position));
        }

        position = mp.compute(&query, position, duration)?;
        start_time += duration;
    }

    Ok(SampledPathMp::new(start_time, samples))
}

impl From<DetachFromParentEmpa> for EmpAction {
    fn from(a: DetachFromParentEmpa) -> Self {
        EmpAction::DetachFromParent(a)
    }
}

impl From<StayStillAtLastPositionEmpa> for EmpAction {
    fn from(a: StayStillAtLastPositionEmpa) -> Self {
        EmpAction::StayStillAtLastPosition(a)
    }
}

impl From<MoveCustomPolarEmpa> for EmpAction {
    fn from(a: MoveCustomPolarEmpa) -> Self {
        EmpAction::MoveCustomPolar(a)
    }
}

impl From<MoveCustomBezierEmpa> for EmpAction {
    fn from(a: MoveCustomBezierEmpa) -> Self {
        EmpAction::MoveCustomBezier(a)
    }
}

impl From<MovePlayerHomingEmpa> for EmpAction {
    fn from(a: MovePlayerHomingEmpa) -> Self {
        EmpAction::MovePlayerHoming(a)
    }
}

impl From<MoveGlobalHomingEmpa> for EmpAction {
    fn from(a: MoveGlobalHomingEmpa) -> Self {
        EmpAction::MoveGlobalHoming(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::StaticQuery;
    use crate::tfv::Tfv;
    use approx::assert_relative_eq;

    fn sequence() -> Vec<EmpAction> {
        vec![
            MoveCustomPolarEmpa::new(Tfv::linear(0.0, 4.0, 1.0), Tfv::constant(0.0), 1.0, AngleOffset::Zero).into(),
            StayStillAtLastPositionEmpa::new(0.5).into(),
            DetachFromParentEmpa.into(),
            MoveCustomBezierEmpa::new(1.0, vec![Vec2::ZERO, Vec2::new(0.0, 2.0)], AngleOffset::Zero).into(),
        ]
    }

    #[test]
    fn test_total_time() {
        assert_eq!(total_time(&sequence()), 2.5);
        assert_eq!(total_time(&[]), 0.0);
    }

    #[test]
    fn test_set_time_through_enum() {
        let mut action: EmpAction = StayStillAtLastPositionEmpa::new(1.0).into();
        action.set_time(3.0);
        assert_eq!(action.time(), 3.0);
        assert_eq!(action.name(), "Stay still");
    }

    #[test]
    fn test_generate_standalone_mp_is_relative() {
        let action: EmpAction =
            MoveCustomPolarEmpa::new(Tfv::constant(3.0), Tfv::constant(0.0), 1.0, AngleOffset::Zero).into();
        let mp = action.generate_standalone_mp(100.0, 100.0, 0.0, 0.0).unwrap();
        assert_eq!(mp.evaluate(&StaticQuery::new(), 0.5).unwrap(), Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_preview_path_chains_actions() {
        let ctx = StandaloneContext::new(Vec2::new(10.0, 10.0), Vec2::ZERO, 0.0);
        let path = preview_path(&sequence(), &ctx, 0.25).unwrap();
        let query = StaticQuery::new();

        assert_eq!(path.lifespan(), 2.5);
        assert_relative_eq!(path.evaluate(&query, 1.0).unwrap().x, 4.0);
        assert_relative_eq!(path.evaluate(&query, 1.25).unwrap().x, 4.0);
        let end = path.evaluate(&query, 2.5).unwrap();
        assert_relative_eq!(end.x, 4.0);
        assert_relative_eq!(end.y, 2.0);
    }

    #[test]
    fn test_unknown_action_tag() {
        assert!(matches!(
            EmpAction::load("TeleportEMPA(1)"),
            Err(FormatError::UnknownTag { family: "EMPA", .. })
        ));
    }
}
