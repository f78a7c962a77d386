/// Concrete movement actions
///
/// Each struct is one kind of EMPA. Executing it against the world starts a
/// motion for one object; `standalone` builds the motion an editor preview
/// would show from fixed positions instead.

use glam::Vec2;
use hecs::{Entity, World};

use super::angle_offset::{AngleContext, AngleOffset, StandaloneContext, WorldAngleContext};
use super::{ActionError, ActionExecution, MovementAction};
use crate::ecs::components::ReferenceAnchor;
use crate::ecs::hierarchy::ReferenceHierarchy;
use crate::ecs::init::{create_following_anchor, create_reference_anchor};
use crate::ecs::{EcsWorld, EntityQuery, QueryError, StaticQuery};
use crate::format::{FormatError, Record, RecordFormat, RecordWriter};
use crate::mp::{BezierMp, HomingMp, Motion, MovablePoint, PolarMp, SampledPathMp, StationaryMp};
use crate::tfv::{AngleTarget, TimeFunction, Tfv};

/// Anchor at the object's current position that follows whatever its
/// current reference follows
///
/// Relative motions start from here, so consecutive actions join up. Anchors
/// never follow other anchors; they follow the first non-anchor up the chain.
fn anchor_here(world: &mut EcsWorld, entity: Entity) -> Result<Entity, QueryError> {
    let position = world.position(entity)?;
    let follow = ReferenceHierarchy::parent(&world.world, entity).and_then(|parent| {
        if world.world.get::<&ReferenceAnchor>(parent).is_ok() {
            ReferenceHierarchy::parent(&world.world, parent)
        } else {
            Some(parent)
        }
    });
    Ok(create_following_anchor(&mut world.world, position, follow))
}

/// Re-root the object at a fresh anchor placed where it is now
///
/// Takes no time; the object stays put until the next action.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DetachFromParentEmpa;

impl MovementAction for DetachFromParentEmpa {
    fn time(&self) -> f32 {
        0.0
    }

    fn set_time(&mut self, _time: f32) {}

    fn execute(&self, world: &mut EcsWorld, entity: Entity, time_lag: f32) -> Result<ActionExecution, ActionError> {
        let position = world.position(entity)?;
        let anchor = create_reference_anchor(&mut world.world, position);
        Ok(ActionExecution {
            motion: Motion::Path(MovablePoint::Stationary(StationaryMp::new(0.0, Vec2::ZERO))),
            new_reference: Some(anchor),
            start_time: time_lag,
        })
    }

    fn standalone(&self, _ctx: &StandaloneContext, _preview_step: f32) -> Result<MovablePoint, ActionError> {
        Ok(MovablePoint::Stationary(StationaryMp::new(0.0, Vec2::ZERO)))
    }

    fn name(&self) -> &'static str {
        "Detach from parent"
    }
}

impl RecordFormat for DetachFromParentEmpa {
    const TAG: &'static str = "DetachFromParentEMPA";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        writer
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        record.expect_fields(0)?;
        Ok(Self)
    }
}

/// Hold the current relative position for `time` seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StayStillAtLastPositionEmpa {
    pub time: f32,
}

impl StayStillAtLastPositionEmpa {
    pub fn new(time: f32) -> Self {
        Self { time }
    }
}

impl MovementAction for StayStillAtLastPositionEmpa {
    fn time(&self) -> f32 {
        self.time
    }

    fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    fn execute(&self, world: &mut EcsWorld, entity: Entity, time_lag: f32) -> Result<ActionExecution, ActionError> {
        Ok(ActionExecution {
            motion: Motion::Path(MovablePoint::Stationary(StationaryMp::new(self.time, Vec2::ZERO))),
            new_reference: Some(anchor_here(world, entity)?),
            start_time: time_lag,
        })
    }

    fn standalone(&self, _ctx: &StandaloneContext, _preview_step: f32) -> Result<MovablePoint, ActionError> {
        Ok(MovablePoint::Stationary(StationaryMp::new(self.time, Vec2::ZERO)))
    }

    fn name(&self) -> &'static str {
        "Stay still"
    }
}

impl RecordFormat for StayStillAtLastPositionEmpa {
    const TAG: &'static str = "StayStillAtLastPositionEMPA";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        writer.f32(self.time)
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        record.expect_fields(1)?;
        Ok(Self::new(record.f32(0)?))
    }
}

/// Polar motion driven by distance and angle curves, rotated by an offset
#[derive(Debug, Clone, PartialEq)]
pub struct MoveCustomPolarEmpa {
    distance: Tfv,
    angle: Tfv,
    time: f32,
    angle_offset: AngleOffset,
}

impl MoveCustomPolarEmpa {
    pub fn new(distance: Tfv, angle: Tfv, time: f32, angle_offset: AngleOffset) -> Self {
        Self {
            distance,
            angle,
            time,
            angle_offset,
        }
    }

    pub fn distance(&self) -> &Tfv {
        &self.distance
    }

    pub fn angle(&self) -> &Tfv {
        &self.angle
    }

    pub fn angle_offset(&self) -> AngleOffset {
        self.angle_offset
    }

    /// Replace the distance curve, stretching it to this action's duration
    pub fn set_distance(&mut self, mut distance: Tfv) {
        distance.set_max_time(self.time);
        self.distance = distance;
    }

    pub fn set_angle(&mut self, mut angle: Tfv) {
        angle.set_max_time(self.time);
        self.angle = angle;
    }

    pub fn set_angle_offset(&mut self, angle_offset: AngleOffset) {
        self.angle_offset = angle_offset;
    }

    fn polar_mp(&self, offset: f32) -> MovablePoint {
        MovablePoint::Polar(
            PolarMp::new(self.time, self.distance.clone(), self.angle.clone()).with_angle_offset(offset),
        )
    }
}

impl MovementAction for MoveCustomPolarEmpa {
    fn time(&self) -> f32 {
        self.time
    }

    fn set_time(&mut self, time: f32) {
        self.time = time;
        self.distance.set_max_time(time);
        self.angle.set_max_time(time);
    }

    fn execute(&self, world: &mut EcsWorld, entity: Entity, time_lag: f32) -> Result<ActionExecution, ActionError> {
        let offset = self.angle_offset.evaluate(&WorldAngleContext { world, entity });
        Ok(ActionExecution {
            motion: Motion::Path(self.polar_mp(offset)),
            new_reference: Some(anchor_here(world, entity)?),
            start_time: time_lag,
        })
    }

    fn standalone(&self, ctx: &StandaloneContext, _preview_step: f32) -> Result<MovablePoint, ActionError> {
        Ok(self.polar_mp(self.angle_offset.evaluate(ctx)))
    }

    fn name(&self) -> &'static str {
        "Move (polar)"
    }
}

impl RecordFormat for MoveCustomPolarEmpa {
    const TAG: &'static str = "MoveCustomPolarEMPA";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        writer
            .nested(&self.distance)
            .nested(&self.angle)
            .f32(self.time)
            .nested(&self.angle_offset)
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        record.expect_fields(4)?;
        Ok(Self::new(
            record.nested(0)?,
            record.nested(1)?,
            record.f32(2)?,
            record.nested(3)?,
        ))
    }
}

/// Bezier motion whose control points rotate about the first point by the
/// sampled angle offset
#[derive(Debug, Clone, PartialEq)]
pub struct MoveCustomBezierEmpa {
    pub time: f32,
    unrotated_control_points: Vec<Vec2>,
    pub angle_offset: AngleOffset,
}

impl MoveCustomBezierEmpa {
    pub fn new(time: f32, unrotated_control_points: Vec<Vec2>, angle_offset: AngleOffset) -> Self {
        debug_assert!((2..=4).contains(&unrotated_control_points.len()));
        Self {
            time,
            unrotated_control_points,
            angle_offset,
        }
    }

    pub fn unrotated_control_points(&self) -> &[Vec2] {
        &self.unrotated_control_points
    }

    /// Control points after rotating by `angle` about the first one
    pub fn rotated_control_points(&self, angle: f32) -> Vec<Vec2> {
        let Some(&pivot) = self.unrotated_control_points.first() else {
            return Vec::new();
        };
        let rotation = Vec2::from_angle(angle);
        self.unrotated_control_points
            .iter()
            .map(|&p| pivot + rotation.rotate(p - pivot))
            .collect()
    }

    fn bezier_mp(&self, offset: f32) -> MovablePoint {
        MovablePoint::Bezier(BezierMp::new(self.time, self.rotated_control_points(offset)))
    }
}

impl MovementAction for MoveCustomBezierEmpa {
    fn time(&self) -> f32 {
        self.time
    }

    fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    fn execute(&self, world: &mut EcsWorld, entity: Entity, time_lag: f32) -> Result<ActionExecution, ActionError> {
        let offset = self.angle_offset.evaluate(&WorldAngleContext { world, entity });
        Ok(ActionExecution {
            motion: Motion::Path(self.bezier_mp(offset)),
            new_reference: Some(anchor_here(world, entity)?),
            start_time: time_lag,
        })
    }

    fn standalone(&self, ctx: &StandaloneContext, _preview_step: f32) -> Result<MovablePoint, ActionError> {
        Ok(self.bezier_mp(self.angle_offset.evaluate(ctx)))
    }

    fn name(&self) -> &'static str {
        "Move (Bezier)"
    }
}

/// `(time)(offset)(x0)(y0)(x1)(y1)...`
impl RecordFormat for MoveCustomBezierEmpa {
    const TAG: &'static str = "MoveCustomBezierEMPA";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        let writer = writer.f32(self.time).nested(&self.angle_offset);
        self.unrotated_control_points
            .iter()
            .fold(writer, |w, p| w.f32(p.x).f32(p.y))
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        let coordinates = record.len().saturating_sub(2);
        if record.len() < 2 || coordinates % 2 != 0 || !(2..=4).contains(&(coordinates / 2)) {
            return Err(record.invalid(format!(
                "expected time, offset and 2 to 4 control points, got {} fields",
                record.len()
            )));
        }

        let mut control_points = Vec::with_capacity(coordinates / 2);
        for i in (2..record.len()).step_by(2) {
            control_points.push(Vec2::new(record.f32(i)?, record.f32(i + 1)?));
        }
        Ok(Self::new(record.f32(0)?, control_points, record.nested(1)?))
    }
}

/// Run a homing session against a fixed target and record where it goes,
/// relative to `start`
fn bake_homing_preview(
    start: Vec2,
    target: Vec2,
    speed: &Tfv,
    homing_strength: &Tfv,
    lifespan: f32,
    step: f32,
) -> Result<SampledPathMp, ActionError> {
    if step <= 0.0 {
        return Err(ActionError::InvalidPreviewStep(step));
    }

    let mut scratch = World::new();
    let mover = scratch.spawn(());
    let mut query = StaticQuery::new().with(mover, start);
    let mut homing = HomingMp::new(
        &query,
        lifespan,
        speed.clone(),
        homing_strength.clone(),
        mover,
        AngleTarget::Point(target),
        step,
    );

    let mut samples = vec![(0.0, Vec2::ZERO)];
    let mut time = 0.0;
    while time < lifespan {
        time = (time + step).min(lifespan);
        let position = homing.compute(&query, time)?;
        query.set(mover, position);
        samples.push((time, position - start));
    }
    Ok(SampledPathMp::new(lifespan, samples))
}

fn homing_execution(
    world: &mut EcsWorld,
    entity: Entity,
    time_lag: f32,
    lifespan: f32,
    speed: &Tfv,
    homing_strength: &Tfv,
    target: AngleTarget,
) -> Result<ActionExecution, ActionError> {
    // Fail now rather than home from the origin
    world.position(entity)?;
    let homing = HomingMp::new(
        &*world,
        lifespan,
        speed.clone(),
        homing_strength.clone(),
        entity,
        target,
        world.max_physics_step,
    );
    Ok(ActionExecution {
        motion: Motion::Homing(homing),
        new_reference: None,
        start_time: time_lag,
    })
}

/// Home in on the player
#[derive(Debug, Clone, PartialEq)]
pub struct MovePlayerHomingEmpa {
    homing_strength: Tfv,
    speed: Tfv,
    time: f32,
}

impl MovePlayerHomingEmpa {
    pub fn new(homing_strength: Tfv, speed: Tfv, time: f32) -> Self {
        Self {
            homing_strength,
            speed,
            time,
        }
    }

    pub fn homing_strength(&self) -> &Tfv {
        &self.homing_strength
    }

    pub fn speed(&self) -> &Tfv {
        &self.speed
    }
}

impl MovementAction for MovePlayerHomingEmpa {
    fn time(&self) -> f32 {
        self.time
    }

    fn set_time(&mut self, time: f32) {
        self.time = time;
        self.homing_strength.set_max_time(time);
        self.speed.set_max_time(time);
    }

    fn execute(&self, world: &mut EcsWorld, entity: Entity, time_lag: f32) -> Result<ActionExecution, ActionError> {
        let player = world.player()?;
        homing_execution(
            world,
            entity,
            time_lag,
            self.time,
            &self.speed,
            &self.homing_strength,
            AngleTarget::Entity(player),
        )
    }

    fn standalone(&self, ctx: &StandaloneContext, preview_step: f32) -> Result<MovablePoint, ActionError> {
        let start = ctx.evaluator_position()?;
        let target = ctx.player_position()?;
        bake_homing_preview(start, target, &self.speed, &self.homing_strength, self.time, preview_step)
            .map(MovablePoint::Sampled)
    }

    fn name(&self) -> &'static str {
        "Home in on player"
    }
}

impl RecordFormat for MovePlayerHomingEmpa {
    const TAG: &'static str = "MovePlayerHomingEMPA";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        writer
            .nested(&self.homing_strength)
            .nested(&self.speed)
            .f32(self.time)
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        record.expect_fields(3)?;
        Ok(Self::new(record.nested(0)?, record.nested(1)?, record.f32(2)?))
    }
}

/// Home in on a fixed world position
#[derive(Debug, Clone, PartialEq)]
pub struct MoveGlobalHomingEmpa {
    homing_strength: Tfv,
    speed: Tfv,
    time: f32,
    pub target: Vec2,
}

impl MoveGlobalHomingEmpa {
    pub fn new(homing_strength: Tfv, speed: Tfv, time: f32, target: Vec2) -> Self {
        Self {
            homing_strength,
            speed,
            time,
            target,
        }
    }

    pub fn homing_strength(&self) -> &Tfv {
        &self.homing_strength
    }

    pub fn speed(&self) -> &Tfv {
        &self.speed
    }
}

impl MovementAction for MoveGlobalHomingEmpa {
    fn time(&self) -> f32 {
        self.time
    }

    fn set_time(&mut self, time: f32) {
        self.time = time;
        self.homing_strength.set_max_time(time);
        self.speed.set_max_time(time);
    }

    fn execute(&self, world: &mut EcsWorld, entity: Entity, time_lag: f32) -> Result<ActionExecution, ActionError> {
        homing_execution(
            world,
            entity,
            time_lag,
            self.time,
            &self.speed,
            &self.homing_strength,
            AngleTarget::Point(self.target),
        )
    }

    fn standalone(&self, ctx: &StandaloneContext, preview_step: f32) -> Result<MovablePoint, ActionError> {
        let start = ctx.evaluator_position()?;
        bake_homing_preview(start, self.target, &self.speed, &self.homing_strength, self.time, preview_step)
            .map(MovablePoint::Sampled)
    }

    fn name(&self) -> &'static str {
        "Home in on position"
    }
}

impl RecordFormat for MoveGlobalHomingEmpa {
    const TAG: &'static str = "MoveGlobalHomingEMPA";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        writer
            .nested(&self.homing_strength)
            .nested(&self.speed)
            .f32(self.time)
            .f32(self.target.x)
            .f32(self.target.y)
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        record.expect_fields(5)?;
        Ok(Self::new(
            record.nested(0)?,
            record.nested(1)?,
            record.f32(2)?,
            Vec2::new(record.f32(3)?, record.f32(4)?),
        ))
    }
}
