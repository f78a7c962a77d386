/// Movable points (MPs)
///
/// 2D position as a function of time, optionally relative to a moving
/// origin. `MovablePoint` covers the pure evaluators; `HomingMp` is a stateful
/// session and only reachable through `Motion`.

pub mod aggregator;
pub mod homing;
pub mod points;

pub use aggregator::AggregatorMp;
pub use homing::{lerp_angle, HomingMp};
pub use points::{BezierMp, EntityMp, PolarMp, SampledPathMp, StationaryMp};

use glam::Vec2;
use thiserror::Error;

use crate::ecs::EntityQuery;
use crate::tfv::TfvError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    #[error(transparent)]
    Tfv(#[from] TfvError),

    #[error("aggregator has no children")]
    EmptyAggregator,

    #[error("sampled path has no samples")]
    EmptyPath,

    #[error("time {time} is older than the oldest cached homing sample at {oldest}")]
    BeyondCacheWindow { time: f32, oldest: f32 },
}

/// A pure 2D position evaluator
pub trait MotionEvaluator {
    /// Raw evaluator output: relative to the origin, or absolute if
    /// `returns_global_positions`
    fn evaluate(&self, query: &dyn EntityQuery, time: f32) -> Result<Vec2, MotionError>;

    fn lifespan(&self) -> f32;

    fn returns_global_positions(&self) -> bool {
        false
    }

    fn compute(&self, query: &dyn EntityQuery, origin: Vec2, time: f32) -> Result<Vec2, MotionError> {
        let position = self.evaluate(query, time)?;
        if self.returns_global_positions() {
            Ok(position)
        } else {
            Ok(origin + position)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MovablePoint {
    Stationary(StationaryMp),
    Polar(PolarMp),
    Bezier(BezierMp),
    Aggregator(AggregatorMp),
    Entity(EntityMp),
    Sampled(SampledPathMp),
}

impl MovablePoint {
    fn as_evaluator(&self) -> &dyn MotionEvaluator {
        match self {
            MovablePoint::Stationary(mp) => mp,
            MovablePoint::Polar(mp) => mp,
            MovablePoint::Bezier(mp) => mp,
            MovablePoint::Aggregator(mp) => mp,
            MovablePoint::Entity(mp) => mp,
            MovablePoint::Sampled(mp) => mp,
        }
    }
}

impl MotionEvaluator for MovablePoint {
    fn evaluate(&self, query: &dyn EntityQuery, time: f32) -> Result<Vec2, MotionError> {
        self.as_evaluator().evaluate(query, time)
    }

    fn lifespan(&self) -> f32 {
        self.as_evaluator().lifespan()
    }

    fn returns_global_positions(&self) -> bool {
        self.as_evaluator().returns_global_positions()
    }
}

/// The live motion of one object for one action activation
#[derive(Debug)]
pub enum Motion {
    Path(MovablePoint),
    Homing(HomingMp),
}

impl Motion {
    /// Absolute position at `time` given the reference entity's position
    pub fn compute(&mut self, query: &dyn EntityQuery, origin: Vec2, time: f32) -> Result<Vec2, MotionError> {
        match self {
            Motion::Path(mp) => mp.compute(query, origin, time),
            Motion::Homing(homing) => homing.compute(query, time),
        }
    }

    pub fn lifespan(&self) -> f32 {
        match self {
            Motion::Path(mp) => mp.lifespan(),
            Motion::Homing(homing) => homing.lifespan(),
        }
    }

    pub fn returns_global_positions(&self) -> bool {
        match self {
            Motion::Path(mp) => mp.returns_global_positions(),
            Motion::Homing(_) => true,
        }
    }

    pub fn as_path(&self) -> Option<&MovablePoint> {
        match self {
            Motion::Path(mp) => Some(mp),
            Motion::Homing(_) => None,
        }
    }
}

impl From<MovablePoint> for Motion {
    fn from(mp: MovablePoint) -> Self {
        Motion::Path(mp)
    }
}

/// Linear interpolation through time-sorted samples, clamped at both ends.
/// Exact sample times return the stored value untouched; a NaN time gives
/// the first sample.
pub(crate) fn interpolate_samples(samples: &[(f32, Vec2)], time: f32) -> Option<Vec2> {
    let (first, last) = (samples.first()?, samples.last()?);
    if time.is_nan() || time <= first.0 {
        return Some(first.1);
    }
    if time >= last.0 {
        return Some(last.1);
    }

    let i = samples.partition_point(|(t, _)| *t <= time);
    let (Some(&(t0, p0)), Some(&(t1, p1))) = (samples.get(i.wrapping_sub(1)), samples.get(i)) else {
        return Some(if i == 0 { first.1 } else { last.1 });
    };
    if t0 == time {
        return Some(p0);
    }
    Some(p0.lerp(p1, (time - t0) / (t1 - t0)))
}
