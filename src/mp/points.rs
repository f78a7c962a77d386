/// Pure movable points
///
/// Stationary, polar, Bezier, entity-tracking and baked-path evaluators.

use glam::Vec2;
use hecs::Entity;
use tracing::warn;

use super::{interpolate_samples, MotionError, MotionEvaluator};
use crate::ecs::EntityQuery;
use crate::tfv::{TimeFunction, Tfv};

/// Constant position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationaryMp {
    pub lifespan: f32,
    pub position: Vec2,
}

impl StationaryMp {
    pub fn new(lifespan: f32, position: Vec2) -> Self {
        Self { lifespan, position }
    }
}

impl MotionEvaluator for StationaryMp {
    fn evaluate(&self, _query: &dyn EntityQuery, _time: f32) -> Result<Vec2, MotionError> {
        Ok(self.position)
    }

    fn lifespan(&self) -> f32 {
        self.lifespan
    }
}

/// `(distance(t) cos(angle(t) + offset), distance(t) sin(angle(t) + offset))`
///
/// The offset is fixed for the point's whole life.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarMp {
    pub lifespan: f32,
    pub distance: Tfv,
    pub angle: Tfv,
    pub angle_offset: f32,
}

impl PolarMp {
    pub fn new(lifespan: f32, distance: Tfv, angle: Tfv) -> Self {
        Self {
            lifespan,
            distance,
            angle,
            angle_offset: 0.0,
        }
    }

    pub fn with_angle_offset(mut self, angle_offset: f32) -> Self {
        self.angle_offset = angle_offset;
        self
    }
}

impl MotionEvaluator for PolarMp {
    fn evaluate(&self, _query: &dyn EntityQuery, time: f32) -> Result<Vec2, MotionError> {
        let distance = self.distance.evaluate(time)?;
        let angle = self.angle.evaluate(time)? + self.angle_offset;
        Ok(Vec2::new(distance * angle.cos(), distance * angle.sin()))
    }

    fn lifespan(&self) -> f32 {
        self.lifespan
    }
}

/// Linear, quadratic or cubic Bezier curve over the lifespan
///
/// The first control point is conventionally the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierMp {
    lifespan: f32,
    control_points: Vec<Vec2>,
}

impl BezierMp {
    pub fn new(lifespan: f32, control_points: Vec<Vec2>) -> Self {
        debug_assert!(
            (2..=4).contains(&control_points.len()),
            "Bezier curves need 2 to 4 control points, got {}",
            control_points.len()
        );
        Self {
            lifespan,
            control_points,
        }
    }

    pub fn control_points(&self) -> &[Vec2] {
        &self.control_points
    }

    /// Position at normalized curve parameter `u`
    pub fn point_at(&self, u: f32) -> Vec2 {
        let mu = 1.0 - u;
        match self.control_points.as_slice() {
            [] => Vec2::ZERO,
            [p0] => *p0,
            [p0, p1] => *p0 * mu + *p1 * u,
            [p0, p1, p2] => *p0 * (mu * mu) + *p1 * (2.0 * mu * u) + *p2 * (u * u),
            [p0, p1, p2, p3] => {
                *p0 * (mu * mu * mu)
                    + *p1 * (3.0 * mu * mu * u)
                    + *p2 * (3.0 * mu * u * u)
                    + *p3 * (u * u * u)
            }
            points => de_casteljau(points, u),
        }
    }
}

fn de_casteljau(points: &[Vec2], u: f32) -> Vec2 {
    let mut work = points.to_vec();
    for level in (1..work.len()).rev() {
        for i in 0..level {
            work[i] = work[i].lerp(work[i + 1], u);
        }
    }
    work[0]
}

impl MotionEvaluator for BezierMp {
    fn evaluate(&self, _query: &dyn EntityQuery, time: f32) -> Result<Vec2, MotionError> {
        let u = if self.lifespan > 0.0 {
            time / self.lifespan
        } else {
            1.0
        };
        Ok(self.point_at(u))
    }

    fn lifespan(&self) -> f32 {
        self.lifespan
    }
}

/// Follows a live entity's hitbox center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityMp {
    pub lifespan: f32,
    pub entity: Entity,
}

impl EntityMp {
    pub fn new(lifespan: f32, entity: Entity) -> Self {
        Self { lifespan, entity }
    }
}

impl MotionEvaluator for EntityMp {
    fn evaluate(&self, query: &dyn EntityQuery, _time: f32) -> Result<Vec2, MotionError> {
        match query.hitbox_center(self.entity) {
            Ok(position) => Ok(position),
            Err(e) => {
                warn!("Tracked entity unavailable: {}", e);
                Ok(Vec2::ZERO)
            }
        }
    }

    fn lifespan(&self) -> f32 {
        self.lifespan
    }

    fn returns_global_positions(&self) -> bool {
        true
    }
}

/// Piecewise-linear path through pre-sampled `(time, position)` pairs
///
/// Used to preview motion that cannot be evaluated without live state.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledPathMp {
    lifespan: f32,
    samples: Vec<(f32, Vec2)>,
}

impl SampledPathMp {
    /// `samples` must be sorted by time
    pub fn new(lifespan: f32, samples: Vec<(f32, Vec2)>) -> Self {
        debug_assert!(samples.windows(2).all(|w| w[0].0 <= w[1].0));
        Self { lifespan, samples }
    }

    pub fn samples(&self) -> &[(f32, Vec2)] {
        &self.samples
    }
}

impl MotionEvaluator for SampledPathMp {
    fn evaluate(&self, _query: &dyn EntityQuery, time: f32) -> Result<Vec2, MotionError> {
        interpolate_samples(&self.samples, time).ok_or(MotionError::EmptyPath)
    }

    fn lifespan(&self) -> f32 {
        self.lifespan
    }
}
