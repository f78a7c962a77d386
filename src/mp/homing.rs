/// Homing motion session
///
/// Homing is not a function of time: each step turns toward wherever the
/// target is now, starting from wherever the homing entity is now. The session
/// therefore carries state and needs `&mut self` to advance. It keeps about one
/// max physics step of history so the scheduler can ask for slightly past
/// positions to make up for lag.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use hecs::Entity;
use tracing::warn;

use super::{interpolate_samples, MotionError};
use crate::ecs::EntityQuery;
use crate::tfv::{AngleTarget, CurrentAngleTfv, TimeFunction, Tfv};

/// Interpolate from angle `from` toward `to` along the shorter arc
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let mut delta = (to - from).rem_euclid(TAU);
    if delta > PI {
        delta -= TAU;
    }
    (from + delta * t).rem_euclid(TAU)
}

/// Not `Clone`: a session belongs to exactly one moving object
#[derive(Debug)]
pub struct HomingMp {
    lifespan: f32,
    speed: Tfv,
    homing_strength: Tfv,
    from: Entity,
    current_angle: CurrentAngleTfv,
    max_step: f32,

    last_evaluated_time: f32,
    prev_angle: f32,
    cache: Vec<(f32, Vec2)>,
}

impl HomingMp {
    /// Start a session with the angle toward the target sampled now
    pub fn new(
        query: &dyn EntityQuery,
        lifespan: f32,
        speed: Tfv,
        homing_strength: Tfv,
        from: Entity,
        target: AngleTarget,
        max_step: f32,
    ) -> Self {
        let mut current_angle = CurrentAngleTfv::new(from, target);
        let prev_angle = current_angle.evaluate(query);

        let mut cache = Vec::new();
        match query.position(from) {
            Ok(position) => cache.push((0.0, position)),
            Err(e) => warn!("Homing entity unavailable at start: {}", e),
        }

        Self {
            lifespan,
            speed,
            homing_strength,
            from,
            current_angle,
            max_step,
            last_evaluated_time: 0.0,
            prev_angle,
            cache,
        }
    }

    pub fn lifespan(&self) -> f32 {
        self.lifespan
    }

    pub fn from_entity(&self) -> Entity {
        self.from
    }

    pub fn last_evaluated_time(&self) -> f32 {
        self.last_evaluated_time
    }

    /// Angle used on the most recent step
    pub fn prev_angle(&self) -> f32 {
        self.prev_angle
    }

    /// Cached `(time, position)` history, oldest first
    pub fn cached(&self) -> &[(f32, Vec2)] {
        &self.cache
    }

    /// Absolute position at `time`
    ///
    /// Later times advance the simulation by one step. Earlier times are
    /// answered from the cache and fail once they fall outside it.
    pub fn compute(&mut self, query: &dyn EntityQuery, time: f32) -> Result<Vec2, MotionError> {
        let delta_time = time - self.last_evaluated_time;

        if delta_time > 0.0 {
            self.step(query, time, delta_time)
        } else if delta_time < 0.0 {
            self.replay(time)
        } else {
            Ok(self.from_position(query).unwrap_or(Vec2::ZERO))
        }
    }

    fn step(&mut self, query: &dyn EntityQuery, time: f32, delta_time: f32) -> Result<Vec2, MotionError> {
        let Some(from_position) = self.from_position(query) else {
            return Ok(Vec2::ZERO);
        };

        // Curves first: a failed evaluation leaves the session untouched
        let strength = self.homing_strength.evaluate(time)?.clamp(0.0, 1.0);
        let speed = self.speed.evaluate(time)?;
        let target_angle = self.current_angle.evaluate(query);
        let radians = lerp_angle(self.prev_angle, target_angle, strength);

        // Keep the newest sample even if it is older than the window, so the
        // step being added always has a left neighbour to interpolate from
        let horizon = time - self.max_step;
        let stale = self
            .cache
            .iter()
            .take(self.cache.len().saturating_sub(1))
            .take_while(|(t, _)| *t < horizon)
            .count();
        self.cache.drain(..stale);

        let new_position = from_position + Vec2::new(radians.cos(), radians.sin()) * speed * delta_time;

        self.cache.push((time, new_position));
        self.prev_angle = radians;
        self.last_evaluated_time = time;
        Ok(new_position)
    }

    fn replay(&self, time: f32) -> Result<Vec2, MotionError> {
        let oldest = match self.cache.first() {
            Some((t, _)) => *t,
            None => {
                return Err(MotionError::BeyondCacheWindow {
                    time,
                    oldest: self.last_evaluated_time,
                })
            }
        };
        if time < oldest {
            return Err(MotionError::BeyondCacheWindow { time, oldest });
        }
        interpolate_samples(&self.cache, time).ok_or(MotionError::EmptyPath)
    }

    fn from_position(&self, query: &dyn EntityQuery) -> Option<Vec2> {
        match query.position(self.from) {
            Ok(position) => Some(position),
            Err(e) => {
                warn!("Homing entity unavailable: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::StaticQuery;
    use crate::tfv::PiecewiseTfv;
    use approx::assert_relative_eq;
    use hecs::World;
    use std::f32::consts::FRAC_PI_2;

    const STEP: f32 = 1.0 / 120.0;

    fn setup() -> (Entity, Entity, StaticQuery) {
        let mut world = World::new();
        let bullet = world.spawn(());
        let player = world.spawn(());
        let query = StaticQuery::new()
            .with(bullet, Vec2::ZERO)
            .with(player, Vec2::new(0.0, 100.0));
        (bullet, player, query)
    }

    #[test]
    fn test_lerp_angle_takes_short_way() {
        assert_relative_eq!(lerp_angle(0.2, TAU - 0.2, 0.25), 0.1, epsilon = 1e-5);
        assert_relative_eq!(lerp_angle(0.0, FRAC_PI_2, 0.5), FRAC_PI_2 / 2.0);
        assert_relative_eq!(lerp_angle(1.0, 2.0, 1.0), 2.0);
    }

    #[test]
    fn test_full_strength_heads_straight_at_target() {
        let (bullet, player, mut query) = setup();
        let mut homing = HomingMp::new(
            &query,
            5.0,
            Tfv::constant(120.0),
            Tfv::constant(1.0),
            bullet,
            AngleTarget::Entity(player),
            STEP,
        );

        let position = homing.compute(&query, STEP).unwrap();
        assert_relative_eq!(position.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(position.y, 1.0, epsilon = 1e-4);

        query.set(bullet, position);
        let position = homing.compute(&query, 2.0 * STEP).unwrap();
        assert_relative_eq!(position.y, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_same_time_returns_current_entity_position() {
        let (bullet, player, mut query) = setup();
        let mut homing = HomingMp::new(
            &query,
            5.0,
            Tfv::constant(10.0),
            Tfv::constant(0.5),
            bullet,
            AngleTarget::Entity(player),
            STEP,
        );
        query.set(bullet, Vec2::new(4.0, 4.0));
        assert_eq!(homing.compute(&query, 0.0).unwrap(), Vec2::new(4.0, 4.0));
    }

    #[test]
    fn test_past_query_interpolates_between_cached_samples() {
        let (bullet, player, mut query) = setup();
        let mut homing = HomingMp::new(
            &query,
            5.0,
            Tfv::constant(120.0),
            Tfv::constant(1.0),
            bullet,
            AngleTarget::Entity(player),
            STEP,
        );

        let first = homing.compute(&query, STEP).unwrap();
        query.set(bullet, first);
        let second = homing.compute(&query, 2.0 * STEP).unwrap();

        assert_eq!(homing.compute(&query, STEP).unwrap(), first);

        let halfway = homing.compute(&query, 1.5 * STEP).unwrap();
        assert_relative_eq!(halfway.x, (first.x + second.x) / 2.0, epsilon = 1e-5);
        assert_relative_eq!(halfway.y, (first.y + second.y) / 2.0, epsilon = 1e-5);

        // Replay does not advance the session
        assert_eq!(homing.last_evaluated_time(), 2.0 * STEP);
    }

    #[test]
    fn test_query_older_than_cache_window_fails() {
        let (bullet, player, mut query) = setup();
        let mut homing = HomingMp::new(
            &query,
            5.0,
            Tfv::constant(60.0),
            Tfv::constant(1.0),
            bullet,
            AngleTarget::Entity(player),
            STEP,
        );

        let mut time = 0.0;
        for _ in 0..10 {
            time += STEP;
            let position = homing.compute(&query, time).unwrap();
            query.set(bullet, position);
        }

        assert!(homing.cached().len() <= 3);
        assert!(matches!(
            homing.compute(&query, 0.0),
            Err(MotionError::BeyondCacheWindow { .. })
        ));
    }

    #[test]
    fn test_partial_strength_turns_gradually() {
        let (bullet, player, mut query) = setup();
        query.set(player, Vec2::new(100.0, 0.0));
        let mut homing = HomingMp::new(
            &query,
            5.0,
            Tfv::constant(60.0),
            Tfv::constant(0.5),
            bullet,
            AngleTarget::Entity(player),
            STEP,
        );
        assert_relative_eq!(homing.prev_angle(), 0.0);

        // Target jumps a quarter turn; half strength covers half of it
        query.set(player, Vec2::new(0.0, 100.0));
        homing.compute(&query, STEP).unwrap();
        assert_relative_eq!(homing.prev_angle(), FRAC_PI_2 / 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_missing_homing_entity_yields_zero() {
        let (bullet, player, mut query) = setup();
        let mut homing = HomingMp::new(
            &query,
            5.0,
            Tfv::constant(60.0),
            Tfv::constant(1.0),
            bullet,
            AngleTarget::Entity(player),
            STEP,
        );
        query.remove(bullet);
        assert_eq!(homing.compute(&query, STEP).unwrap(), Vec2::ZERO);
    }

    #[test]
    fn test_failed_curve_keeps_cache_and_clock() {
        let (bullet, player, mut query) = setup();
        let mut homing = HomingMp::new(
            &query,
            5.0,
            Tfv::constant(60.0),
            Tfv::constant(1.0),
            bullet,
            AngleTarget::Entity(player),
            STEP,
        );

        let mut time = 0.0;
        for _ in 0..3 {
            time += STEP;
            let position = homing.compute(&query, time).unwrap();
            query.set(bullet, position);
        }
        let cached = homing.cached().to_vec();

        homing.speed = Tfv::Piecewise(PiecewiseTfv::new());
        assert!(homing.compute(&query, time + 5.0 * STEP).is_err());
        assert_eq!(homing.cached(), cached.as_slice());
        assert_eq!(homing.last_evaluated_time(), time);
    }
}
