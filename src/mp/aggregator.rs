/// Sequential composition of movable points
///
/// Children play back to back. `min_times[i]` is the time child `i` starts,
/// i.e. the sum of the lifespans before it.

use glam::Vec2;

use super::{MotionError, MotionEvaluator, MovablePoint};
use crate::ecs::EntityQuery;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregatorMp {
    children: Vec<MovablePoint>,
    min_times: Vec<f32>,
    lifespan: f32,
}

impl AggregatorMp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_children(children: impl IntoIterator<Item = MovablePoint>) -> Self {
        let mut aggregator = Self::new();
        for child in children {
            aggregator.push_back(child);
        }
        aggregator
    }

    pub fn push_back(&mut self, child: MovablePoint) {
        self.children.push(child);
        self.recompute_times();
    }

    pub fn clear(&mut self) {
        self.children.clear();
        self.recompute_times();
    }

    pub fn children(&self) -> &[MovablePoint] {
        &self.children
    }

    pub fn min_times(&self) -> &[f32] {
        &self.min_times
    }

    fn recompute_times(&mut self) {
        self.min_times.clear();
        let mut total = 0.0;
        for child in &self.children {
            self.min_times.push(total);
            total += child.lifespan();
        }
        self.lifespan = total;
    }

    /// Index of the child active at `time`
    ///
    /// Times before the first child clamp to the first child.
    fn active_child(&self, time: f32) -> Option<usize> {
        if self.children.is_empty() {
            return None;
        }
        Some(
            self.min_times
                .iter()
                .rposition(|&start| start <= time)
                .unwrap_or(0),
        )
    }
}

impl MotionEvaluator for AggregatorMp {
    fn evaluate(&self, query: &dyn EntityQuery, time: f32) -> Result<Vec2, MotionError> {
        let index = self.active_child(time).ok_or(MotionError::EmptyAggregator)?;
        let local_time = (time - self.min_times[index]).max(0.0);
        self.children[index].compute(query, Vec2::ZERO, local_time)
    }

    fn lifespan(&self) -> f32 {
        self.lifespan
    }
}
