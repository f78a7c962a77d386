/// Movement system for scripted objects
///
/// Each moving object carries a `MovementPath`: the list of actions it plays
/// through in order. `update_movement_paths` advances every path by one frame
/// and writes the resulting absolute position back to the object.

use glam::Vec2;
use hecs::{Entity, World};
use tracing::{debug, warn};

use crate::action::{self, ActionExecution, EmpAction, MovementAction};
use crate::ecs::components::{AnchorOffset, Children, ReferenceAnchor};
use crate::ecs::hierarchy::ReferenceHierarchy;
use crate::ecs::{EcsWorld, EntityQuery};
use crate::mp::{Motion, MovablePoint, StationaryMp};

#[derive(Debug)]
pub enum PathState {
    /// Attached but not started
    Idle,
    Executing {
        index: usize,
        motion: Motion,
        /// Local time within the current action
        clock: f32,
    },
    /// Every action has run; the object keeps its last position
    Finished,
}

/// Per-object action sequencer
#[derive(Debug)]
pub struct MovementPath {
    actions: Vec<EmpAction>,
    state: PathState,
}

impl MovementPath {
    pub fn new(actions: Vec<EmpAction>) -> Self {
        Self {
            actions,
            state: PathState::Idle,
        }
    }

    pub fn actions(&self) -> &[EmpAction] {
        &self.actions
    }

    pub fn state(&self) -> &PathState {
        &self.state
    }

    /// Index of the running action
    pub fn current_action(&self) -> Option<usize> {
        match self.state {
            PathState::Executing { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, PathState::Finished)
    }

    pub fn total_time(&self) -> f32 {
        action::total_time(&self.actions)
    }

    /// Advance by `dt` seconds and write the object's new position
    ///
    /// Actions that end mid-frame hand the leftover time to the next one as
    /// its start lag.
    pub fn advance(&mut self, ecs: &mut EcsWorld, entity: Entity, dt: f32) {
        if matches!(self.state, PathState::Idle) {
            self.begin(ecs, entity, 0, 0.0);
        }
        if let PathState::Executing { clock, .. } = &mut self.state {
            *clock += dt;
        }

        self.settle(ecs, entity);

        if let PathState::Executing { motion, clock, .. } = &mut self.state {
            write_position(ecs, entity, motion, *clock);
        }
    }

    /// Hand off every action whose clock has run out
    fn settle(&mut self, ecs: &mut EcsWorld, entity: Entity) {
        loop {
            let (index, overflow) = match &mut self.state {
                PathState::Executing { index, motion, clock } if *clock >= motion.lifespan() => {
                    let end = motion.lifespan();
                    // Land exactly on the end point before the next action reads it
                    write_position(ecs, entity, motion, end);
                    (*index, *clock - end)
                }
                _ => return,
            };
            self.begin(ecs, entity, index + 1, overflow);
        }
    }

    fn begin(&mut self, ecs: &mut EcsWorld, entity: Entity, index: usize, lag: f32) {
        let Some(action) = self.actions.get(index) else {
            debug!("Movement path of {:?} finished", entity);
            self.state = PathState::Finished;
            return;
        };

        let execution = match action.execute(ecs, entity, lag) {
            Ok(execution) => execution,
            Err(e) => {
                warn!(
                    "Action {} ({}) failed to start on {:?}: {}, holding position",
                    index,
                    action.name(),
                    entity,
                    e
                );
                hold_position(ecs, entity, action.time(), lag)
            }
        };

        if let Some(reference) = execution.new_reference {
            let previous = ReferenceHierarchy::parent(&ecs.world, entity);
            ReferenceHierarchy::reparent(&mut ecs.world, entity, reference);
            if let Some(previous) = previous.filter(|&p| p != reference) {
                release_anchor(&mut ecs.world, previous);
            }
        }

        debug!(
            "{:?} starting action {} ({}) with lag {}",
            entity,
            index,
            action.name(),
            lag
        );
        self.state = PathState::Executing {
            index,
            motion: execution.motion,
            clock: execution.start_time,
        };
    }
}

fn hold_position(ecs: &EcsWorld, entity: Entity, time: f32, lag: f32) -> ActionExecution {
    let relative = ecs.position(entity).unwrap_or(Vec2::ZERO) - reference_origin(ecs, entity);
    ActionExecution {
        motion: Motion::Path(MovablePoint::Stationary(StationaryMp::new(time, relative))),
        new_reference: None,
        start_time: lag,
    }
}

/// Position of the entity an object moves relative to; the world origin if none
pub fn reference_origin(ecs: &EcsWorld, entity: Entity) -> Vec2 {
    ReferenceHierarchy::parent(&ecs.world, entity)
        .and_then(|parent| ecs.position(parent).ok())
        .unwrap_or(Vec2::ZERO)
}

/// Move a following anchor to keep its offset from the entity it follows
///
/// If that entity is gone the anchor stays where it last was.
fn follow_reference(ecs: &mut EcsWorld, anchor: Entity) {
    let Ok(offset) = ecs.world.get::<&AnchorOffset>(anchor).map(|o| o.0) else {
        return;
    };
    let Some(target) = ReferenceHierarchy::parent(&ecs.world, anchor) else {
        return;
    };
    match ecs.position(target) {
        Ok(position) => {
            let _ = ecs.set_position(anchor, position + offset);
        }
        Err(e) => warn!("Anchor {:?} lost the entity it follows: {}", anchor, e),
    }
}

fn write_position(ecs: &mut EcsWorld, entity: Entity, motion: &mut Motion, time: f32) {
    if let Some(reference) = ReferenceHierarchy::parent(&ecs.world, entity) {
        follow_reference(ecs, reference);
    }
    let origin = reference_origin(ecs, entity);
    match motion.compute(&*ecs, origin, time) {
        Ok(position) => {
            if let Err(e) = ecs.set_position(entity, position) {
                warn!("Cannot move {:?}: {}", entity, e);
            }
        }
        Err(e) => warn!("Motion of {:?} failed at t={}: {}", entity, time, e),
    }
}

/// Despawn an anchor nobody follows anymore
fn release_anchor(world: &mut World, anchor: Entity) {
    if world.get::<&ReferenceAnchor>(anchor).is_err() {
        return;
    }
    let orphaned = world
        .get::<&Children>(anchor)
        .map(|children| children.0.is_empty())
        .unwrap_or(true);
    if orphaned {
        if let Some(target) = ReferenceHierarchy::parent(world, anchor) {
            ReferenceHierarchy::remove_child(world, target, anchor);
        }
        let _ = world.despawn(anchor);
    }
}

/// Number of reference links between `entity` and its root
fn depth(world: &World, entity: Entity) -> usize {
    let mut depth = 0;
    let mut current = entity;
    while let Some(parent) = ReferenceHierarchy::parent(world, current) {
        depth += 1;
        current = parent;
        // Guard against accidental cycles
        if depth > 64 {
            break;
        }
    }
    depth
}

/// Advance every `MovementPath` in the world by `dt`
///
/// Frames longer than `max_physics_step` are split into equal substeps;
/// negative or non-finite `dt` advances nothing. Reference entities update
/// before the objects that follow them. Returns the number of paths advanced.
pub fn update_movement_paths(ecs: &mut EcsWorld, dt: f32) -> usize {
    if !dt.is_finite() || dt < 0.0 {
        warn!("Ignoring movement update with invalid dt {}", dt);
        return 0;
    }

    let entities: Vec<Entity> = ecs
        .world
        .query::<&MovementPath>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();
    let mut ordered: Vec<(usize, Entity)> = entities
        .into_iter()
        .map(|entity| (depth(&ecs.world, entity), entity))
        .collect();
    ordered.sort_by_key(|&(depth, _)| depth);

    let substeps = if ecs.max_physics_step > 0.0 {
        (dt / ecs.max_physics_step).ceil().max(1.0) as usize
    } else {
        1
    };
    let step = dt / substeps as f32;

    for _ in 0..substeps {
        for &(_, entity) in &ordered {
            let Ok(mut path) = ecs.world.remove_one::<MovementPath>(entity) else {
                continue;
            };
            path.advance(ecs, entity, step);
            let _ = ecs.world.insert_one(entity, path);
        }
    }

    ordered.len()
}
