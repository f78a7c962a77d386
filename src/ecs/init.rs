/// ECS World initialization helpers
///
/// Provides functions to create the entities the kinematics core works with
/// (player, moving objects, reference anchors)

use glam::Vec2;
use hecs::{Entity, World};
use crate::ecs::components::*;
use crate::ecs::hierarchy::ReferenceHierarchy;

/// Create the player entity
pub fn create_player_entity(world: &mut World, position: Vec2, hitbox_offset: Vec2) -> Entity {
    world.spawn((
        Position(position),
        HitboxOffset(hitbox_offset),
        Facing(std::f32::consts::FRAC_PI_2),
        Player,
    ))
}

/// Create a stationary entity to serve as a reference frame
pub fn create_reference_anchor(world: &mut World, position: Vec2) -> Entity {
    world.spawn((Position(position), ReferenceAnchor))
}

/// Create an anchor at `position` that keeps its offset from `follow` as
/// `follow` moves
///
/// Falls back to a stationary anchor if `follow` is gone.
pub fn create_following_anchor(world: &mut World, position: Vec2, follow: Option<Entity>) -> Entity {
    let anchor = create_reference_anchor(world, position);

    if let Some(target) = follow {
        if let Ok(offset) = world.get::<&Position>(target).map(|p| position - p.0) {
            let _ = world.insert_one(anchor, AnchorOffset(offset));
            ReferenceHierarchy::add_child(world, target, anchor);
        }
    }

    anchor
}

/// Create a moving object (enemy, bullet) whose motion is relative to `reference`
///
/// Objects without a reference move relative to the world origin
pub fn create_moving_entity(
    world: &mut World,
    position: Vec2,
    reference: Option<Entity>,
) -> Entity {
    let entity = world.spawn((Position(position), HitboxOffset::default()));

    if let Some(parent) = reference {
        ReferenceHierarchy::add_child(world, parent, entity);
    }

    entity
}
