/// Core ECS components read and written by the kinematics core
///
/// Positions are absolute world coordinates. Relative motion is expressed
/// through the reference entity an object's movement path is rooted at.

use glam::Vec2;

/// Absolute world position
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position(pub Vec2);

/// Offset from `Position` to the hitbox center
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HitboxOffset(pub Vec2);

/// Direction the entity's sprite is facing, in radians
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Facing(pub f32);

/// Tag component for the player entity
#[derive(Debug, Clone, Copy, Default)]
pub struct Player;

/// Tag component for stationary entities spawned to act as a reference frame
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceAnchor;

/// Fixed offset an anchor keeps from the entity it follows (its `Parent`)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnchorOffset(pub Vec2);

/// Parent-child relationship component
/// The parent is the reference entity the child's motion is relative to
#[derive(Debug, Clone, Copy)]
pub struct Parent(pub hecs::Entity);

/// Children component - tracks all entities whose motion is relative to this one
#[derive(Debug, Clone, Default)]
pub struct Children(pub Vec<hecs::Entity>);
