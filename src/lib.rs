//! Kinematics core for scripted bullet-hell movement
//!
//! - `tfv`: time-function values, scalar curves over time
//! - `mp`: movable points, 2D positions over time
//! - `action`: authored movement steps that start motions on live objects
//! - `movement`: per-object sequencing of those steps
//! - `format`: the `Tag(field)(field)` text format everything round-trips through

pub mod action;
pub mod config;
pub mod ecs;
pub mod format;
pub mod movement;
pub mod mp;
pub mod tfv;
