/// Reference-frame hierarchy for parent-child relationships
///
/// A child's motion is computed relative to its parent's position, so the
/// parent must be re-pointed whenever an action installs a new reference entity.

use hecs::{Entity, World};
use crate::ecs::components::{Children, Parent};

pub struct ReferenceHierarchy;

impl ReferenceHierarchy {
    /// Current parent of an entity, if any
    pub fn parent(world: &World, child: Entity) -> Option<Entity> {
        world.get::<&Parent>(child).map(|p| p.0).ok()
    }

    /// Add a child to a parent entity
    /// Automatically sets up Parent and Children components
    pub fn add_child(world: &mut World, parent: Entity, child: Entity) {
        let has_parent = world.get::<&Parent>(child).is_ok();

        if has_parent {
            if let Ok(mut parent_comp) = world.get::<&mut Parent>(child) {
                parent_comp.0 = parent;
            }
        } else {
            let _ = world.insert_one(child, Parent(parent));
        }

        let has_children = world.get::<&Children>(parent).is_ok();

        if has_children {
            if let Ok(mut children) = world.get::<&mut Children>(parent) {
                if !children.0.contains(&child) {
                    children.0.push(child);
                }
            }
        } else {
            let _ = world.insert_one(parent, Children(vec![child]));
        }
    }

    /// Remove a child from its parent
    pub fn remove_child(world: &mut World, parent: Entity, child: Entity) {
        let _ = world.remove_one::<Parent>(child);

        if let Ok(mut children) = world.get::<&mut Children>(parent) {
            children.0.retain(|&e| e != child);
        }
    }

    /// Detach `child` from whatever it was following and root it at `new_parent`
    pub fn reparent(world: &mut World, child: Entity, new_parent: Entity) {
        if let Some(old_parent) = Self::parent(world, child) {
            if old_parent == new_parent {
                return;
            }
            Self::remove_child(world, old_parent, child);
        }
        Self::add_child(world, new_parent, child);
    }

    /// Get all descendants of an entity (children, grandchildren, etc.)
    pub fn get_descendants(world: &World, entity: Entity) -> Vec<Entity> {
        let mut descendants = Vec::new();

        if let Ok(children) = world.get::<&Children>(entity) {
            for &child in &children.0 {
                descendants.push(child);
                descendants.extend(Self::get_descendants(world, child));
            }
        }

        descendants
    }
}
