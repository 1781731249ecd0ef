//! Node arena and hierarchy operations.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use thiserror::Error;

use crate::Transform;

/// A node identifier (index into the tree's arena).
///
/// Ids stay valid across removals of other nodes; slots are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Creates a new node id.
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Errors from structural tree operations.
#[derive(Debug, Clone, Error)]
pub enum SceneError {
    /// The id does not resolve to a live node.
    #[error("node not found: {0}")]
    NodeNotFound(u32),

    /// Reparenting would make a node its own ancestor.
    #[error("reparenting would create a cycle")]
    CycleDetected,
}

/// A node in the hierarchy.
#[derive(Debug, Clone)]
pub struct Node {
    /// Human-readable name.
    pub name: String,
    /// Local transform in parent space.
    pub local: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    world: Transform,
    metadata: HashMap<String, f32>,
}

impl Node {
    fn new(name: String, local: Transform, parent: Option<NodeId>) -> Self {
        Self {
            name,
            local,
            parent,
            children: Vec::new(),
            world: local,
            metadata: HashMap::new(),
        }
    }

    /// Returns the parent id (None for roots).
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the ordered child ids.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the cached world transform.
    ///
    /// Stale until the tree's `update_world`/`update_all` has run after the
    /// last local-transform change on this node or an ancestor.
    pub fn world(&self) -> Transform {
        self.world
    }

    /// Reads a metadata value.
    pub fn metadata(&self, key: &str) -> Option<f32> {
        self.metadata.get(key).copied()
    }

    /// Writes a metadata value.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: f32) {
        self.metadata.insert(key.into(), value);
    }
}

/// An arena-backed transform hierarchy.
///
/// Multiple roots are allowed; removal leaves a tombstone so ids held by
/// other systems stay stable.
#[derive(Debug, Clone, Default)]
pub struct SceneTree {
    slots: Vec<Option<Node>>,
}

impl SceneTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node and returns its id.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        local: Transform,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SceneError> {
        if let Some(p) = parent {
            if !self.contains(p) {
                return Err(SceneError::NodeNotFound(p.0));
            }
        }
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(Node::new(name.into(), local, parent)));
        if let Some(p) = parent {
            if let Some(node) = self.node_mut(p) {
                node.children.push(id);
            }
        }
        Ok(id)
    }

    /// Returns true if the id resolves to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Returns a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).and_then(|slot| slot.as_ref())
    }

    /// Returns a mutable node by id.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.index()).and_then(|slot| slot.as_mut())
    }

    /// Returns a node's parent id.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Returns a node's ordered children.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    /// Finds the first node with the given name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.slots.iter().enumerate().find_map(|(i, slot)| {
            slot.as_ref()
                .filter(|node| node.name == name)
                .map(|_| NodeId(i as u32))
        })
    }

    /// Returns all root ids.
    pub fn roots(&self) -> Vec<NodeId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Some(node) if node.parent.is_none() => Some(NodeId(i as u32)),
                _ => None,
            })
            .collect()
    }

    /// Returns the subtree rooted at `id` in pre-order, starting with `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.node(current) {
                for &child in node.children.iter().rev() {
                    stack.push(child);
                }
            }
        }
        out
    }

    /// Returns the number of live nodes.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Moves a node under a new parent (or to the root set), keeping its
    /// local transform untouched.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), SceneError> {
        if !self.contains(child) {
            return Err(SceneError::NodeNotFound(child.0));
        }
        if let Some(p) = parent {
            if !self.contains(p) {
                return Err(SceneError::NodeNotFound(p.0));
            }
            let mut cursor = Some(p);
            while let Some(ancestor) = cursor {
                if ancestor == child {
                    return Err(SceneError::CycleDetected);
                }
                cursor = self.parent(ancestor);
            }
        }
        let old_parent = self.parent(child);
        if let Some(op) = old_parent {
            if let Some(node) = self.node_mut(op) {
                node.children.retain(|&c| c != child);
            }
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = parent;
        }
        if let Some(p) = parent {
            if let Some(node) = self.node_mut(p) {
                node.children.push(child);
            }
        }
        Ok(())
    }

    /// Removes a node. Its children are spliced up to the removed node's
    /// parent, keeping their local transform values as-is.
    pub fn remove(&mut self, id: NodeId) -> Result<(), SceneError> {
        let node = self
            .slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(SceneError::NodeNotFound(id.0))?;
        if let Some(p) = node.parent {
            if let Some(parent) = self.node_mut(p) {
                parent.children.retain(|&c| c != id);
            }
        }
        for child in node.children {
            if let Some(orphan) = self.node_mut(child) {
                orphan.parent = node.parent;
            }
            if let Some(p) = node.parent {
                if let Some(parent) = self.node_mut(p) {
                    parent.children.push(child);
                }
            }
        }
        Ok(())
    }

    /// Copies a node (name, local transform, metadata) under the same parent.
    /// Children are not copied.
    pub fn clone_node(&mut self, id: NodeId) -> Result<NodeId, SceneError> {
        let (name, local, metadata, parent) = {
            let node = self.node(id).ok_or(SceneError::NodeNotFound(id.0))?;
            (
                node.name.clone(),
                node.local,
                node.metadata.clone(),
                node.parent,
            )
        };
        let copy = self.add_node(name, local, parent)?;
        if let Some(node) = self.node_mut(copy) {
            node.metadata = metadata;
        }
        Ok(copy)
    }

    /// Recomputes cached world transforms for the subtree rooted at `id`,
    /// reading the parent's cached world transform as the base.
    pub fn update_world(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).map(|node| node.parent) else {
            return;
        };
        let base = parent
            .and_then(|p| self.node(p))
            .map(|node| node.world)
            .unwrap_or(Transform::IDENTITY);
        let mut stack = vec![(id, base)];
        while let Some((current, parent_world)) = stack.pop() {
            let Some(node) = self
                .slots
                .get_mut(current.index())
                .and_then(|slot| slot.as_mut())
            else {
                continue;
            };
            node.world = parent_world.then(&node.local);
            let world = node.world;
            let children = node.children.clone();
            for child in children {
                stack.push((child, world));
            }
        }
    }

    /// Recomputes cached world transforms for every root's subtree.
    pub fn update_all(&mut self) {
        for root in self.roots() {
            self.update_world(root);
        }
    }

    /// Returns the cached world transform.
    pub fn world_transform(&self, id: NodeId) -> Option<Transform> {
        self.node(id).map(Node::world)
    }

    /// Returns the cached world position.
    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.node(id).map(|node| node.world.translation)
    }

    /// Returns the cached world rotation.
    pub fn world_rotation(&self, id: NodeId) -> Option<Quat> {
        self.node(id).map(|node| node.world.rotation)
    }

    /// Converts a point from `id`'s local space to world space, through the
    /// cached world transform.
    pub fn local_to_world(&self, id: NodeId, point: Vec3) -> Option<Vec3> {
        self.node(id).map(|node| node.world.transform_point(point))
    }

    /// Converts a world-space point into `id`'s local space, through the
    /// cached world transform.
    pub fn world_to_local(&self, id: NodeId, point: Vec3) -> Option<Vec3> {
        self.node(id)
            .map(|node| node.world.inverse().transform_point(point))
    }

    /// Writes a metadata value on a node. Missing nodes are ignored.
    pub fn set_metadata(&mut self, id: NodeId, key: impl Into<String>, value: f32) {
        if let Some(node) = self.node_mut(id) {
            node.set_metadata(key, value);
        }
    }

    /// Reads a metadata value from a node.
    pub fn metadata(&self, id: NodeId, key: &str) -> Option<f32> {
        self.node(id).and_then(|node| node.metadata(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn chain() -> (SceneTree, NodeId, NodeId, NodeId) {
        let mut tree = SceneTree::new();
        let root = tree.add_node("root", Transform::IDENTITY, None).unwrap();
        let upper = tree
            .add_node("upper", Transform::from_translation(Vec3::Y), Some(root))
            .unwrap();
        let lower = tree
            .add_node("lower", Transform::from_translation(Vec3::Y), Some(upper))
            .unwrap();
        tree.update_all();
        (tree, root, upper, lower)
    }

    #[test]
    fn test_add_and_lookup() {
        let (tree, root, upper, lower) = chain();
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.parent(upper), Some(root));
        assert_eq!(tree.children(upper), &[lower]);
        assert_eq!(tree.find_node("lower"), Some(lower));
        assert_eq!(tree.find_node("missing"), None);
    }

    #[test]
    fn test_add_under_missing_parent() {
        let mut tree = SceneTree::new();
        let result = tree.add_node("x", Transform::IDENTITY, Some(NodeId(7)));
        assert!(matches!(result, Err(SceneError::NodeNotFound(7))));
    }

    #[test]
    fn test_world_chain() {
        let (tree, root, upper, lower) = chain();
        assert_eq!(tree.world_position(root), Some(Vec3::ZERO));
        assert_eq!(tree.world_position(upper), Some(Vec3::Y));
        assert_eq!(tree.world_position(lower), Some(Vec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn test_world_rotation_propagates() {
        let (mut tree, root, _, lower) = chain();
        tree.node_mut(root).unwrap().local.rotation = Quat::from_rotation_z(FRAC_PI_2);
        tree.update_all();
        let p = tree.world_position(lower).unwrap();
        assert!((p - Vec3::new(-2.0, 0.0, 0.0)).length() < 1e-5);
        let r = tree.world_rotation(lower).unwrap();
        assert!(r.angle_between(Quat::from_rotation_z(FRAC_PI_2)) < 1e-5);
    }

    #[test]
    fn test_cache_is_explicit() {
        let (mut tree, root, _, lower) = chain();
        tree.node_mut(root).unwrap().local.translation = Vec3::X;
        // Not refreshed yet.
        assert_eq!(tree.world_position(lower), Some(Vec3::new(0.0, 2.0, 0.0)));
        tree.update_world(root);
        assert_eq!(tree.world_position(lower), Some(Vec3::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn test_point_conversion_roundtrip() {
        let (tree, _, upper, _) = chain();
        let p = Vec3::new(0.3, -1.2, 2.0);
        let world = tree.local_to_world(upper, p).unwrap();
        let back = tree.world_to_local(upper, world).unwrap();
        assert!((back - p).length() < 1e-5);
    }

    #[test]
    fn test_set_parent_keeps_local() {
        let (mut tree, root, upper, lower) = chain();
        tree.set_parent(lower, Some(root)).unwrap();
        assert_eq!(tree.parent(lower), Some(root));
        assert!(!tree.children(upper).contains(&lower));
        assert_eq!(tree.node(lower).unwrap().local.translation, Vec3::Y);
        tree.update_all();
        assert_eq!(tree.world_position(lower), Some(Vec3::Y));
    }

    #[test]
    fn test_set_parent_rejects_cycle() {
        let (mut tree, _, upper, lower) = chain();
        let result = tree.set_parent(upper, Some(lower));
        assert!(matches!(result, Err(SceneError::CycleDetected)));
        let result = tree.set_parent(upper, Some(upper));
        assert!(matches!(result, Err(SceneError::CycleDetected)));
    }

    #[test]
    fn test_remove_splices_children() {
        let (mut tree, root, upper, lower) = chain();
        tree.remove(upper).unwrap();
        assert!(!tree.contains(upper));
        assert_eq!(tree.parent(lower), Some(root));
        assert!(tree.children(root).contains(&lower));
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_remove_root_orphans_children() {
        let (mut tree, root, upper, _) = chain();
        tree.remove(root).unwrap();
        assert_eq!(tree.parent(upper), None);
        assert!(tree.roots().contains(&upper));
    }

    #[test]
    fn test_clone_node_copies_shallow() {
        let (mut tree, root, upper, lower) = chain();
        tree.set_metadata(upper, "wiggle_velocity", 0.25);
        let copy = tree.clone_node(upper).unwrap();
        assert_eq!(tree.parent(copy), Some(root));
        assert_eq!(tree.metadata(copy, "wiggle_velocity"), Some(0.25));
        assert_eq!(tree.node(copy).unwrap().local.translation, Vec3::Y);
        // Children stay with the original.
        assert!(tree.children(copy).is_empty());
        assert_eq!(tree.children(upper), &[lower]);
    }

    #[test]
    fn test_descendants_preorder() {
        let (tree, root, upper, lower) = chain();
        assert_eq!(tree.descendants(root), vec![root, upper, lower]);
        assert_eq!(tree.descendants(lower), vec![lower]);
    }

    #[test]
    fn test_metadata_roundtrip() {
        let (mut tree, root, _, _) = chain();
        assert_eq!(tree.metadata(root, "wiggle_stiffness"), None);
        tree.set_metadata(root, "wiggle_stiffness", 700.0);
        assert_eq!(tree.metadata(root, "wiggle_stiffness"), Some(700.0));
    }
}
