//! Shared joint plumbing: wrapper setup/teardown and step scheduling.
//!
//! Every simulated joint is wrapped by a synthetic node that takes over the
//! joint's rest transform. The wrapper tracks the host's animation; the
//! joint under it carries only the simulation's rotation, with its local
//! position forced back to the origin after every step so bone length never
//! drifts.

use glam::{Quat, Vec3};
use jiggle_scene::{NodeId, SceneError, SceneTree};
use thiserror::Error;

use crate::lag::LagJoint;
use crate::spring::SpringJoint;

/// Largest delta accepted by `update`, in seconds. Bigger deltas saturate.
const MAX_DELTA: f32 = 100.0;
/// Deltas below this are dropped entirely; near-zero steps destabilize the
/// filters more than skipping a frame does.
const MIN_DELTA: f32 = 0.006;
/// Deltas above this run two internal steps instead of one.
const DOUBLE_STEP_DELTA: f32 = 0.01;
/// Internal steps applied when the delta saturates at [`MAX_DELTA`].
const SATURATED_STEPS: u32 = 25;

/// Errors from joint construction.
#[derive(Debug, Error)]
pub enum RigError {
    /// The target is a tree root; a parent is required to hold the wrapper.
    #[error("joint {0} has no parent to attach a wrapper to")]
    RootJoint(u32),

    /// The target id does not resolve to a live node.
    #[error("node not found: {0}")]
    NodeNotFound(u32),

    /// A tree operation failed while restructuring the hierarchy.
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Maps a frame delta (seconds) to the number of internal fixed steps.
///
/// The step count is keyed off coarse thresholds of the clamped delta, not a
/// fixed-timestep accumulator: tiny deltas are ignored, typical frames get
/// one or two steps, and a saturated delta gets a fixed burst.
pub(crate) fn substep_count(dt: f32) -> u32 {
    let dt = dt.min(MAX_DELTA);
    if dt < MIN_DELTA {
        0
    } else if dt >= MAX_DELTA {
        SATURATED_STEPS
    } else if dt > DOUBLE_STEP_DELTA {
        2
    } else {
        1
    }
}

/// State shared by both joint filters: the wrapped target, its captured rest
/// pose, and the last simulated world position.
#[derive(Debug, Clone)]
pub(crate) struct JointBase {
    target: NodeId,
    wrapper: NodeId,
    original_parent: NodeId,
    rest_position: Vec3,
    rest_rotation: Quat,
    prev_world: Vec3,
}

impl JointBase {
    /// Wraps `target` and captures its rest pose.
    ///
    /// The wrapper is a shallow copy of the target inserted between the
    /// target and its parent; the target keeps its local transform until the
    /// first simulation step replaces it.
    pub(crate) fn attach(tree: &mut SceneTree, target: NodeId) -> Result<Self, RigError> {
        let (parent, rest_position, rest_rotation) = {
            let node = tree
                .node(target)
                .ok_or(RigError::NodeNotFound(target.0))?;
            let parent = node.parent().ok_or(RigError::RootJoint(target.0))?;
            (parent, node.local.translation, node.local.rotation)
        };
        tree.update_world(target);
        let prev_world = tree.world_position(target).unwrap_or(rest_position);

        let wrapper = tree.clone_node(target)?;
        tree.set_parent(target, Some(wrapper))?;
        tree.update_world(wrapper);

        Ok(Self {
            target,
            wrapper,
            original_parent: parent,
            rest_position,
            rest_rotation,
            prev_world,
        })
    }

    /// Restores the captured rest pose and re-arms the filter from an
    /// undeflected state. Calling this repeatedly is the same as calling it
    /// once.
    pub(crate) fn reset(&mut self, tree: &mut SceneTree) {
        if let Some(node) = tree.node_mut(self.target) {
            node.local.translation = self.rest_position;
            node.local.rotation = self.rest_rotation;
        }
        tree.update_world(self.target);
        if let Some(world) = tree.world_position(self.target) {
            self.prev_world = world;
        }
    }

    /// Undoes the wrapping: the target goes back to its original parent at
    /// its rest pose, and the wrapper is removed from the tree.
    pub(crate) fn detach(mut self, tree: &mut SceneTree) {
        self.reset(tree);
        tree.set_parent(self.target, Some(self.original_parent)).ok();
        tree.remove(self.wrapper).ok();
        tree.update_world(self.target);
    }

    /// The joint's undisturbed world-space target: the rest offset pushed
    /// through the wrapper's cached world transform.
    pub(crate) fn rest_target(&self, tree: &SceneTree) -> Option<Vec3> {
        tree.local_to_world(self.wrapper, self.rest_position)
    }

    /// Applies a simulated world-space position as a pure rotation: the
    /// offset is converted into wrapper space, the joint is rotated so its
    /// local +Y axis points along it, and the joint's local position is
    /// forced back to the origin.
    pub(crate) fn apply_deflection(&mut self, tree: &mut SceneTree, goal: Vec3) {
        self.prev_world = goal;
        let Some(local) = tree.world_to_local(self.wrapper, goal) else {
            return;
        };
        let direction = local.normalize_or_zero();
        if let Some(node) = tree.node_mut(self.target) {
            if direction.length_squared() > 0.0 {
                node.local.rotation = Quat::from_rotation_arc(Vec3::Y, direction);
            }
            node.local.translation = Vec3::ZERO;
        }
        tree.update_world(self.target);
    }

    pub(crate) fn target(&self) -> NodeId {
        self.target
    }

    pub(crate) fn wrapper(&self) -> NodeId {
        self.wrapper
    }

    pub(crate) fn prev_world(&self) -> Vec3 {
        self.prev_world
    }
}

/// A simulated joint of either kind, so rigs can own one homogeneous
/// collection.
#[derive(Debug, Clone)]
pub enum JointFilter {
    /// Exponential-lag filter.
    Lag(LagJoint),
    /// Damped-spring filter.
    Spring(SpringJoint),
}

impl JointFilter {
    /// Steps the simulation by `dt` seconds.
    pub fn update(&mut self, tree: &mut SceneTree, dt: f32) {
        match self {
            Self::Lag(joint) => joint.update(tree, dt),
            Self::Spring(joint) => joint.update(tree, dt),
        }
    }

    /// Restores the joint to its undeflected rest pose.
    pub fn reset(&mut self, tree: &mut SceneTree) {
        match self {
            Self::Lag(joint) => joint.reset(tree),
            Self::Spring(joint) => joint.reset(tree),
        }
    }

    /// Tears the joint down, restoring the original hierarchy.
    pub fn dispose(self, tree: &mut SceneTree) {
        match self {
            Self::Lag(joint) => joint.dispose(tree),
            Self::Spring(joint) => joint.dispose(tree),
        }
    }

    /// The simulated joint node.
    pub fn target(&self) -> NodeId {
        match self {
            Self::Lag(joint) => joint.target(),
            Self::Spring(joint) => joint.target(),
        }
    }

    /// The synthetic wrapper node holding the rest pose.
    pub fn wrapper(&self) -> NodeId {
        match self {
            Self::Lag(joint) => joint.wrapper(),
            Self::Spring(joint) => joint.wrapper(),
        }
    }

    /// The joint's current rest target in world space.
    pub fn rest_target(&self, tree: &SceneTree) -> Option<Vec3> {
        match self {
            Self::Lag(joint) => joint.rest_target(tree),
            Self::Spring(joint) => joint.rest_target(tree),
        }
    }

    /// The last simulated world position.
    pub fn deflection(&self) -> Vec3 {
        match self {
            Self::Lag(joint) => joint.deflection(),
            Self::Spring(joint) => joint.deflection(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lag::LagConfig;
    use jiggle_scene::Transform;

    fn arm_tree() -> (SceneTree, NodeId, NodeId) {
        let mut tree = SceneTree::new();
        let root = tree.add_node("root", Transform::IDENTITY, None).unwrap();
        let arm = tree
            .add_node("arm", Transform::from_translation(Vec3::Y), Some(root))
            .unwrap();
        tree.update_all();
        (tree, root, arm)
    }

    #[test]
    fn test_substep_policy() {
        assert_eq!(substep_count(0.003), 0);
        assert_eq!(substep_count(0.005), 1);
        assert_eq!(substep_count(0.01), 1);
        assert_eq!(substep_count(0.02), 2);
        assert_eq!(substep_count(1.0), 2);
        assert_eq!(substep_count(100.0), 25);
        assert_eq!(substep_count(200.0), 25);
    }

    #[test]
    fn test_attach_requires_parent() {
        let (mut tree, root, _) = arm_tree();
        let result = JointBase::attach(&mut tree, root);
        assert!(matches!(result, Err(RigError::RootJoint(_))));
    }

    #[test]
    fn test_attach_rejects_dead_node() {
        let (mut tree, _, arm) = arm_tree();
        tree.remove(arm).unwrap();
        let result = JointBase::attach(&mut tree, arm);
        assert!(matches!(result, Err(RigError::NodeNotFound(_))));
    }

    #[test]
    fn test_attach_inserts_wrapper() {
        let (mut tree, root, arm) = arm_tree();
        let base = JointBase::attach(&mut tree, arm).unwrap();
        let wrapper = base.wrapper();
        assert_eq!(tree.parent(arm), Some(wrapper));
        assert_eq!(tree.parent(wrapper), Some(root));
        // The wrapper took over the rest transform.
        assert_eq!(tree.node(wrapper).unwrap().local.translation, Vec3::Y);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let (mut tree, _, arm) = arm_tree();
        let mut joint = LagJoint::attach(&mut tree, arm, LagConfig::default()).unwrap();
        tree.node_mut(arm).unwrap().local.translation = Vec3::new(3.0, 0.5, -1.0);
        tree.update_all();

        joint.reset(&mut tree);
        let once = tree.node(arm).unwrap().local;
        let deflection = joint.deflection();
        joint.reset(&mut tree);
        joint.reset(&mut tree);
        assert_eq!(tree.node(arm).unwrap().local, once);
        assert_eq!(joint.deflection(), deflection);
        assert_eq!(once.translation, Vec3::Y);
    }

    #[test]
    fn test_dispose_restores_hierarchy() {
        let (mut tree, root, arm) = arm_tree();
        let before = tree.node_count();
        let joint = LagJoint::attach(&mut tree, arm, LagConfig::default()).unwrap();
        let wrapper = joint.wrapper();
        joint.dispose(&mut tree);

        assert_eq!(tree.parent(arm), Some(root));
        assert!(!tree.contains(wrapper));
        assert_eq!(tree.node_count(), before);
        assert_eq!(tree.node(arm).unwrap().local.translation, Vec3::Y);
    }

    #[test]
    fn test_dispose_before_any_update() {
        let (mut tree, root, arm) = arm_tree();
        let joint = LagJoint::attach(&mut tree, arm, LagConfig::default()).unwrap();
        joint.dispose(&mut tree);
        assert_eq!(tree.parent(arm), Some(root));
    }

    #[test]
    fn test_dispose_after_updates() {
        let (mut tree, root, arm) = arm_tree();
        let mut joint = LagJoint::attach(&mut tree, arm, LagConfig::default()).unwrap();
        tree.node_mut(root).unwrap().local.translation = Vec3::X;
        tree.update_all();
        joint.update(&mut tree, 1.0 / 60.0);
        let wrapper = joint.wrapper();
        joint.dispose(&mut tree);

        assert_eq!(tree.parent(arm), Some(root));
        assert!(!tree.contains(wrapper));
        // Rest pose is back, expressed under the original parent.
        assert_eq!(tree.node(arm).unwrap().local.translation, Vec3::Y);
    }
}
