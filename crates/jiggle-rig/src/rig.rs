//! Skeleton-wide orchestration.
//!
//! A [`WiggleRig`] scans a skeleton subtree for joints tagged with motion
//! metadata and builds the matching filter for each one. Joints are
//! independent: each stores its own rest pose and wrapper, so a joint that
//! cannot be built is skipped without affecting the rest of the scan.

use jiggle_scene::{NodeId, SceneTree};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::joint::JointFilter;
use crate::lag::{LagConfig, LagJoint};
use crate::spring::{SpringConfig, SpringJoint};

/// Metadata key selecting an exponential-lag joint; the value is its
/// smoothing fraction.
pub const WIGGLE_VELOCITY: &str = "wiggle_velocity";
/// Metadata key selecting a damped-spring joint; the value is its stiffness.
pub const WIGGLE_STIFFNESS: &str = "wiggle_stiffness";
/// Metadata key for a spring joint's damping coefficient.
pub const WIGGLE_DAMPING: &str = "wiggle_damping";

/// Configuration for a [`WiggleRig`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigConfig {
    /// Scales every tagged smoothing fraction at build time.
    pub multiplier: f32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self { multiplier: 1.0 }
    }
}

/// A collection of simulated joints built from a skeleton's metadata tags.
#[derive(Debug, Default)]
pub struct WiggleRig {
    joints: Vec<JointFilter>,
}

impl WiggleRig {
    /// Scans the subtree rooted at `skeleton` and builds a filter for every
    /// tagged joint.
    ///
    /// Tagging rules per joint: [`WIGGLE_VELOCITY`] builds a [`LagJoint`]
    /// (value scaled by the rig multiplier); otherwise [`WIGGLE_STIFFNESS`]
    /// builds a [`SpringJoint`] (damping from [`WIGGLE_DAMPING`] or the
    /// default); untagged joints are left untouched. A joint that cannot be
    /// built (e.g. a tagged root) is logged and skipped.
    pub fn from_skeleton(tree: &mut SceneTree, skeleton: NodeId, config: &RigConfig) -> Self {
        let mut joints = Vec::new();
        if !tree.contains(skeleton) {
            warn!(node = skeleton.0, "skeleton root is not in the tree; rig is empty");
            return Self { joints };
        }

        for id in tree.descendants(skeleton) {
            if let Some(velocity) = tree.metadata(id, WIGGLE_VELOCITY) {
                let lag = LagConfig {
                    velocity: velocity * config.multiplier,
                    ..LagConfig::default()
                };
                match LagJoint::attach(tree, id, lag) {
                    Ok(joint) => joints.push(JointFilter::Lag(joint)),
                    Err(error) => warn!(node = id.0, %error, "skipping lag joint"),
                }
            } else if let Some(stiffness) = tree.metadata(id, WIGGLE_STIFFNESS) {
                let damping = tree
                    .metadata(id, WIGGLE_DAMPING)
                    .unwrap_or(SpringConfig::default().damping);
                let spring = SpringConfig { stiffness, damping };
                match SpringJoint::attach(tree, id, spring) {
                    Ok(joint) => joints.push(JointFilter::Spring(joint)),
                    Err(error) => warn!(node = id.0, %error, "skipping spring joint"),
                }
            }
        }
        Self { joints }
    }

    /// Steps every joint by the same `dt` seconds.
    pub fn update(&mut self, tree: &mut SceneTree, dt: f32) {
        for joint in &mut self.joints {
            joint.update(tree, dt);
        }
    }

    /// Restores every joint to its undeflected rest pose.
    pub fn reset(&mut self, tree: &mut SceneTree) {
        for joint in &mut self.joints {
            joint.reset(tree);
        }
    }

    /// Tears every joint down, restoring the original hierarchy. The rig
    /// holds no node references afterwards.
    pub fn dispose(self, tree: &mut SceneTree) {
        for joint in self.joints {
            joint.dispose(tree);
        }
    }

    /// Returns the owned joint filters.
    pub fn joints(&self) -> &[JointFilter] {
        &self.joints
    }

    /// Returns the number of simulated joints.
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Returns true if the scan found no tagged joints.
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}
