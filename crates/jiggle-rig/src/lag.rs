//! Exponential-lag joint filter.
//!
//! The cheapest wiggle: every internal step pulls the joint's simulated
//! world position a fixed fraction of the way toward its rest target. The
//! fraction stays strictly below one, so the motion settles monotonically
//! and never overshoots; use [`crate::SpringJoint`] when overshoot is
//! wanted.

use glam::Vec3;
use jiggle_scene::{NodeId, SceneTree};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::joint::{substep_count, JointBase, RigError};

/// Scale applied to the smoothing fraction each internal step.
const LAG_STEP_SCALE: f32 = 0.85;
/// The smoothing fraction is capped just below 1 so a step can never jump
/// past the rest target.
const MAX_BLEND: f32 = 0.99999;

/// Configuration for a [`LagJoint`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LagConfig {
    /// Smoothing fraction per tick (0-1, higher = tighter tracking).
    pub velocity: f32,
    /// Maximum stretch distance. The rotational filter keeps bone length
    /// fixed and does not consume it.
    pub max_stretch: f32,
}

impl Default for LagConfig {
    fn default() -> Self {
        Self {
            velocity: 0.1,
            max_stretch: 0.1,
        }
    }
}

impl LagConfig {
    /// Creates a config with the given smoothing fraction.
    pub fn with_velocity(velocity: f32) -> Self {
        Self {
            velocity,
            ..Self::default()
        }
    }
}

/// A joint that trails its rest target with exponential smoothing.
#[derive(Debug, Clone)]
pub struct LagJoint {
    base: JointBase,
    config: LagConfig,
}

impl LagJoint {
    /// Wraps `target` and starts simulating it.
    ///
    /// Fails if `target` is a root or not in the tree.
    pub fn attach(
        tree: &mut SceneTree,
        target: NodeId,
        config: LagConfig,
    ) -> Result<Self, RigError> {
        Ok(Self {
            base: JointBase::attach(tree, target)?,
            config,
        })
    }

    /// Restores the captured rest pose; see [`JointFilter::reset`].
    ///
    /// [`JointFilter::reset`]: crate::JointFilter::reset
    pub fn reset(&mut self, tree: &mut SceneTree) {
        self.base.reset(tree);
    }

    /// Unwraps the joint and restores the original hierarchy.
    pub fn dispose(self, tree: &mut SceneTree) {
        self.base.detach(tree);
    }

    /// Steps the simulation by `dt` seconds.
    pub fn update(&mut self, tree: &mut SceneTree, dt: f32) {
        for _ in 0..substep_count(dt) {
            self.step(tree);
        }
    }

    fn step(&mut self, tree: &mut SceneTree) {
        tree.update_world(self.base.wrapper());
        let Some(rest_target) = self.base.rest_target(tree) else {
            return;
        };
        let blend = self.config.velocity.min(MAX_BLEND) * LAG_STEP_SCALE;
        let goal = self.base.prev_world().lerp(rest_target, blend);
        self.base.apply_deflection(tree, goal);
    }

    /// The simulated joint node.
    pub fn target(&self) -> NodeId {
        self.base.target()
    }

    /// The synthetic wrapper node holding the rest pose.
    pub fn wrapper(&self) -> NodeId {
        self.base.wrapper()
    }

    /// The joint's current rest target in world space.
    pub fn rest_target(&self, tree: &SceneTree) -> Option<Vec3> {
        self.base.rest_target(tree)
    }

    /// The last simulated world position.
    pub fn deflection(&self) -> Vec3 {
        self.base.prev_world()
    }

    /// The configuration the joint was built with.
    pub fn config(&self) -> &LagConfig {
        &self.config
    }
}
