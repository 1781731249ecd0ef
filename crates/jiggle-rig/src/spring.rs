//! Damped-spring joint filter.
//!
//! Drives the joint's simulated world position with three independent
//! [`Oscillator`]s, one per world axis. Underdamped settings make the joint
//! overshoot and ring around its rest target; critically damped and
//! overdamped settings settle without crossing it.
//!
//! The oscillators advance by a fixed internal tick per simulation step; the
//! caller's frame delta only decides how many steps run (see
//! [`crate::LagJoint`] for the shared step policy).

use glam::Vec3;
use jiggle_scene::{NodeId, SceneTree};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::joint::{substep_count, JointBase, RigError};
use crate::oscillator::Oscillator;

/// Milliseconds each internal step advances the axis oscillators.
const SPRING_TICK_MS: f32 = 16.0;

/// Configuration for a [`SpringJoint`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpringConfig {
    /// Spring stiffness (higher = snappier return to rest).
    pub stiffness: f32,
    /// Damping coefficient (higher = less ringing).
    pub damping: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 500.0,
            damping: 17.0,
        }
    }
}

impl SpringConfig {
    /// Loose, visibly bouncy response.
    pub fn bouncy() -> Self {
        Self {
            stiffness: 700.0,
            damping: 13.0,
        }
    }

    /// Critically damped for the default stiffness; settles with no
    /// overshoot.
    pub fn smooth() -> Self {
        let stiffness = 500.0f32;
        Self {
            stiffness,
            damping: 2.0 * stiffness.sqrt(),
        }
    }
}

/// A joint that springs around its rest target with damped harmonic motion.
#[derive(Debug, Clone)]
pub struct SpringJoint {
    base: JointBase,
    config: SpringConfig,
    axes: [Oscillator; 3],
    primed: bool,
}

impl SpringJoint {
    /// Wraps `target` and starts simulating it.
    ///
    /// Fails if `target` is a root or not in the tree.
    pub fn attach(
        tree: &mut SceneTree,
        target: NodeId,
        config: SpringConfig,
    ) -> Result<Self, RigError> {
        Ok(Self {
            base: JointBase::attach(tree, target)?,
            config,
            axes: [Oscillator::new(); 3],
            primed: false,
        })
    }

    /// Restores the captured rest pose; the next step re-anchors the
    /// oscillators instead of springing from stale state.
    pub fn reset(&mut self, tree: &mut SceneTree) {
        self.base.reset(tree);
        self.primed = false;
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
        let rest = rest_target.to_array();

        // The first step anchors every axis at the rest target, so a joint
        // never springs away from wherever it happened to spawn.
        if !self.primed {
            self.primed = true;
            for (axis, value) in self.axes.iter_mut().zip(rest) {
                axis.configure(value, value, self.config.stiffness, self.config.damping);
            }
        }

        let mut goal = [0.0f32; 3];
        for ((axis, value), out) in self.axes.iter_mut().zip(rest).zip(goal.iter_mut()) {
            axis.retarget(value);
            *out = axis.advance(SPRING_TICK_MS);
        }
        self.base.apply_deflection(tree, Vec3::from_array(goal));
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
    pub fn config(&self) -> &SpringConfig {
        &self.config
    }
}
