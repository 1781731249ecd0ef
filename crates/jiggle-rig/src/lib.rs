//! Procedural secondary motion ("jiggle bones") for transform hierarchies.
//!
//! Tags joints of a [`jiggle_scene::SceneTree`] with motion parameters and
//! simulates how they lag and overshoot when their parent moves, without any
//! hand-authored animation:
//! - [`LagJoint`] - exponential smoothing toward the joint's rest target
//! - [`SpringJoint`] - damped-spring motion, one [`Oscillator`] per world axis
//! - [`WiggleRig`] - scans a skeleton for tagged joints and drives them all
//! - [`WiggleOverlay`] - read-only debug-draw data for the simulated joints
//!
//! Each simulated joint gets a synthetic wrapper node holding its rest pose;
//! the joint itself is driven purely by rotation, so bone length never
//! changes and skinned meshes never stretch.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use jiggle_scene::{SceneTree, Transform};
//! use jiggle_rig::{RigConfig, WiggleRig, WIGGLE_STIFFNESS};
//!
//! let mut tree = SceneTree::new();
//! let root = tree.add_node("root", Transform::IDENTITY, None).unwrap();
//! let tail = tree
//!     .add_node("tail", Transform::from_translation(Vec3::Y), Some(root))
//!     .unwrap();
//! tree.set_metadata(tail, WIGGLE_STIFFNESS, 700.0);
//! tree.update_all();
//!
//! let mut rig = WiggleRig::from_skeleton(&mut tree, root, &RigConfig::default());
//! assert_eq!(rig.len(), 1);
//!
//! // Per frame: host animation writes rest transforms, then the rig steps.
//! rig.update(&mut tree, 1.0 / 60.0);
//! ```

mod clock;
mod joint;
mod lag;
mod oscillator;
mod overlay;
mod rig;
mod spring;

pub use clock::FrameTimer;
pub use joint::{JointFilter, RigError};
pub use lag::{LagConfig, LagJoint};
pub use oscillator::Oscillator;
pub use overlay::{OverlayConfig, OverlayDot, OverlayLine, OverlaySnapshot, WiggleOverlay};
pub use rig::{RigConfig, WiggleRig, WIGGLE_DAMPING, WIGGLE_STIFFNESS, WIGGLE_VELOCITY};
pub use spring::{SpringConfig, SpringJoint};
