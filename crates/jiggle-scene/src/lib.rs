//! Hierarchical transform tree for procedural animation.
//!
//! Provides an arena-based scene hierarchy with:
//! - [`Transform`] - decomposed translation/rotation/scale transform
//! - [`SceneTree`] - node arena with stable ids, reparenting, and removal
//! - Cached world transforms, recomputed on demand per subtree
//! - Free-form per-node metadata for tagging nodes with simulation parameters
//!
//! # Example
//!
//! ```
//! use jiggle_scene::{SceneTree, Transform};
//! use glam::Vec3;
//!
//! let mut tree = SceneTree::new();
//! let root = tree.add_node("root", Transform::IDENTITY, None).unwrap();
//! let arm = tree
//!     .add_node("arm", Transform::from_translation(Vec3::Y), Some(root))
//!     .unwrap();
//!
//! tree.update_all();
//! assert_eq!(tree.world_position(arm), Some(Vec3::Y));
//! ```

mod transform;
mod tree;

pub use transform::Transform;
pub use tree::{Node, NodeId, SceneError, SceneTree};
