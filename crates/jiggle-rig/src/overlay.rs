//! Read-only debug-draw data for a wiggled skeleton.
//!
//! Produces plain positions and colors for the host renderer to draw; it
//! never mutates the tree or the simulation. Build the overlay before
//! wrapping the skeleton in a rig if the bone-to-bone links should skip the
//! synthetic wrapper nodes.

use glam::Vec3;
use jiggle_scene::{NodeId, SceneTree};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rig::WiggleRig;

/// Configuration for a [`WiggleOverlay`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverlayConfig {
    /// Root of the skeleton to visualize. Without one the overlay draws
    /// nothing.
    pub skeleton: Option<NodeId>,
    /// Diameter of joint markers.
    pub dot_size: f32,
    /// Thickness of bone links.
    pub line_width: f32,
    /// Color for anchored markers (the skeleton root, rest targets).
    pub color_static: [f32; 3],
    /// Color for simulated markers and links.
    pub color_dynamic: [f32; 3],
    /// Length multiplier for the marker extending past each leaf bone.
    pub leaf_extension: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            skeleton: None,
            dot_size: 0.33,
            line_width: 0.025,
            color_static: [0.0, 0.42, 1.0],
            color_dynamic: [0.99, 0.45, 0.16],
            leaf_extension: 1.0,
        }
    }
}

/// A marker to draw at a world position.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverlayDot {
    /// World position.
    pub position: Vec3,
    /// Diameter.
    pub size: f32,
    /// RGB color.
    pub color: [f32; 3],
}

/// A line segment to draw between two world positions.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverlayLine {
    /// World-space start.
    pub start: Vec3,
    /// World-space end.
    pub end: Vec3,
    /// Thickness.
    pub width: f32,
    /// RGB color.
    pub color: [f32; 3],
}

/// One frame of debug-draw data.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverlaySnapshot {
    /// Markers, in draw order.
    pub dots: Vec<OverlayDot>,
    /// Bone links and leaf extensions.
    pub lines: Vec<OverlayLine>,
}

/// Captures a skeleton's shape once and emits draw data for it on demand.
#[derive(Debug, Clone)]
pub struct WiggleOverlay {
    joints: Vec<NodeId>,
    links: Vec<(NodeId, NodeId)>,
    leaves: Vec<(NodeId, f32)>,
    config: OverlayConfig,
}

impl WiggleOverlay {
    /// Builds an overlay for the skeleton named in `config`.
    ///
    /// A missing or vanished skeleton logs a warning and yields an overlay
    /// whose snapshots are empty.
    pub fn new(tree: &SceneTree, config: OverlayConfig) -> Self {
        let inert = Self {
            joints: Vec::new(),
            links: Vec::new(),
            leaves: Vec::new(),
            config,
        };
        let Some(root) = config.skeleton else {
            warn!("overlay has no skeleton; nothing will be drawn");
            return inert;
        };
        if !tree.contains(root) {
            warn!(node = root.0, "overlay skeleton is not in the tree");
            return inert;
        }

        let joints = tree.descendants(root);
        let mut links = Vec::new();
        let mut leaves = Vec::new();
        for &id in &joints {
            let children = tree.children(id);
            if children.is_empty() {
                let length = tree
                    .node(id)
                    .map(|node| node.local.translation.length())
                    .unwrap_or_default();
                leaves.push((id, length));
            }
            for &child in children {
                links.push((id, child));
            }
        }

        Self {
            joints,
            links,
            leaves,
            config,
        }
    }

    /// Emits the current frame's draw data from the tree's cached world
    /// transforms.
    pub fn snapshot(&self, tree: &SceneTree) -> OverlaySnapshot {
        let mut snapshot = OverlaySnapshot::default();

        for (index, &id) in self.joints.iter().enumerate() {
            let Some(position) = tree.world_position(id) else {
                continue;
            };
            let color = if index == 0 {
                self.config.color_static
            } else {
                self.config.color_dynamic
            };
            snapshot.dots.push(OverlayDot {
                position,
                size: self.config.dot_size,
                color,
            });
        }

        for &(id, length) in &self.leaves {
            let tip = Vec3::Y * length * self.config.leaf_extension;
            let Some(tip_world) = tree.local_to_world(id, tip) else {
                continue;
            };
            snapshot.dots.push(OverlayDot {
                position: tip_world,
                size: self.config.dot_size,
                color: self.config.color_dynamic,
            });
            if let Some(head) = tree.world_position(id) {
                snapshot.lines.push(OverlayLine {
                    start: head,
                    end: tip_world,
                    width: self.config.line_width,
                    color: self.config.color_dynamic,
                });
            }
        }

        for &(a, b) in &self.links {
            let (Some(start), Some(end)) = (tree.world_position(a), tree.world_position(b)) else {
                continue;
            };
            snapshot.lines.push(OverlayLine {
                start,
                end,
                width: self.config.line_width,
                color: self.config.color_dynamic,
            });
        }

        snapshot
    }

    /// Like [`snapshot`](Self::snapshot), plus a rest-target marker and a
    /// current-deflection marker for every joint the rig simulates.
    pub fn snapshot_with_rig(&self, tree: &SceneTree, rig: &WiggleRig) -> OverlaySnapshot {
        let mut snapshot = self.snapshot(tree);
        for joint in rig.joints() {
            if let Some(rest) = joint.rest_target(tree) {
                snapshot.dots.push(OverlayDot {
                    position: rest,
                    size: self.config.dot_size,
                    color: self.config.color_static,
                });
            }
            snapshot.dots.push(OverlayDot {
                position: joint.deflection(),
                size: self.config.dot_size,
                color: self.config.color_dynamic,
            });
        }
        snapshot
    }

    /// Returns the number of joints the overlay tracks.
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::{RigConfig, WIGGLE_STIFFNESS};
    use jiggle_scene::Transform;

    fn skeleton() -> (SceneTree, NodeId) {
        let mut tree = SceneTree::new();
        let root = tree.add_node("root", Transform::IDENTITY, None).unwrap();
        let mid = tree
            .add_node("mid", Transform::from_translation(Vec3::Y), Some(root))
            .unwrap();
        tree.add_node("tip", Transform::from_translation(Vec3::Y), Some(mid))
            .unwrap();
        tree.update_all();
        (tree, root)
    }

    #[test]
    fn test_snapshot_counts() {
        let (tree, root) = skeleton();
        let overlay = WiggleOverlay::new(
            &tree,
            OverlayConfig {
                skeleton: Some(root),
                ..OverlayConfig::default()
            },
        );

        assert_eq!(overlay.joint_count(), 3);
        let snapshot = overlay.snapshot(&tree);
        // One dot per joint plus one leaf extension.
        assert_eq!(snapshot.dots.len(), 4);
        // Two bone links plus one leaf extension line.
        assert_eq!(snapshot.lines.len(), 3);
    }

    #[test]
    fn test_root_dot_is_static_colored() {
        let (tree, root) = skeleton();
        let config = OverlayConfig {
            skeleton: Some(root),
            ..OverlayConfig::default()
        };
        let overlay = WiggleOverlay::new(&tree, config);
        let snapshot = overlay.snapshot(&tree);
        assert_eq!(snapshot.dots[0].color, config.color_static);
        assert_eq!(snapshot.dots[1].color, config.color_dynamic);
    }

    #[test]
    fn test_leaf_extension_position() {
        let (tree, root) = skeleton();
        let overlay = WiggleOverlay::new(
            &tree,
            OverlayConfig {
                skeleton: Some(root),
                ..OverlayConfig::default()
            },
        );
        let snapshot = overlay.snapshot(&tree);
        // The tip rests at (0,2,0) with a unit rest offset, so the extension
        // marker lands one unit further along +Y.
        let extension = snapshot.dots.last().unwrap();
        assert!((extension.position - Vec3::new(0.0, 3.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_missing_skeleton_is_inert() {
        let (tree, _) = skeleton();
        let overlay = WiggleOverlay::new(&tree, OverlayConfig::default());
        assert_eq!(overlay.joint_count(), 0);
        let snapshot = overlay.snapshot(&tree);
        assert!(snapshot.dots.is_empty());
        assert!(snapshot.lines.is_empty());
    }

    #[test]
    fn test_snapshot_with_rig_adds_markers() {
        let (mut tree, root) = skeleton();
        let tip = tree.find_node("tip").unwrap();
        tree.set_metadata(tip, WIGGLE_STIFFNESS, 700.0);

        let overlay = WiggleOverlay::new(
            &tree,
            OverlayConfig {
                skeleton: Some(root),
                ..OverlayConfig::default()
            },
        );
        let mut rig = WiggleRig::from_skeleton(&mut tree, root, &RigConfig::default());
        rig.update(&mut tree, 1.0 / 60.0);

        let plain = overlay.snapshot(&tree);
        let with_rig = overlay.snapshot_with_rig(&tree, &rig);
        assert_eq!(with_rig.dots.len(), plain.dots.len() + 2);
    }
}
