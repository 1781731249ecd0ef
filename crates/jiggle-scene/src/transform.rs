//! Decomposed transform type for hierarchy math.

use glam::{Mat4, Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 3D transform stored as translation, rotation, and scale.
///
/// Kept decomposed rather than as a matrix so rotation and translation can be
/// written independently by animation and simulation code.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform {
    /// Position in parent space.
    pub translation: Vec3,
    /// Orientation in parent space.
    pub rotation: Quat,
    /// Per-axis scale factors.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Creates a transform from all three components.
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Creates a translation-only transform.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Creates a rotation-only transform.
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Creates a scale-only transform.
    pub fn from_scale(scale: Vec3) -> Self {
        Self {
            scale,
            ..Self::IDENTITY
        }
    }

    /// Composes `self` (parent) with `child`, yielding the child's transform
    /// expressed in the parent's parent space.
    ///
    /// Assumes no shear, i.e. the scale stays axis-aligned per node.
    pub fn then(&self, child: &Transform) -> Transform {
        Transform {
            translation: self.translation + self.rotation * (self.scale * child.translation),
            rotation: self.rotation * child.rotation,
            scale: self.scale * child.scale,
        }
    }

    /// Returns the inverse transform.
    pub fn inverse(&self) -> Transform {
        let inv_rotation = self.rotation.inverse();
        let inv_scale = Vec3::ONE / self.scale;
        Transform {
            translation: inv_rotation * (-self.translation) * inv_scale,
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }

    /// Transforms a point from this transform's local space outward.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * (self.scale * point)
    }

    /// Converts to a 4x4 column-major matrix (TRS order).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_identity_point() {
        let p = Vec3::new(1.0, -2.0, 3.0);
        assert_eq!(Transform::IDENTITY.transform_point(p), p);
    }

    #[test]
    fn test_compose_translations() {
        let a = Transform::from_translation(Vec3::X);
        let b = Transform::from_translation(Vec3::Y);
        assert_eq!(a.then(&b).translation, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_rotation_moves_child_offset() {
        let parent = Transform::from_rotation(Quat::from_rotation_z(FRAC_PI_2));
        let child = Transform::from_translation(Vec3::X);
        let composed = parent.then(&child);
        assert!((composed.translation - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let t = Transform::new(
            Vec3::new(2.0, -1.0, 4.0),
            Quat::from_rotation_y(0.7),
            Vec3::splat(2.0),
        );
        let roundtrip = t.then(&t.inverse());
        assert!((roundtrip.translation - Vec3::ZERO).length() < 1e-5);
        assert!((roundtrip.rotation.w.abs() - 1.0).abs() < 1e-5);
        assert!((roundtrip.scale - Vec3::ONE).length() < 1e-5);
    }

    #[test]
    fn test_inverse_point() {
        let t = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_x(0.3),
            Vec3::ONE,
        );
        let p = Vec3::new(-4.0, 0.5, 2.0);
        let back = t.inverse().transform_point(t.transform_point(p));
        assert!((back - p).length() < 1e-5);
    }

    #[test]
    fn test_matrix_matches_point_transform() {
        let t = Transform::new(
            Vec3::new(0.5, 1.5, -2.0),
            Quat::from_rotation_z(1.1),
            Vec3::new(2.0, 1.0, 0.5),
        );
        let p = Vec3::new(1.0, 1.0, 1.0);
        let via_matrix = t.to_matrix().transform_point3(p);
        assert!((via_matrix - t.transform_point(p)).length() < 1e-4);
    }
}
