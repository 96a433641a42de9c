//! Transform component: position, Euler rotation in degrees, uniform scale.

use glam::{Mat4, Vec3};

/// World placement of an object.
///
/// Rotation is stored as Euler angles in degrees around X, Y and Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Vec3, scale: f32) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Model matrix `T * Rz * Ry * Rx * S`.
    ///
    /// Applied to a point this scales first, then rotates about X, Y, Z in
    /// that order, then translates.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_scale(Vec3::splat(self.scale))
    }

    /// Translate the transform by a delta.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Add to the Euler angles (degrees).
    pub fn rotate(&mut self, delta: Vec3) {
        self.rotation += delta;
    }

    /// Yaw in degrees.
    pub fn rot_y(&self) -> f32 {
        self.rotation.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    /// Identity transform maps points onto themselves.
    #[test]
    fn default_is_identity() {
        let m = Transform::default().to_matrix();
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    /// Scale is applied before rotation and translation.
    #[test]
    fn scale_then_translate() {
        let t = Transform::new(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO, 2.0);
        let p = t.to_matrix().transform_point3(Vec3::new(1.0, 1.0, 1.0));
        assert!(approx(p, Vec3::new(12.0, 2.0, 2.0)));
    }

    /// X rotation happens before Y rotation.
    #[test]
    fn rotation_order_is_x_then_y_then_z() {
        let t = Transform::new(Vec3::ZERO, Vec3::new(90.0, 90.0, 0.0), 1.0);
        // +Y rotated 90 deg about X goes to +Z, then 90 deg about Y goes to +X.
        let p = t.to_matrix().transform_point3(Vec3::Y);
        assert!(approx(p, Vec3::X), "got {p:?}");

        let t = Transform::new(Vec3::ZERO, Vec3::new(0.0, 90.0, 90.0), 1.0);
        // +X about Y goes to -Z, about Z stays -Z.
        let p = t.to_matrix().transform_point3(Vec3::X);
        assert!(approx(p, -Vec3::Z), "got {p:?}");
    }

    #[test]
    fn translate_and_rotate_accumulate() {
        let mut t = Transform::default();
        t.translate(Vec3::new(1.0, 2.0, 3.0));
        t.translate(Vec3::new(1.0, 0.0, 0.0));
        t.rotate(Vec3::new(0.0, 45.0, 0.0));
        t.rotate(Vec3::new(0.0, 45.0, 0.0));
        assert_eq!(t.position, Vec3::new(2.0, 2.0, 3.0));
        assert_eq!(t.rot_y(), 90.0);
    }
}
