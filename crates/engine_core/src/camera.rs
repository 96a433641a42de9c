//! First-person camera derived from the player, and the perspective
//! projection shared by the renderer and the picker.

use glam::{Mat4, Vec3, Vec4};

use crate::Transform;

/// Height of the eye above the followed entity's origin.
pub const EYE_HEIGHT: f32 = 7.0;

/// View state recomputed every tick from the followed entity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Camera {
    pub position: Vec3,
    /// Degrees; positive looks down.
    pub pitch: f32,
    /// Degrees around +Y.
    pub yaw: f32,
}

impl Camera {
    pub fn new(position: Vec3, pitch: f32, yaw: f32) -> Self {
        Self {
            position,
            pitch,
            yaw,
        }
    }

    /// Camera looking out of the eyes of `target`.
    pub fn follow(target: &Transform, head_pitch: f32) -> Self {
        Self {
            position: target.position + Vec3::new(0.0, EYE_HEIGHT, 0.0),
            pitch: head_pitch,
            yaw: -target.rotation.y,
        }
    }

    /// `Rx(pitch) * Ry(yaw) * T(-position)`.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.pitch.to_radians())
            * Mat4::from_rotation_y(self.yaw.to_radians())
            * Mat4::from_translation(-self.position)
    }

    /// View matrix with the translation removed, for sky rendering.
    pub fn rotation_matrix(&self) -> Mat4 {
        let mut view = self.view_matrix();
        view.w_axis = Vec4::W;
        view
    }
}

/// Perspective projection in OpenGL clip conventions (z in [-1, 1]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov: 80.0,
            near: 0.1,
            far: 1000.0,
            aspect: 16.0 / 9.0,
        }
    }
}

impl Projection {
    pub fn new(width: u32, height: u32) -> Self {
        let mut projection = Self::default();
        projection.resize(width, height);
        projection
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// The field of view spans the horizontal axis; vertical scale grows
    /// with the aspect ratio.
    pub fn matrix(&self) -> Mat4 {
        let y_scale = (1.0 / (self.fov / 2.0).to_radians().tan()) * self.aspect;
        let x_scale = y_scale / self.aspect;
        let frustum_length = self.far - self.near;

        Mat4::from_cols(
            Vec4::new(x_scale, 0.0, 0.0, 0.0),
            Vec4::new(0.0, y_scale, 0.0, 0.0),
            Vec4::new(0.0, 0.0, -((self.far + self.near) / frustum_length), -1.0),
            Vec4::new(0.0, 0.0, -((2.0 * self.near * self.far) / frustum_length), 0.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_sits_at_eye_height_facing_against_yaw() {
        let player = Transform::new(Vec3::new(400.0, 12.0, 400.0), Vec3::new(0.0, 180.0, 0.0), 8.0);
        let camera = Camera::follow(&player, 15.0);
        assert_eq!(camera.position, Vec3::new(400.0, 19.0, 400.0));
        assert_eq!(camera.pitch, 15.0);
        assert_eq!(camera.yaw, -180.0);
    }

    /// The eye position maps to the view-space origin.
    #[test]
    fn view_moves_eye_to_origin() {
        let camera = Camera::new(Vec3::new(3.0, 4.0, 5.0), 20.0, 35.0);
        let p = camera.view_matrix().transform_point3(camera.position);
        assert!(p.length() < 1e-4);
    }

    /// With a 90 degree pitch, straight down is the view direction (-Z).
    #[test]
    fn positive_pitch_looks_down() {
        let camera = Camera::new(Vec3::ZERO, 90.0, 0.0);
        let d = camera.view_matrix().transform_vector3(-Vec3::Y);
        assert!((d - -Vec3::Z).length() < 1e-5, "got {d:?}");
    }

    /// Near plane maps to clip z = -w, far plane to clip z = +w.
    #[test]
    fn projection_maps_near_and_far_planes() {
        let projection = Projection::default();
        let m = projection.matrix();
        let near = m * Vec4::new(0.0, 0.0, -projection.near, 1.0);
        let far = m * Vec4::new(0.0, 0.0, -projection.far, 1.0);
        assert!((near.z / near.w + 1.0).abs() < 1e-3);
        assert!((far.z / far.w - 1.0).abs() < 1e-3);
    }

    #[test]
    fn projection_scales_follow_aspect() {
        let projection = Projection::new(1600, 900);
        let m = projection.matrix();
        assert!((m.y_axis.y / m.x_axis.x - 1600.0 / 900.0).abs() < 1e-4);
    }
}
