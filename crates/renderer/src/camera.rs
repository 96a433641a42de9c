//! Per-frame uniform data: camera matrices, lights, fog and sky.

use bytemuck::{Pod, Zeroable};
use engine_core::{Light, Mat4, MAX_LIGHTS};
use glam::Vec4;

use crate::SceneParams;

/// Maps OpenGL clip depth `[-1, 1]` to wgpu's `[0, 1]`.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 1.0),
);

/// One light slot (must match `Light` in the WGSL shaders).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub attenuation: [f32; 4],
}

impl From<&Light> for LightUniform {
    fn from(light: &Light) -> Self {
        Self {
            position: light.position.extend(1.0).to_array(),
            color: light.color.extend(1.0).to_array(),
            attenuation: light.attenuation.extend(0.0).to_array(),
        }
    }
}

/// Scene uniform data for GPU (must match `Scene` in the WGSL shaders).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneUniform {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub sky_view: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub sky_color: [f32; 4],
    /// x = density, y = gradient, z = day/night fade, w unused
    pub fog: [f32; 4],
    pub lights: [LightUniform; MAX_LIGHTS],
}

impl SceneUniform {
    pub fn new() -> Self {
        Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            proj: OPENGL_TO_WGPU_MATRIX.to_cols_array_2d(),
            sky_view: Mat4::IDENTITY.to_cols_array_2d(),
            camera_position: [0.0, 0.0, 0.0, 1.0],
            sky_color: [0.0, 0.0, 0.0, 1.0],
            fog: [0.0; 4],
            lights: [LightUniform::from(&Light::padding()); MAX_LIGHTS],
        }
    }

    pub fn update(&mut self, scene: &SceneParams) {
        self.view = scene.view.to_cols_array_2d();
        self.proj = (OPENGL_TO_WGPU_MATRIX * scene.projection).to_cols_array_2d();
        self.sky_view = scene.sky_view.to_cols_array_2d();
        self.camera_position = scene.camera_position.extend(1.0).to_array();
        self.sky_color = scene.sky_color.extend(1.0).to_array();
        self.fog = [scene.fog.density, scene.fog.gradient, scene.fade, 0.0];
        for (slot, light) in self.lights.iter_mut().zip(scene.lights.slots()) {
            *slot = LightUniform::from(light);
        }
    }
}

impl Default for SceneUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fog;
    use engine_core::{LightSet, Projection, Vec3};

    /// Uniform buffers need a size that is a multiple of 16 bytes.
    #[test]
    fn scene_uniform_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 48);
        assert_eq!(std::mem::size_of::<SceneUniform>() % 16, 0);
    }

    #[test]
    fn update_converts_depth_range_and_pads_lights() {
        let projection = Projection::default();
        let scene = SceneParams {
            view: Mat4::IDENTITY,
            projection: projection.matrix(),
            sky_view: Mat4::IDENTITY,
            camera_position: Vec3::new(1.0, 2.0, 3.0),
            lights: LightSet::from_lights(&[Light::new(Vec3::Y, Vec3::ONE)]),
            sky_color: Vec3::splat(0.2),
            fog: Fog::default(),
            fade: 0.25,
        };
        let mut uniform = SceneUniform::new();
        uniform.update(&scene);

        let proj = Mat4::from_cols_array_2d(&uniform.proj);
        let near = proj * Vec4::new(0.0, 0.0, -projection.near, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -projection.far, 1.0);
        assert!((near.z / near.w).abs() < 1e-3);
        assert!((far.z / far.w - 1.0).abs() < 1e-3);

        assert_eq!(uniform.fog, [0.007, 1.5, 0.25, 0.0]);
        assert_eq!(uniform.lights[0].color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(uniform.lights[1].color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniform.lights[1].attenuation, [1.0, 0.0, 0.0, 0.0]);
    }
}
