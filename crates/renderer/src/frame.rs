//! The draw list a [`MasterRenderer`](crate::MasterRenderer) hands to a
//! [`RenderBackend`] each frame.

use engine_core::{CubeMapHandle, LightSet, Mat4, Material, MeshHandle, ModelHandle, TextureHandle, Vec2, Vec3};
use terrain::TerrainTexturePack;

use crate::RenderError;

/// Exponential distance fog: `visibility = exp(-(distance * density)^gradient)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub density: f32,
    pub gradient: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            density: 0.007,
            gradient: 1.5,
        }
    }
}

impl Fog {
    pub fn visibility(&self, distance: f32) -> f32 {
        (-(distance * self.density).powf(self.gradient)).exp().clamp(0.0, 1.0)
    }
}

/// Values shared by every draw in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneParams {
    pub view: Mat4,
    /// OpenGL-style clip space; backends convert as needed.
    pub projection: Mat4,
    /// View rotation for the sky, translation removed.
    pub sky_view: Mat4,
    pub camera_position: Vec3,
    pub lights: LightSet,
    /// Clear colour and fog colour.
    pub sky_color: Vec3,
    pub fog: Fog,
    /// 0 is full day, 1 full night.
    pub fade: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    /// Bind mesh and material state for the following entity draws.
    BindModel {
        model: ModelHandle,
        mesh: MeshHandle,
        index_count: u32,
        material: Material,
    },
    /// Draw the bound model once with this transform.
    DrawEntity { transform: Mat4, texture_offset: Vec2 },
    DrawTerrain {
        mesh: MeshHandle,
        index_count: u32,
        transform: Mat4,
        textures: TerrainTexturePack,
        blend_map: TextureHandle,
    },
    DrawSkybox {
        day: CubeMapHandle,
        night: CubeMapHandle,
        fade: f32,
    },
}

/// One frame: clear, then the commands in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub scene: SceneParams,
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn entity_draws(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::DrawEntity { .. }))
            .count()
    }

    pub fn terrain_draws(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::DrawTerrain { .. }))
            .count()
    }
}

/// Counters reported by a flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub batches: usize,
    pub draw_calls: usize,
    pub skipped_batches: usize,
    pub terrain_tiles: usize,
}

/// Something that can execute a [`Frame`].
pub trait RenderBackend {
    /// Number of indices in an uploaded mesh; 0 if unknown or empty.
    fn index_count(&self, mesh: MeshHandle) -> u32;

    fn render(&mut self, frame: &Frame) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fog_fades_with_distance() {
        let fog = Fog::default();
        assert_eq!(fog.visibility(0.0), 1.0);
        let near = fog.visibility(50.0);
        let far = fog.visibility(600.0);
        assert!(near > far);
        assert!(far < 0.01);
        assert!((fog.visibility(100.0) - (-(0.7_f32).powf(1.5)).exp()).abs() < 1e-6);
    }
}
