//! GPU buffer layouts for mesh vertices and per-draw instance data.

use bytemuck::{Pod, Zeroable};
use engine_core::{Mat4, Material, Vec2, Vertex};

/// Types that can be bound as a vertex buffer.
pub trait VertexLayout {
    fn layout() -> wgpu::VertexBufferLayout<'static>;
}

impl VertexLayout for Vertex {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // UV/Tex coords
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Per-draw data: transform plus the material values the shaders read.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Model matrix (4x4)
    pub model: [[f32; 4]; 4],
    /// x = shine damper, y = reflectivity, z = fake lighting (0/1), w = atlas rows
    pub material: [f32; 4],
    /// xy = atlas cell offset
    pub atlas: [f32; 4],
}

impl InstanceData {
    pub fn new(model: Mat4, material: &Material, texture_offset: Vec2) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            material: [
                material.shine_damper,
                material.reflectivity,
                if material.use_fake_lighting { 1.0 } else { 0.0 },
                material.atlas_rows.max(1) as f32,
            ],
            atlas: [texture_offset.x, texture_offset.y, 0.0, 0.0],
        }
    }

    /// Terrain tiles only use the transform.
    pub fn terrain(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            material: [1.0, 0.0, 0.0, 1.0],
            atlas: [0.0; 4],
        }
    }
}

impl VertexLayout for InstanceData {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Model matrix column 0
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Model matrix column 1
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Model matrix column 2
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Model matrix column 3
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Material
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Atlas offset
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 20]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Position-only vertex for the sky cube.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SkyVertex {
    pub position: [f32; 3],
}

impl VertexLayout for SkyVertex {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SkyVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::TextureHandle;

    /// Strides must match the WGSL inputs.
    #[test]
    fn layouts_match_struct_sizes() {
        assert_eq!(Vertex::layout().array_stride, 32);
        assert_eq!(InstanceData::layout().array_stride, 96);
        assert_eq!(InstanceData::layout().attributes.len(), 6);
        assert_eq!(SkyVertex::layout().array_stride, 12);
    }

    #[test]
    fn instance_packs_material() {
        let material = Material::new(TextureHandle(0)).shiny(10.0, 0.5).fake_lit();
        let data = InstanceData::new(Mat4::IDENTITY, &material, Vec2::new(0.5, 0.0));
        assert_eq!(data.material, [10.0, 0.5, 1.0, 1.0]);
        assert_eq!(data.atlas, [0.5, 0.0, 0.0, 0.0]);
        assert_eq!(data.model[3], [0.0, 0.0, 0.0, 1.0]);
    }
}
