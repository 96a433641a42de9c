//! GPU-resident meshes.

use engine_core::MeshData;
use wgpu::util::DeviceExt;

use crate::vertex::SkyVertex;

/// Half the edge length of the sky cube.
pub const SKYBOX_SIZE: f32 = 500.0;

/// A GPU mesh with vertex and index buffers.
pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl Mesh {
    /// Upload vertex and index data.
    pub fn new(device: &wgpu::Device, label: &str, data: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_indices: data.indices.len() as u32,
        }
    }
}

/// Non-indexed cube drawn around the camera for the sky.
pub struct SkyCube {
    pub vertex_buffer: wgpu::Buffer,
    pub num_vertices: u32,
}

impl SkyCube {
    pub fn new(device: &wgpu::Device) -> Self {
        let vertices = sky_cube_vertices(SKYBOX_SIZE);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sky Cube Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertex_buffer,
            num_vertices: vertices.len() as u32,
        }
    }
}

/// 36 vertices, wound to be seen from inside.
fn sky_cube_vertices(s: f32) -> Vec<SkyVertex> {
    #[rustfmt::skip]
    let corners: [[f32; 3]; 36] = [
        [-s,  s, -s], [-s, -s, -s], [ s, -s, -s], [ s, -s, -s], [ s,  s, -s], [-s,  s, -s],
        [-s, -s,  s], [-s, -s, -s], [-s,  s, -s], [-s,  s, -s], [-s,  s,  s], [-s, -s,  s],
        [ s, -s, -s], [ s, -s,  s], [ s,  s,  s], [ s,  s,  s], [ s,  s, -s], [ s, -s, -s],
        [-s, -s,  s], [-s,  s,  s], [ s,  s,  s], [ s,  s,  s], [ s, -s,  s], [-s, -s,  s],
        [-s,  s, -s], [ s,  s, -s], [ s,  s,  s], [ s,  s,  s], [-s,  s,  s], [-s,  s, -s],
        [-s, -s, -s], [-s, -s,  s], [ s, -s, -s], [ s, -s, -s], [-s, -s,  s], [ s, -s,  s],
    ];
    corners.iter().map(|&position| SkyVertex { position }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    /// Every face is wound counter-clockwise when seen from the centre.
    #[test]
    fn sky_cube_faces_inwards() {
        let vertices = sky_cube_vertices(1.0);
        assert_eq!(vertices.len(), 36);
        for tri in vertices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|v| Vec3::from(v.position));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(-centroid) > 0.0, "triangle {a} {b} {c} faces out");
        }
    }
}
