//! Triangle mesh generation from a height field.

use engine_core::{MeshData, Vertex};

use crate::HeightField;

/// Turns a [`HeightField`] into an indexed grid mesh.
pub struct MeshBuilder;

impl MeshBuilder {
    /// One vertex per sample, row-major with `x` fastest, UVs spanning
    /// `[0, 1]`. Each cell emits (top-left, bottom-left, top-right) and
    /// (top-right, bottom-left, bottom-right), counter-clockwise seen from
    /// above.
    pub fn build(field: &HeightField) -> MeshData {
        let n = field.resolution();
        let last = (n - 1) as f32;
        let size = field.size();

        let mut vertices = Vec::with_capacity(n * n);
        for z in 0..n {
            for x in 0..n {
                let u = x as f32 / last;
                let v = z as f32 / last;
                vertices.push(Vertex::new(
                    [u * size, field.height(x, z), v * size],
                    [u, v],
                    field.normal(x, z).to_array(),
                ));
            }
        }

        let mut indices = Vec::with_capacity(6 * (n - 1) * (n - 1));
        for z in 0..n - 1 {
            for x in 0..n - 1 {
                let top_left = (z * n + x) as u32;
                let top_right = top_left + 1;
                let bottom_left = ((z + 1) * n + x) as u32;
                let bottom_right = bottom_left + 1;
                indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }

        log::debug!("Built terrain mesh: {} vertices, {} indices", vertices.len(), indices.len());
        MeshData::new(vertices, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn field() -> HeightField {
        let heights = (0..16).map(|i| ((i * 7) % 5) as f32 - 1.5).collect();
        HeightField::from_heights(4, 30.0, heights).unwrap()
    }

    /// Re-reading vertex heights at grid points gives back the field exactly.
    #[test]
    fn vertex_heights_round_trip() {
        let field = field();
        let mesh = MeshBuilder::build(&field);
        assert_eq!(mesh.vertices.len(), 16);
        for z in 0..4 {
            for x in 0..4 {
                let v = mesh.vertices[z * 4 + x];
                assert_eq!(v.position[1], field.height(x, z));
                assert!((v.position[0] - x as f32 * 10.0).abs() < 1e-4);
                assert!((v.position[2] - z as f32 * 10.0).abs() < 1e-4);
                assert_eq!(v.tex_coords, [x as f32 / 3.0, z as f32 / 3.0]);
                assert_eq!(v.normal, field.normal(x, z).to_array());
            }
        }
    }

    #[test]
    fn cell_winding_and_count() {
        let field = HeightField::from_heights(3, 2.0, vec![0.0; 9]).unwrap();
        let mesh = MeshBuilder::build(&field);
        assert_eq!(mesh.indices.len(), 6 * 4);
        assert_eq!(&mesh.indices[..6], &[0, 3, 1, 1, 3, 4]);
        // Last cell.
        assert_eq!(&mesh.indices[18..], &[4, 7, 5, 5, 7, 8]);
    }

    /// Every triangle of a flat field faces up.
    #[test]
    fn triangles_face_up() {
        let field = HeightField::from_heights(3, 2.0, vec![0.0; 9]).unwrap();
        let mesh = MeshBuilder::build(&field);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.vertices[i as usize].position));
            let n = (b - a).cross(c - a);
            assert!(n.y > 0.0, "triangle {tri:?} faces down");
        }
    }

    #[test]
    fn deterministic() {
        let field = field();
        assert_eq!(MeshBuilder::build(&field), MeshBuilder::build(&field));
    }
}
