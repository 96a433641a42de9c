//! Height samples, normals and interpolated height queries.

use glam::{Vec2, Vec3};

use crate::{Heightmap, TerrainError};

/// Anything that can answer "how high is the ground here".
pub trait Ground {
    fn height_at(&self, x: f32, z: f32) -> f32;
}

/// Height of `pos` on the plane through three points, by barycentric weights
/// computed in XZ.
pub fn barycentric(p1: Vec3, p2: Vec3, p3: Vec3, pos: Vec2) -> f32 {
    let det = (p2.z - p3.z) * (p1.x - p3.x) + (p3.x - p2.x) * (p1.z - p3.z);
    let l1 = ((p2.z - p3.z) * (pos.x - p3.x) + (p3.x - p2.x) * (pos.y - p3.z)) / det;
    let l2 = ((p3.z - p1.z) * (pos.x - p3.x) + (p1.x - p3.x) * (pos.y - p3.z)) / det;
    let l3 = 1.0 - l1 - l2;
    l1 * p1.y + l2 * p2.y + l3 * p3.y
}

/// Which half of a grid cell a point falls in.
///
/// Cells are split along the diagonal from `(x+1, z)` to `(x, z+1)`. Points
/// exactly on the diagonal belong to the upper-left half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellTriangle {
    UpperLeft,
    LowerRight,
}

impl CellTriangle {
    pub fn select(x_frac: f32, z_frac: f32) -> Self {
        if x_frac <= 1.0 - z_frac {
            CellTriangle::UpperLeft
        } else {
            CellTriangle::LowerRight
        }
    }
}

/// Square grid of heights covering `size` x `size` world units.
#[derive(Debug, Clone)]
pub struct HeightField {
    resolution: usize,
    size: f32,
    /// Row-major, `x` fastest.
    heights: Vec<f32>,
    normals: Vec<Vec3>,
}

impl HeightField {
    /// Darker pixels become higher ground: `height = darkness * max_height`.
    pub fn build(map: &Heightmap, size: f32, max_height: f32) -> Self {
        let n = map.resolution();
        let mut heights = Vec::with_capacity(n * n);
        for z in 0..n as i64 {
            for x in 0..n as i64 {
                heights.push(map.darkness(x, z) * max_height);
            }
        }
        Self::with_heights(n, size, heights)
    }

    /// Build from raw heights, row-major with `x` fastest.
    pub fn from_heights(resolution: usize, size: f32, heights: Vec<f32>) -> Result<Self, TerrainError> {
        if resolution < 2 {
            return Err(TerrainError::TooSmall(resolution));
        }
        if heights.len() != resolution * resolution {
            return Err(TerrainError::SampleCount {
                expected: resolution * resolution,
                actual: heights.len(),
            });
        }
        Ok(Self::with_heights(resolution, size, heights))
    }

    fn with_heights(resolution: usize, size: f32, heights: Vec<f32>) -> Self {
        let mut field = Self {
            resolution,
            size,
            heights,
            normals: Vec::new(),
        };
        let n = resolution as i64;
        field.normals = (0..n)
            .flat_map(|z| (0..n).map(move |x| (x, z)))
            .map(|(x, z)| field.central_difference(x, z))
            .collect();
        field
    }

    /// Neighbours outside the grid count as height 0.
    fn central_difference(&self, x: i64, z: i64) -> Vec3 {
        let left = self.sample(x - 1, z);
        let right = self.sample(x + 1, z);
        let down = self.sample(x, z - 1);
        let up = self.sample(x, z + 1);
        Vec3::new(left - right, 2.0, down - up).normalize()
    }

    fn sample(&self, x: i64, z: i64) -> f32 {
        let n = self.resolution as i64;
        if x < 0 || z < 0 || x >= n || z >= n {
            return 0.0;
        }
        self.heights[(z * n + x) as usize]
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// World distance between neighbouring samples.
    pub fn cell_size(&self) -> f32 {
        self.size / (self.resolution - 1) as f32
    }

    /// Height stored at grid point `(x, z)`.
    ///
    /// # Panics
    /// If the grid point is out of range.
    pub fn height(&self, x: usize, z: usize) -> f32 {
        self.heights[z * self.resolution + x]
    }

    pub fn normal(&self, x: usize, z: usize) -> Vec3 {
        self.normals[z * self.resolution + x]
    }

    /// Grid cell and in-cell fractions for a local position, or `None`
    /// outside the field.
    fn locate(&self, x: f32, z: f32) -> Option<(usize, usize, f32, f32)> {
        let cell = self.cell_size();
        let grid_x = (x / cell).floor();
        let grid_z = (z / cell).floor();
        let last = (self.resolution - 1) as f32;
        if !(grid_x >= 0.0 && grid_z >= 0.0 && grid_x < last && grid_z < last) {
            return None;
        }
        let x_frac = (x % cell) / cell;
        let z_frac = (z % cell) / cell;
        Some((grid_x as usize, grid_z as usize, x_frac, z_frac))
    }

    /// Triangle a local position falls in, or `None` outside the field.
    pub fn triangle_at(&self, x: f32, z: f32) -> Option<CellTriangle> {
        self.locate(x, z).map(|(_, _, fx, fz)| CellTriangle::select(fx, fz))
    }

    /// Interpolated height at a position relative to the field's origin.
    /// Returns 0 outside the field.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let Some((gx, gz, fx, fz)) = self.locate(x, z) else {
            return 0.0;
        };
        let pos = Vec2::new(fx, fz);
        match CellTriangle::select(fx, fz) {
            CellTriangle::UpperLeft => barycentric(
                Vec3::new(0.0, self.height(gx, gz), 0.0),
                Vec3::new(1.0, self.height(gx + 1, gz), 0.0),
                Vec3::new(0.0, self.height(gx, gz + 1), 1.0),
                pos,
            ),
            CellTriangle::LowerRight => barycentric(
                Vec3::new(1.0, self.height(gx + 1, gz), 0.0),
                Vec3::new(1.0, self.height(gx + 1, gz + 1), 1.0),
                Vec3::new(0.0, self.height(gx, gz + 1), 1.0),
                pos,
            ),
        }
    }
}

impl Ground for HeightField {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        HeightField::height_at(self, x, z)
    }
}
