//! Heightmap terrain: decoding, height sampling and mesh generation.
//!
//! A [`Heightmap`] is decoded from an image, turned into a [`HeightField`]
//! (heights plus normals), meshed by [`MeshBuilder`] and wrapped in a
//! [`Terrain`] tile placed on the world grid.

pub mod error;
pub mod heightfield;
pub mod heightmap;
pub mod mesh;
pub mod terrain;

pub use error::TerrainError;
pub use heightfield::{barycentric, CellTriangle, Ground, HeightField};
pub use heightmap::{pack_argb, Heightmap, MAX_PIXEL_COLOR};
pub use mesh::MeshBuilder;
pub use terrain::{Terrain, TerrainTexturePack, MAX_HEIGHT, TERRAIN_SIZE};
