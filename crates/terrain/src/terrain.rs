//! A terrain tile placed on the world grid.

use std::path::Path;

use engine_core::{AssetLoader, MeshHandle, TextureHandle};
use glam::{Mat4, Vec3};

use crate::{Ground, HeightField, Heightmap, MeshBuilder, TerrainError};

/// Edge length of one tile in world units.
pub const TERRAIN_SIZE: f32 = 800.0;
/// Height of a fully black heightmap pixel.
pub const MAX_HEIGHT: f32 = 30.0;

/// Ground textures blended by the blend map: the background shows where
/// the map is black, `r`, `g` and `b` where the matching channel is lit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TerrainTexturePack {
    pub background: TextureHandle,
    pub r: TextureHandle,
    pub g: TextureHandle,
    pub b: TextureHandle,
}

/// Immutable terrain tile. Built once at level load.
#[derive(Debug)]
pub struct Terrain {
    grid_x: i32,
    grid_z: i32,
    field: HeightField,
    mesh: MeshHandle,
    index_count: u32,
    textures: TerrainTexturePack,
    blend_map: TextureHandle,
}

impl Terrain {
    pub fn new(
        grid_x: i32,
        grid_z: i32,
        field: HeightField,
        mesh: MeshHandle,
        index_count: u32,
        textures: TerrainTexturePack,
        blend_map: TextureHandle,
    ) -> Self {
        Self {
            grid_x,
            grid_z,
            field,
            mesh,
            index_count,
            textures,
            blend_map,
        }
    }

    /// Mesh and upload a height field.
    pub fn from_field(
        grid_x: i32,
        grid_z: i32,
        field: HeightField,
        textures: TerrainTexturePack,
        blend_map: TextureHandle,
        loader: &mut impl AssetLoader,
    ) -> Result<Self, TerrainError> {
        let mesh_data = MeshBuilder::build(&field);
        let label = format!("terrain ({grid_x}, {grid_z})");
        let mesh = loader.load_mesh(&label, &mesh_data)?;
        Ok(Self::new(
            grid_x,
            grid_z,
            field,
            mesh,
            mesh_data.index_count(),
            textures,
            blend_map,
        ))
    }

    /// Decode the heightmap at `path` and build a full-size tile from it.
    pub fn load(
        grid_x: i32,
        grid_z: i32,
        path: impl AsRef<Path>,
        textures: TerrainTexturePack,
        blend_map: TextureHandle,
        loader: &mut impl AssetLoader,
    ) -> Result<Self, TerrainError> {
        let map = Heightmap::load(path.as_ref())?;
        let field = HeightField::build(&map, TERRAIN_SIZE, MAX_HEIGHT);
        log::info!(
            "Terrain ({grid_x}, {grid_z}) built from {:?}: {}x{} samples",
            path.as_ref(),
            field.resolution(),
            field.resolution()
        );
        Self::from_field(grid_x, grid_z, field, textures, blend_map, loader)
    }

    pub fn grid(&self) -> (i32, i32) {
        (self.grid_x, self.grid_z)
    }

    /// World position of the tile's (0, 0) corner.
    pub fn origin(&self) -> Vec3 {
        let size = self.field.size();
        Vec3::new(self.grid_x as f32 * size, 0.0, self.grid_z as f32 * size)
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.origin())
    }

    pub fn field(&self) -> &HeightField {
        &self.field
    }

    pub fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn textures(&self) -> &TerrainTexturePack {
        &self.textures
    }

    pub fn blend_map(&self) -> TextureHandle {
        self.blend_map
    }

    pub fn size(&self) -> f32 {
        self.field.size()
    }

    pub fn contains(&self, world_x: f32, world_z: f32) -> bool {
        let origin = self.origin();
        let (x, z) = (world_x - origin.x, world_z - origin.z);
        x >= 0.0 && z >= 0.0 && x < self.size() && z < self.size()
    }

    /// Ground height at a world position; 0 off the tile.
    pub fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        let origin = self.origin();
        self.field.height_at(world_x - origin.x, world_z - origin.z)
    }
}

impl Ground for Terrain {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        Terrain::height_at(self, x, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{AssetError, CubeMapHandle, MeshData};
    use std::path::PathBuf;

    #[derive(Default)]
    struct CountingLoader {
        meshes: Vec<usize>,
    }

    impl AssetLoader for CountingLoader {
        fn load_mesh(&mut self, _label: &str, mesh: &MeshData) -> Result<MeshHandle, AssetError> {
            self.meshes.push(mesh.vertices.len());
            Ok(MeshHandle(self.meshes.len() as u32 - 1))
        }

        fn load_texture(&mut self, _path: &Path) -> Result<TextureHandle, AssetError> {
            Ok(TextureHandle(0))
        }

        fn load_cube_map(&mut self, _faces: &[PathBuf; 6]) -> Result<CubeMapHandle, AssetError> {
            Ok(CubeMapHandle(0))
        }
    }

    fn pack() -> TerrainTexturePack {
        TerrainTexturePack {
            background: TextureHandle(0),
            r: TextureHandle(1),
            g: TextureHandle(2),
            b: TextureHandle(3),
        }
    }

    fn tile(grid_x: i32, grid_z: i32) -> Terrain {
        let field = HeightField::from_heights(3, 10.0, vec![1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
        let mut loader = CountingLoader::default();
        let terrain = Terrain::from_field(grid_x, grid_z, field, pack(), TextureHandle(4), &mut loader).unwrap();
        assert_eq!(loader.meshes, vec![9]);
        terrain
    }

    #[test]
    fn uploads_one_mesh_with_all_indices() {
        let terrain = tile(0, 0);
        assert_eq!(terrain.mesh(), MeshHandle(0));
        assert_eq!(terrain.index_count(), 24);
        assert_eq!(terrain.blend_map(), TextureHandle(4));
    }

    /// Queries are shifted by the tile's grid origin.
    #[test]
    fn world_queries_use_the_origin() {
        let terrain = tile(1, -1);
        assert_eq!(terrain.origin(), Vec3::new(10.0, 0.0, -10.0));
        assert_eq!(terrain.height_at(15.0, -5.0), 5.0);
        assert_eq!(terrain.height_at(5.0, -5.0), 0.0);
        assert!(terrain.contains(10.0, -10.0));
        assert!(!terrain.contains(20.0, -5.0));
        assert_eq!(Ground::height_at(&terrain, 15.0, -5.0), 5.0);
    }

    #[test]
    fn missing_heightmap_aborts_load() {
        let mut loader = CountingLoader::default();
        let result = Terrain::load(0, 0, "nope/heightmap.png", pack(), TextureHandle(4), &mut loader);
        assert!(result.is_err());
        assert!(loader.meshes.is_empty());
    }
}
