//! Asset handles, materials and the model table used as batch keys.

use std::path::{Path, PathBuf};

use crate::{AssetError, MeshData};

/// GPU-resident mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub u32);

/// GPU-resident 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// GPU-resident cube map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CubeMapHandle(pub u32);

/// Index into a [`ModelRegistry`]. Two handles are the same batch only if
/// they are the same registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelHandle(pub u32);

/// Surface parameters for a textured model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub texture: TextureHandle,
    pub shine_damper: f32,
    pub reflectivity: f32,
    /// Drawn without back-face culling.
    pub has_transparency: bool,
    /// Lit as if the normal pointed straight up (grass, flat foliage).
    pub use_fake_lighting: bool,
    /// Texture atlas is `atlas_rows` x `atlas_rows` cells.
    pub atlas_rows: u32,
}

impl Material {
    pub fn new(texture: TextureHandle) -> Self {
        Self {
            texture,
            shine_damper: 1.0,
            reflectivity: 0.0,
            has_transparency: false,
            use_fake_lighting: false,
            atlas_rows: 1,
        }
    }

    pub fn shiny(mut self, shine_damper: f32, reflectivity: f32) -> Self {
        self.shine_damper = shine_damper;
        self.reflectivity = reflectivity;
        self
    }

    pub fn transparent(mut self) -> Self {
        self.has_transparency = true;
        self
    }

    pub fn fake_lit(mut self) -> Self {
        self.use_fake_lighting = true;
        self
    }
}

/// Mesh plus material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturedModel {
    pub mesh: MeshHandle,
    pub material: Material,
}

/// Table of registered models. The position in the table is the handle.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: Vec<TexturedModel>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model. Registering an identical model again yields a new,
    /// distinct handle.
    pub fn register(&mut self, model: TexturedModel) -> ModelHandle {
        let handle = ModelHandle(self.models.len() as u32);
        self.models.push(model);
        handle
    }

    pub fn get(&self, handle: ModelHandle) -> Option<&TexturedModel> {
        self.models.get(handle.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Turns decoded asset data into GPU-resident handles.
pub trait AssetLoader {
    fn load_mesh(&mut self, label: &str, mesh: &MeshData) -> Result<MeshHandle, AssetError>;

    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, AssetError>;

    /// Textures read as data rather than colour, such as blend maps.
    fn load_data_texture(&mut self, path: &Path) -> Result<TextureHandle, AssetError> {
        self.load_texture(path)
    }

    /// Faces in +X, -X, +Y, -Y, +Z, -Z order.
    fn load_cube_map(&mut self, faces: &[PathBuf; 6]) -> Result<CubeMapHandle, AssetError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Equal materials registered twice are still different batch keys.
    #[test]
    fn registry_hands_out_identity_keys() {
        let mut registry = ModelRegistry::new();
        let model = TexturedModel {
            mesh: MeshHandle(0),
            material: Material::new(TextureHandle(0)),
        };
        let a = registry.register(model);
        let b = registry.register(model);
        assert_ne!(a, b);
        assert_eq!(registry.get(a), registry.get(b));
        assert_eq!(registry.len(), 2);
        assert!(registry.get(ModelHandle(7)).is_none());
    }

    #[test]
    fn material_defaults() {
        let m = Material::new(TextureHandle(3));
        assert_eq!(m.shine_damper, 1.0);
        assert_eq!(m.reflectivity, 0.0);
        assert!(!m.has_transparency);
        assert!(!m.use_fake_lighting);
        assert_eq!(m.atlas_rows, 1);
    }
}
