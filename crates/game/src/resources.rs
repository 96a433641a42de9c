//! Asset lookup under the configured asset directory and a by-name model cache.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use engine_core::{AssetLoader, CubeMapHandle, Material, ModelHandle, ModelRegistry, TextureHandle, TexturedModel};

/// Cube faces in the order the loader expects (+X, -X, +Y, -Y, +Z, -Z).
const CUBE_FACES: [&str; 6] = ["right", "left", "top", "bottom", "back", "front"];

pub struct Resources {
    root: PathBuf,
    models: ModelRegistry,
    /// Keyed by model and texture name.
    by_name: HashMap<(String, String), ModelHandle>,
}

impl Resources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            models: ModelRegistry::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn obj(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.obj"))
    }

    pub fn png(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.png"))
    }

    pub fn cube_faces(&self, dir: &str) -> [PathBuf; 6] {
        CUBE_FACES.map(|face| self.png(&format!("{dir}/{face}")))
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn texture(&self, loader: &mut impl AssetLoader, name: &str) -> Result<TextureHandle> {
        let path = self.png(name);
        loader
            .load_texture(&path)
            .with_context(|| format!("loading texture {name}"))
    }

    pub fn cube_map(&self, loader: &mut impl AssetLoader, dir: &str) -> Result<CubeMapHandle> {
        loader
            .load_cube_map(&self.cube_faces(dir))
            .with_context(|| format!("loading cube map {dir}"))
    }

    /// `name.obj` textured with `name.png`. Each name is loaded once; asking
    /// again with a different material is a bug.
    pub fn model(
        &mut self,
        loader: &mut impl AssetLoader,
        name: &str,
        material: impl FnOnce(Material) -> Material,
    ) -> Result<ModelHandle> {
        self.model_with_texture(loader, name, name, material)
    }

    pub fn model_with_texture(
        &mut self,
        loader: &mut impl AssetLoader,
        name: &str,
        texture: &str,
        material: impl FnOnce(Material) -> Material,
    ) -> Result<ModelHandle> {
        let key = (name.to_string(), texture.to_string());
        if let Some(&handle) = self.by_name.get(&key) {
            if let Some(cached) = self.models.get(handle) {
                debug_assert_eq!(
                    material(Material::new(cached.material.texture)),
                    cached.material,
                    "model {name} requested with two materials"
                );
            }
            return Ok(handle);
        }
        let data = renderer::load_obj(self.obj(name)).with_context(|| format!("loading model {name}"))?;
        let mesh = loader.load_mesh(name, &data)?;
        let texture = self.texture(loader, texture)?;
        let handle = self.models.register(TexturedModel {
            mesh,
            material: material(Material::new(texture)),
        });
        log::debug!("Model {name}: {} triangles", data.triangle_count());
        self.by_name.insert(key, handle);
        Ok(handle)
    }
}
