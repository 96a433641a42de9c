//! Batching front end of the renderer.

use engine_core::{Camera, CubeMapHandle, Entity, Light, LightSet, Mat4, ModelRegistry, Projection, Vec3};
use terrain::Terrain;

use crate::{DrawCommand, Fog, Frame, FrameStats, RenderBackend, RenderError, SceneParams};

/// Clear and fog colour.
pub const SKY_COLOR: Vec3 = Vec3::new(0.2, 0.2, 0.2);
/// Degrees of sky rotation per millisecond.
pub const SKY_ROTATE_SPEED: f32 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq)]
struct TerrainDraw {
    mesh: engine_core::MeshHandle,
    index_count: u32,
    transform: Mat4,
    textures: terrain::TerrainTexturePack,
    blend_map: engine_core::TextureHandle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Skybox {
    day: CubeMapHandle,
    night: CubeMapHandle,
}

/// Collects entities and terrain each frame and turns them into a [`Frame`].
///
/// Submissions only live until the next [`flush`](Self::flush); entities
/// themselves are owned elsewhere.
#[derive(Debug)]
pub struct MasterRenderer {
    projection: Projection,
    sky_color: Vec3,
    fog: Fog,
    skybox: Option<Skybox>,
    fade: f32,
    sky_rotation: f32,
    batches: crate::RenderBatches,
    terrains: Vec<TerrainDraw>,
}

impl MasterRenderer {
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            sky_color: SKY_COLOR,
            fog: Fog::default(),
            skybox: None,
            fade: 0.0,
            sky_rotation: 0.0,
            batches: crate::RenderBatches::new(),
            terrains: Vec::new(),
        }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
    }

    pub fn set_skybox(&mut self, day: CubeMapHandle, night: CubeMapHandle) {
        self.skybox = Some(Skybox { day, night });
    }

    /// Day/night blend, clamped to `[0, 1]`.
    pub fn set_fade(&mut self, fade: f32) {
        self.fade = fade.clamp(0.0, 1.0);
    }

    pub fn fade(&self) -> f32 {
        self.fade
    }

    pub fn set_fog(&mut self, fog: Fog) {
        self.fog = fog;
    }

    /// Turn the sky slowly with time.
    pub fn advance_sky(&mut self, elapsed_millis: f32) {
        self.sky_rotation = (self.sky_rotation + SKY_ROTATE_SPEED * elapsed_millis) % 360.0;
    }

    pub fn submit(&mut self, entity: &Entity) {
        self.batches.push(entity);
    }

    pub fn submit_terrain(&mut self, terrain: &Terrain) {
        self.terrains.push(TerrainDraw {
            mesh: terrain.mesh(),
            index_count: terrain.index_count(),
            transform: terrain.model_matrix(),
            textures: *terrain.textures(),
            blend_map: terrain.blend_map(),
        });
    }

    pub fn pending_entities(&self) -> usize {
        self.batches.entity_count()
    }

    fn scene_params(&self, lights: &[Light], camera: &Camera) -> SceneParams {
        SceneParams {
            view: camera.view_matrix(),
            projection: self.projection.matrix(),
            sky_view: camera.rotation_matrix() * Mat4::from_rotation_y(self.sky_rotation.to_radians()),
            camera_position: camera.position,
            lights: LightSet::from_lights(lights),
            sky_color: self.sky_color,
            fog: self.fog,
            fade: self.fade,
        }
    }

    /// Build this frame's draw list and hand it to `backend`: entities batch
    /// by batch, then terrain, then the sky. Submissions are cleared whether
    /// or not the backend succeeds.
    pub fn flush(
        &mut self,
        backend: &mut impl RenderBackend,
        models: &ModelRegistry,
        lights: &[Light],
        camera: &Camera,
    ) -> Result<FrameStats, RenderError> {
        let mut stats = FrameStats::default();
        let mut commands = Vec::with_capacity(self.batches.entity_count() + self.batches.batch_count() + 8);

        for (handle, entities) in self.batches.iter() {
            let Some(model) = models.get(handle) else {
                log::warn!("Skipping {} entities with unregistered model {:?}", entities.len(), handle);
                stats.skipped_batches += 1;
                continue;
            };
            let index_count = backend.index_count(model.mesh);
            if index_count == 0 {
                stats.skipped_batches += 1;
                continue;
            }

            commands.push(DrawCommand::BindModel {
                model: handle,
                mesh: model.mesh,
                index_count,
                material: model.material,
            });
            for entity in entities {
                commands.push(DrawCommand::DrawEntity {
                    transform: entity.transform.to_matrix(),
                    texture_offset: entity.texture_offset(model.material.atlas_rows),
                });
                stats.draw_calls += 1;
            }
            stats.batches += 1;
        }

        for terrain in &self.terrains {
            if terrain.index_count == 0 {
                continue;
            }
            commands.push(DrawCommand::DrawTerrain {
                mesh: terrain.mesh,
                index_count: terrain.index_count,
                transform: terrain.transform,
                textures: terrain.textures,
                blend_map: terrain.blend_map,
            });
            stats.terrain_tiles += 1;
        }

        if let Some(sky) = self.skybox {
            commands.push(DrawCommand::DrawSkybox {
                day: sky.day,
                night: sky.night,
                fade: self.fade,
            });
        }

        let frame = Frame {
            scene: self.scene_params(lights, camera),
            commands,
        };
        let result = backend.render(&frame);
        self.batches.clear();
        self.terrains.clear();
        result.map(|()| stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{Material, MeshHandle, ModelHandle, TextureHandle, TexturedModel, Vec2};
    use std::collections::HashMap;
    use terrain::{HeightField, TerrainTexturePack};

    #[derive(Default)]
    struct RecordingBackend {
        index_counts: HashMap<MeshHandle, u32>,
        frames: Vec<Frame>,
        fail: bool,
    }

    impl RenderBackend for RecordingBackend {
        fn index_count(&self, mesh: MeshHandle) -> u32 {
            self.index_counts.get(&mesh).copied().unwrap_or(0)
        }

        fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
            self.frames.push(frame.clone());
            if self.fail {
                return Err(RenderError::NoAdapter);
            }
            Ok(())
        }
    }

    struct Fixture {
        backend: RecordingBackend,
        models: ModelRegistry,
        tree: ModelHandle,
        rock: ModelHandle,
        empty: ModelHandle,
    }

    fn fixture() -> Fixture {
        let mut backend = RecordingBackend::default();
        backend.index_counts.insert(MeshHandle(0), 36);
        backend.index_counts.insert(MeshHandle(1), 12);
        backend.index_counts.insert(MeshHandle(2), 0);

        let mut models = ModelRegistry::new();
        let tree = models.register(TexturedModel {
            mesh: MeshHandle(0),
            material: Material::new(TextureHandle(0)),
        });
        let rock = models.register(TexturedModel {
            mesh: MeshHandle(1),
            material: Material::new(TextureHandle(1)).shiny(10.0, 0.5),
        });
        let empty = models.register(TexturedModel {
            mesh: MeshHandle(2),
            material: Material::new(TextureHandle(2)),
        });
        Fixture {
            backend,
            models,
            tree,
            rock,
            empty,
        }
    }

    fn entity(model: ModelHandle, x: f32) -> Entity {
        Entity::new(model, Vec3::new(x, 0.0, 0.0), Vec3::ZERO, 1.0)
    }

    fn renderer() -> MasterRenderer {
        MasterRenderer::new(Projection::default())
    }

    /// Each batch binds once and draws once per entity.
    #[test]
    fn binds_once_per_batch() {
        let mut f = fixture();
        let mut renderer = renderer();
        renderer.submit(&entity(f.tree, 1.0));
        renderer.submit(&entity(f.rock, 2.0));
        renderer.submit(&entity(f.tree, 3.0));

        let stats = renderer.flush(&mut f.backend, &f.models, &[], &Camera::default()).unwrap();
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.draw_calls, 3);

        let frame = &f.backend.frames[0];
        let binds: Vec<ModelHandle> = frame
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::BindModel { model, .. } => Some(*model),
                _ => None,
            })
            .collect();
        assert_eq!(binds, vec![f.tree, f.rock]);
        assert!(matches!(frame.commands[0], DrawCommand::BindModel { index_count: 36, .. }));
        match frame.commands[2] {
            DrawCommand::DrawEntity { transform, .. } => {
                assert_eq!(transform.w_axis.x, 3.0);
            }
            other => panic!("expected a draw, got {other:?}"),
        }
    }

    /// A second flush with nothing submitted draws nothing.
    #[test]
    fn flush_clears_batches() {
        let mut f = fixture();
        let mut renderer = renderer();
        renderer.submit(&entity(f.tree, 0.0));
        renderer.flush(&mut f.backend, &f.models, &[], &Camera::default()).unwrap();
        assert_eq!(renderer.pending_entities(), 0);

        let stats = renderer.flush(&mut f.backend, &f.models, &[], &Camera::default()).unwrap();
        assert_eq!(stats, FrameStats::default());
        assert_eq!(f.backend.frames[1].entity_draws(), 0);
        assert!(f.backend.frames[1].commands.is_empty());
    }

    /// Separately registered but identical models do not share a batch.
    #[test]
    fn batches_by_identity_not_equality() {
        let mut f = fixture();
        let twin = f.models.register(*f.models.get(f.tree).unwrap());
        let mut renderer = renderer();
        renderer.submit(&entity(f.tree, 0.0));
        renderer.submit(&entity(twin, 0.0));
        let stats = renderer.flush(&mut f.backend, &f.models, &[], &Camera::default()).unwrap();
        assert_eq!(stats.batches, 2);
    }

    #[test]
    fn empty_and_unknown_models_are_skipped() {
        let mut f = fixture();
        let mut renderer = renderer();
        renderer.submit(&entity(f.empty, 0.0));
        renderer.submit(&entity(ModelHandle(99), 0.0));
        renderer.submit(&entity(f.rock, 0.0));
        let stats = renderer.flush(&mut f.backend, &f.models, &[], &Camera::default()).unwrap();
        assert_eq!(stats.skipped_batches, 2);
        assert_eq!(stats.batches, 1);
        assert_eq!(f.backend.frames[0].entity_draws(), 1);
    }

    /// Terrain draws after entities, the sky last, and both are per-frame.
    #[test]
    fn terrain_and_sky_follow_entities() {
        let mut f = fixture();
        let mut renderer = renderer();
        renderer.set_skybox(CubeMapHandle(0), CubeMapHandle(1));
        renderer.set_fade(1.5);

        let field = HeightField::from_heights(2, 800.0, vec![0.0; 4]).unwrap();
        let pack = TerrainTexturePack {
            background: TextureHandle(0),
            r: TextureHandle(1),
            g: TextureHandle(2),
            b: TextureHandle(3),
        };
        let terrain = Terrain::new(1, 0, field, MeshHandle(5), 6, pack, TextureHandle(4));

        renderer.submit(&entity(f.tree, 0.0));
        renderer.submit_terrain(&terrain);
        let stats = renderer.flush(&mut f.backend, &f.models, &[], &Camera::default()).unwrap();
        assert_eq!(stats.terrain_tiles, 1);

        let commands = &f.backend.frames[0].commands;
        assert_eq!(commands.len(), 4);
        match commands[2] {
            DrawCommand::DrawTerrain { transform, .. } => assert_eq!(transform.w_axis.x, 800.0),
            other => panic!("expected terrain, got {other:?}"),
        }
        assert!(matches!(commands[3], DrawCommand::DrawSkybox { fade, .. } if fade == 1.0));

        renderer.flush(&mut f.backend, &f.models, &[], &Camera::default()).unwrap();
        assert_eq!(f.backend.frames[1].terrain_draws(), 0);
        assert_eq!(f.backend.frames[1].commands.len(), 1);
    }

    /// Lights are padded to four and the scene carries camera state.
    #[test]
    fn scene_params_carry_lights_and_camera() {
        let mut f = fixture();
        let mut renderer = renderer();
        let sun = Light::new(Vec3::new(600.0, 3000.0, -500.0), Vec3::ONE);
        let camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), 10.0, 20.0);
        renderer.flush(&mut f.backend, &f.models, &[sun], &camera).unwrap();

        let scene = f.backend.frames[0].scene;
        assert_eq!(scene.lights.active_count(), 1);
        assert_eq!(scene.lights.slots()[3], Light::padding());
        assert_eq!(scene.camera_position, camera.position);
        assert_eq!(scene.view, camera.view_matrix());
        assert_eq!(scene.sky_color, SKY_COLOR);
        assert_eq!(scene.sky_view.w_axis, engine_core::Vec4::W);
    }

    #[test]
    fn atlas_offset_is_passed_through() {
        let mut f = fixture();
        let atlas = f.models.register(TexturedModel {
            mesh: MeshHandle(0),
            material: Material {
                atlas_rows: 2,
                ..Material::new(TextureHandle(0))
            },
        });
        let mut renderer = renderer();
        renderer.submit(&entity(atlas, 0.0).with_texture_index(3));
        renderer.flush(&mut f.backend, &f.models, &[], &Camera::default()).unwrap();
        assert!(matches!(
            f.backend.frames[0].commands[1],
            DrawCommand::DrawEntity { texture_offset, .. } if texture_offset == Vec2::new(0.5, 0.5)
        ));
    }

    /// A failing backend still leaves the renderer ready for the next frame.
    #[test]
    fn failed_render_still_clears() {
        let mut f = fixture();
        f.backend.fail = true;
        let mut renderer = renderer();
        renderer.submit(&entity(f.tree, 0.0));
        assert!(renderer.flush(&mut f.backend, &f.models, &[], &Camera::default()).is_err());
        assert_eq!(renderer.pending_entities(), 0);
    }
}
