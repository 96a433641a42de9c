//! wgpu backend: owns the device, uploaded assets and pipelines, and replays
//! a [`Frame`] in a single render pass.

use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine_core::{AssetError, AssetLoader, CubeMapHandle, MeshData, MeshHandle, TextureHandle};
use terrain::TerrainTexturePack;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::SceneUniform,
    mesh::{Mesh, SkyCube},
    pipeline::{
        create_entity_pipeline, create_scene_bind_group_layout, create_sky_bind_group_layout,
        create_sky_pipeline, create_terrain_bind_group_layout, create_terrain_pipeline,
        create_texture_bind_group_layout,
    },
    texture::Texture,
    vertex::InstanceData,
    DrawCommand, Frame, RenderBackend, RenderError,
};

const INITIAL_INSTANCE_CAPACITY: usize = 1024;

type TerrainKey = (TerrainTexturePack, TextureHandle);
type SkyKey = (CubeMapHandle, CubeMapHandle);

/// Draws resolved from a [`Frame`] before the pass begins.
enum PassOp {
    Entities {
        mesh: MeshHandle,
        index_count: u32,
        texture: TextureHandle,
        cull_back: bool,
        instances: Range<u32>,
    },
    Terrain {
        mesh: MeshHandle,
        index_count: u32,
        key: TerrainKey,
        instance: u32,
    },
    Sky {
        key: SkyKey,
    },
}

struct UploadedTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

pub struct GpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    entity_pipeline: wgpu::RenderPipeline,
    entity_pipeline_no_cull: wgpu::RenderPipeline,
    terrain_pipeline: wgpu::RenderPipeline,
    sky_pipeline: wgpu::RenderPipeline,

    texture_layout: wgpu::BindGroupLayout,
    terrain_layout: wgpu::BindGroupLayout,
    sky_layout: wgpu::BindGroupLayout,

    scene_uniform: SceneUniform,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,

    depth_texture: Texture,
    terrain_sampler: wgpu::Sampler,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,

    meshes: Vec<Mesh>,
    textures: Vec<UploadedTexture>,
    cube_maps: Vec<Texture>,
    default_texture: UploadedTexture,
    sky_cube: SkyCube,
    terrain_bind_groups: HashMap<TerrainKey, wgpu::BindGroup>,
    sky_bind_groups: HashMap<SkyKey, wgpu::BindGroup>,
}

impl GpuRenderer {
    /// Create a renderer for the given window.
    pub async fn new(window: Arc<Window>, vsync: bool) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        log::info!("Using GPU: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

        let present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let scene_layout = create_scene_bind_group_layout(&device);
        let texture_layout = create_texture_bind_group_layout(&device);
        let terrain_layout = create_terrain_bind_group_layout(&device);
        let sky_layout = create_sky_bind_group_layout(&device);

        let scene_uniform = SceneUniform::new();
        let scene_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Buffer"),
            contents: bytemuck::cast_slice(&[scene_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        let entity_pipeline = create_entity_pipeline(&device, config.format, &scene_layout, &texture_layout, true);
        let entity_pipeline_no_cull =
            create_entity_pipeline(&device, config.format, &scene_layout, &texture_layout, false);
        let terrain_pipeline = create_terrain_pipeline(&device, config.format, &scene_layout, &terrain_layout);
        let sky_pipeline = create_sky_pipeline(&device, config.format, &scene_layout, &sky_layout);

        let depth_texture = Texture::create_depth_texture(&device, config.width, config.height, "Depth Texture");
        let terrain_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Terrain Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let instance_buffer = create_instance_buffer(&device, INITIAL_INSTANCE_CAPACITY);

        let white = Texture::white_pixel(&device, &queue);
        let default_texture = UploadedTexture {
            bind_group: texture_bind_group(&device, &texture_layout, &white, "Default Texture Bind Group"),
            texture: white,
        };
        let sky_cube = SkyCube::new(&device);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            entity_pipeline,
            entity_pipeline_no_cull,
            terrain_pipeline,
            sky_pipeline,
            texture_layout,
            terrain_layout,
            sky_layout,
            scene_uniform,
            scene_buffer,
            scene_bind_group,
            depth_texture,
            terrain_sampler,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            meshes: Vec::new(),
            textures: Vec::new(),
            cube_maps: Vec::new(),
            default_texture,
            sky_cube,
            terrain_bind_groups: HashMap::new(),
            sky_bind_groups: HashMap::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Texture::create_depth_texture(&self.device, width, height, "Depth Texture");
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn push_texture(&mut self, texture: Texture, path: &Path) -> TextureHandle {
        let label = format!("{} Bind Group", path.display());
        let bind_group = texture_bind_group(&self.device, &self.texture_layout, &texture, &label);
        self.textures.push(UploadedTexture { texture, bind_group });
        log::debug!("Loaded texture {}", path.display());
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn texture(&self, handle: TextureHandle) -> &UploadedTexture {
        self.textures.get(handle.0 as usize).unwrap_or(&self.default_texture)
    }

    fn ensure_instance_capacity(&mut self, count: usize) {
        if count > self.instance_capacity {
            self.instance_capacity = count.next_power_of_two();
            self.instance_buffer = create_instance_buffer(&self.device, self.instance_capacity);
            log::debug!("Instance buffer grown to {}", self.instance_capacity);
        }
    }

    fn ensure_terrain_bind_group(&mut self, key: TerrainKey) {
        if self.terrain_bind_groups.contains_key(&key) {
            return;
        }
        let (pack, blend_map) = key;
        let views = [pack.background, pack.r, pack.g, pack.b, blend_map].map(|h| &self.texture(h).texture.view);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Terrain Bind Group"),
            layout: &self.terrain_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(views[0]),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(views[1]),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(views[2]),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(views[3]),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(views[4]),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&self.terrain_sampler),
                },
            ],
        });
        self.terrain_bind_groups.insert(key, bind_group);
    }

    fn ensure_sky_bind_group(&mut self, key: SkyKey) {
        if self.sky_bind_groups.contains_key(&key) {
            return;
        }
        let (Some(day), Some(night)) = (self.cube_maps.get(key.0 .0 as usize), self.cube_maps.get(key.1 .0 as usize))
        else {
            log::warn!("Skybox uses unknown cube maps {:?}", key);
            return;
        };
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sky Bind Group"),
            layout: &self.sky_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&day.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&night.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&day.sampler),
                },
            ],
        });
        self.sky_bind_groups.insert(key, bind_group);
    }

    /// Flatten the frame into instance data and pass operations.
    fn prepare(&mut self, frame: &Frame) -> (Vec<InstanceData>, Vec<PassOp>) {
        let mut instances = Vec::with_capacity(frame.commands.len());
        let mut ops = Vec::new();
        let mut bound = None;

        for command in &frame.commands {
            match *command {
                DrawCommand::BindModel {
                    mesh,
                    index_count,
                    material,
                    ..
                } => {
                    let start = instances.len() as u32;
                    ops.push(PassOp::Entities {
                        mesh,
                        index_count,
                        texture: material.texture,
                        cull_back: !material.has_transparency,
                        instances: start..start,
                    });
                    bound = Some(material);
                }
                DrawCommand::DrawEntity {
                    transform,
                    texture_offset,
                } => {
                    let Some(material) = bound else {
                        log::warn!("Entity draw with no model bound");
                        continue;
                    };
                    instances.push(InstanceData::new(transform, &material, texture_offset));
                    if let Some(PassOp::Entities { instances: range, .. }) = ops.last_mut() {
                        range.end = instances.len() as u32;
                    }
                }
                DrawCommand::DrawTerrain {
                    mesh,
                    index_count,
                    transform,
                    textures,
                    blend_map,
                } => {
                    bound = None;
                    let key = (textures, blend_map);
                    self.ensure_terrain_bind_group(key);
                    instances.push(InstanceData::terrain(transform));
                    ops.push(PassOp::Terrain {
                        mesh,
                        index_count,
                        key,
                        instance: instances.len() as u32 - 1,
                    });
                }
                DrawCommand::DrawSkybox { day, night, .. } => {
                    bound = None;
                    let key = (day, night);
                    self.ensure_sky_bind_group(key);
                    ops.push(PassOp::Sky { key });
                }
            }
        }
        (instances, ops)
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceData>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
    })
}

impl AssetLoader for GpuRenderer {
    fn load_mesh(&mut self, label: &str, mesh: &MeshData) -> Result<MeshHandle, AssetError> {
        if mesh.is_empty() {
            return Err(AssetError::Empty(label.to_string()));
        }
        self.meshes.push(Mesh::new(&self.device, label, mesh));
        log::debug!("Uploaded mesh {label} ({} triangles)", mesh.triangle_count());
        Ok(MeshHandle(self.meshes.len() as u32 - 1))
    }

    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, AssetError> {
        let texture = Texture::load(&self.device, &self.queue, path, true)?;
        Ok(self.push_texture(texture, path))
    }

    /// Uploaded without sRGB decoding.
    fn load_data_texture(&mut self, path: &Path) -> Result<TextureHandle, AssetError> {
        let texture = Texture::load(&self.device, &self.queue, path, false)?;
        Ok(self.push_texture(texture, path))
    }

    fn load_cube_map(&mut self, faces: &[PathBuf; 6]) -> Result<CubeMapHandle, AssetError> {
        let cube = Texture::load_cube(&self.device, &self.queue, faces)?;
        self.cube_maps.push(cube);
        Ok(CubeMapHandle(self.cube_maps.len() as u32 - 1))
    }
}

impl RenderBackend for GpuRenderer {
    fn index_count(&self, mesh: MeshHandle) -> u32 {
        self.meshes.get(mesh.0 as usize).map_or(0, |m| m.num_indices)
    }

    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        self.scene_uniform.update(&frame.scene);
        self.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[self.scene_uniform]));

        let (instances, ops) = self.prepare(frame);
        self.ensure_instance_capacity(instances.len());
        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let sky = frame.scene.sky_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: sky.x as f64,
                            g: sky.y as f64,
                            b: sky.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.scene_bind_group, &[]);
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            for op in &ops {
                match op {
                    PassOp::Entities {
                        mesh,
                        index_count,
                        texture,
                        cull_back,
                        instances,
                    } => {
                        let Some(mesh) = self.meshes.get(mesh.0 as usize) else {
                            continue;
                        };
                        if instances.is_empty() {
                            continue;
                        }
                        let pipeline = if *cull_back {
                            &self.entity_pipeline
                        } else {
                            &self.entity_pipeline_no_cull
                        };
                        render_pass.set_pipeline(pipeline);
                        render_pass.set_bind_group(1, &self.texture(*texture).bind_group, &[]);
                        render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                        render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..*index_count, 0, instances.clone());
                    }
                    PassOp::Terrain {
                        mesh,
                        index_count,
                        key,
                        instance,
                    } => {
                        let (Some(mesh), Some(bind_group)) =
                            (self.meshes.get(mesh.0 as usize), self.terrain_bind_groups.get(key))
                        else {
                            continue;
                        };
                        render_pass.set_pipeline(&self.terrain_pipeline);
                        render_pass.set_bind_group(1, bind_group, &[]);
                        render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                        render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..*index_count, 0, *instance..*instance + 1);
                    }
                    PassOp::Sky { key } => {
                        let Some(bind_group) = self.sky_bind_groups.get(key) else {
                            continue;
                        };
                        render_pass.set_pipeline(&self.sky_pipeline);
                        render_pass.set_bind_group(1, bind_group, &[]);
                        render_pass.set_vertex_buffer(0, self.sky_cube.vertex_buffer.slice(..));
                        render_pass.draw(0..self.sky_cube.num_vertices, 0..1);
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
