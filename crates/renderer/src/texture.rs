//! Textures: 2D images, cube maps and the depth buffer.

use std::path::{Path, PathBuf};

use engine_core::AssetError;
use image::DynamicImage;
use wgpu::util::DeviceExt;

/// A texture with its default view and sampler.
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self { texture, view, sampler }
    }

    /// Upload an RGBA image. `srgb` selects colour textures; data textures
    /// such as blend maps are linear.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &DynamicImage,
        label: &str,
        srgb: bool,
    ) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &rgba,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self { texture, view, sampler }
    }

    pub fn load(device: &wgpu::Device, queue: &wgpu::Queue, path: &Path, srgb: bool) -> Result<Self, AssetError> {
        let image = decode(path)?;
        let label = path.display().to_string();
        Ok(Self::from_image(device, queue, &image, &label, srgb))
    }

    /// 1x1 white fallback.
    pub fn white_pixel(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let image = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(1, 1, image::Rgba([255; 4])));
        Self::from_image(device, queue, &image, "White Pixel", true)
    }

    /// Cube map from six square faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub fn load_cube(device: &wgpu::Device, queue: &wgpu::Queue, faces: &[PathBuf; 6]) -> Result<Self, AssetError> {
        let mut data = Vec::new();
        let mut size = None;
        for path in faces {
            let rgba = decode(path)?.to_rgba8();
            let dimensions = rgba.dimensions();
            match size {
                None => size = Some(dimensions),
                Some(expected) if expected != dimensions => {
                    return Err(AssetError::decode(
                        path,
                        format!("cube face is {dimensions:?}, expected {expected:?}"),
                    ));
                }
                Some(_) => {}
            }
            data.extend_from_slice(&rgba);
        }
        let (width, height) = size.unwrap_or((1, 1));

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("Cube Map"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Cube Map View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Cube Map Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Ok(Self { texture, view, sampler })
    }
}

fn decode(path: &Path) -> Result<DynamicImage, AssetError> {
    let bytes = std::fs::read(path).map_err(|e| AssetError::io(path, e))?;
    image::load_from_memory(&bytes).map_err(|e| AssetError::decode(path, e))
}
