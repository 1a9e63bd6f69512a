use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
};

use uuid::Uuid;
use wgpu::util::DeviceExt;

use crate::{Environment, Geometry, GraphicsInstance, HdrImage, Texture, TextureFormat, TextureImage};

const BACKGROUND_MAX_WIDTH: u32 = 4096;

#[derive(Debug)]
pub struct GpuGeometry {
    pub positions: wgpu::Buffer,
    pub normals: wgpu::Buffer,
    pub uvs: wgpu::Buffer,
    pub indices: Option<(wgpu::Buffer, u32)>,
    pub vertex_count: u32,
}

impl GpuGeometry {
    fn new(graphics_instance: &GraphicsInstance, geometry: &Geometry) -> Self {
        let device = graphics_instance.device();
        let vertex_buffer = |label: &str, contents: &[u8]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            })
        };

        let indices = geometry.indices().map(|indices| {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Indices"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            (buffer, indices.len() as u32)
        });

        Self {
            positions: vertex_buffer("Positions", bytemuck::cast_slice(geometry.positions())),
            normals: vertex_buffer("Normals", bytemuck::cast_slice(geometry.normals())),
            uvs: vertex_buffer("Uvs", bytemuck::cast_slice(geometry.uvs())),
            indices,
            vertex_count: geometry.vertex_count(),
        }
    }
}

/// GPU copies of scene resources keyed by the id of their CPU source.
/// Entries not used by the latest frame are released.
#[derive(Debug, Default)]
pub struct GpuCache {
    geometries: HashMap<Uuid, GpuGeometry>,
    material_bind_groups: HashMap<Uuid, wgpu::BindGroup>,
    environment: Option<(Uuid, Texture)>,
    background: Option<(Uuid, wgpu::BindGroup)>,
}

impl GpuCache {
    pub fn upload_geometry(&mut self, graphics_instance: &GraphicsInstance, geometry: &Geometry) {
        self.geometries
            .entry(*geometry.id())
            .or_insert_with(|| GpuGeometry::new(graphics_instance, geometry));
    }

    pub fn get_geometry(&self, id: &Uuid) -> Option<&GpuGeometry> {
        self.geometries.get(id)
    }

    pub fn upload_material_texture(
        &mut self,
        graphics_instance: &GraphicsInstance,
        image: &TextureImage,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
    ) {
        self.material_bind_groups
            .entry(*image.id())
            .or_insert_with(|| {
                let texture = create_material_texture(graphics_instance, image);
                create_texture_bind_group(graphics_instance, "Material", layout, &texture, sampler)
            });
    }

    pub fn get_material_bind_group(&self, id: &Uuid) -> Option<&wgpu::BindGroup> {
        self.material_bind_groups.get(id)
    }

    /// Returns `true` when a new texture was uploaded.
    pub fn upload_environment(
        &mut self,
        graphics_instance: &GraphicsInstance,
        environment: &Environment,
    ) -> bool {
        if matches!(&self.environment, Some((id, _)) if id == environment.id()) {
            return false;
        }

        log::debug!(
            "Upload environment {} ({} levels of {}px)",
            environment.id(),
            environment.mip_level_count(),
            environment.face_size()
        );
        let texture = Texture::from_data_cube(
            graphics_instance,
            "Environment",
            TextureFormat::HDR_SOURCE,
            environment.face_size(),
            environment.mip_level_count(),
            &environment.to_layer_major_bytes(),
        );
        self.environment = Some((*environment.id(), texture));
        true
    }

    pub fn environment_texture(&self) -> Option<&Texture> {
        self.environment.as_ref().map(|(_, texture)| texture)
    }

    pub fn update_background(
        &mut self,
        graphics_instance: &GraphicsInstance,
        image: &HdrImage,
        create_bind_group: impl FnOnce(&Texture) -> wgpu::BindGroup,
    ) {
        if matches!(&self.background, Some((id, _)) if id == image.id()) {
            return;
        }
        let texture = create_background_texture(graphics_instance, image);
        self.background = Some((*image.id(), create_bind_group(&texture)));
    }

    pub fn background_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.background.as_ref().map(|(_, bind_group)| bind_group)
    }

    /// Drop geometry and textures that the latest frame did not reference.
    pub fn retain(&mut self, geometries: &HashSet<Uuid>, images: &HashSet<Uuid>) {
        self.geometries.retain(|id, _| geometries.contains(id));
        self.material_bind_groups.retain(|id, _| images.contains(id));
    }
}

pub fn create_texture_bind_group(
    graphics_instance: &GraphicsInstance,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    graphics_instance
        .device()
        .create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(texture.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
}

/// Largest size within `max_dimension` keeping the aspect ratio.
pub fn fit_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let largest = width.max(height);
    if largest <= max_dimension || largest == 0 {
        return (width, height);
    }
    let scale = max_dimension as f64 / largest as f64;
    (
        ((width as f64 * scale).round() as u32).max(1),
        ((height as f64 * scale).round() as u32).max(1),
    )
}

fn create_material_texture(graphics_instance: &GraphicsInstance, image: &TextureImage) -> Texture {
    let max_dimension = graphics_instance.device().limits().max_texture_dimension_2d;
    let (width, height) = fit_dimensions(image.width(), image.height(), max_dimension);

    let data: Cow<[u8]> = if (width, height) == (image.width(), image.height()) {
        Cow::Borrowed(image.data())
    } else {
        log::warn!(
            "Texture {} ({}x{}) exceeds device limits, downscale to {}x{}",
            image.name(),
            image.width(),
            image.height(),
            width,
            height
        );
        match image::RgbaImage::from_raw(image.width(), image.height(), image.data().to_vec()) {
            Some(source) => Cow::Owned(
                image::imageops::resize(
                    &source,
                    width,
                    height,
                    image::imageops::FilterType::Triangle,
                )
                .into_raw(),
            ),
            None => Cow::Owned(vec![255; (width * height * 4) as usize]),
        }
    };

    Texture::from_data_2d(
        graphics_instance,
        image.name(),
        TextureFormat::MATERIAL_COLOR,
        width,
        height,
        &data,
    )
}

fn create_background_texture(graphics_instance: &GraphicsInstance, image: &HdrImage) -> Texture {
    let max_dimension = graphics_instance
        .device()
        .limits()
        .max_texture_dimension_2d
        .min(BACKGROUND_MAX_WIDTH);
    let (width, height) = fit_dimensions(image.width(), image.height(), max_dimension);

    let resized;
    let source = if (width, height) == (image.width(), image.height()) {
        image
    } else {
        resized = image.resized(width, height);
        &resized
    };
    log::debug!("Upload background {} at {}x{}", image.id(), width, height);

    Texture::from_data_2d(
        graphics_instance,
        "Background",
        TextureFormat::HDR_SOURCE,
        width,
        height,
        bytemuck::cast_slice(source.as_raw()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_keeps_aspect_ratio() {
        assert_eq!(fit_dimensions(8192, 4096, 4096), (4096, 2048));
        assert_eq!(fit_dimensions(1024, 512, 4096), (1024, 512));
        assert_eq!(fit_dimensions(1, 10000, 100), (1, 100));
    }
}
