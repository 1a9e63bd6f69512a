mod format;

pub use format::*;

use wgpu::util::DeviceExt;

use crate::GraphicsInstance;

#[derive(Debug, Clone)]
pub struct Texture {
    inner: wgpu::Texture,
    format: TextureFormat,
    size: wgpu::Extent3d,
    view: wgpu::TextureView,
}

impl Texture {
    pub fn new(
        inner: wgpu::Texture,
        format: TextureFormat,
        size: wgpu::Extent3d,
        view: wgpu::TextureView,
    ) -> Self {
        Self {
            inner,
            format,
            size,
            view,
        }
    }

    /// Allocate a 2D attachment usable as render target and shader input.
    pub fn render_target(
        graphics_instance: &GraphicsInstance,
        label: &str,
        format: TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = graphics_instance
            .device()
            .create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: format.as_wgpu(),
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self::new(texture, format, size, view)
    }

    /// Upload a single-mip 2D texture.
    pub fn from_data_2d(
        graphics_instance: &GraphicsInstance,
        label: &str,
        format: TextureFormat,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = graphics_instance.device().create_texture_with_data(
            graphics_instance.queue(),
            &wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: format.as_wgpu(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self::new(texture, format, size, view)
    }

    /// Upload a cube texture. `data` holds every mip of face 0, then every mip of face 1, ...
    pub fn from_data_cube(
        graphics_instance: &GraphicsInstance,
        label: &str,
        format: TextureFormat,
        face_size: u32,
        mip_level_count: u32,
        data: &[u8],
    ) -> Self {
        let size = wgpu::Extent3d {
            width: face_size,
            height: face_size,
            depth_or_array_layers: 6,
        };
        let texture = graphics_instance.device().create_texture_with_data(
            graphics_instance.queue(),
            &wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: format.as_wgpu(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        Self::new(texture, format, size, view)
    }

    pub fn wgpu_texture(&self) -> &wgpu::Texture {
        &self.inner
    }

    pub fn format(&self) -> &TextureFormat {
        &self.format
    }

    pub fn size(&self) -> &wgpu::Extent3d {
        &self.size
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}
