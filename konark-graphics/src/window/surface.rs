use wgpu::{SurfaceError, SurfaceTexture};

use crate::{GraphicsError, GraphicsInstance, TextureFormat};

#[derive(Debug)]
pub struct Surface<'window> {
    inner: wgpu::Surface<'window>,
    config: wgpu::SurfaceConfiguration,
}

impl<'a> Surface<'a> {
    pub fn new(
        surface: wgpu::Surface<'a>,
        graphics_instance: &GraphicsInstance,
        width: u32,
        height: u32,
    ) -> anyhow::Result<Self> {
        let capabilities = surface.get_capabilities(graphics_instance.adapter());
        if capabilities.formats.is_empty() {
            return Err(GraphicsError::SurfaceUnsupported.into());
        }
        // sRGB first; otherwise the tonemap pass encodes sRGB itself
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or(GraphicsError::SurfaceFormatNotFound)?;
        let alpha_mode = capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(graphics_instance.device(), &config);
        log::debug!("Surface configured: {:?}", config);

        Ok(Self {
            inner: surface,
            config,
        })
    }

    pub fn format(&self) -> TextureFormat {
        TextureFormat::from(self.config.format)
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn resize(&mut self, graphics_instance: &GraphicsInstance, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.inner.configure(graphics_instance.device(), &self.config);
    }

    /// Acquire the next swapchain texture.
    /// Returns `None` when this frame must be skipped.
    pub fn acquire(
        &self,
        graphics_instance: &GraphicsInstance,
    ) -> anyhow::Result<Option<SurfaceTexture>> {
        match self.inner.get_current_texture() {
            Ok(texture) => Ok(Some(texture)),
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated. Reconfigure and skip frame");
                self.inner.configure(graphics_instance.device(), &self.config);
                Ok(None)
            }
            Err(SurfaceError::Timeout) => {
                log::warn!("Surface acquire timeout. Skip frame");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
