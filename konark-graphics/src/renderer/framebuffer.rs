use konark_core::Size2Du;

use crate::{GraphicsInstance, Texture, TextureFormat};

/// HDR color and depth targets the scene is drawn into, sized to the drawing buffer.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    color: Texture,
    depth: Texture,
    size: Size2Du,
}

impl Framebuffer {
    pub fn new(graphics_instance: &GraphicsInstance, size: Size2Du) -> Self {
        let color = Texture::render_target(
            graphics_instance,
            "SceneColor",
            TextureFormat::SCENE_COLOR,
            size.width,
            size.height,
        );
        let depth = Texture::render_target(
            graphics_instance,
            "SceneDepth",
            TextureFormat::DEPTH,
            size.width,
            size.height,
        );

        Self { color, depth, size }
    }

    pub fn size(&self) -> Size2Du {
        self.size
    }

    pub fn color(&self) -> &Texture {
        &self.color
    }

    pub fn color_attachment(&self, clear: wgpu::Color) -> wgpu::RenderPassColorAttachment<'_> {
        wgpu::RenderPassColorAttachment {
            view: self.color.view(),
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: wgpu::StoreOp::Store,
            },
        }
    }

    pub fn depth_attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: self.depth.view(),
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Discard,
            }),
            stencil_ops: None,
        }
    }
}
