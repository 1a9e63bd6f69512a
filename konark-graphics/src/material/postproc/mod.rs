mod tonemap;

pub use tonemap::*;

use crate::RenderPass;

/// Fullscreen pass reading one bind group.
#[derive(Debug, Clone)]
pub struct Postproc {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl Postproc {
    pub fn new(pipeline: wgpu::RenderPipeline, bind_group_layout: wgpu::BindGroupLayout) -> Self {
        Self {
            pipeline,
            bind_group_layout,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn encode(&self, render_pass: &mut RenderPass<'_>, bind_group: &wgpu::BindGroup) {
        render_pass.bind_pipeline(&self.pipeline);
        render_pass.bind_group(0, bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}
