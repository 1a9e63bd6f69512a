use std::ops::Range;

pub struct RenderPass<'encoder> {
    inner: wgpu::RenderPass<'encoder>,
}

impl<'e> RenderPass<'e> {
    pub fn new(inner: wgpu::RenderPass<'e>) -> Self {
        RenderPass { inner }
    }

    pub fn bind_pipeline(&mut self, pipeline: &wgpu::RenderPipeline) {
        self.inner.set_pipeline(pipeline);
    }

    pub fn bind_group(&mut self, index: u32, bind_group: &wgpu::BindGroup, offsets: &[u32]) {
        self.inner.set_bind_group(index, bind_group, offsets);
    }

    pub fn bind_vertex_buffer(&mut self, slot: u32, buffer: &wgpu::Buffer) {
        self.inner.set_vertex_buffer(slot, buffer.slice(..));
    }

    pub fn bind_index_buffer(&mut self, buffer: &wgpu::Buffer) {
        self.inner
            .set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    pub fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.inner.draw(vertices, instances);
    }

    pub fn draw_indexed(&mut self, indices: Range<u32>, instances: Range<u32>) {
        self.inner.draw_indexed(indices, 0, instances);
    }
}
