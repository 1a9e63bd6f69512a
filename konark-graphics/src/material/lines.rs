use wgpu::{
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, BufferBindingType,
    FragmentState, MultisampleState, PipelineCompilationOptions, PipelineLayoutDescriptor,
    RenderPipelineDescriptor, ShaderStages, VertexState,
};

use crate::{GraphicsInstance, LineVertex, RenderPass, TextureFormat};

use super::{default_shader_defs, shader_preprocessor};

const LINE_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

/// Unlit vertex-colored line list.
#[derive(Debug, Clone)]
pub struct LineMaterial {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl LineMaterial {
    pub fn new(
        graphics_instance: &GraphicsInstance,
        color_format: TextureFormat,
        depth_format: TextureFormat,
    ) -> anyhow::Result<Self> {
        let device = graphics_instance.device();

        let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("LineBindings"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Lines"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader_descriptor = shader_preprocessor()?.build(
            include_str!("../shader/lines.wgsl"),
            &default_shader_defs(),
            Some("lines.wgsl"),
        )?;
        let shader_module = device.create_shader_module(shader_descriptor);

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Lines"),
            vertex: VertexState {
                module: &shader_module,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LineVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &LINE_ATTRIBUTES,
                }],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format.as_wgpu(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format.as_wgpu(),
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            layout: Some(&pipeline_layout),
            multisample: MultisampleState::default(),
            multiview: None,
            cache: graphics_instance.pipeline_cache(),
        });

        Ok(Self {
            pipeline,
            bind_group_layout,
        })
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn encode(
        &self,
        render_pass: &mut RenderPass<'_>,
        bind_group: &wgpu::BindGroup,
        vertex_buffer: &wgpu::Buffer,
        vertex_count: u32,
    ) {
        render_pass.bind_pipeline(&self.pipeline);
        render_pass.bind_group(0, bind_group, &[]);
        render_pass.bind_vertex_buffer(0, vertex_buffer);
        render_pass.draw(0..vertex_count, 0..1);
    }
}
