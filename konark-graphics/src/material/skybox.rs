use wgpu::{
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, BufferBindingType,
    FragmentState, MultisampleState, PipelineCompilationOptions, PipelineLayoutDescriptor,
    RenderPipelineDescriptor, SamplerBindingType, ShaderStages, TextureSampleType,
    TextureViewDimension, VertexState,
};

use crate::{GraphicsInstance, RenderPass, TextureFormat};

use super::{default_shader_defs, shader_preprocessor};

/// Draws an equirectangular background behind everything else.
#[derive(Debug, Clone)]
pub struct SkyboxMaterial {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl SkyboxMaterial {
    pub fn new(
        graphics_instance: &GraphicsInstance,
        color_format: TextureFormat,
        depth_format: TextureFormat,
    ) -> anyhow::Result<Self> {
        let device = graphics_instance.device();

        let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("SkyboxBindings"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: false },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Skybox"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader_descriptor = shader_preprocessor()?.build(
            include_str!("../shader/skybox.wgsl"),
            &default_shader_defs(),
            Some("skybox.wgsl"),
        )?;
        let shader_module = device.create_shader_module(shader_descriptor);

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Skybox"),
            vertex: VertexState {
                module: &shader_module,
                entry_point: Some("vs_main"),
                buffers: &[],
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
            primitive: wgpu::PrimitiveState::default(),
            // Drawn first; leaves depth untouched
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format.as_wgpu(),
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
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

    pub fn encode(&self, render_pass: &mut RenderPass<'_>, bind_group: &wgpu::BindGroup) {
        render_pass.bind_pipeline(&self.pipeline);
        render_pass.bind_group(0, bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}
