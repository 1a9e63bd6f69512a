use wgpu::{
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, FragmentState,
    MultisampleState, PipelineCompilationOptions, PipelineLayoutDescriptor,
    RenderPipelineDescriptor, SamplerBindingType, ShaderStages, TextureSampleType,
    TextureViewDimension, VertexState,
};

use crate::{shader_preprocessor, GraphicsInstance, ShaderValue, TextureFormat};

use super::Postproc;

pub const TONE_MAPPING_EXPOSURE: f32 = 1.5;

/// ACES filmic tone mapping of the HDR scene color onto the output format.
/// sRGB encoding happens in the shader when the output format does not do it.
pub fn create_tonemap_proc(
    graphics_instance: &GraphicsInstance,
    output_format: TextureFormat,
    exposure: f32,
) -> anyhow::Result<Postproc> {
    let device = graphics_instance.device();

    let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("TonemapBindings"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("Tonemap"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let mut defs = std::collections::HashMap::new();
    defs.insert("EXPOSURE".to_owned(), ShaderValue::Float(exposure));
    if !output_format.is_srgb() {
        defs.insert("ENCODE_SRGB".to_owned(), ShaderValue::Def);
    }
    let shader_descriptor = shader_preprocessor()?.build(
        include_str!("../../shader/tonemap.wgsl"),
        &defs,
        Some("tonemap.wgsl"),
    )?;
    let shader_module = device.create_shader_module(shader_descriptor);

    let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("Tonemap"),
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
                format: output_format.as_wgpu(),
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: PipelineCompilationOptions::default(),
        }),
        depth_stencil: None,
        layout: Some(&pipeline_layout),
        multisample: MultisampleState::default(),
        primitive: wgpu::PrimitiveState::default(),
        multiview: None,
        cache: graphics_instance.pipeline_cache(),
    });

    Ok(Postproc::new(pipeline, bind_group_layout))
}
