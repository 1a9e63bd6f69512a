use wgpu::{
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, BufferBindingType,
    FragmentState, MultisampleState, PipelineCompilationOptions, PipelineLayoutDescriptor,
    RenderPipelineDescriptor, SamplerBindingType, ShaderStages, TextureSampleType,
    TextureViewDimension, VertexState,
};

use crate::{GraphicsInstance, Material, TextureFormat};

use super::{default_shader_defs, shader_preprocessor};

pub const BIND_GROUP_INDEX_FRAME: u32 = 0;
pub const BIND_GROUP_INDEX_MODEL: u32 = 1;
pub const BIND_GROUP_INDEX_MATERIAL: u32 = 2;

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
const UV_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x2];

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelParams {
    pub model: glam::Mat4,
    pub normal_matrix: glam::Mat4,
    pub base_color_factor: glam::Vec4,
    pub metallic: f32,
    pub roughness: f32,
    pub env_map_intensity: f32,
    pub _pad: u32,
}

impl ModelParams {
    pub fn new(world: &glam::Mat4, material: &Material) -> Self {
        Self {
            model: *world,
            normal_matrix: world.inverse().transpose(),
            base_color_factor: glam::Vec4::from_array(material.base_color_factor),
            metallic: material.metallic,
            roughness: material.roughness,
            env_map_intensity: material.env_map_intensity,
            _pad: 0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EnvParams {
    pub mip_count: f32,
    pub has_environment: u32,
    pub _pad: [u32; 2],
}

/// Metallic-roughness mesh pipeline with directional, ambient and image based lighting.
#[derive(Debug, Clone)]
pub struct PbrMaterial {
    pipeline: wgpu::RenderPipeline,
    frame_layout: wgpu::BindGroupLayout,
    model_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
}

impl PbrMaterial {
    pub fn new(
        graphics_instance: &GraphicsInstance,
        color_format: TextureFormat,
        depth_format: TextureFormat,
    ) -> anyhow::Result<Self> {
        let device = graphics_instance.device();

        let uniform = |binding: u32, has_dynamic_offset: bool| BindGroupLayoutEntry {
            binding,
            visibility: ShaderStages::VERTEX_FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset,
                min_binding_size: None,
            },
            count: None,
        };

        let frame_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("PbrFrameBindings"),
            entries: &[
                uniform(0, false),
                uniform(1, false),
                uniform(2, false),
                BindGroupLayoutEntry {
                    binding: 3,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: false },
                        view_dimension: TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 4,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let model_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("PbrModelBindings"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ModelParams>() as u64
                    ),
                },
                count: None,
            }],
        });

        let material_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("PbrMaterialBindings"),
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
            label: Some("Pbr"),
            bind_group_layouts: &[&frame_layout, &model_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let shader_descriptor = shader_preprocessor()?.build(
            include_str!("../shader/pbr.wgsl"),
            &default_shader_defs(),
            Some("pbr.wgsl"),
        )?;
        let shader_module = device.create_shader_module(shader_descriptor);

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Pbr"),
            vertex: VertexState {
                module: &shader_module,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &POSITION_ATTRIBUTES,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &NORMAL_ATTRIBUTES,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &UV_ATTRIBUTES,
                    },
                ],
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
            // Back faces are shaded with flipped normals instead of culled
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
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
            frame_layout,
            model_layout,
            material_layout,
        })
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn frame_layout(&self) -> &wgpu::BindGroupLayout {
        &self.frame_layout
    }

    pub fn model_layout(&self) -> &wgpu::BindGroupLayout {
        &self.model_layout
    }

    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_params_match_shader_layout() {
        assert_eq!(std::mem::size_of::<ModelParams>(), 160);
        assert_eq!(std::mem::size_of::<EnvParams>(), 16);
        assert_eq!(std::mem::size_of::<crate::LightParams>(), 160);
        assert_eq!(std::mem::size_of::<crate::ViewParams>(), 400);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let world = glam::Mat4::from_scale(glam::vec3(2.0, 1.0, 1.0));
        let params = ModelParams::new(&world, &Material::default());

        let normal = params
            .normal_matrix
            .transform_vector3(glam::vec3(1.0, 1.0, 0.0))
            .normalize();
        assert!(normal.abs_diff_eq(glam::vec3(0.5, 1.0, 0.0).normalize(), 1e-6));
        assert_eq!(params.env_map_intensity, 1.0);
    }
}
