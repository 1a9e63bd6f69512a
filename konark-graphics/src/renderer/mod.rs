mod cache;
mod command_encoder;
mod framebuffer;
mod render_pass;

pub use cache::*;
pub use command_encoder::*;
pub use framebuffer::*;
pub use render_pass::*;

use std::{collections::HashSet, sync::Arc};

use konark_core::Size2Du;
use uuid::Uuid;
use wgpu::{util::DeviceExt, CommandEncoderDescriptor};

use crate::{
    create_tonemap_proc, Background, EnvParams, GraphicsInstance, LightParams, LineMaterial,
    LineVertex, ModelParams, PbrMaterial, PerspectiveCamera, Postproc, PrimitiveCollector,
    PrimitiveCollectorError, Scene, SkyboxMaterial, Surface, Texture, TextureFormat,
    BIND_GROUP_INDEX_FRAME, BIND_GROUP_INDEX_MATERIAL, BIND_GROUP_INDEX_MODEL,
    TONE_MAPPING_EXPOSURE,
};

/// Draws a scene from a camera. The viewer only talks to the renderer through this trait.
pub trait SceneRenderer {
    /// `surface` is the presentation size in physical pixels, `drawing_buffer` the
    /// size the scene is rendered at before being scaled onto the surface.
    fn resize(&mut self, surface: Size2Du, drawing_buffer: Size2Du);

    /// Draw one frame. Scenes without models, background or environment are valid.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> anyhow::Result<()>;
}

struct DrawCall {
    geometry_id: Uuid,
    image_id: Option<Uuid>,
    model_offset: u32,
}

pub struct Renderer {
    graphics_instance: Arc<GraphicsInstance>,
    surface: Surface<'static>,
    framebuffer: Framebuffer,
    pbr: PbrMaterial,
    skybox: SkyboxMaterial,
    lines: LineMaterial,
    tonemap: Postproc,
    tonemap_bind_group: wgpu::BindGroup,
    linear_sampler: wgpu::Sampler,
    nearest_sampler: wgpu::Sampler,
    view_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    env_params_buffer: wgpu::Buffer,
    fallback_environment: Texture,
    frame_bind_group: wgpu::BindGroup,
    frame_environment: Option<Uuid>,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    model_capacity: usize,
    model_stride: u64,
    default_material_bind_group: wgpu::BindGroup,
    line_bind_group: wgpu::BindGroup,
    axes: Option<(f32, wgpu::Buffer)>,
    cache: GpuCache,
}

impl Renderer {
    pub fn new(
        graphics_instance: Arc<GraphicsInstance>,
        surface: wgpu::Surface<'static>,
        surface_size: Size2Du,
        drawing_buffer: Size2Du,
    ) -> anyhow::Result<Self> {
        let surface = Surface::new(
            surface,
            &graphics_instance,
            surface_size.width,
            surface_size.height,
        )?;
        let gi = graphics_instance.as_ref();
        let device = gi.device();

        let framebuffer = Framebuffer::new(gi, drawing_buffer);
        let pbr = PbrMaterial::new(gi, TextureFormat::SCENE_COLOR, TextureFormat::DEPTH)?;
        let skybox = SkyboxMaterial::new(gi, TextureFormat::SCENE_COLOR, TextureFormat::DEPTH)?;
        let lines = LineMaterial::new(gi, TextureFormat::SCENE_COLOR, TextureFormat::DEPTH)?;
        let tonemap = create_tonemap_proc(gi, surface.format(), TONE_MAPPING_EXPOSURE)?;
        log::debug!("Pipelines created for surface format {:?}", surface.format());

        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Linear"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let nearest_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Nearest"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let uniform_buffer = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let view_buffer = uniform_buffer("ViewParams", std::mem::size_of::<crate::ViewParams>());
        let light_buffer = uniform_buffer("LightParams", std::mem::size_of::<LightParams>());
        let env_params_buffer = uniform_buffer("EnvParams", std::mem::size_of::<EnvParams>());

        let fallback_environment = Texture::from_data_cube(
            gi,
            "FallbackEnvironment",
            TextureFormat::HDR_SOURCE,
            1,
            1,
            &[0u8; 16 * 6],
        );
        let white = Texture::from_data_2d(
            gi,
            "White",
            TextureFormat::MATERIAL_COLOR,
            1,
            1,
            &[255u8; 4],
        );
        let default_material_bind_group = create_texture_bind_group(
            gi,
            "DefaultMaterial",
            pbr.material_layout(),
            &white,
            &linear_sampler,
        );

        let model_stride = align_to(
            std::mem::size_of::<ModelParams>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let model_capacity = 64;
        let (model_buffer, model_bind_group) =
            Self::create_model_buffer(gi, &pbr, model_stride, model_capacity);

        let frame_bind_group = Self::create_frame_bind_group(
            gi,
            &pbr,
            &view_buffer,
            &light_buffer,
            &env_params_buffer,
            &fallback_environment,
            &nearest_sampler,
        );
        let line_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lines"),
            layout: lines.bind_group_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: view_buffer.as_entire_binding(),
            }],
        });
        let tonemap_bind_group = create_texture_bind_group(
            gi,
            "Tonemap",
            tonemap.bind_group_layout(),
            framebuffer.color(),
            &linear_sampler,
        );

        Ok(Self {
            graphics_instance,
            surface,
            framebuffer,
            pbr,
            skybox,
            lines,
            tonemap,
            tonemap_bind_group,
            linear_sampler,
            nearest_sampler,
            view_buffer,
            light_buffer,
            env_params_buffer,
            fallback_environment,
            frame_bind_group,
            frame_environment: None,
            model_buffer,
            model_bind_group,
            model_capacity,
            model_stride,
            default_material_bind_group,
            line_bind_group,
            axes: None,
            cache: GpuCache::default(),
        })
    }

    pub fn graphics_instance(&self) -> &Arc<GraphicsInstance> {
        &self.graphics_instance
    }

    pub fn surface(&self) -> &Surface<'static> {
        &self.surface
    }

    pub fn drawing_buffer_size(&self) -> Size2Du {
        self.framebuffer.size()
    }

    fn create_frame_bind_group(
        graphics_instance: &GraphicsInstance,
        pbr: &PbrMaterial,
        view_buffer: &wgpu::Buffer,
        light_buffer: &wgpu::Buffer,
        env_params_buffer: &wgpu::Buffer,
        environment: &Texture,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        graphics_instance
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Frame"),
                layout: pbr.frame_layout(),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: view_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: light_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: env_params_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(environment.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            })
    }

    fn create_model_buffer(
        graphics_instance: &GraphicsInstance,
        pbr: &PbrMaterial,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let device = graphics_instance.device();
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ModelParams"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model"),
            layout: pbr.model_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ModelParams>() as u64),
                }),
            }],
        });

        (buffer, bind_group)
    }

    fn prepare_environment(&mut self, scene: &Scene) {
        let gi = self.graphics_instance.as_ref();
        let environment = scene.environment();

        if let Some(environment) = environment {
            self.cache.upload_environment(gi, environment);
        }
        let environment_id = environment.map(|environment| *environment.id());
        if environment_id != self.frame_environment {
            let texture = match environment_id {
                Some(_) => self
                    .cache
                    .environment_texture()
                    .unwrap_or(&self.fallback_environment),
                None => &self.fallback_environment,
            };
            self.frame_bind_group = Self::create_frame_bind_group(
                gi,
                &self.pbr,
                &self.view_buffer,
                &self.light_buffer,
                &self.env_params_buffer,
                texture,
                &self.nearest_sampler,
            );
            self.frame_environment = environment_id;
        }

        let env_params = EnvParams {
            mip_count: environment.map_or(1.0, |environment| environment.mip_level_count() as f32),
            has_environment: environment.is_some() as u32,
            _pad: [0; 2],
        };
        gi.queue()
            .write_buffer(&self.env_params_buffer, 0, bytemuck::bytes_of(&env_params));
    }

    fn prepare_background(&mut self, scene: &Scene) -> wgpu::Color {
        match scene.background() {
            Some(Background::Equirect(image)) => {
                let gi = self.graphics_instance.as_ref();
                let layout = self.skybox.bind_group_layout();
                let view_buffer = &self.view_buffer;
                let sampler = &self.nearest_sampler;
                self.cache.update_background(gi, image, |texture| {
                    gi.device().create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("Background"),
                        layout,
                        entries: &[
                            wgpu::BindGroupEntry {
                                binding: 0,
                                resource: view_buffer.as_entire_binding(),
                            },
                            wgpu::BindGroupEntry {
                                binding: 1,
                                resource: wgpu::BindingResource::TextureView(texture.view()),
                            },
                            wgpu::BindGroupEntry {
                                binding: 2,
                                resource: wgpu::BindingResource::Sampler(sampler),
                            },
                        ],
                    })
                });
                wgpu::Color::BLACK
            }
            Some(Background::Color([r, g, b])) => wgpu::Color {
                r: *r as f64,
                g: *g as f64,
                b: *b as f64,
                a: 1.0,
            },
            None => wgpu::Color::BLACK,
        }
    }

    fn prepare_axes(&mut self, scene: &Scene) {
        let Some(axes) = scene.axes() else {
            self.axes = None;
            return;
        };
        if matches!(&self.axes, Some((size, _)) if *size == axes.size()) {
            return;
        }

        let vertices: [LineVertex; 6] = axes.line_vertices();
        let buffer = self
            .graphics_instance
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Axes"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.axes = Some((axes.size(), buffer));
    }

    /// Upload what the scene's primitives need and write their per-draw uniforms.
    fn prepare_meshes(&mut self, scene: &Scene) -> anyhow::Result<Vec<DrawCall>> {
        let mut collector = PrimitiveCollector::new();
        scene.accept::<PrimitiveCollectorError>(&mut collector)?;
        let items = collector.into_items();

        if items.len() > self.model_capacity {
            self.model_capacity = items.len().next_power_of_two();
            let (buffer, bind_group) = Self::create_model_buffer(
                &self.graphics_instance,
                &self.pbr,
                self.model_stride,
                self.model_capacity,
            );
            self.model_buffer = buffer;
            self.model_bind_group = bind_group;
            log::debug!("Grow model uniforms to {} entries", self.model_capacity);
        }

        let gi = self.graphics_instance.as_ref();
        let mut model_data = vec![0u8; (self.model_stride as usize) * items.len()];
        let mut draw_calls = Vec::with_capacity(items.len());
        let mut used_geometries = HashSet::new();
        let mut used_images = HashSet::new();

        for (index, item) in items.iter().enumerate() {
            let geometry = item.primitive.geometry();
            if geometry.vertex_count() == 0 {
                continue;
            }
            self.cache.upload_geometry(gi, geometry);
            used_geometries.insert(*geometry.id());

            let material = item.primitive.material();
            let image_id = material.base_color_texture.as_ref().map(|image| {
                self.cache.upload_material_texture(
                    gi,
                    image,
                    self.pbr.material_layout(),
                    &self.linear_sampler,
                );
                used_images.insert(*image.id());
                *image.id()
            });

            let offset = index * self.model_stride as usize;
            let params = ModelParams::new(&item.world, material);
            model_data[offset..offset + std::mem::size_of::<ModelParams>()]
                .copy_from_slice(bytemuck::bytes_of(&params));

            draw_calls.push(DrawCall {
                geometry_id: *geometry.id(),
                image_id,
                model_offset: offset as u32,
            });
        }

        if !model_data.is_empty() {
            gi.queue().write_buffer(&self.model_buffer, 0, &model_data);
        }
        self.cache.retain(&used_geometries, &used_images);

        Ok(draw_calls)
    }

    fn encode_scene(
        &self,
        encoder: &mut CommandEncoder,
        clear: wgpu::Color,
        scene: &Scene,
        draw_calls: &[DrawCall],
    ) {
        let pass = encoder
            .encoder_mut()
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene"),
                color_attachments: &[Some(self.framebuffer.color_attachment(clear))],
                depth_stencil_attachment: Some(self.framebuffer.depth_attachment()),
                ..Default::default()
            });
        let mut render_pass = RenderPass::new(pass);

        if let (Some(Background::Equirect(_)), Some(bind_group)) =
            (scene.background(), self.cache.background_bind_group())
        {
            self.skybox.encode(&mut render_pass, bind_group);
        }

        render_pass.bind_pipeline(self.pbr.pipeline());
        render_pass.bind_group(BIND_GROUP_INDEX_FRAME, &self.frame_bind_group, &[]);
        for draw_call in draw_calls {
            let Some(geometry) = self.cache.get_geometry(&draw_call.geometry_id) else {
                continue;
            };
            let material_bind_group = draw_call
                .image_id
                .and_then(|id| self.cache.get_material_bind_group(&id))
                .unwrap_or(&self.default_material_bind_group);

            render_pass.bind_group(
                BIND_GROUP_INDEX_MODEL,
                &self.model_bind_group,
                &[draw_call.model_offset],
            );
            render_pass.bind_group(BIND_GROUP_INDEX_MATERIAL, material_bind_group, &[]);
            render_pass.bind_vertex_buffer(0, &geometry.positions);
            render_pass.bind_vertex_buffer(1, &geometry.normals);
            render_pass.bind_vertex_buffer(2, &geometry.uvs);
            match &geometry.indices {
                Some((indices, count)) => {
                    render_pass.bind_index_buffer(indices);
                    render_pass.draw_indexed(0..*count, 0..1);
                }
                None => render_pass.draw(0..geometry.vertex_count, 0..1),
            }
        }

        if let Some((_, buffer)) = &self.axes {
            self.lines
                .encode(&mut render_pass, &self.line_bind_group, buffer, 6);
        }
    }

    fn encode_tonemap(&self, encoder: &mut CommandEncoder, target: &wgpu::TextureView) {
        let pass = encoder
            .encoder_mut()
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Tonemap"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
        let mut render_pass = RenderPass::new(pass);
        self.tonemap
            .encode(&mut render_pass, &self.tonemap_bind_group);
    }
}

impl SceneRenderer for Renderer {
    fn resize(&mut self, surface: Size2Du, drawing_buffer: Size2Du) {
        if surface.is_empty() || drawing_buffer.is_empty() {
            return;
        }
        let gi = self.graphics_instance.clone();
        self.surface.resize(&gi, surface.width, surface.height);

        if drawing_buffer != self.framebuffer.size() {
            self.framebuffer = Framebuffer::new(&gi, drawing_buffer);
            self.tonemap_bind_group = create_texture_bind_group(
                &gi,
                "Tonemap",
                self.tonemap.bind_group_layout(),
                self.framebuffer.color(),
                &self.linear_sampler,
            );
            log::debug!(
                "Drawing buffer {}x{}, surface {}x{}",
                drawing_buffer.width,
                drawing_buffer.height,
                surface.width,
                surface.height
            );
        }
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> anyhow::Result<()> {
        let Some(frame) = self.surface.acquire(&self.graphics_instance)? else {
            return Ok(());
        };

        let queue = self.graphics_instance.queue();
        queue.write_buffer(
            &self.view_buffer,
            0,
            bytemuck::bytes_of(&camera.as_view_params()),
        );
        let lights = LightParams::new(scene.ambient_light(), scene.directional_lights());
        queue.write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(&lights));

        self.prepare_environment(scene);
        let clear = self.prepare_background(scene);
        self.prepare_axes(scene);
        let draw_calls = self.prepare_meshes(scene)?;

        let mut encoder = CommandEncoder::new(
            self.graphics_instance
                .device()
                .create_command_encoder(&CommandEncoderDescriptor {
                    label: Some("Frame"),
                }),
        );
        self.encode_scene(&mut encoder, clear, scene, &draw_calls);

        let target = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.encode_tonemap(&mut encoder, &target);

        self.graphics_instance.queue().submit([encoder.end()]);
        frame.present();

        Ok(())
    }
}

fn align_to(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_stride_respects_uniform_alignment() {
        assert_eq!(align_to(160, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(300, 256), 512);
    }
}
