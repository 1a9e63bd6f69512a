use std::sync::Arc;

use wgpu::{DeviceDescriptor, InstanceDescriptor, RequestAdapterOptions};

use crate::{required_wgpu_features, required_wgpu_limits, required_wgpu_memory_hints, GraphicsError};

#[derive(Debug, Clone)]
pub struct GraphicsInstance {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline_cache: Option<wgpu::PipelineCache>,
}

impl GraphicsInstance {
    /// Create instance, adapter and device able to present to `target`.
    pub async fn with_surface<T>(
        target: T,
    ) -> anyhow::Result<(Arc<Self>, wgpu::Surface<'static>)>
    where
        T: Into<wgpu::SurfaceTarget<'static>>,
    {
        let instance = wgpu::Instance::new(&InstanceDescriptor::from_env_or_default());
        let surface = instance.create_surface(target)?;
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .ok_or(GraphicsError::AdapterNotFound)?;
        log::debug!("Adapter: {:?}", adapter.get_info());

        let graphics_instance = Self::from_adapter(instance, adapter).await?;
        Ok((graphics_instance, surface))
    }

    /// Create a surfaceless instance. Used for offscreen work.
    pub async fn new() -> anyhow::Result<Arc<Self>> {
        let instance = wgpu::Instance::new(&InstanceDescriptor::from_env_or_default());
        let adapter = instance
            .request_adapter(&RequestAdapterOptions::default())
            .await
            .ok_or(GraphicsError::AdapterNotFound)?;
        Self::from_adapter(instance, adapter).await
    }

    async fn from_adapter(
        instance: wgpu::Instance,
        adapter: wgpu::Adapter,
    ) -> anyhow::Result<Arc<Self>> {
        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("konark"),
                    required_features: required_wgpu_features(),
                    required_limits: required_wgpu_limits(&adapter),
                    memory_hints: required_wgpu_memory_hints(),
                },
                None,
            )
            .await?;
        log::debug!("Device graphics limits: {:?}", device.limits());

        Ok(Arc::new(Self {
            instance,
            adapter,
            device,
            queue,
            pipeline_cache: None,
        }))
    }

    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn pipeline_cache(&self) -> Option<&wgpu::PipelineCache> {
        self.pipeline_cache.as_ref()
    }
}
