pub fn required_wgpu_features() -> wgpu::Features {
    wgpu::Features::empty()
}

pub fn required_wgpu_memory_hints() -> wgpu::MemoryHints {
    #[cfg(target_os = "android")]
    let hints = wgpu::MemoryHints::MemoryUsage;
    #[cfg(not(target_os = "android"))]
    let hints = wgpu::MemoryHints::Performance;

    hints
}

/// Default limits with texture size limits taken from the adapter.
pub fn required_wgpu_limits(adapter: &wgpu::Adapter) -> wgpu::Limits {
    wgpu::Limits::default().using_resolution(adapter.limits())
}
