/// Texture formats used by the renderer.
/// This is a subset of the graphics library's texture formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureFormat(wgpu::TextureFormat);

impl TextureFormat {
    pub const SCENE_COLOR: Self = Self(wgpu::TextureFormat::Rgba16Float);
    pub const DEPTH: Self = Self(wgpu::TextureFormat::Depth32Float);
    pub const HDR_SOURCE: Self = Self(wgpu::TextureFormat::Rgba32Float);
    pub const MATERIAL_COLOR: Self = Self(wgpu::TextureFormat::Rgba8UnormSrgb);

    pub fn as_wgpu(&self) -> wgpu::TextureFormat {
        self.0
    }

    pub fn is_srgb(&self) -> bool {
        self.0.is_srgb()
    }

    pub fn is_depth(&self) -> bool {
        self.0.has_depth_aspect()
    }

    /// Size of one texel in bytes. Block compressed formats are not used here.
    pub fn texel_size(&self) -> u32 {
        self.0.block_copy_size(None).unwrap_or(0)
    }
}

impl From<wgpu::TextureFormat> for TextureFormat {
    fn from(value: wgpu::TextureFormat) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texel_sizes_match_upload_layouts() {
        assert_eq!(TextureFormat::HDR_SOURCE.texel_size(), 16);
        assert_eq!(TextureFormat::MATERIAL_COLOR.texel_size(), 4);
        assert!(TextureFormat::MATERIAL_COLOR.is_srgb());
        assert!(TextureFormat::DEPTH.is_depth());
    }
}
