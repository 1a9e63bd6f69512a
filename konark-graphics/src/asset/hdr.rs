use std::{fmt::Debug, time::Instant};

use glam::Vec3;
use uuid::Uuid;

use crate::{sample_bilinear_wrapped, LoadError};

use super::{AssetSource, ProgressSender};

/// Decoded equirectangular HDR image in linear RGBA32F.
pub struct HdrImage {
    id: Uuid,
    image: image::Rgba32FImage,
}

impl HdrImage {
    pub fn new(image: image::Rgba32FImage) -> Self {
        Self {
            id: Uuid::new_v4(),
            image,
        }
    }

    /// Build from a row-major list of linear RGB texels.
    pub fn from_rgb(width: u32, height: u32, texels: &[[f32; 3]]) -> Option<Self> {
        let data = texels
            .iter()
            .flat_map(|[r, g, b]| [*r, *g, *b, 1.0])
            .collect();
        image::Rgba32FImage::from_raw(width, height, data).map(Self::new)
    }

    pub fn decode(data: &[u8]) -> anyhow::Result<Self> {
        let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Hdr)?;
        Ok(Self::new(decoded.into_rgba32f()))
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_raw(&self) -> &[f32] {
        self.image.as_raw()
    }

    pub fn texel(&self, x: u32, y: u32) -> Vec3 {
        let pixel = self.image.get_pixel(x, y);
        Vec3::new(pixel[0], pixel[1], pixel[2])
    }

    /// Resampled copy. Used when the source exceeds texture size limits.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        Self::new(image::imageops::resize(
            &self.image,
            width,
            height,
            image::imageops::FilterType::Triangle,
        ))
    }

    /// Bilinear sample. `u` wraps around, `v` clamps at the poles.
    pub fn sample(&self, u: f32, v: f32) -> Vec3 {
        sample_bilinear_wrapped(self.width(), self.height(), |x, y| self.texel(x, y), u, v)
    }
}

impl Debug for HdrImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HdrImage")
            .field("id", &self.id)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct HdrLoader {
    source: AssetSource,
}

impl HdrLoader {
    pub fn new(source: AssetSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &AssetSource {
        &self.source
    }

    /// Fetch and decode a Radiance HDR file.
    pub async fn load(
        &self,
        name: &str,
        progress: Option<ProgressSender>,
    ) -> Result<HdrImage, LoadError> {
        let url = self.source.resolve(name);
        self.load_impl(name, progress.as_ref())
            .await
            .map_err(|cause| LoadError::new(&url, cause))
    }

    async fn load_impl(
        &self,
        name: &str,
        progress: Option<&ProgressSender>,
    ) -> anyhow::Result<HdrImage> {
        let instant = Instant::now();
        let data = self.source.fetch(name, progress).await?;
        log::debug!(
            "Fetch {} ({} bytes) in {} secs",
            name,
            data.len(),
            instant.elapsed().as_secs_f32()
        );

        let instant = Instant::now();
        let image = tokio::task::spawn_blocking(move || HdrImage::decode(&data)).await??;
        log::debug!(
            "Decode {}x{} hdr in {} secs",
            image.width(),
            image.height(),
            instant.elapsed().as_secs_f32()
        );

        Ok(image)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Flat (non-RLE) Radiance file; valid for widths below 8.
    pub(crate) fn radiance_bytes(width: u32, height: u32, rgbe: [u8; 4]) -> Vec<u8> {
        let mut data =
            format!("#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y {} +X {}\n", height, width)
                .into_bytes();
        for _ in 0..width * height {
            data.extend_from_slice(&rgbe);
        }
        data
    }

    #[test]
    fn decode_flat_radiance() {
        let image = HdrImage::decode(&radiance_bytes(4, 2, [128, 128, 128, 129])).unwrap();

        assert_eq!(image.width(), 4);
        assert_eq!(image.height(), 2);
        assert!(image.texel(3, 1).abs_diff_eq(Vec3::ONE, 0.01));
    }

    #[test]
    fn sample_wraps_horizontally() {
        let image = HdrImage::from_rgb(2, 1, &[[1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]).unwrap();

        // Texel centers
        assert!(image.sample(0.25, 0.5).abs_diff_eq(Vec3::X, 1e-6));
        assert!(image.sample(0.75, 0.5).abs_diff_eq(Vec3::Z, 1e-6));
        // Seam blends the last and first column
        assert!(image
            .sample(0.0, 0.5)
            .abs_diff_eq(Vec3::new(0.5, 0.0, 0.5), 1e-6));
    }

    #[tokio::test]
    async fn missing_hdr_reports_url() {
        let loader = HdrLoader::new(AssetSource::new("no/such/dir").unwrap());
        let err = loader.load("cloudy.hdr", None).await.unwrap_err();

        assert!(err.url().ends_with("cloudy.hdr"));
    }

    #[tokio::test]
    async fn garbage_hdr_is_a_load_error() {
        let dir = std::env::temp_dir().join(format!("konark-hdr-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("bad.hdr"), b"not an hdr").await.unwrap();

        let loader = HdrLoader::new(AssetSource::Directory(dir.clone()));
        assert!(loader.load("bad.hdr", None).await.is_err());
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
