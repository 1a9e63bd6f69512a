use std::{
    sync::{Arc, Weak},
    time::Instant,
};

use glam::Vec3;
use rayon::iter::{IntoParallelIterator, IntoParallelRefIterator, ParallelIterator};

use crate::HdrImage;

use super::{
    equirect_uv, face_direction, hammersley, importance_sample_ggx, sample_bilinear_wrapped,
    tangent_frame, CubeLevel, Environment, CUBE_FACE_COUNT,
};

pub const DEFAULT_ENVIRONMENT_FACE_SIZE: u32 = 256;
const MIN_FACE_SIZE: u32 = 16;
const SAMPLE_COUNT: u32 = 64;
/// Smallest source level kept when building the equirect pyramid
const MIN_PYRAMID_WIDTH: u32 = 8;

/// Precomputed per-texel directions and GGX sample sets for each output mip.
#[derive(Debug)]
pub struct FilterKernel {
    levels: Vec<KernelLevel>,
}

#[derive(Debug)]
struct KernelLevel {
    size: u32,
    roughness: f32,
    directions: [Vec<Vec3>; CUBE_FACE_COUNT],
    /// Tangent-space half vectors; empty for the mirror level
    half_vectors: Vec<Vec3>,
}

impl FilterKernel {
    fn new(face_size: u32) -> Self {
        let mut sizes = vec![face_size.max(1)];
        while let Some(&last) = sizes.last() {
            let next = last / 2;
            if next < MIN_FACE_SIZE {
                break;
            }
            sizes.push(next);
        }

        let last = (sizes.len() - 1).max(1) as f32;
        let levels = sizes
            .iter()
            .enumerate()
            .map(|(index, &size)| {
                let roughness = if sizes.len() == 1 { 0.0 } else { index as f32 / last };
                let half_vectors = if index == 0 {
                    Vec::new()
                } else {
                    (0..SAMPLE_COUNT)
                        .map(|i| importance_sample_ggx(hammersley(i, SAMPLE_COUNT), roughness))
                        .collect()
                };
                KernelLevel {
                    size,
                    roughness,
                    directions: std::array::from_fn(|face| {
                        (0..size * size)
                            .map(|i| face_direction(face, i % size, i / size, size))
                            .collect()
                    }),
                    half_vectors,
                }
            })
            .collect();

        Self { levels }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

/// Box-filtered copies of the source so each cube level reads a source of similar density.
struct EquirectPyramid {
    levels: Vec<(u32, u32, Vec<Vec3>)>,
}

impl EquirectPyramid {
    fn new(image: &HdrImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let base: Vec<Vec3> = (0..width * height)
            .map(|i| image.texel(i % width, i / width))
            .collect();
        let mut levels = vec![(width, height, base)];

        loop {
            let Some((w, h, texels)) = levels.last() else {
                break;
            };
            if *w / 2 < MIN_PYRAMID_WIDTH || *h / 2 == 0 {
                break;
            }
            let (nw, nh) = (w / 2, h / 2);
            let next = (0..nw * nh)
                .into_par_iter()
                .map(|i| {
                    let (x, y) = (i % nw * 2, i / nw * 2);
                    (texels[(y * w + x) as usize]
                        + texels[(y * w + x + 1) as usize]
                        + texels[((y + 1) * w + x) as usize]
                        + texels[((y + 1) * w + x + 1) as usize])
                        * 0.25
                })
                .collect();
            levels.push((nw, nh, next));
        }

        Self { levels }
    }

    /// First level no wider than four times the cube face.
    fn level_for(&self, face_size: u32) -> &(u32, u32, Vec<Vec3>) {
        let target = face_size * 4;
        self.levels
            .iter()
            .find(|(width, _, _)| *width <= target)
            .unwrap_or(&self.levels[self.levels.len() - 1])
    }

    fn sample(level: &(u32, u32, Vec<Vec3>), direction: Vec3) -> Vec3 {
        let (width, height, texels) = level;
        let uv = equirect_uv(direction);
        sample_bilinear_wrapped(
            *width,
            *height,
            |x, y| texels[(y * width + x) as usize],
            uv.x,
            uv.y,
        )
    }
}

/// Converts equirectangular HDR images into prefiltered environments.
/// Consumed by [`EnvironmentGenerator::dispose`] once it is no longer needed.
#[derive(Debug)]
pub struct EnvironmentGenerator {
    face_size: u32,
    kernel: Option<Arc<FilterKernel>>,
}

impl Default for EnvironmentGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ENVIRONMENT_FACE_SIZE)
    }
}

impl EnvironmentGenerator {
    pub fn new(face_size: u32) -> Self {
        Self {
            face_size,
            kernel: None,
        }
    }

    /// Build the filter kernel ahead of the first conversion.
    pub fn compile_equirectangular(&mut self) {
        if self.kernel.is_none() {
            let instant = Instant::now();
            self.kernel = Some(Arc::new(FilterKernel::new(self.face_size)));
            log::debug!(
                "Compile equirect kernel ({}px) in {} secs",
                self.face_size,
                instant.elapsed().as_secs_f32()
            );
        }
    }

    pub fn kernel(&self) -> Option<Weak<FilterKernel>> {
        self.kernel.as_ref().map(Arc::downgrade)
    }

    pub fn from_equirectangular(&mut self, image: &HdrImage) -> Environment {
        self.compile_equirectangular();
        let Some(kernel) = self.kernel.clone() else {
            return Environment::new(Vec::new());
        };

        let instant = Instant::now();
        let pyramid = EquirectPyramid::new(image);
        let levels = kernel
            .levels
            .iter()
            .map(|level| Self::filter_level(level, &pyramid))
            .collect();
        log::debug!(
            "Prefilter {}x{} environment into {} levels in {} secs",
            image.width(),
            image.height(),
            kernel.levels.len(),
            instant.elapsed().as_secs_f32()
        );

        Environment::new(levels)
    }

    /// Release the kernel. The generator cannot be used afterwards.
    pub fn dispose(self) {
        drop(self);
    }

    fn filter_level(level: &KernelLevel, pyramid: &EquirectPyramid) -> CubeLevel {
        let source = pyramid.level_for(level.size);
        let faces = std::array::from_fn(|face| {
            level.directions[face]
                .par_iter()
                .map(|&normal| {
                    let color = if level.half_vectors.is_empty() {
                        EquirectPyramid::sample(source, normal)
                    } else {
                        Self::prefilter(normal, &level.half_vectors, source)
                    };
                    [color.x, color.y, color.z, 1.0]
                })
                .collect()
        });

        CubeLevel {
            size: level.size,
            roughness: level.roughness,
            faces,
        }
    }

    /// GGX prefilter with view == normal.
    fn prefilter(normal: Vec3, half_vectors: &[Vec3], source: &(u32, u32, Vec<Vec3>)) -> Vec3 {
        let (tangent, bitangent) = tangent_frame(normal);
        let mut color = Vec3::ZERO;
        let mut weight = 0.0;

        for h in half_vectors {
            let half = tangent * h.x + bitangent * h.y + normal * h.z;
            let light = 2.0 * normal.dot(half) * half - normal;
            let n_dot_l = normal.dot(light);
            if n_dot_l > 0.0 {
                color += EquirectPyramid::sample(source, light) * n_dot_l;
                weight += n_dot_l;
            }
        }

        if weight > 0.0 {
            color / weight
        } else {
            EquirectPyramid::sample(source, normal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_levels_halve_down_to_minimum() {
        let kernel = FilterKernel::new(64);
        let sizes: Vec<_> = kernel.levels.iter().map(|l| l.size).collect();

        assert_eq!(sizes, vec![64, 32, 16]);
        assert_eq!(kernel.levels[0].roughness, 0.0);
        assert_eq!(kernel.levels[2].roughness, 1.0);
    }

    #[test]
    fn constant_source_stays_constant() {
        let color = [0.25, 0.5, 1.0];
        let image = HdrImage::from_rgb(16, 8, &[color; 128]).unwrap();
        let mut generator = EnvironmentGenerator::new(32);
        let environment = generator.from_equirectangular(&image);
        generator.dispose();

        assert_eq!(environment.mip_level_count(), 2);
        for roughness in [0.0, 1.0] {
            for direction in [Vec3::X, Vec3::NEG_Y, Vec3::new(1.0, 1.0, -1.0).normalize()] {
                let sampled = environment.sample(direction, roughness);
                assert!(sampled.abs_diff_eq(Vec3::from(color), 1e-4));
            }
        }
    }

    #[test]
    fn bright_sky_lands_on_positive_y_face() {
        // Top half white, bottom half black
        let texels: Vec<[f32; 3]> = (0..32)
            .map(|i| if i < 16 { [1.0; 3] } else { [0.0; 3] })
            .collect();
        let image = HdrImage::from_rgb(8, 4, &texels).unwrap();
        let mut generator = EnvironmentGenerator::new(16);
        let environment = generator.from_equirectangular(&image);

        assert!(environment.sample(Vec3::Y, 0.0).x > 0.99);
        assert!(environment.sample(Vec3::NEG_Y, 0.0).x < 0.01);
    }

    #[test]
    fn dispose_releases_kernel() {
        let image = HdrImage::from_rgb(8, 4, &[[1.0; 3]; 32]).unwrap();
        let mut generator = EnvironmentGenerator::new(16);
        generator.compile_equirectangular();
        let kernel = generator.kernel().unwrap();
        let _environment = generator.from_equirectangular(&image);

        assert!(kernel.upgrade().is_some());
        generator.dispose();
        assert!(kernel.upgrade().is_none());
    }

    #[test]
    fn layer_major_bytes_cover_every_face_and_mip() {
        let image = HdrImage::from_rgb(8, 4, &[[1.0; 3]; 32]).unwrap();
        let environment = EnvironmentGenerator::new(32).from_equirectangular(&image);

        let texels = (32 * 32 + 16 * 16) * CUBE_FACE_COUNT;
        assert_eq!(environment.to_layer_major_bytes().len(), texels * 16);
    }
}
