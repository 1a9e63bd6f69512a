mod generator;
mod sampling;

pub use generator::*;
pub use sampling::*;

use std::fmt::Debug;

use glam::Vec3;
use uuid::Uuid;

/// One mip of the prefiltered cube. `faces` are in layer order, texels row-major RGBA.
#[derive(Clone)]
pub struct CubeLevel {
    pub size: u32,
    pub roughness: f32,
    pub faces: [Vec<[f32; 4]>; CUBE_FACE_COUNT],
}

impl CubeLevel {
    pub fn texel(&self, face: usize, x: u32, y: u32) -> Vec3 {
        let [r, g, b, _] = self.faces[face][(y * self.size + x) as usize];
        Vec3::new(r, g, b)
    }
}

impl Debug for CubeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CubeLevel")
            .field("size", &self.size)
            .field("roughness", &self.roughness)
            .finish()
    }
}

/// Prefiltered radiance cubemap. Level 0 is a mirror reflection, the last level
/// is fully rough and doubles as the diffuse term.
#[derive(Debug)]
pub struct Environment {
    id: Uuid,
    levels: Vec<CubeLevel>,
}

impl Environment {
    pub fn new(levels: Vec<CubeLevel>) -> Self {
        Self {
            id: Uuid::new_v4(),
            levels,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn face_size(&self) -> u32 {
        self.levels.first().map_or(0, |level| level.size)
    }

    pub fn mip_level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn levels(&self) -> &[CubeLevel] {
        &self.levels
    }

    /// Nearest texel of the level matching `roughness`.
    pub fn sample(&self, direction: Vec3, roughness: f32) -> Vec3 {
        let Some(last) = self.levels.len().checked_sub(1) else {
            return Vec3::ZERO;
        };
        let level = &self.levels[((roughness.clamp(0.0, 1.0) * last as f32).round() as usize).min(last)];
        let (face, uv) = direction_to_face_uv(direction);
        let x = ((uv.x * level.size as f32) as u32).min(level.size - 1);
        let y = ((uv.y * level.size as f32) as u32).min(level.size - 1);
        level.texel(face, x, y)
    }

    /// Texel data in layer-major order: every mip of +X, then every mip of -X, ...
    pub fn to_layer_major_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for face in 0..CUBE_FACE_COUNT {
            for level in &self.levels {
                bytes.extend_from_slice(bytemuck::cast_slice(&level.faces[face]));
            }
        }
        bytes
    }
}
