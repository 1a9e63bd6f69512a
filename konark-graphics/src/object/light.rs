use glam::{Vec3, Vec4};

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(color: Vec3, intensity: f32) -> Self {
        Self { color, intensity }
    }
}

/// Light arriving from `position` towards `target`. Only the direction matters.
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl DirectionalLight {
    pub fn new(color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: Vec3::Y,
            target: Vec3::ZERO,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Unit vector pointing from the target towards the light.
    pub fn direction_to_light(&self) -> Vec3 {
        (self.position - self.target).try_normalize().unwrap_or(Vec3::Y)
    }
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightParams {
    /// xyz: direction to light
    pub direction: Vec4,
    /// rgb: color * intensity
    pub radiance: Vec4,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightParams {
    pub ambient: Vec4,
    pub directional: [DirectionalLightParams; MAX_DIRECTIONAL_LIGHTS],
    pub directional_count: u32,
    pub _pad: [u32; 3],
}

impl LightParams {
    pub fn new(ambient: Option<&AmbientLight>, directional: &[DirectionalLight]) -> Self {
        let mut params = Self::default();
        if let Some(ambient) = ambient {
            params.ambient = (ambient.color * ambient.intensity).extend(1.0);
        }
        if directional.len() > MAX_DIRECTIONAL_LIGHTS {
            log::warn!(
                "Only {} of {} directional lights are shaded",
                MAX_DIRECTIONAL_LIGHTS,
                directional.len()
            );
        }
        for (slot, light) in params.directional.iter_mut().zip(directional) {
            *slot = DirectionalLightParams {
                direction: light.direction_to_light().extend(0.0),
                radiance: (light.color * light.intensity).extend(1.0),
            };
        }
        params.directional_count = directional.len().min(MAX_DIRECTIONAL_LIGHTS) as u32;

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_params_pack_color_and_direction() {
        let ambient = AmbientLight::new(Vec3::ONE, 0.5);
        let sun = DirectionalLight::new(Vec3::ONE, 2.0).with_position(Vec3::new(20.0, 20.0, 20.0));
        let params = LightParams::new(Some(&ambient), &[sun]);

        assert_eq!(params.ambient.truncate(), Vec3::splat(0.5));
        assert_eq!(params.directional_count, 1);
        assert!(params.directional[0]
            .direction
            .truncate()
            .abs_diff_eq(Vec3::ONE.normalize(), 1e-6));
        assert_eq!(params.directional[0].radiance.truncate(), Vec3::splat(2.0));
    }
}
