use glam::Vec3;

/// Spherical coordinates around a pivot with Y as the up axis.
///
/// `phi` is the polar angle measured from +Y, `theta` the azimuth around Y
/// measured from +Z towards +X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Default for Spherical {
    fn default() -> Self {
        Self {
            radius: 1.0,
            phi: 0.0,
            theta: 0.0,
        }
    }
}

impl Spherical {
    const EPS: f32 = 1e-6;

    pub fn new(radius: f32, phi: f32, theta: f32) -> Self {
        Self { radius, phi, theta }
    }

    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::new(0.0, 0.0, 0.0);
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(&self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keep phi away from the poles so the up vector stays defined.
    pub fn make_safe(&mut self) {
        self.phi = self
            .phi
            .clamp(Self::EPS, std::f32::consts::PI - Self::EPS);
    }
}
