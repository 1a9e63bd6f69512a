use std::{f32::consts::PI, time::Duration};

use glam::{Vec2, Vec3};
use konark_core::Spherical;
use konark_graphics::PerspectiveCamera;

const TWO_PI: f32 = 2.0 * PI;
const ZOOM_BASE: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitOptions {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub enable_pan: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for OrbitOptions {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            auto_rotate: true,
            auto_rotate_speed: 0.5,
            min_polar_angle: 0.2,
            max_polar_angle: PI / 2.2,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            enable_pan: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    None,
    Rotate(Vec2),
    Pan(Vec2),
}

/// Orbits a camera around a target. Input only accumulates deltas; the camera
/// moves in [`OrbitController::update`], once per frame.
#[derive(Debug, Clone)]
pub struct OrbitController {
    options: OrbitOptions,
    target: Vec3,
    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vec3,
    state: DragState,
    surface_height: f32,
}

impl OrbitController {
    pub fn new(options: OrbitOptions) -> Self {
        Self {
            options,
            target: Vec3::ZERO,
            spherical_delta: Spherical::new(0.0, 0.0, 0.0),
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            state: DragState::None,
            surface_height: 1.0,
        }
    }

    pub fn options(&self) -> &OrbitOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut OrbitOptions {
        &mut self.options
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Height of the input surface in logical pixels. Drag distances are relative to it.
    pub fn set_surface_height(&mut self, height: f32) {
        if height > 0.0 {
            self.surface_height = height;
        }
    }

    pub fn is_interacting(&self) -> bool {
        self.state != DragState::None
    }

    /// Rotation applied by auto-rotate over `delta`. Without a delta a 60 Hz frame is assumed.
    pub fn auto_rotation_angle(&self, delta: Option<Duration>) -> f32 {
        let per_second = TWO_PI / 60.0 * self.options.auto_rotate_speed;
        match delta {
            Some(delta) => per_second * delta.as_secs_f32(),
            None => per_second / 60.0,
        }
    }

    /// Apply accumulated input, auto-rotation and damping to `camera`.
    /// Returns `true` when the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera, delta: Option<Duration>) -> bool {
        let position = camera.get_position();
        let mut spherical = Spherical::from_offset(position - self.target);

        if self.options.auto_rotate && self.state == DragState::None {
            self.rotate_left(self.auto_rotation_angle(delta));
        }

        let step = if self.options.enable_damping {
            self.options.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.spherical_delta.theta * step;
        spherical.phi += self.spherical_delta.phi * step;
        spherical.phi = spherical
            .phi
            .clamp(self.options.min_polar_angle, self.options.max_polar_angle);
        spherical.make_safe();

        spherical.radius = (spherical.radius * self.scale)
            .clamp(self.options.min_distance, self.options.max_distance);

        self.target += self.pan_offset * step;

        let next_position = self.target + spherical.to_offset();
        camera.set_position(next_position);
        camera.look_at(self.target);

        if self.options.enable_damping {
            let decay = 1.0 - self.options.damping_factor;
            self.spherical_delta.theta *= decay;
            self.spherical_delta.phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.spherical_delta = Spherical::new(0.0, 0.0, 0.0);
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        next_position.distance_squared(position) > 1e-12
    }

    pub fn pointer_down(&mut self, button: PointerButton, position: Vec2) {
        self.state = match button {
            PointerButton::Primary => DragState::Rotate(position),
            PointerButton::Secondary | PointerButton::Middle if self.options.enable_pan => {
                DragState::Pan(position)
            }
            _ => DragState::None,
        };
    }

    pub fn pointer_moved(&mut self, camera: &PerspectiveCamera, position: Vec2) {
        match self.state {
            DragState::Rotate(last) => {
                let delta = (position - last) * self.options.rotate_speed;
                self.rotate_left(TWO_PI * delta.x / self.surface_height);
                self.rotate_up(TWO_PI * delta.y / self.surface_height);
                self.state = DragState::Rotate(position);
            }
            DragState::Pan(last) => {
                let delta = (position - last) * self.options.pan_speed;
                self.pan(camera, delta);
                self.state = DragState::Pan(position);
            }
            DragState::None => {}
        }
    }

    pub fn pointer_up(&mut self) {
        self.state = DragState::None;
    }

    /// Positive `delta_y` moves away from the target.
    pub fn wheel(&mut self, delta_y: f32) {
        let zoom_scale = ZOOM_BASE.powf(self.options.zoom_speed);
        if delta_y > 0.0 {
            self.scale /= zoom_scale;
        } else if delta_y < 0.0 {
            self.scale *= zoom_scale;
        }
    }

    fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    fn pan(&mut self, camera: &PerspectiveCamera, delta: Vec2) {
        let offset = camera.get_position() - self.target;
        let target_distance = offset.length() * (camera.get_fov().to_radians() / 2.0).tan();

        let forward = -offset.normalize_or_zero();
        let right = forward.cross(camera.get_up()).normalize_or_zero();
        let up = right.cross(forward);

        self.pan_offset += right * (-2.0 * delta.x * target_distance / self.surface_height);
        self.pan_offset += up * (2.0 * delta.y * target_distance / self.surface_height);
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(OrbitOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0)
            .with_position(Vec3::new(-20.0, 20.0, 20.0))
            .with_target(Vec3::ZERO)
    }

    fn polar_angle(camera: &PerspectiveCamera) -> f32 {
        Spherical::from_offset(camera.get_position()).phi
    }

    #[test]
    fn auto_rotation_assumes_sixty_hz_without_delta() {
        let controller = OrbitController::default();
        let per_frame = controller.auto_rotation_angle(None);
        let one_frame = controller.auto_rotation_angle(Some(Duration::from_secs_f32(1.0 / 60.0)));

        assert!((per_frame - TWO_PI / 60.0 * 0.5 / 60.0).abs() < 1e-7);
        assert!((per_frame - one_frame).abs() < 1e-6);
    }

    #[test]
    fn polar_angle_stays_clamped() {
        let mut controller = OrbitController::default();
        let mut camera = camera();
        controller.set_surface_height(100.0);

        controller.pointer_down(PointerButton::Primary, Vec2::ZERO);
        controller.pointer_moved(&camera, Vec2::new(0.0, 10_000.0));
        for _ in 0..200 {
            controller.update(&mut camera, None);
            let phi = polar_angle(&camera);
            assert!(phi >= 0.2 - 1e-4 && phi <= PI / 2.2 + 1e-4, "phi {}", phi);
        }

        controller.pointer_moved(&camera, Vec2::new(0.0, -20_000.0));
        for _ in 0..200 {
            controller.update(&mut camera, None);
            assert!(polar_angle(&camera) >= 0.2 - 1e-4);
        }
    }

    #[test]
    fn distance_is_clamped() {
        let mut controller = OrbitController::new(OrbitOptions {
            min_distance: 16.0,
            max_distance: 36.0,
            ..Default::default()
        });
        let mut camera = camera();

        for _ in 0..100 {
            controller.wheel(1.0);
            controller.update(&mut camera, None);
        }
        assert!(camera.get_position().length() <= 36.0 + 1e-3);

        for _ in 0..100 {
            controller.wheel(-1.0);
            controller.update(&mut camera, None);
        }
        assert!(camera.get_position().length() >= 16.0 - 1e-3);
    }

    #[test]
    fn damping_keeps_moving_after_release() {
        let mut controller = OrbitController::new(OrbitOptions {
            auto_rotate: false,
            ..Default::default()
        });
        let mut camera = camera();
        controller.set_surface_height(500.0);

        controller.pointer_down(PointerButton::Primary, Vec2::ZERO);
        controller.pointer_moved(&camera, Vec2::new(50.0, 0.0));
        controller.pointer_up();

        assert!(controller.update(&mut camera, None));
        assert!(controller.update(&mut camera, None));
    }

    #[test]
    fn pan_disabled_ignores_secondary_drag() {
        let mut controller = OrbitController::new(OrbitOptions {
            enable_pan: false,
            auto_rotate: false,
            ..Default::default()
        });
        let mut camera = camera();

        controller.pointer_down(PointerButton::Secondary, Vec2::ZERO);
        assert!(!controller.is_interacting());
        controller.pointer_moved(&camera, Vec2::new(40.0, 40.0));
        controller.update(&mut camera, None);
        assert_eq!(controller.target(), Vec3::ZERO);
    }

    #[test]
    fn pan_moves_target() {
        let mut controller = OrbitController::new(OrbitOptions {
            auto_rotate: false,
            enable_damping: false,
            ..Default::default()
        });
        let mut camera = camera();
        controller.set_surface_height(500.0);

        controller.pointer_down(PointerButton::Secondary, Vec2::ZERO);
        controller.pointer_moved(&camera, Vec2::new(40.0, 0.0));
        controller.update(&mut camera, None);

        assert!(controller.target().length() > 0.0);
        let offset = camera.get_position() - controller.target();
        assert!((offset.length() - Vec3::new(-20.0, 20.0, 20.0).length()).abs() < 1e-3);
    }
}
