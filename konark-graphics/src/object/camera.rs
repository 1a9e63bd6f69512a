use glam::{Mat4, Vec3};

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewParams {
    pub view_projection: glam::Mat4,
    pub inv_view_projection: glam::Mat4,
    pub view: glam::Mat4,
    pub inv_view: glam::Mat4,
    pub projection: glam::Mat4,
    pub inv_projection: glam::Mat4,
    pub world_position: glam::Vec3,
    pub _pad: u32,
}

/// Right-handed perspective camera looking at a target point.
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCamera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    /// Vertical field of view in degrees
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            ..Default::default()
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_target(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn as_view_params(&self) -> ViewParams {
        let view_mat = self.view_matrix();
        let proj_mat = self.projection_matrix();
        let view_proj_mat = proj_mat * view_mat;

        ViewParams {
            view_projection: view_proj_mat,
            inv_view_projection: view_proj_mat.inverse(),
            view: view_mat,
            inv_view: view_mat.inverse(),
            projection: proj_mat,
            inv_projection: proj_mat.inverse(),
            world_position: self.position,
            _pad: 0,
        }
    }

    /// Point the camera at `target` without moving it.
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
    }

    pub fn get_position(&self) -> Vec3 {
        self.position
    }

    pub fn get_target(&self) -> Vec3 {
        self.target
    }

    pub fn get_up(&self) -> Vec3 {
        self.up
    }

    pub fn get_fov(&self) -> f32 {
        self.fov
    }

    pub fn get_aspect(&self) -> f32 {
        self.aspect
    }

    pub fn get_near(&self) -> f32 {
        self.near
    }

    pub fn get_far(&self) -> f32 {
        self.far
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            fov: 50.0,
            aspect: 1.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_projects_to_screen_center() {
        let camera = PerspectiveCamera::new(75.0, 16.0 / 9.0, 0.1, 1000.0)
            .with_position(Vec3::new(-20.0, 20.0, 20.0))
            .with_target(Vec3::ZERO);
        let params = camera.as_view_params();

        let clip = params.view_projection * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn aspect_update_changes_projection() {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        let before = camera.projection_matrix();
        camera.set_aspect(2.0);

        assert_ne!(before, camera.projection_matrix());
        assert_eq!(camera.get_aspect(), 2.0);
    }
}
