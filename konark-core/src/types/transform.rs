/// Local transform of a scene node, decomposed into translation, rotation and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    translation: glam::Vec3,
    scale: glam::Vec3,
    rotation: glam::Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: glam::Vec3::ZERO,
        scale: glam::Vec3::ONE,
        rotation: glam::Quat::IDENTITY,
    };

    pub fn with_translation(mut self, translation: glam::Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: glam::Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: glam::Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn from_matrix(matrix: &glam::Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_decomposed(
        translation: &glam::Vec3,
        rotation: &glam::Quat,
        scale: &glam::Vec3,
    ) -> Self {
        Self {
            translation: *translation,
            rotation: *rotation,
            scale: *scale,
        }
    }

    pub fn translate(&mut self, translation: glam::Vec3) {
        self.translation += translation;
    }

    pub fn scale(&mut self, scale: glam::Vec3) {
        self.scale *= scale;
    }

    pub fn rotate(&mut self, rotation: glam::Quat) {
        self.rotation *= rotation;
    }

    pub fn set_translation(&mut self, translation: glam::Vec3) {
        self.translation = translation;
    }

    pub fn set_rotation(&mut self, rotation: glam::Quat) {
        self.rotation = rotation;
    }

    pub fn set_scale(&mut self, scale: glam::Vec3) {
        self.scale = scale;
    }

    /// Position at origin, uniform scale of 1 and no rotation.
    pub fn reset(&mut self) {
        *self = Self::IDENTITY;
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn to_model_matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn to_model_array(&self) -> [f32; 16] {
        self.to_model_matrix().to_cols_array()
    }

    pub fn get_translation(&self) -> glam::Vec3 {
        self.translation
    }

    pub fn get_rotation(&self) -> glam::Quat {
        self.rotation
    }

    pub fn get_scale(&self) -> glam::Vec3 {
        self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_identity() {
        let mut transform = Transform::default()
            .with_translation(glam::vec3(3.0, -2.0, 7.5))
            .with_scale(glam::vec3(0.01, 0.01, 0.01))
            .with_rotation(glam::Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2));
        assert!(!transform.is_identity());

        transform.reset();

        assert!(transform.is_identity());
        assert_eq!(transform.get_translation(), glam::Vec3::ZERO);
        assert_eq!(transform.get_scale(), glam::Vec3::ONE);
        assert_eq!(transform.get_rotation(), glam::Quat::IDENTITY);
    }

    #[test]
    fn matrix_decomposition_keeps_components() {
        let transform = Transform::default()
            .with_translation(glam::vec3(1.0, 2.0, 3.0))
            .with_scale(glam::vec3(2.0, 2.0, 2.0));
        let decomposed = Transform::from_matrix(&transform.to_model_matrix());

        assert!(decomposed
            .get_translation()
            .abs_diff_eq(glam::vec3(1.0, 2.0, 3.0), 1e-5));
        assert!(decomposed.get_scale().abs_diff_eq(glam::Vec3::splat(2.0), 1e-5));
    }
}
