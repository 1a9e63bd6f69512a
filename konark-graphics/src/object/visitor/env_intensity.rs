use std::{error::Error, fmt::Display};

use crate::SceneNode;

use super::Visitor;

/// Sets `env_map_intensity` on every material below the visited node.
#[derive(Debug)]
pub struct EnvIntensityAdjuster {
    intensity: f32,
    adjusted: usize,
}

impl EnvIntensityAdjuster {
    pub fn new(intensity: f32) -> Self {
        Self {
            intensity,
            adjusted: 0,
        }
    }

    /// Number of materials changed so far
    pub fn adjusted(&self) -> usize {
        self.adjusted
    }
}

#[derive(Debug)]
pub enum EnvIntensityAdjusterError {}

impl Visitor<EnvIntensityAdjusterError> for EnvIntensityAdjuster {
    fn visit(
        &mut self,
        _node: &SceneNode,
        _world: &glam::Mat4,
    ) -> Result<(), EnvIntensityAdjusterError> {
        Ok(())
    }

    fn visit_mut(
        &mut self,
        node: &mut SceneNode,
        _world: &glam::Mat4,
    ) -> Result<(), EnvIntensityAdjusterError> {
        if let Some(mesh) = node.mesh_mut() {
            for primitive in mesh.primitives_mut() {
                primitive.material_mut().env_map_intensity = self.intensity;
                self.adjusted += 1;
            }
        }
        Ok(())
    }
}

impl Error for EnvIntensityAdjusterError {}
impl Display for EnvIntensityAdjusterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:?}", self))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{Geometry, Material, Mesh, Primitive};

    #[test]
    fn lowers_intensity_on_nested_meshes() {
        let geometry = Arc::new(Geometry::new(vec![[0.0; 3]; 3], None, None, None));
        let mesh = Mesh::default()
            .with_primitives(vec![Primitive::new(geometry.clone(), Material::default())]);
        let mut root = SceneNode::new("root")
            .with_mesh(mesh.clone())
            .with_children(vec![SceneNode::new("child").with_mesh(mesh)]);

        let mut adjuster = EnvIntensityAdjuster::new(0.5);
        root.accept_mut(&mut adjuster, &glam::Mat4::IDENTITY).unwrap();

        assert_eq!(adjuster.adjusted(), 2);
        let child = &root.children()[0];
        for node in [&root, child] {
            let material = node.mesh().unwrap().primitives()[0].material();
            assert_eq!(material.env_map_intensity, 0.5);
        }
    }
}
