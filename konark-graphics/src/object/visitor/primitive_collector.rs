use std::{error::Error, fmt::Display};

use crate::{NodeId, Primitive, SceneNode};

use super::Visitor;

/// Primitive with the world matrix of the node that owns it
#[derive(Debug, Clone)]
pub struct RenderItem {
    pub primitive: Primitive,
    pub world: glam::Mat4,
    pub node_id: NodeId,
}

#[derive(Debug, Default)]
pub struct PrimitiveCollector {
    items: Vec<RenderItem>,
}

impl PrimitiveCollector {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<RenderItem> {
        self.items
    }
}

#[derive(Debug)]
pub enum PrimitiveCollectorError {}

impl Visitor<PrimitiveCollectorError> for PrimitiveCollector {
    fn visit(
        &mut self,
        node: &SceneNode,
        world: &glam::Mat4,
    ) -> Result<(), PrimitiveCollectorError> {
        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                self.items.push(RenderItem {
                    primitive: primitive.clone(),
                    world: *world,
                    node_id: node.id(),
                });
            }
        }
        Ok(())
    }
}

impl Error for PrimitiveCollectorError {}
impl Display for PrimitiveCollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:?}", self))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use konark_core::Transform;

    use super::*;
    use crate::{Geometry, Material, Mesh};

    fn triangle_mesh() -> Mesh {
        let geometry = Arc::new(Geometry::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            None,
            None,
            None,
        ));
        Mesh::default().with_primitives(vec![Primitive::new(geometry, Material::default())])
    }

    #[test]
    fn world_matrix_accumulates_parent_transforms() {
        let child = SceneNode::new("child")
            .with_transform(Transform::default().with_translation(glam::vec3(0.0, 2.0, 0.0)))
            .with_mesh(triangle_mesh());
        let root = SceneNode::new("root")
            .with_transform(Transform::default().with_translation(glam::vec3(1.0, 0.0, 0.0)))
            .with_children(vec![child]);

        let mut collector = PrimitiveCollector::new();
        root.accept(&mut collector, &glam::Mat4::IDENTITY).unwrap();

        let items = collector.into_items();
        assert_eq!(items.len(), 1);
        let origin = items[0].world.transform_point3(glam::Vec3::ZERO);
        assert!(origin.abs_diff_eq(glam::vec3(1.0, 2.0, 0.0), 1e-6));
    }
}
