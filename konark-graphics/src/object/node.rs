use std::fmt::Display;

use konark_core::Transform;
use uuid::Uuid;

use super::{Mesh, Visitor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Default, Clone)]
pub struct SceneNode {
    id: NodeId,
    name: String,
    transform: Transform,
    mesh: Option<Mesh>,
    children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_children(mut self, children: Vec<SceneNode>) -> Self {
        self.children = children;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        self.mesh.as_mut()
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Depth-first visit of this node and its descendants. `parent` is the world
    /// matrix of the parent node.
    pub fn accept<E>(&self, visitor: &mut dyn Visitor<E>, parent: &glam::Mat4) -> anyhow::Result<()>
    where
        E: std::error::Error + Sync + Send + 'static,
    {
        let world = *parent * self.transform.to_model_matrix();
        visitor.visit(self, &world)?;

        for child in &self.children {
            child.accept(visitor, &world)?;
        }

        Ok(())
    }

    pub fn accept_mut<E>(
        &mut self,
        visitor: &mut dyn Visitor<E>,
        parent: &glam::Mat4,
    ) -> anyhow::Result<()>
    where
        E: std::error::Error + Sync + Send + 'static,
    {
        let world = *parent * self.transform.to_model_matrix();
        visitor.visit_mut(self, &world)?;

        for child in &mut self.children {
            child.accept_mut(visitor, &world)?;
        }

        Ok(())
    }
}
