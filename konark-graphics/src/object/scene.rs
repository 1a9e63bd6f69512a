use std::sync::Arc;

use crate::{Environment, HdrImage};

use super::{AmbientLight, AxesHelper, DirectionalLight, NodeId, SceneNode, Visitor};

#[derive(Debug, Clone)]
pub enum Background {
    /// Linear RGB clear color
    Color([f32; 3]),
    /// Equirectangular image sampled by view direction
    Equirect(Arc<HdrImage>),
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    ambient_light: Option<AmbientLight>,
    directional_lights: Vec<DirectionalLight>,
    axes: Option<AxesHelper>,
    background: Option<Background>,
    environment: Option<Arc<Environment>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a root node and return its id.
    pub fn add(&mut self, node: SceneNode) -> NodeId {
        let id = node.id();
        self.nodes.push(node);
        id
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn get_node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.iter_mut().find(|node| node.id() == id)
    }

    pub fn set_ambient_light(&mut self, light: AmbientLight) {
        self.ambient_light = Some(light);
    }

    pub fn add_directional_light(&mut self, light: DirectionalLight) {
        self.directional_lights.push(light);
    }

    pub fn set_axes(&mut self, axes: AxesHelper) {
        self.axes = Some(axes);
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = Some(background);
    }

    pub fn set_environment(&mut self, environment: Arc<Environment>) {
        self.environment = Some(environment);
    }

    pub fn ambient_light(&self) -> Option<&AmbientLight> {
        self.ambient_light.as_ref()
    }

    pub fn directional_lights(&self) -> &[DirectionalLight] {
        &self.directional_lights
    }

    pub fn axes(&self) -> Option<&AxesHelper> {
        self.axes.as_ref()
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn environment(&self) -> Option<&Arc<Environment>> {
        self.environment.as_ref()
    }

    pub fn accept<E>(&self, visitor: &mut dyn Visitor<E>) -> anyhow::Result<()>
    where
        E: std::error::Error + Sync + Send + 'static,
    {
        for node in &self.nodes {
            node.accept(visitor, &glam::Mat4::IDENTITY)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use konark_core::Transform;

    use super::*;
    use crate::PrimitiveCollector;

    #[test]
    fn roots_accumulate_and_are_found_by_id() {
        let mut scene = Scene::new();
        let first = scene.add(SceneNode::new("first"));
        let second = scene.add(SceneNode::new("second"));

        assert_eq!(scene.nodes().len(), 2);
        assert_eq!(scene.get_node(first).map(|n| n.name()), Some("first"));
        assert_eq!(scene.get_node(second).map(|n| n.name()), Some("second"));
    }

    #[test]
    fn empty_scene_collects_nothing() {
        let mut scene = Scene::new();
        scene.add(SceneNode::new("empty").with_transform(
            Transform::default().with_translation(glam::Vec3::ONE),
        ));
        let mut collector = PrimitiveCollector::new();
        scene
            .accept::<crate::PrimitiveCollectorError>(&mut collector)
            .unwrap();

        assert!(collector.items().is_empty());
        assert!(scene.background().is_none());
        assert!(scene.environment().is_none());
    }
}
