mod env_intensity;
mod primitive_collector;

pub use env_intensity::*;
pub use primitive_collector::*;

use super::SceneNode;

#[allow(unused)]
pub trait Visitor<E> {
    /// `world` is the node's accumulated world matrix
    fn visit(&mut self, node: &SceneNode, world: &glam::Mat4) -> Result<(), E>;

    /// Implement only if you need actual mutable work
    fn visit_mut(&mut self, node: &mut SceneNode, world: &glam::Mat4) -> Result<(), E> {
        self.visit(node, world)
    }
}
