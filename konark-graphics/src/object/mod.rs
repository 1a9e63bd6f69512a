mod camera;
mod helper;
mod light;
mod mesh;
mod node;
mod scene;
mod visitor;

pub use camera::*;
pub use helper::*;
pub use light::*;
pub use mesh::*;
pub use node::*;
pub use scene::*;
pub use visitor::*;
