mod asset;
mod environment;
mod error;
mod graphics;
mod material;
mod object;
mod renderer;
mod texture;
mod util;
mod window;

pub use asset::*;
pub use environment::*;
pub use error::*;
pub use graphics::*;
pub use material::*;
pub use object::*;
pub use renderer::*;
pub use texture::*;
pub use util::*;
pub use window::*;
