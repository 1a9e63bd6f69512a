mod gltf;
mod hdr;
mod progress;
mod source;

pub use self::gltf::*;
pub use hdr::*;
pub use progress::*;
pub use source::*;
