mod size;
mod spherical;
mod transform;

pub use size::*;
pub use spherical::*;
pub use transform::*;
