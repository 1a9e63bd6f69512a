mod surface;

pub use surface::*;
