//! 3D model viewer: scene graph, glTF and HDR environment loading, orbit
//! controls and a continuous render loop in a single window.

pub mod core {
    pub use konark_core::*;
}

pub mod graphics {
    pub use konark_graphics::*;
}

pub use konark_runtime::*;
