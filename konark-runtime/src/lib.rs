mod application;
mod clock;
mod context;
mod controls;
mod error;
mod event;
mod input;
mod loader;
mod preset;
mod runtime;
mod runtime_builder;
mod viewport;

pub use clock::*;
pub use context::*;
pub use controls::*;
pub use error::*;
pub use event::*;
pub use input::*;
pub use loader::*;
pub use preset::*;
pub use runtime::*;
pub use runtime_builder::*;
pub use viewport::*;
