use core::fmt;
use std::{error::Error, fmt::Debug};

#[derive(Debug)]
pub enum RuntimeError {
    WindowNotInitialized,
    EventLoopClosed,
    UnknownPreset(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WindowNotInitialized => write!(f, "Window is not initialized"),
            Self::EventLoopClosed => write!(f, "Event loop is closed"),
            Self::UnknownPreset(name) => write!(f, "Unknown viewer preset '{}'", name),
        }
    }
}

impl Error for RuntimeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
