use std::sync::Arc;

use konark_graphics::{Environment, Gltf, HdrImage, LoadError};
use winit::event_loop::EventLoopProxy;

use crate::RuntimeError;

/// Decoded environment: the source image becomes the background, the filtered
/// cube the reflection environment.
pub struct LoadedEnvironment {
    pub image: Arc<HdrImage>,
    pub environment: Environment,
}

/// Results of background work, delivered to the event loop thread.
pub enum RuntimeEvent {
    ModelLoaded(Result<Gltf, LoadError>),
    EnvironmentLoaded(Result<LoadedEnvironment, LoadError>),
}

impl std::fmt::Debug for RuntimeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelLoaded(Ok(gltf)) => write!(f, "ModelLoaded({})", gltf.name),
            Self::ModelLoaded(Err(e)) => write!(f, "ModelLoaded({})", e),
            Self::EnvironmentLoaded(Ok(loaded)) => {
                write!(f, "EnvironmentLoaded({})", loaded.environment.id())
            }
            Self::EnvironmentLoaded(Err(e)) => write!(f, "EnvironmentLoaded({})", e),
        }
    }
}

/// Destination of [`RuntimeEvent`]s sent from worker tasks.
pub trait EventSink: Clone + Send + 'static {
    fn send(&self, event: RuntimeEvent) -> Result<(), RuntimeError>;
}

impl EventSink for EventLoopProxy<RuntimeEvent> {
    fn send(&self, event: RuntimeEvent) -> Result<(), RuntimeError> {
        self.send_event(event)
            .map_err(|_| RuntimeError::EventLoopClosed)
    }
}

impl EventSink for tokio::sync::mpsc::UnboundedSender<RuntimeEvent> {
    fn send(&self, event: RuntimeEvent) -> Result<(), RuntimeError> {
        tokio::sync::mpsc::UnboundedSender::send(self, event)
            .map_err(|_| RuntimeError::EventLoopClosed)
    }
}
