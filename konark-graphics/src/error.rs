use std::{error::Error, fmt::Display};

#[derive(Debug)]
pub enum GraphicsError {
    AdapterNotFound,
    SurfaceUnsupported,
    SurfaceFormatNotFound,
}

impl Error for GraphicsError {}

impl Display for GraphicsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AdapterNotFound => write!(f, "No graphics adapter compatible with the surface"),
            Self::SurfaceUnsupported => write!(f, "Surface is not supported by the adapter"),
            Self::SurfaceFormatNotFound => write!(f, "Surface exposes no usable texture format"),
        }
    }
}

/// Failure of a single asset load. Terminal for that asset; nothing retries.
#[derive(Debug)]
pub struct LoadError {
    url: String,
    cause: anyhow::Error,
}

impl LoadError {
    pub fn new<E>(url: &str, cause: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self {
            url: url.to_owned(),
            cause: cause.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to load '{}': {:#}", self.url, self.cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_reports_url_and_cause() {
        let err = LoadError::new("assets/missing.glb", anyhow::anyhow!("file not found"));

        assert_eq!(err.url(), "assets/missing.glb");
        let message = err.to_string();
        assert!(message.contains("assets/missing.glb"));
        assert!(message.contains("file not found"));
        assert!(err.source().is_some());
    }
}
