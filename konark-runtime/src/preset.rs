use std::{fmt::Display, str::FromStr};

use crate::{OrbitOptions, RuntimeError};

/// Named viewer configurations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPreset {
    /// Free orbit with panning and unbounded zoom.
    #[default]
    Unconstrained,
    /// Pan disabled, zoom bounded around the model, dimmed reflections and
    /// frame-time based auto-rotation.
    Constrained,
}

impl ViewerPreset {
    pub fn orbit_options(&self) -> OrbitOptions {
        match self {
            Self::Unconstrained => OrbitOptions::default(),
            Self::Constrained => OrbitOptions {
                enable_pan: false,
                min_distance: 16.0,
                max_distance: 36.0,
                ..Default::default()
            },
        }
    }

    /// Environment intensity applied to every loaded mesh, if any.
    pub fn env_map_intensity(&self) -> Option<f32> {
        match self {
            Self::Unconstrained => None,
            Self::Constrained => Some(0.5),
        }
    }

    /// Whether the controller is advanced with measured frame deltas.
    pub fn uses_clock(&self) -> bool {
        matches!(self, Self::Constrained)
    }
}

impl FromStr for ViewerPreset {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unconstrained" => Ok(Self::Unconstrained),
            "constrained" => Ok(Self::Constrained),
            _ => Err(RuntimeError::UnknownPreset(s.to_owned())),
        }
    }
}

impl Display for ViewerPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unconstrained => write!(f, "unconstrained"),
            Self::Constrained => write!(f, "constrained"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_presets() {
        assert_eq!("Constrained".parse::<ViewerPreset>().unwrap(), ViewerPreset::Constrained);
        assert_eq!(
            "unconstrained".parse::<ViewerPreset>().unwrap(),
            ViewerPreset::Unconstrained
        );
        assert!("orbit".parse::<ViewerPreset>().is_err());
    }

    #[test]
    fn constrained_limits_controls() {
        let options = ViewerPreset::Constrained.orbit_options();
        assert!(!options.enable_pan);
        assert_eq!((options.min_distance, options.max_distance), (16.0, 36.0));
        assert_eq!(ViewerPreset::Constrained.env_map_intensity(), Some(0.5));

        let options = ViewerPreset::Unconstrained.orbit_options();
        assert!(options.enable_pan);
        assert!(options.max_distance.is_infinite());
        assert!(!ViewerPreset::Unconstrained.uses_clock());
    }
}
