use std::path::PathBuf;

use konark::{ViewerPreset, DEFAULT_BASE_PATH, DEFAULT_ENVIRONMENT, DEFAULT_MODELS};

#[derive(clap::Parser, Debug)]
#[command(version, about)]
pub struct ProgramArgs {
    #[command(flatten)]
    pub assets: AssetArgs,
    #[command(flatten)]
    pub window: WindowArgs,
    /// Camera and material preset: unconstrained or constrained
    #[arg(long, default_value_t = ViewerPreset::Unconstrained)]
    pub preset: ViewerPreset,
    /// Environment intensity applied to every loaded mesh. Overrides the preset
    #[arg(long)]
    pub env_intensity: Option<f32>,
}

#[derive(clap::Args, Debug)]
pub struct AssetArgs {
    /// Directory or http(s) URL every asset name is resolved against
    #[arg(long, default_value = DEFAULT_BASE_PATH)]
    pub base_path: String,
    /// Model file to load. Repeat to load several
    #[arg(long = "model", default_values_t = DEFAULT_MODELS.map(String::from))]
    pub models: Vec<String>,
    /// Equirectangular Radiance HDR used as background and reflections
    #[arg(long, default_value = DEFAULT_ENVIRONMENT, conflicts_with = "no_environment")]
    pub environment: String,
    /// Skip the environment load
    #[arg(long, default_value_t = false)]
    pub no_environment: bool,
    /// Draco decoder executable, or the directory containing it
    #[arg(long)]
    pub decoder_path: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct WindowArgs {
    /// Set width of viewer window
    #[arg(long, default_value_t = 1280)]
    pub width: u32,
    /// Set height of viewer window
    #[arg(long, default_value_t = 720)]
    pub height: u32,
    /// Set title of viewer window
    #[arg(long, default_value = "Konark")]
    pub title: String,
}
