use crate::{AssetOptions, Runtime, RuntimeWindowOptions, ViewerPreset};

#[derive(Debug, Default, Clone)]
pub struct RuntimeBuilder {
    application_name: String,
    window_options: RuntimeWindowOptions,
    assets: AssetOptions,
    preset: ViewerPreset,
    env_map_intensity: Option<f32>,
}

impl RuntimeBuilder {
    pub fn with_application_name(mut self, application_name: &str) -> Self {
        self.application_name = application_name.to_owned();
        self
    }

    pub fn with_window_options(mut self, window_options: RuntimeWindowOptions) -> Self {
        self.window_options = window_options;
        self
    }

    pub fn with_assets(mut self, assets: AssetOptions) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_preset(mut self, preset: ViewerPreset) -> Self {
        self.preset = preset;
        self
    }

    /// Override the environment intensity the preset applies to loaded meshes.
    pub fn with_env_map_intensity(mut self, intensity: f32) -> Self {
        self.env_map_intensity = Some(intensity);
        self
    }

    pub fn build(self) -> anyhow::Result<Runtime> {
        let application_name = if self.application_name.is_empty() {
            "konark".to_owned()
        } else {
            self.application_name
        };
        let env_map_intensity = self
            .env_map_intensity
            .or_else(|| self.preset.env_map_intensity());

        Runtime::new(
            &application_name,
            self.window_options,
            self.assets,
            self.preset,
            env_map_intensity,
        )
    }
}
