use log::debug;
use winit::event_loop::{self, ControlFlow};

use crate::{
    application::{RuntimeApplication, ViewerSettings},
    AssetOptions, RuntimeBuilder, RuntimeEvent, ViewerPreset,
};

#[derive(Debug, Clone)]
pub struct RuntimeWindowOptions {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub resizable: bool,
    pub fullscreen: bool,
    pub decorated: bool,
}

impl Default for RuntimeWindowOptions {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Konark".to_owned(),
            resizable: true,
            fullscreen: false,
            decorated: true,
        }
    }
}

/// Owns the worker pool for asset loads and drives the window event loop on the
/// calling thread.
#[derive(Debug)]
pub struct Runtime {
    main_thread: tokio::runtime::Runtime,
    settings: ViewerSettings,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    pub(crate) fn new(
        application_name: &str,
        window_options: RuntimeWindowOptions,
        assets: AssetOptions,
        preset: ViewerPreset,
        env_map_intensity: Option<f32>,
    ) -> anyhow::Result<Self> {
        let main_thread = tokio::runtime::Builder::new_multi_thread()
            .thread_name(format!("{}-main", application_name))
            .enable_all()
            .build()?;

        Ok(Self {
            main_thread,
            settings: ViewerSettings {
                window_options,
                assets,
                preset,
                env_map_intensity,
            },
        })
    }

    /// Run until the window is closed. Must be called from the main thread.
    pub fn run(self) -> anyhow::Result<()> {
        let event_loop = event_loop::EventLoop::<RuntimeEvent>::with_user_event().build()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        let event_proxy = event_loop.create_proxy();

        let mut runtime_app = RuntimeApplication::new(
            self.settings,
            self.main_thread.handle().clone(),
            event_proxy,
        );

        event_loop.run_app(&mut runtime_app)?;
        debug!("Event loop closed");

        // Pending loads have nowhere to deliver to
        self.main_thread.shutdown_background();

        runtime_app.into_result()
    }
}
