use std::{sync::Arc, time::Instant};

use glam::Vec2;
use konark_graphics::{GraphicsInstance, Renderer};
use log::debug;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoopProxy},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::{
    spawn_startup_loads, AssetOptions, PointerButton, RuntimeError, RuntimeEvent,
    RuntimeWindowOptions, Viewer, ViewerPreset, Viewport,
};

#[derive(Debug, Clone)]
pub(crate) struct ViewerSettings {
    pub window_options: RuntimeWindowOptions,
    pub assets: AssetOptions,
    pub preset: ViewerPreset,
    pub env_map_intensity: Option<f32>,
}

struct ViewerWindow {
    window: Arc<Window>,
    viewer: Viewer<Renderer>,
}

pub(crate) struct RuntimeApplication {
    settings: ViewerSettings,
    main_handle: tokio::runtime::Handle,
    event_proxy: EventLoopProxy<RuntimeEvent>,
    viewer_window: Option<ViewerWindow>,
    error: Option<anyhow::Error>,
}

impl RuntimeApplication {
    pub fn new(
        settings: ViewerSettings,
        main_handle: tokio::runtime::Handle,
        event_proxy: EventLoopProxy<RuntimeEvent>,
    ) -> Self {
        Self {
            settings,
            main_handle,
            event_proxy,
            viewer_window: None,
            error: None,
        }
    }

    /// Error that stopped the event loop, if any.
    pub fn into_result(self) -> anyhow::Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn on_resumed(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        if let Some(viewer_window) = &self.viewer_window {
            viewer_window.window.request_redraw();
            return Ok(());
        }
        debug!("Application on resumed");

        let options = &self.settings.window_options;
        let window = Arc::new(
            event_loop.create_window(
                WindowAttributes::default()
                    .with_title(options.title.clone())
                    .with_inner_size(LogicalSize::new(options.width, options.height))
                    .with_resizable(options.resizable)
                    .with_decorations(options.decorated)
                    .with_fullscreen(options.fullscreen.then(|| Fullscreen::Borderless(None))),
            )?,
        );

        let (graphics_instance, surface) =
            futures::executor::block_on(GraphicsInstance::with_surface(window.clone()))?;
        let viewport = Self::viewport_of(&window, window.inner_size());
        let renderer = Renderer::new(
            graphics_instance,
            surface,
            viewport.surface_size(),
            viewport.drawing_buffer_size(),
        )?;
        let viewer = Viewer::new(renderer, viewport, self.settings.preset)
            .with_env_map_intensity(self.settings.env_map_intensity);

        spawn_startup_loads(
            &self.main_handle,
            &self.settings.assets,
            self.event_proxy.clone(),
        )?;

        window.request_redraw();
        self.viewer_window = Some(ViewerWindow { window, viewer });

        Ok(())
    }

    fn viewport_of(window: &Window, size: PhysicalSize<u32>) -> Viewport {
        let scale_factor = window.scale_factor();
        let logical: LogicalSize<f64> = size.to_logical(scale_factor);
        Viewport::new(logical.width, logical.height, scale_factor)
    }

    fn on_window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        event: WindowEvent,
    ) -> anyhow::Result<()> {
        let ViewerWindow { window, viewer } = self
            .viewer_window
            .as_mut()
            .ok_or(RuntimeError::WindowNotInitialized)?;
        let window: &Window = window;

        match event {
            WindowEvent::CloseRequested => {
                debug!("Close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                Self::resize(window, viewer, size);
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                Self::resize(window, viewer, window.inner_size());
            }
            WindowEvent::RedrawRequested => {
                viewer.frame()?;
                window.request_redraw();
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = Self::pointer_button(button) else {
                    return Ok(());
                };
                match state {
                    ElementState::Pressed => {
                        let position = viewer.pointer_position();
                        viewer.pointer_pressed(button, position, Instant::now(), window);
                    }
                    ElementState::Released => viewer.pointer_released(),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                viewer.pointer_moved(Self::logical_position(window, position));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y,
                    MouseScrollDelta::PixelDelta(position) => -position.y as f32,
                };
                viewer.wheel(delta_y);
            }
            WindowEvent::Touch(touch) => {
                let position = Self::logical_position(window, touch.location);
                match touch.phase {
                    TouchPhase::Started => {
                        viewer.pointer_pressed(
                            PointerButton::Primary,
                            position,
                            Instant::now(),
                            window,
                        );
                    }
                    TouchPhase::Moved => viewer.pointer_moved(position),
                    TouchPhase::Ended | TouchPhase::Cancelled => viewer.pointer_released(),
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn resize(window: &Window, viewer: &mut Viewer<Renderer>, size: PhysicalSize<u32>) {
        let viewport = Self::viewport_of(window, size);
        viewer.resize(
            viewport.width(),
            viewport.height(),
            viewport.device_pixel_ratio(),
        );
    }

    fn logical_position(window: &Window, position: PhysicalPosition<f64>) -> Vec2 {
        let logical = position.to_logical::<f64>(window.scale_factor());
        Vec2::new(logical.x as f32, logical.y as f32)
    }

    fn pointer_button(button: MouseButton) -> Option<PointerButton> {
        match button {
            MouseButton::Left => Some(PointerButton::Primary),
            MouseButton::Right => Some(PointerButton::Secondary),
            MouseButton::Middle => Some(PointerButton::Middle),
            _ => None,
        }
    }

    fn on_user_event(&mut self, event: RuntimeEvent) -> anyhow::Result<()> {
        let viewer_window = self
            .viewer_window
            .as_mut()
            .ok_or(RuntimeError::WindowNotInitialized)?;

        match event {
            RuntimeEvent::ModelLoaded(result) => viewer_window.viewer.on_model_loaded(result)?,
            RuntimeEvent::EnvironmentLoaded(result) => {
                viewer_window.viewer.on_environment_loaded(result)
            }
        }
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        if self.error.is_none() {
            self.error = Some(error);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler<RuntimeEvent> for RuntimeApplication {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.on_resumed(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Err(e) = self.on_window_event(event_loop, event) {
            self.fail(event_loop, e);
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: RuntimeEvent) {
        if let Err(e) = self.on_user_event(event) {
            self.fail(event_loop, e);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        debug!("Exiting");
        self.viewer_window = None;
    }
}
