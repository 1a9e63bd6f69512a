use std::{sync::Arc, time::Instant};

use glam::{Vec2, Vec3};
use konark_core::{Size2Du, Transform};
use konark_graphics::{
    AmbientLight, AxesHelper, Background, DirectionalLight, EnvIntensityAdjuster,
    EnvIntensityAdjusterError, Gltf, LoadError, NodeId, PerspectiveCamera, Scene, SceneRenderer,
};

use crate::{
    toggle_fullscreen, Clock, DoubleClickDetector, FullscreenSurface, LoadedEnvironment,
    OrbitController, PointerButton, ViewerPreset, Viewport,
};

pub const CAMERA_FOV: f32 = 75.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
pub const CAMERA_POSITION: Vec3 = Vec3::new(-20.0, 20.0, 20.0);
pub const AXES_SIZE: f32 = 10.0;

/// Viewer session: scene, camera, controls and the renderer drawing them.
/// Lives on the event loop thread; every scene mutation happens here.
pub struct Viewer<R: SceneRenderer> {
    renderer: R,
    scene: Scene,
    camera: PerspectiveCamera,
    viewport: Viewport,
    controls: OrbitController,
    clock: Option<Clock>,
    double_click: DoubleClickDetector,
    pointer: Vec2,
    env_map_intensity: Option<f32>,
    model: Option<NodeId>,
}

impl<R: SceneRenderer> Viewer<R> {
    pub fn new(renderer: R, viewport: Viewport, preset: ViewerPreset) -> Self {
        let mut scene = Scene::new();
        scene.set_ambient_light(AmbientLight::new(Vec3::ONE, 0.5));
        scene.add_directional_light(
            DirectionalLight::new(Vec3::ONE, 2.0).with_position(Vec3::new(20.0, 20.0, 20.0)),
        );
        scene.set_axes(AxesHelper::new(AXES_SIZE));

        let camera = PerspectiveCamera::new(
            CAMERA_FOV,
            viewport.aspect() as f32,
            CAMERA_NEAR,
            CAMERA_FAR,
        )
        .with_position(CAMERA_POSITION)
        .with_target(Vec3::ZERO);

        let mut controls = OrbitController::new(preset.orbit_options());
        controls.set_surface_height(viewport.height() as f32);

        let mut viewer = Self {
            renderer,
            scene,
            camera,
            viewport,
            controls,
            clock: preset.uses_clock().then(Clock::new),
            double_click: DoubleClickDetector::default(),
            pointer: Vec2::ZERO,
            env_map_intensity: preset.env_map_intensity(),
            model: None,
        };
        viewer.apply_viewport();
        viewer
    }

    /// Replace the intensity applied to loaded meshes.
    pub fn with_env_map_intensity(mut self, intensity: Option<f32>) -> Self {
        self.env_map_intensity = intensity;
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn controls(&self) -> &OrbitController {
        &self.controls
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Most recently attached model root.
    pub fn model(&self) -> Option<NodeId> {
        self.model
    }

    /// Size in logical pixels. Camera and renderer are updated on every call;
    /// returns `false` when the viewport itself did not change.
    pub fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) -> bool {
        let changed = self.viewport.resize(width, height, device_pixel_ratio);
        self.apply_viewport();
        changed
    }

    fn apply_viewport(&mut self) {
        self.camera.set_aspect(self.viewport.aspect() as f32);
        self.controls
            .set_surface_height(self.viewport.height() as f32);
        let surface: Size2Du = self.viewport.surface_size();
        self.renderer
            .resize(surface, self.viewport.drawing_buffer_size());
    }

    /// Advance the controls and draw one frame.
    pub fn frame(&mut self) -> anyhow::Result<()> {
        let delta = self.clock.as_mut().map(Clock::delta);
        self.controls.update(&mut self.camera, delta);
        self.renderer.render(&self.scene, &self.camera)
    }

    pub fn on_model_loaded(&mut self, result: Result<Gltf, LoadError>) -> anyhow::Result<()> {
        let gltf = match result {
            Ok(gltf) => gltf,
            Err(e) => {
                log::error!("Could not load model {}: {:#}", e.url(), e.cause());
                return Ok(());
            }
        };

        let name = gltf.name.clone();
        let mut root = gltf.into_root();
        *root.transform_mut() = Transform::IDENTITY;

        if let Some(intensity) = self.env_map_intensity {
            let mut adjuster = EnvIntensityAdjuster::new(intensity);
            root.accept_mut::<EnvIntensityAdjusterError>(&mut adjuster, &glam::Mat4::IDENTITY)?;
            log::debug!(
                "Set environment intensity {} on {} primitives of {}",
                intensity,
                adjuster.adjusted(),
                name
            );
        }

        let id = self.scene.add(root);
        self.model = Some(id);
        log::info!("Model {} loaded", name);
        Ok(())
    }

    pub fn on_environment_loaded(&mut self, result: Result<LoadedEnvironment, LoadError>) {
        match result {
            Ok(LoadedEnvironment { image, environment }) => {
                log::info!(
                    "Environment loaded ({}x{}, {} levels)",
                    image.width(),
                    image.height(),
                    environment.mip_level_count()
                );
                self.scene.set_background(Background::Equirect(image));
                self.scene.set_environment(Arc::new(environment));
            }
            Err(e) => {
                log::error!("Could not load environment {}: {:#}", e.url(), e.cause());
            }
        }
    }

    /// `position` is in logical pixels. Returns `true` when fullscreen was toggled.
    pub fn pointer_pressed(
        &mut self,
        button: PointerButton,
        position: Vec2,
        at: Instant,
        surface: &dyn FullscreenSurface,
    ) -> bool {
        self.pointer = position;
        self.controls.pointer_down(button, position);
        if button == PointerButton::Primary && self.double_click.press(at, position) {
            return toggle_fullscreen(surface);
        }
        false
    }

    pub fn pointer_moved(&mut self, position: Vec2) {
        self.pointer = position;
        self.controls.pointer_moved(&self.camera, position);
    }

    pub fn pointer_released(&mut self) {
        self.controls.pointer_up();
    }

    /// Position of the last pointer event in logical pixels.
    pub fn pointer_position(&self) -> Vec2 {
        self.pointer
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.controls.wheel(delta_y);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use konark_graphics::{Geometry, HdrImage, Material, Mesh, Primitive, SceneNode};

    use super::*;
    use crate::{derive_environment, input::tests::FakeSurface};

    #[derive(Default)]
    struct RecordingRenderer {
        frames: usize,
        sizes: Vec<(Size2Du, Size2Du)>,
    }

    impl SceneRenderer for RecordingRenderer {
        fn resize(&mut self, surface: Size2Du, drawing_buffer: Size2Du) {
            self.sizes.push((surface, drawing_buffer));
        }

        fn render(&mut self, _scene: &Scene, _camera: &PerspectiveCamera) -> anyhow::Result<()> {
            self.frames += 1;
            Ok(())
        }
    }

    fn viewer(preset: ViewerPreset) -> Viewer<RecordingRenderer> {
        Viewer::new(
            RecordingRenderer::default(),
            Viewport::new(800.0, 600.0, 1.0),
            preset,
        )
    }

    fn model_with_offset() -> Gltf {
        let geometry = Arc::new(Geometry::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            None,
            None,
            None,
        ));
        let mesh = Mesh::default().with_primitives(vec![Primitive::new(geometry, Material::default())]);
        let root = SceneNode::new("model")
            .with_transform(
                Transform::default()
                    .with_translation(Vec3::new(5.0, -3.0, 2.0))
                    .with_scale(Vec3::splat(4.0))
                    .with_rotation(glam::Quat::from_rotation_y(1.0)),
            )
            .with_mesh(mesh);
        Gltf::default()
            .with_name("model.glb")
            .with_scenes(vec![root])
    }

    #[test]
    fn frame_without_assets_succeeds() {
        let mut viewer = viewer(ViewerPreset::Unconstrained);
        viewer.frame().unwrap();
        viewer.frame().unwrap();

        assert_eq!(viewer.renderer().frames, 2);
        assert!(viewer.scene().nodes().is_empty());
        assert!(viewer.scene().axes().is_some());
        assert_eq!(viewer.scene().directional_lights().len(), 1);
    }

    #[test]
    fn scene_starts_with_white_lights() {
        let viewer = viewer(ViewerPreset::Unconstrained);

        let ambient = viewer.scene().ambient_light().unwrap();
        assert_eq!(ambient.color, Vec3::ONE);
        assert_eq!(ambient.intensity, 0.5);
        let sun = &viewer.scene().directional_lights()[0];
        assert_eq!(sun.color, Vec3::ONE);
        assert_eq!(sun.intensity, 2.0);
        assert_eq!(sun.position, Vec3::new(20.0, 20.0, 20.0));
    }

    #[test]
    fn repeated_resize_still_reaches_renderer() {
        let mut viewer = viewer(ViewerPreset::Unconstrained);
        let pushed = viewer.renderer().sizes.len();

        assert!(!viewer.resize(800.0, 600.0, 1.0));
        assert_eq!(viewer.renderer().sizes.len(), pushed + 1);
        assert!((viewer.camera().get_aspect() - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn resize_updates_camera_and_renderer() {
        let mut viewer = viewer(ViewerPreset::Unconstrained);
        assert!(viewer.resize(1024.0, 512.0, 3.0));

        assert_eq!(viewer.camera().get_aspect(), 2.0);
        assert_eq!(
            viewer.renderer().sizes.last(),
            Some(&(Size2Du::new(3072, 1536), Size2Du::new(2048, 1024)))
        );
        assert!(!viewer.resize(0.0, 0.0, 1.0));
        assert_eq!(viewer.viewport().width(), 1024.0);
    }

    #[test]
    fn loaded_model_is_normalised_and_attached() {
        let mut viewer = viewer(ViewerPreset::Unconstrained);
        viewer.on_model_loaded(Ok(model_with_offset())).unwrap();

        let id = viewer.model().unwrap();
        let root = viewer.scene().get_node(id).unwrap();
        assert_eq!(*root.transform(), Transform::IDENTITY);
        let material = root.mesh().unwrap().primitives()[0].material();
        assert_eq!(material.env_map_intensity, 1.0);
    }

    #[test]
    fn constrained_preset_dims_reflections() {
        let mut viewer = viewer(ViewerPreset::Constrained);
        viewer.on_model_loaded(Ok(model_with_offset())).unwrap();

        let root = viewer.scene().get_node(viewer.model().unwrap()).unwrap();
        let material = root.mesh().unwrap().primitives()[0].material();
        assert_eq!(material.env_map_intensity, 0.5);
    }

    #[test]
    fn later_model_becomes_reference_and_earlier_stays() {
        let mut viewer = viewer(ViewerPreset::Unconstrained);
        viewer.on_model_loaded(Ok(model_with_offset())).unwrap();
        let first = viewer.model().unwrap();
        viewer.on_model_loaded(Ok(model_with_offset())).unwrap();

        assert_ne!(viewer.model(), Some(first));
        assert_eq!(viewer.scene().nodes().len(), 2);
    }

    #[test]
    fn failed_model_leaves_scene_untouched() {
        let mut viewer = viewer(ViewerPreset::Unconstrained);
        viewer
            .on_model_loaded(Err(LoadError::new(
                "assets/missing.glb",
                anyhow::anyhow!("not found"),
            )))
            .unwrap();

        assert!(viewer.model().is_none());
        assert!(viewer.scene().nodes().is_empty());
        viewer.frame().unwrap();
    }

    #[test]
    fn environment_sets_background_and_reflections() {
        let mut viewer = viewer(ViewerPreset::Unconstrained);
        let image = HdrImage::from_rgb(8, 4, &[[0.5; 3]; 32]).unwrap();
        let (environment, kernel) = derive_environment(&image, 16);
        viewer.on_environment_loaded(Ok(LoadedEnvironment {
            image: Arc::new(image),
            environment,
        }));

        assert!(matches!(
            viewer.scene().background(),
            Some(Background::Equirect(_))
        ));
        assert!(viewer.scene().environment().is_some());
        assert!(kernel.and_then(|kernel| kernel.upgrade()).is_none());
    }

    #[test]
    fn failed_environment_is_logged_only() {
        let mut viewer = viewer(ViewerPreset::Unconstrained);
        viewer.on_environment_loaded(Err(LoadError::new(
            "assets/cloudy.hdr",
            anyhow::anyhow!("decode"),
        )));
        assert!(viewer.scene().background().is_none());
        assert!(viewer.scene().environment().is_none());
    }

    #[test]
    fn double_click_toggles_fullscreen_once() {
        let mut viewer = viewer(ViewerPreset::Unconstrained);
        let surface = FakeSurface::supported();
        let start = Instant::now();
        let position = Vec2::new(100.0, 100.0);

        assert!(!viewer.pointer_pressed(PointerButton::Primary, position, start, &surface));
        viewer.pointer_released();
        assert!(viewer.pointer_pressed(
            PointerButton::Primary,
            position,
            start + Duration::from_millis(150),
            &surface
        ));
        viewer.pointer_released();

        assert_eq!(*surface.requests.borrow(), vec![true]);
    }

    #[test]
    fn double_click_without_support_is_ignored() {
        let mut viewer = viewer(ViewerPreset::Unconstrained);
        let surface = FakeSurface::default();
        let start = Instant::now();

        viewer.pointer_pressed(PointerButton::Primary, Vec2::ZERO, start, &surface);
        let toggled = viewer.pointer_pressed(
            PointerButton::Primary,
            Vec2::ZERO,
            start + Duration::from_millis(100),
            &surface,
        );
        assert!(!toggled);
        assert!(surface.requests.borrow().is_empty());
    }

    #[test]
    fn constrained_preset_uses_frame_clock() {
        let mut viewer = viewer(ViewerPreset::Constrained);
        let before = viewer.camera().get_position();
        viewer.frame().unwrap();
        std::thread::sleep(Duration::from_millis(5));
        viewer.frame().unwrap();

        assert!(viewer.camera().get_position() != before);
        let distance = viewer.camera().get_position().length();
        assert!((16.0..=36.0).contains(&distance));
    }
}
