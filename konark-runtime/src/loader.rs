use std::{
    path::PathBuf,
    sync::{Arc, Weak},
    time::Instant,
};

use konark_graphics::{
    AssetSource, DracoCommandDecompressor, Environment, EnvironmentGenerator, FilterKernel,
    GltfLoader, HdrImage, HdrLoader, LoadError, DEFAULT_ENVIRONMENT_FACE_SIZE,
};
use tokio::{runtime::Handle, task::JoinHandle};

use crate::{EventSink, LoadedEnvironment, RuntimeEvent};

pub const DEFAULT_BASE_PATH: &str = match option_env!("KONARK_BASE_PATH") {
    Some(path) => path,
    None => "assets",
};
pub const DEFAULT_MODELS: [&str; 2] = ["konark_8k.glb", "konark_texture_reprojected_8k_6.glb"];
pub const DEFAULT_ENVIRONMENT: &str = "cloudy.hdr";

/// What to load at startup and where from.
#[derive(Debug, Clone)]
pub struct AssetOptions {
    pub base_path: String,
    pub models: Vec<String>,
    pub environment: Option<String>,
    /// Location of the Draco decoder. Compressed models fail to load without it.
    pub decoder_path: Option<PathBuf>,
    pub environment_face_size: u32,
}

impl Default for AssetOptions {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_owned(),
            models: DEFAULT_MODELS.iter().map(|name| name.to_string()).collect(),
            environment: Some(DEFAULT_ENVIRONMENT.to_owned()),
            decoder_path: None,
            environment_face_size: DEFAULT_ENVIRONMENT_FACE_SIZE,
        }
    }
}

/// Start every configured load on `handle`. Each result is sent to `sink` when it
/// completes; loads do not wait for each other.
pub fn spawn_startup_loads<S>(
    handle: &Handle,
    options: &AssetOptions,
    sink: S,
) -> anyhow::Result<Vec<JoinHandle<()>>>
where
    S: EventSink,
{
    let source = AssetSource::new(&options.base_path)?;
    let mut gltf_loader = GltfLoader::new(source.clone());
    if let Some(decoder_path) = &options.decoder_path {
        let decompressor = DracoCommandDecompressor::new(decoder_path);
        log::debug!("Draco decoder: {}", decompressor.program().display());
        gltf_loader = gltf_loader.with_decompressor(Arc::new(decompressor));
    }

    let mut tasks = Vec::new();
    for model in &options.models {
        let loader = gltf_loader.clone();
        let model = model.clone();
        let sink = sink.clone();
        tasks.push(handle.spawn(async move {
            let result = loader.load(&model, None).await;
            deliver(&sink, RuntimeEvent::ModelLoaded(result));
        }));
    }

    if let Some(environment) = &options.environment {
        let loader = HdrLoader::new(source);
        let environment = environment.clone();
        let face_size = options.environment_face_size;
        tasks.push(handle.spawn(async move {
            let result = load_environment(&loader, &environment, face_size).await;
            deliver(&sink, RuntimeEvent::EnvironmentLoaded(result));
        }));
    }

    Ok(tasks)
}

async fn load_environment(
    loader: &HdrLoader,
    name: &str,
    face_size: u32,
) -> Result<LoadedEnvironment, LoadError> {
    let image = Arc::new(loader.load(name, None).await?);

    let source = image.clone();
    let (environment, _) =
        tokio::task::spawn_blocking(move || derive_environment(&source, face_size))
            .await
            .map_err(|e| LoadError::new(&loader.source().resolve(name), e))?;

    Ok(LoadedEnvironment { image, environment })
}

/// Prefilter `image` with a generator that is disposed right after. The returned
/// handle refers to the generator's kernel and no longer upgrades.
pub fn derive_environment(
    image: &HdrImage,
    face_size: u32,
) -> (Environment, Option<Weak<FilterKernel>>) {
    let instant = Instant::now();
    let mut generator = EnvironmentGenerator::new(face_size);
    generator.compile_equirectangular();
    let environment = generator.from_equirectangular(image);
    let kernel = generator.kernel();
    generator.dispose();

    log::debug!(
        "Derive environment {} in {} secs",
        environment.id(),
        instant.elapsed().as_secs_f32()
    );
    (environment, kernel)
}

fn deliver<S: EventSink>(sink: &S, event: RuntimeEvent) {
    if let Err(e) = sink.send(event) {
        log::debug!("Drop load result: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_environment_releases_generator() {
        let image = HdrImage::from_rgb(8, 4, &[[1.0, 0.5, 0.25]; 32]).unwrap();
        let (environment, kernel) = derive_environment(&image, 16);

        assert!(environment.mip_level_count() >= 1);
        let kernel = kernel.expect("kernel was compiled");
        assert!(kernel.upgrade().is_none());
    }

    #[test]
    fn defaults_load_both_models_and_environment() {
        let options = AssetOptions::default();
        assert_eq!(options.models.len(), 2);
        assert_eq!(options.environment.as_deref(), Some("cloudy.hdr"));
        assert!(options.decoder_path.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_assets_report_errors() {
        let dir = std::env::temp_dir().join(format!("konark-missing-{}", uuid::Uuid::new_v4()));
        let options = AssetOptions {
            base_path: dir.to_string_lossy().to_string(),
            models: vec!["absent.glb".to_owned()],
            environment: Some("absent.hdr".to_owned()),
            ..Default::default()
        };
        let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();

        let tasks = spawn_startup_loads(&Handle::current(), &options, sender).unwrap();
        for task in tasks {
            task.await.unwrap();
        }

        let mut model_failed = false;
        let mut environment_failed = false;
        while let Ok(event) = receiver.try_recv() {
            match event {
                RuntimeEvent::ModelLoaded(Err(e)) => {
                    assert!(e.url().ends_with("absent.glb"));
                    model_failed = true;
                }
                RuntimeEvent::EnvironmentLoaded(Err(e)) => {
                    assert!(e.url().ends_with("absent.hdr"));
                    environment_failed = true;
                }
                event => panic!("unexpected {:?}", event),
            }
        }
        assert!(model_failed && environment_failed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn malformed_model_delivers_load_error() {
        let dir = std::env::temp_dir().join(format!("konark-malformed-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(
            dir.join("broken.gltf"),
            r#"{
                "asset": { "version": "2.0" },
                "images": [{ "bufferView": 7, "mimeType": "image/png" }],
                "buffers": [{ "byteLength": 4, "uri": "data:application/octet-stream;base64,AAAAAA==" }]
            }"#,
        )
        .await
        .unwrap();
        let options = AssetOptions {
            base_path: dir.to_string_lossy().to_string(),
            models: vec!["broken.gltf".to_owned()],
            environment: None,
            ..Default::default()
        };
        let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();

        let tasks = spawn_startup_loads(&Handle::current(), &options, sender).unwrap();
        for task in tasks {
            task.await.unwrap();
        }

        match receiver.try_recv() {
            Ok(RuntimeEvent::ModelLoaded(Err(e))) => assert!(e.url().ends_with("broken.gltf")),
            other => panic!("unexpected {:?}", other),
        }
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
