use std::{collections::HashMap, sync::Arc, time::Instant};

use konark_core::Transform;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    sibling_asset_name, AssetSource, Geometry, LoadError, Material, Mesh, Primitive,
    ProgressSender, SceneNode, TextureImage,
};

use super::{CompressedPrimitive, DecodedGeometry, GeometryDecompressor, Gltf, DRACO_EXTENSION};

/// Required extensions the loader can honour without help.
const SUPPORTED_REQUIRED_EXTENSIONS: &[&str] = &[];

#[derive(Clone)]
pub struct GltfLoader {
    source: AssetSource,
    decompressor: Option<Arc<dyn GeometryDecompressor>>,
}

struct EncodedImage {
    name: String,
    mime_type: Option<String>,
    data: Vec<u8>,
}

impl GltfLoader {
    pub fn new(source: AssetSource) -> Self {
        Self {
            source,
            decompressor: None,
        }
    }

    pub fn with_decompressor(mut self, decompressor: Arc<dyn GeometryDecompressor>) -> Self {
        self.decompressor = Some(decompressor);
        self
    }

    pub fn source(&self) -> &AssetSource {
        &self.source
    }

    /// Fetch a glTF/GLB file with its buffers and images and build its scenes.
    pub async fn load(&self, name: &str, progress: Option<ProgressSender>) -> Result<Gltf, LoadError> {
        let url = self.source.resolve(name);
        log::debug!("Load gltf {}", &url);
        self.load_impl(name, progress.as_ref())
            .await
            .map_err(|cause| LoadError::new(&url, cause))
    }

    async fn load_impl(&self, name: &str, progress: Option<&ProgressSender>) -> anyhow::Result<Gltf> {
        let instant = Instant::now();
        let data = self.source.fetch(name, progress).await?;
        log::debug!(
            "Fetch {} ({} bytes) in {} secs",
            name,
            data.len(),
            instant.elapsed().as_secs_f32()
        );

        let gltf = gltf::Gltf::from_slice_without_validation(&data)?;
        validate_document(&gltf.document)?;
        let draco_required = self.check_required_extensions(&gltf.document)?;

        // Phase1. resolve buffers and encoded images
        let instant = Instant::now();
        let buffer_futures: Vec<_> = gltf
            .buffers()
            .map(|buffer| self.load_buffer(&gltf, buffer, name))
            .collect();
        let buffers = futures::future::try_join_all(buffer_futures).await?;
        log::debug!(
            "Load {} raw buffers in {} secs",
            buffers.len(),
            instant.elapsed().as_secs_f32()
        );

        let image_futures: Vec<_> = gltf
            .images()
            .map(|image| self.load_image_bytes(image, &buffers, name))
            .collect();
        let encoded_images = futures::future::try_join_all(image_futures).await?;

        // Phase2. decode images and build scene nodes off the async workers
        let decompressor = self.decompressor.clone();
        let gltf_name = name.to_owned();
        tokio::task::spawn_blocking(move || {
            let instant = Instant::now();
            let images = Self::decode_images(&encoded_images);
            log::debug!(
                "Decode {} images in {} secs",
                images.len(),
                instant.elapsed().as_secs_f32()
            );

            let instant = Instant::now();
            let builder = SceneBuilder {
                document: &gltf.document,
                buffers: &buffers,
                images: &images,
                decompressor: decompressor.as_deref(),
                draco_required,
            };
            let result = builder.build(&gltf_name);
            log::debug!("Build scenes in {} secs", instant.elapsed().as_secs_f32());
            result
        })
        .await
        .map_err(|e| anyhow::anyhow!("Scene build aborted: {}", e))?
    }

    /// Returns whether draco compression is required.
    fn check_required_extensions(&self, document: &gltf::Document) -> anyhow::Result<bool> {
        let mut draco_required = false;
        for extension in document.extensions_required() {
            let extension = extension.to_string();
            if extension == DRACO_EXTENSION {
                if self.decompressor.is_none() {
                    anyhow::bail!(
                        "'{}' is required but no geometry decompressor is configured",
                        DRACO_EXTENSION
                    );
                }
                draco_required = true;
            } else if !SUPPORTED_REQUIRED_EXTENSIONS.contains(&extension.as_str()) {
                anyhow::bail!("Unsupported required extension '{}'", extension);
            }
        }
        Ok(draco_required)
    }

    async fn load_buffer(
        &self,
        gltf: &gltf::Gltf,
        buffer: gltf::Buffer<'_>,
        name: &str,
    ) -> anyhow::Result<Vec<u8>> {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    blob.to_vec()
                } else {
                    anyhow::bail!("Buffer reference blob but gltf file not has blob data")
                }
            }
            gltf::buffer::Source::Uri(uri) => {
                let decoded_uri = percent_encoding::percent_decode_str(uri).decode_utf8()?;
                if let Some(uri) = UriData::parse(&decoded_uri)? {
                    uri.data
                } else {
                    self.source
                        .fetch(&sibling_asset_name(name, &decoded_uri), None)
                        .await?
                }
            }
        };

        if data.len() < buffer.length() {
            anyhow::bail!(
                "Buffer {} holds {} bytes, expected {}",
                buffer.index(),
                data.len(),
                buffer.length()
            );
        }

        Ok(data)
    }

    async fn load_image_bytes(
        &self,
        image: gltf::Image<'_>,
        raw_buffers: &[Vec<u8>],
        name: &str,
    ) -> anyhow::Result<EncodedImage> {
        match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let slice = raw_buffers
                    .get(view.buffer().index())
                    .and_then(|buffer| buffer.get(view.offset()..view.offset() + view.length()))
                    .ok_or(anyhow::Error::msg("Image view exceeds its buffer"))?;
                let image_name = if let Some(view_name) = view.name() {
                    format!("{}.{}", name, view_name)
                } else {
                    format!("{}.image.{}", name, image.index())
                };

                Ok(EncodedImage {
                    name: image_name,
                    mime_type: Some(mime_type.to_owned()),
                    data: slice.to_vec(),
                })
            }
            gltf::image::Source::Uri { uri, mime_type } => {
                let decoded_uri = percent_encoding::percent_decode_str(uri).decode_utf8()?;
                let (mime_type, data) = if let Some(uri) = UriData::parse(&decoded_uri)? {
                    (Some(uri.mime_type.to_owned()), uri.data)
                } else {
                    let data = self
                        .source
                        .fetch(&sibling_asset_name(name, &decoded_uri), None)
                        .await?;
                    (mime_type.map(str::to_owned), data)
                };

                Ok(EncodedImage {
                    name: format!("{}.{}", name, decoded_uri),
                    mime_type,
                    data,
                })
            }
        }
    }

    /// Undecodable images are dropped from their materials rather than failing the model.
    fn decode_images(encoded_images: &[EncodedImage]) -> Vec<Option<Arc<TextureImage>>> {
        encoded_images
            .par_iter()
            .map(|encoded| {
                let format = encoded
                    .mime_type
                    .as_deref()
                    .and_then(|mime_type| image::ImageFormat::from_mime_type(mime_type));
                let decoded = match format {
                    Some(format) => image::load_from_memory_with_format(&encoded.data, format),
                    None => image::load_from_memory(&encoded.data),
                };

                match decoded {
                    Ok(decoded) => {
                        let rgba = decoded.to_rgba8();
                        Some(Arc::new(TextureImage::new(
                            &encoded.name,
                            rgba.width(),
                            rgba.height(),
                            rgba.into_raw(),
                        )))
                    }
                    Err(e) => {
                        log::warn!("Skip image {}: {}", encoded.name, e);
                        None
                    }
                }
            })
            .collect()
    }
}

/// Index and schema checks over the whole document. Unsupported required
/// extensions pass here and are judged by `check_required_extensions`.
fn validate_document(document: &gltf::Document) -> anyhow::Result<()> {
    use gltf::json::validation::{Error, Validate};

    let root = document.as_json();
    let mut errors = Vec::new();
    root.validate(root, gltf::json::Path::new, &mut |path, error| {
        let path = path();
        if matches!(error, Error::Unsupported) && path.as_str().starts_with("extensionsRequired") {
            return;
        }
        errors.push(format!("{}: {}", path.as_str(), error));
    });

    if !errors.is_empty() {
        anyhow::bail!("Invalid glTF document ({})", errors.join(", "));
    }
    Ok(())
}

struct SceneBuilder<'a> {
    document: &'a gltf::Document,
    buffers: &'a [Vec<u8>],
    images: &'a [Option<Arc<TextureImage>>],
    decompressor: Option<&'a dyn GeometryDecompressor>,
    draco_required: bool,
}

impl SceneBuilder<'_> {
    fn build(&self, name: &str) -> anyhow::Result<Gltf> {
        let meshes = self
            .document
            .meshes()
            .map(|mesh| self.build_mesh(&mesh))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let scenes = self
            .document
            .scenes()
            .map(|scene| {
                let scene_name = scene.name().unwrap_or(name);
                SceneNode::new(scene_name).with_children(
                    scene
                        .nodes()
                        .map(|node| Self::build_node(&node, &meshes))
                        .collect(),
                )
            })
            .collect();

        let mut gltf = Gltf::default().with_name(name).with_scenes(scenes);
        if let Some(scene) = self.document.default_scene() {
            gltf = gltf.with_default_scene(scene.index());
        }
        Ok(gltf)
    }

    fn build_node(node: &gltf::Node<'_>, meshes: &[Mesh]) -> SceneNode {
        let (translation, rotation, scale) = node.transform().decomposed();
        let transform = Transform::from_decomposed(
            &glam::Vec3::from(translation),
            &glam::Quat::from_array(rotation),
            &glam::Vec3::from(scale),
        );

        let name = node
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("node.{}", node.index()));
        let mut scene_node = SceneNode::new(&name)
            .with_transform(transform)
            .with_children(
                node.children()
                    .map(|child| Self::build_node(&child, meshes))
                    .collect(),
            );
        if let Some(mesh) = node.mesh().and_then(|mesh| meshes.get(mesh.index())) {
            scene_node = scene_node.with_mesh(mesh.clone());
        }

        scene_node
    }

    fn build_mesh(&self, mesh: &gltf::Mesh<'_>) -> anyhow::Result<Mesh> {
        let name = mesh
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("mesh.{}", mesh.index()));
        let mut result = Mesh::default().with_name(&name);

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skip primitive {} of {}: mode {:?} is not supported",
                    primitive.index(),
                    name,
                    primitive.mode()
                );
                continue;
            }

            let geometry = self.build_geometry(&primitive).map_err(|e| {
                e.context(format!("Primitive {} of mesh {}", primitive.index(), name))
            })?;
            let material = self.build_material(&primitive.material());
            result.add_primitive(Primitive::new(Arc::new(geometry), material));
        }

        Ok(result)
    }

    fn build_geometry(&self, primitive: &gltf::Primitive<'_>) -> anyhow::Result<Geometry> {
        if let Some(draco) = primitive.extension_value(DRACO_EXTENSION) {
            match self.decompressor {
                Some(decompressor) => {
                    let compressed = self.compressed_primitive(draco)?;
                    let DecodedGeometry {
                        positions,
                        normals,
                        uvs,
                        indices,
                    } = decompressor.decompress(&compressed)?;
                    return Ok(Geometry::new(positions, normals, uvs, indices));
                }
                None if self.draco_required => {
                    anyhow::bail!("Compressed geometry needs a geometry decompressor")
                }
                // Uncompressed fallback accessors are present
                None => {}
            }
        }

        let reader = primitive.reader(|buffer| self.buffers.get(buffer.index()).map(Vec::as_slice));
        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or(anyhow::Error::msg("Primitive has no POSITION attribute"))?
            .collect();
        let normals = reader.read_normals().map(|normals| normals.collect());
        let uvs = reader
            .read_tex_coords(0)
            .map(|uvs| uvs.into_f32().collect());
        let indices = reader
            .read_indices()
            .map(|indices| indices.into_u32().collect());

        Ok(Geometry::new(positions, normals, uvs, indices))
    }

    fn compressed_primitive(
        &self,
        extension: &gltf::json::Value,
    ) -> anyhow::Result<CompressedPrimitive<'_>> {
        let view_index = extension
            .get("bufferView")
            .and_then(|value| value.as_u64())
            .ok_or(anyhow::Error::msg("Compressed primitive has no bufferView"))?;
        let view = self
            .document
            .views()
            .nth(view_index as usize)
            .ok_or(anyhow::Error::msg("Compressed primitive bufferView out of range"))?;
        let data = self
            .buffers
            .get(view.buffer().index())
            .and_then(|buffer| buffer.get(view.offset()..view.offset() + view.length()))
            .ok_or(anyhow::Error::msg("Compressed primitive exceeds its buffer"))?;

        let mut attributes = HashMap::new();
        if let Some(entries) = extension.get("attributes").and_then(|value| value.as_object()) {
            for (semantic, id) in entries {
                if let Some(id) = id.as_u64() {
                    attributes.insert(semantic.clone(), id as u32);
                }
            }
        }

        Ok(CompressedPrimitive { data, attributes })
    }

    fn build_material(&self, material: &gltf::Material<'_>) -> Material {
        let pbr = material.pbr_metallic_roughness();
        let base_color_texture = pbr.base_color_texture().and_then(|info| {
            self.images
                .get(info.texture().source().index())
                .cloned()
                .flatten()
        });

        Material {
            name: material.name().unwrap_or_default().to_owned(),
            base_color_factor: pbr.base_color_factor(),
            metallic: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
            base_color_texture,
            double_sided: material.double_sided(),
            ..Default::default()
        }
    }
}

struct UriData<'a> {
    mime_type: &'a str,
    data: Vec<u8>,
}

impl<'a> UriData<'a> {
    /// `None` when the uri is not a data uri.
    fn parse(decoded_uri: &'a str) -> anyhow::Result<Option<UriData<'a>>> {
        let Some(striped_uri) = decoded_uri.strip_prefix("data:") else {
            return Ok(None);
        };
        if let Some((mime_type, data)) = striped_uri.split_once(',') {
            let (mime_type, is_base64) = match mime_type.strip_suffix(";base64") {
                Some(m) => (m, true),
                None => (mime_type, false),
            };
            let data = if is_base64 {
                base64::Engine::decode(&base64::engine::general_purpose::STANDARD, data)?
            } else {
                data.as_bytes().to_owned()
            };
            Ok(Some(UriData { mime_type, data }))
        } else {
            anyhow::bail!("Invalid data uri format")
        }
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;

    use super::*;

    const TRIANGLE: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

    fn triangle_buffer_uri() -> String {
        let bytes: Vec<u8> = TRIANGLE
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    fn triangle_gltf(extra_primitive: &str, extensions: &str) -> String {
        format!(
            r#"{{
                "asset": {{ "version": "2.0" }},
                {extensions}
                "scene": 0,
                "scenes": [{{ "nodes": [0] }}],
                "nodes": [{{
                    "name": "temple",
                    "mesh": 0,
                    "translation": [5.0, 0.0, 0.0],
                    "scale": [2.0, 2.0, 2.0]
                }}],
                "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }} {extra_primitive} }}] }}],
                "accessors": [{{
                    "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                    "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
                }}],
                "bufferViews": [{{ "buffer": 0, "byteLength": 36 }}],
                "buffers": [{{ "byteLength": 36, "uri": "{uri}" }}]
            }}"#,
            uri = triangle_buffer_uri(),
        )
    }

    async fn write_fixture(file_name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("konark-gltf-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join(file_name), contents).await.unwrap();
        dir
    }

    struct FixedDecompressor;

    impl GeometryDecompressor for FixedDecompressor {
        fn decompress(
            &self,
            primitive: &CompressedPrimitive<'_>,
        ) -> anyhow::Result<DecodedGeometry> {
            assert_eq!(primitive.data.len(), 36);
            assert_eq!(primitive.attributes.get("POSITION"), Some(&0));
            Ok(DecodedGeometry {
                positions: vec![[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]],
                indices: Some(vec![0, 1, 2]),
                ..Default::default()
            })
        }
    }

    const DRACO_PRIMITIVE: &str = r#", "extensions": {
        "KHR_draco_mesh_compression": { "bufferView": 0, "attributes": { "POSITION": 0 } }
    }"#;
    const DRACO_REQUIRED: &str = r#""extensionsUsed": ["KHR_draco_mesh_compression"],
        "extensionsRequired": ["KHR_draco_mesh_compression"],"#;

    #[tokio::test]
    async fn load_embedded_triangle() {
        let dir = write_fixture("triangle.gltf", &triangle_gltf("", "")).await;
        let loader = GltfLoader::new(AssetSource::Directory(dir.clone()));

        let gltf = loader.load("triangle.gltf", None).await.unwrap();
        let root = gltf.into_root();
        let node = &root.children()[0];
        assert_eq!(node.name(), "temple");
        assert_eq!(node.transform().get_translation(), glam::vec3(5.0, 0.0, 0.0));

        let primitive = &node.mesh().unwrap().primitives()[0];
        assert_eq!(primitive.geometry().positions(), &TRIANGLE);
        // Generated from the face
        assert!(glam::Vec3::from(primitive.geometry().normals()[0])
            .abs_diff_eq(glam::Vec3::Z, 1e-6));
        assert_eq!(primitive.material().env_map_intensity, 1.0);
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn required_draco_without_decompressor_fails() {
        let dir = write_fixture(
            "draco.gltf",
            &triangle_gltf(DRACO_PRIMITIVE, DRACO_REQUIRED),
        )
        .await;
        let loader = GltfLoader::new(AssetSource::Directory(dir.clone()));

        let err = loader.load("draco.gltf", None).await.unwrap_err();
        assert!(err.url().ends_with("draco.gltf"));
        assert!(err.to_string().contains(DRACO_EXTENSION));
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn draco_primitive_goes_through_decompressor() {
        let dir = write_fixture(
            "draco.gltf",
            &triangle_gltf(DRACO_PRIMITIVE, DRACO_REQUIRED),
        )
        .await;
        let loader = GltfLoader::new(AssetSource::Directory(dir.clone()))
            .with_decompressor(Arc::new(FixedDecompressor));

        let root = loader.load("draco.gltf", None).await.unwrap().into_root();
        let geometry = root.children()[0].mesh().unwrap().primitives()[0].geometry().clone();
        assert_eq!(geometry.positions()[1], [0.0, 0.0, 1.0]);
        assert_eq!(geometry.indices(), Some(&[0u32, 1, 2][..]));
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn unknown_required_extension_fails() {
        let dir = write_fixture(
            "ext.gltf",
            &triangle_gltf("", r#""extensionsRequired": ["EXT_made_up"],"#),
        )
        .await;
        let loader = GltfLoader::new(AssetSource::Directory(dir.clone()));

        assert!(loader.load("ext.gltf", None).await.is_err());
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    async fn assert_rejected(file_name: &str, contents: &str) {
        let dir = write_fixture(file_name, contents).await;
        let loader = GltfLoader::new(AssetSource::Directory(dir.clone()));

        let err = loader.load(file_name, None).await.unwrap_err();
        assert!(err.url().ends_with(file_name));
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn image_with_dangling_buffer_view_fails() {
        let contents = triangle_gltf("", "").replacen(
            r#""scene": 0,"#,
            r#""images": [{ "bufferView": 7, "mimeType": "image/png" }],
                "scene": 0,"#,
            1,
        );
        assert_rejected("image.gltf", &contents).await;
    }

    #[tokio::test]
    async fn buffer_view_with_dangling_buffer_fails() {
        let contents = triangle_gltf("", "").replace(
            r#""bufferViews": [{ "buffer": 0,"#,
            r#""bufferViews": [{ "buffer": 3,"#,
        );
        assert_rejected("view.gltf", &contents).await;
    }

    #[tokio::test]
    async fn primitive_with_dangling_accessor_fails() {
        let contents = triangle_gltf("", "").replace(r#""POSITION": 0"#, r#""POSITION": 9"#);
        assert_rejected("accessor.gltf", &contents).await;
    }

    #[tokio::test]
    async fn node_with_dangling_mesh_fails() {
        let contents = triangle_gltf("", "").replace(r#""mesh": 0,"#, r#""mesh": 4,"#);
        assert_rejected("node.gltf", &contents).await;
    }

    #[tokio::test]
    async fn accessor_overrunning_its_view_fails() {
        let contents = triangle_gltf("", "").replace(r#""count": 3,"#, r#""count": 30,"#);
        assert_rejected("overrun.gltf", &contents).await;
    }

    #[test]
    fn parse_data_uri() {
        let uri = UriData::parse("data:text/plain,abc").unwrap().unwrap();
        assert_eq!(uri.mime_type, "text/plain");
        assert_eq!(uri.data, b"abc");

        assert!(UriData::parse("scene.bin").unwrap().is_none());
        assert!(UriData::parse("data:missing-comma").is_err());
    }
}
