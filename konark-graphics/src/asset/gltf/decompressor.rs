use std::collections::HashMap;

pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Compressed payload of one primitive as referenced by the draco extension.
#[derive(Debug)]
pub struct CompressedPrimitive<'a> {
    pub data: &'a [u8],
    /// glTF attribute semantic (`POSITION`, `NORMAL`, `TEXCOORD_0`, ...) to the
    /// attribute id inside the compressed stream
    pub attributes: HashMap<String, u32>,
}

#[derive(Debug, Default, Clone)]
pub struct DecodedGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub indices: Option<Vec<u32>>,
}

/// Decoder for compressed mesh geometry, configured on the glTF loader.
pub trait GeometryDecompressor: Send + Sync {
    fn decompress(&self, primitive: &CompressedPrimitive<'_>) -> anyhow::Result<DecodedGeometry>;
}
