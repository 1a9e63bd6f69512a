use std::{
    path::{Path, PathBuf},
    process::Command,
};

use super::{CompressedPrimitive, DecodedGeometry, GeometryDecompressor};

const DECODER_BINARY: &str = "draco_decoder";

/// Decodes Draco streams with the reference `draco_decoder` tool and reads back
/// the PLY it writes.
#[derive(Debug, Clone)]
pub struct DracoCommandDecompressor {
    program: PathBuf,
}

impl DracoCommandDecompressor {
    /// `decoder_path` is either the decoder executable or the directory holding it.
    pub fn new<P: AsRef<Path>>(decoder_path: P) -> Self {
        let path = decoder_path.as_ref();
        let program = if path.is_dir() {
            path.join(DECODER_BINARY)
        } else {
            path.to_path_buf()
        };

        Self { program }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl GeometryDecompressor for DracoCommandDecompressor {
    fn decompress(&self, primitive: &CompressedPrimitive<'_>) -> anyhow::Result<DecodedGeometry> {
        let work_dir = std::env::temp_dir().join(format!("konark-draco-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&work_dir)?;
        let input = work_dir.join("primitive.drc");
        let output = work_dir.join("primitive.ply");

        let result = (|| {
            std::fs::write(&input, primitive.data)?;
            let status = Command::new(&self.program)
                .arg("-i")
                .arg(&input)
                .arg("-o")
                .arg(&output)
                .output()?;
            if !status.status.success() {
                anyhow::bail!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    status.status,
                    String::from_utf8_lossy(&status.stderr).trim()
                );
            }
            parse_ply(&std::fs::read(&output)?)
        })();

        if let Err(e) = std::fs::remove_dir_all(&work_dir) {
            log::debug!("Could not remove {}: {}", work_dir.display(), e);
        }
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    fn parse(name: &str) -> anyhow::Result<Self> {
        Ok(match name {
            "char" | "int8" => Self::I8,
            "uchar" | "uint8" => Self::U8,
            "short" | "int16" => Self::I16,
            "ushort" | "uint16" => Self::U16,
            "int" | "int32" => Self::I32,
            "uint" | "uint32" => Self::U32,
            "float" | "float32" => Self::F32,
            "double" | "float64" => Self::F64,
            _ => anyhow::bail!("Unknown PLY scalar type {}", name),
        })
    }

    fn size(&self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    fn read_le(&self, bytes: &[u8]) -> f64 {
        match self {
            Self::I8 => bytes[0] as i8 as f64,
            Self::U8 => bytes[0] as f64,
            Self::I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            Self::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            Self::I32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::F64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes[..8]);
                f64::from_le_bytes(raw)
            }
        }
    }
}

#[derive(Debug)]
enum Property {
    Scalar(String, ScalarType),
    List(String, ScalarType, ScalarType),
}

#[derive(Debug)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

/// Reads values in declaration order from either PLY body encoding.
struct BodyReader<'a> {
    format: PlyFormat,
    bytes: &'a [u8],
    cursor: usize,
}

impl BodyReader<'_> {
    fn next(&mut self, ty: ScalarType) -> anyhow::Result<f64> {
        match self.format {
            PlyFormat::BinaryLittleEndian => {
                let end = self.cursor + ty.size();
                let bytes = self
                    .bytes
                    .get(self.cursor..end)
                    .ok_or_else(|| anyhow::anyhow!("Unexpected end of PLY body"))?;
                self.cursor = end;
                Ok(ty.read_le(bytes))
            }
            PlyFormat::Ascii => {
                let rest = &self.bytes[self.cursor..];
                let start = rest
                    .iter()
                    .position(|b| !b.is_ascii_whitespace())
                    .ok_or_else(|| anyhow::anyhow!("Unexpected end of PLY body"))?;
                let len = rest[start..]
                    .iter()
                    .position(|b| b.is_ascii_whitespace())
                    .unwrap_or(rest.len() - start);
                let token = std::str::from_utf8(&rest[start..start + len])?;
                self.cursor += start + len;
                Ok(token.parse()?)
            }
        }
    }
}

/// Parse the vertices and faces of a PLY mesh. Faces with more than three corners
/// are fanned into triangles.
pub fn parse_ply(bytes: &[u8]) -> anyhow::Result<DecodedGeometry> {
    const END_HEADER: &[u8] = b"end_header\n";
    let header_end = bytes
        .windows(END_HEADER.len())
        .position(|w| w == END_HEADER)
        .ok_or_else(|| anyhow::anyhow!("PLY header is not terminated"))?;
    let header = std::str::from_utf8(&bytes[..header_end])?;

    let mut lines = header.lines();
    if lines.next().map(str::trim) != Some("ply") {
        anyhow::bail!("Not a PLY file");
    }

    let mut format = None;
    let mut elements: Vec<Element> = Vec::new();
    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["format", "ascii", ..] => format = Some(PlyFormat::Ascii),
            ["format", "binary_little_endian", ..] => {
                format = Some(PlyFormat::BinaryLittleEndian)
            }
            ["format", other, ..] => anyhow::bail!("Unsupported PLY format {}", other),
            ["element", name, count] => elements.push(Element {
                name: name.to_string(),
                count: count.parse()?,
                properties: Vec::new(),
            }),
            ["property", "list", count_ty, item_ty, name] => elements
                .last_mut()
                .ok_or_else(|| anyhow::anyhow!("PLY property before element"))?
                .properties
                .push(Property::List(
                    name.to_string(),
                    ScalarType::parse(count_ty)?,
                    ScalarType::parse(item_ty)?,
                )),
            ["property", ty, name] => elements
                .last_mut()
                .ok_or_else(|| anyhow::anyhow!("PLY property before element"))?
                .properties
                .push(Property::Scalar(name.to_string(), ScalarType::parse(ty)?)),
            _ => {}
        }
    }

    let mut reader = BodyReader {
        format: format.ok_or_else(|| anyhow::anyhow!("PLY format is missing"))?,
        bytes: &bytes[header_end + END_HEADER.len()..],
        cursor: 0,
    };

    let mut geometry = DecodedGeometry::default();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();

    for element in &elements {
        for _ in 0..element.count {
            let mut position = [0.0f32; 3];
            let mut normal = [0.0f32; 3];
            let mut uv = [0.0f32; 2];
            for property in &element.properties {
                match property {
                    Property::Scalar(name, ty) => {
                        let value = reader.next(*ty)? as f32;
                        match name.as_str() {
                            "x" => position[0] = value,
                            "y" => position[1] = value,
                            "z" => position[2] = value,
                            "nx" => normal[0] = value,
                            "ny" => normal[1] = value,
                            "nz" => normal[2] = value,
                            "s" | "u" | "texture_u" => uv[0] = value,
                            "t" | "v" | "texture_v" => uv[1] = value,
                            _ => {}
                        }
                    }
                    Property::List(name, count_ty, item_ty) => {
                        let count = reader.next(*count_ty)? as usize;
                        let mut corners = Vec::with_capacity(count);
                        for _ in 0..count {
                            corners.push(reader.next(*item_ty)? as u32);
                        }
                        if element.name == "face"
                            && matches!(name.as_str(), "vertex_indices" | "vertex_index")
                        {
                            for i in 1..corners.len().saturating_sub(1) {
                                indices.extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
                            }
                        }
                    }
                }
            }

            if element.name == "vertex" {
                geometry.positions.push(position);
                normals.push(normal);
                uvs.push(uv);
            }
        }
    }

    let has = |names: &[&str]| {
        elements.iter().any(|element| {
            element.name == "vertex"
                && element.properties.iter().any(|property| {
                    matches!(property, Property::Scalar(name, _) if names.contains(&name.as_str()))
                })
        })
    };
    if has(&["nx"]) {
        geometry.normals = Some(normals);
    }
    if has(&["s", "u", "texture_u"]) {
        geometry.uvs = Some(uvs);
    }
    if !indices.is_empty() {
        geometry.indices = Some(indices);
    }

    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_quad_is_fanned() {
        let ply = b"ply\nformat ascii 1.0\nelement vertex 4\nproperty float x\nproperty float y\nproperty float z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3\n";
        let geometry = parse_ply(ply).unwrap();

        assert_eq!(geometry.positions.len(), 4);
        assert_eq!(geometry.positions[2], [1.0, 1.0, 0.0]);
        assert_eq!(geometry.indices, Some(vec![0, 1, 2, 0, 2, 3]));
        assert!(geometry.normals.is_none());
        assert!(geometry.uvs.is_none());
    }

    #[test]
    fn binary_with_normals_and_texcoords() {
        let mut ply = b"ply\nformat binary_little_endian 1.0\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\nproperty float nx\nproperty float ny\nproperty float nz\nproperty float s\nproperty float t\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n".to_vec();
        for i in 0..3 {
            let vertex = [i as f32, 0.0, 0.0, 0.0, 0.0, 1.0, 0.5, i as f32 * 0.25];
            for value in vertex {
                ply.extend_from_slice(&value.to_le_bytes());
            }
        }
        ply.push(3);
        for index in [0i32, 1, 2] {
            ply.extend_from_slice(&index.to_le_bytes());
        }

        let geometry = parse_ply(&ply).unwrap();
        assert_eq!(geometry.positions[1], [1.0, 0.0, 0.0]);
        assert_eq!(geometry.normals.as_ref().unwrap()[2], [0.0, 0.0, 1.0]);
        assert_eq!(geometry.uvs.as_ref().unwrap()[2], [0.5, 0.5]);
        assert_eq!(geometry.indices, Some(vec![0, 1, 2]));
    }

    #[test]
    fn truncated_body_is_an_error() {
        let ply = b"ply\nformat binary_little_endian 1.0\nelement vertex 1\nproperty float x\nend_header\n\x00\x00";
        assert!(parse_ply(ply).is_err());
    }

    #[test]
    fn directory_resolves_to_decoder_binary() {
        let dir = std::env::temp_dir();
        let decompressor = DracoCommandDecompressor::new(&dir);
        assert_eq!(decompressor.program(), dir.join("draco_decoder"));
    }
}
