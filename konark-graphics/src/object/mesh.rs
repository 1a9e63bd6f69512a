use std::{fmt::Debug, sync::Arc};

use uuid::Uuid;

/// Decoded RGBA8 (sRGB) image used as a material texture.
#[derive(Clone)]
pub struct TextureImage {
    id: Uuid,
    name: String,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl TextureImage {
    pub fn new(name: &str, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            width,
            height,
            data,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Debug for TextureImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureImage")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Metallic-roughness material.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub base_color_factor: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    /// Scale applied to light coming from the scene environment.
    pub env_map_intensity: f32,
    pub base_color_texture: Option<Arc<TextureImage>>,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            metallic: 1.0,
            roughness: 1.0,
            env_map_intensity: 1.0,
            base_color_texture: None,
            double_sided: false,
        }
    }
}

/// Vertex data of a triangle list. Shared between clones of a primitive.
#[derive(Debug, Default)]
pub struct Geometry {
    id: Uuid,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Option<Vec<u32>>,
}

impl Geometry {
    /// Missing normals are generated from the faces, missing uvs are zero-filled.
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Option<Vec<[f32; 3]>>,
        uvs: Option<Vec<[f32; 2]>>,
        indices: Option<Vec<u32>>,
    ) -> Self {
        let vertex_count = positions.len();
        let normals = match normals {
            Some(normals) if normals.len() == vertex_count => normals,
            _ => compute_vertex_normals(&positions, indices.as_deref()),
        };
        let uvs = match uvs {
            Some(uvs) if uvs.len() == vertex_count => uvs,
            _ => vec![[0.0, 0.0]; vertex_count],
        };

        Self {
            id: Uuid::new_v4(),
            positions,
            normals,
            uvs,
            indices,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    pub fn index_count(&self) -> Option<u32> {
        self.indices.as_ref().map(|indices| indices.len() as u32)
    }
}

fn compute_vertex_normals(positions: &[[f32; 3]], indices: Option<&[u32]>) -> Vec<[f32; 3]> {
    let mut normals = vec![glam::Vec3::ZERO; positions.len()];
    let triangle_count = indices.map_or(positions.len(), |i| i.len()) / 3;

    for triangle in 0..triangle_count {
        let corner = |k: usize| -> usize {
            match indices {
                Some(indices) => indices[triangle * 3 + k] as usize,
                None => triangle * 3 + k,
            }
        };
        let (a, b, c) = (corner(0), corner(1), corner(2));
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let pa = glam::Vec3::from(positions[a]);
        let pb = glam::Vec3::from(positions[b]);
        let pc = glam::Vec3::from(positions[c]);
        let face_normal = (pb - pa).cross(pc - pa);
        normals[a] += face_normal;
        normals[b] += face_normal;
        normals[c] += face_normal;
    }

    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(glam::Vec3::Y).to_array())
        .collect()
}

#[derive(Debug, Clone)]
pub struct Primitive {
    id: Uuid,
    geometry: Arc<Geometry>,
    material: Material,
}

impl Primitive {
    pub fn new(geometry: Arc<Geometry>, material: Material) -> Self {
        Self {
            id: Uuid::new_v4(),
            geometry,
            material,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn geometry(&self) -> &Arc<Geometry> {
        &self.geometry
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }
}

#[derive(Debug, Default, Clone)]
pub struct Mesh {
    name: String,
    primitives: Vec<Primitive>,
}

impl Mesh {
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self
    }

    pub fn with_primitives(mut self, primitives: Vec<Primitive>) -> Self {
        self.primitives = primitives;
        self
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn add_primitive(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn primitives_mut(&mut self) -> &mut [Primitive] {
        &mut self.primitives
    }
}
