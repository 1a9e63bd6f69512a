mod decompressor;
mod draco_command;
mod loader;

pub use decompressor::*;
pub use draco_command::*;
pub use loader::*;

use std::fmt::Debug;

use crate::SceneNode;

/// Scenes of a loaded glTF document, each as one root node.
#[derive(Default, Clone)]
pub struct Gltf {
    pub name: String,
    pub scenes: Vec<SceneNode>,
    pub default_scene: Option<usize>,
}

impl Gltf {
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self
    }

    pub fn with_scenes(mut self, scenes: Vec<SceneNode>) -> Self {
        self.scenes = scenes;
        self
    }

    pub fn with_default_scene(mut self, default_scene_index: usize) -> Self {
        if default_scene_index < self.scenes.len() {
            self.default_scene = Some(default_scene_index);
        }
        self
    }

    pub fn get_default_scene(&self) -> Option<&SceneNode> {
        self.default_scene.and_then(|index| self.scenes.get(index))
    }

    pub fn get_scene_by_name(&self, name: &str) -> Option<&SceneNode> {
        self.scenes.iter().find(|scene| scene.name() == name)
    }

    pub fn get_scenes(&self) -> &[SceneNode] {
        &self.scenes
    }

    /// The default scene, else the first one, else an empty node.
    pub fn into_root(mut self) -> SceneNode {
        let index = self.default_scene.unwrap_or(0);
        if index < self.scenes.len() {
            self.scenes.swap_remove(index)
        } else {
            SceneNode::new(&self.name)
        }
    }
}

impl Debug for Gltf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug_struct = f.debug_struct("Gltf");

        debug_struct.field("name", &self.name);
        if self.default_scene.is_some() && self.scenes.len() > 1 {
            debug_struct.field("default_scene", &self.default_scene);
        }

        debug_struct.field("scenes", &self.scenes.len()).finish()
    }
}
