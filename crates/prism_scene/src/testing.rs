//! In-memory doubles shared by the scene tests.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use prism_assets::{
    AssetLoadError, MaterialData, MeshData, ModelSource, ParsedModel, ParsedNode, TextureData,
    TextureFormat, Vertex,
};
use prism_core::transform::Transform;

fn quad(name: &str, material_slots: Vec<Option<usize>>) -> MeshData {
    let n = [0.0, 0.0, 1.0];
    MeshData {
        name: name.to_owned(),
        vertices: vec![
            Vertex::new([-0.5, -0.5, 0.0], n, [0.0, 1.0]),
            Vertex::new([0.5, -0.5, 0.0], n, [1.0, 1.0]),
            Vertex::new([0.5, 0.5, 0.0], n, [1.0, 0.0]),
            Vertex::new([-0.5, 0.5, 0.0], n, [0.0, 0.0]),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
        material_slots,
        has_tangents: false,
    }
}

/// Two unit quads at x = -1 ("First", textured) and x = +1 ("Second",
/// two material slots, untextured first slot) under one group node.
pub(crate) fn two_mesh_model() -> ParsedModel {
    ParsedModel {
        name: String::from("two"),
        nodes: vec![
            ParsedNode {
                name: String::from("Root"),
                transform: Transform::IDENTITY,
                mesh: None,
                children: vec![1, 2],
            },
            ParsedNode {
                name: String::from("First"),
                transform: Transform::from_xyz(-1.0, 0.0, 0.0),
                mesh: Some(0),
                children: vec![],
            },
            ParsedNode {
                name: String::from("Second"),
                transform: Transform::from_xyz(1.0, 0.0, 0.0),
                mesh: Some(1),
                children: vec![],
            },
        ],
        roots: vec![0],
        meshes: vec![
            quad("First", vec![Some(0)]),
            quad("Second", vec![Some(1), Some(0)]),
        ],
        materials: vec![
            MaterialData {
                name: String::from("Textured"),
                diffuse_texture: Some(0),
                ..Default::default()
            },
            MaterialData {
                name: String::from("Plain"),
                ..Default::default()
            },
        ],
        textures: vec![TextureData {
            name: String::from("Orange"),
            pixels: vec![255, 128, 0, 255],
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8UnormSrgb,
        }],
    }
}

/// A single untextured quad.
pub(crate) fn one_mesh_model() -> ParsedModel {
    ParsedModel {
        name: String::from("one"),
        nodes: vec![ParsedNode {
            name: String::from("Only"),
            transform: Transform::IDENTITY,
            mesh: Some(0),
            children: vec![],
        }],
        roots: vec![0],
        meshes: vec![quad("Only", vec![None])],
        ..Default::default()
    }
}

/// Serves prepared models by path.
#[derive(Default)]
pub(crate) struct MemorySource {
    models: HashMap<PathBuf, ParsedModel>,
}

impl MemorySource {
    pub(crate) fn with(mut self, path: &str, model: ParsedModel) -> Self {
        self.models.insert(PathBuf::from(path), model);
        self
    }
}

#[async_trait]
impl ModelSource for MemorySource {
    async fn fetch(&self, path: &Path) -> Result<ParsedModel, AssetLoadError> {
        self.models
            .get(path)
            .cloned()
            .ok_or_else(|| AssetLoadError::NotFound(path.display().to_string()))
    }
}
