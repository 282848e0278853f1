use glam::{Mat4, Vec3};
use prism_core::{Aabb, transform::Transform};
use rayon::prelude::*;

use crate::tangents::{generate_tangents, triangles};

#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3], // Flat lists are easier for generic loaders
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// xyz = tangent direction, w = bitangent sign
    pub tangent: [f32; 4],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            tangent: [0.0; 4],
        }
    }
}

#[derive(Clone, Debug)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// One slot per source primitive, index into [`ParsedModel::materials`].
    pub material_slots: Vec<Option<usize>>,
    pub has_tangents: bool,
}

impl MeshData {
    pub fn local_bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| Vec3::from(v.position)))
    }

    /// At least one triangle to draw.
    pub fn is_drawable(&self) -> bool {
        !self.vertices.is_empty() && self.indices.len() >= 3
    }

    /// Drops triangles that reference missing vertices, plus a trailing
    /// partial triangle. Returns how many whole triangles went away.
    pub fn retain_valid_triangles(&mut self) -> usize {
        let before = self.indices.len() / 3;
        self.indices = valid_triangles(&self.indices, self.vertices.len());
        before - self.indices.len() / 3
    }

    pub fn ensure_tangents(&mut self) {
        if !self.has_tangents {
            generate_tangents(&mut self.vertices, &self.indices);
            self.has_tangents = true;
        }
    }
}

/// The whole triangles of `indices` whose corners all lie below `vertex_count`.
pub fn valid_triangles(indices: &[u32], vertex_count: usize) -> Vec<u32> {
    triangles(indices, vertex_count)
        .flatten()
        .map(|i| i as u32)
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8Unorm,     // Linear data
    Rgba8UnormSrgb, // Color data
}

#[derive(Clone, Debug)]
pub struct TextureData {
    pub name: String,
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// The source material as authored in the file. The viewer only ever reads
/// its diffuse texture; everything else is discarded when the material is
/// replaced by a viewer shader.
#[derive(Clone, Debug)]
pub struct MaterialData {
    pub name: String,
    pub base_color: [f32; 4],
    pub diffuse_texture: Option<usize>,
    pub normal_texture: Option<usize>,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            name: String::from("Default"),
            base_color: [1.0, 1.0, 1.0, 1.0],
            diffuse_texture: None,
            normal_texture: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ParsedNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
}

/// Everything decoded from one model file, before any GPU work.
#[derive(Clone, Debug, Default)]
pub struct ParsedModel {
    pub name: String,
    pub nodes: Vec<ParsedNode>,
    pub roots: Vec<usize>,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    pub textures: Vec<TextureData>,
}

/// One mesh occurrence found while walking the node hierarchy.
#[derive(Clone, Copy, Debug)]
pub struct MeshInstance {
    pub node: usize,
    pub mesh: usize,
    pub world: Mat4,
}

impl ParsedModel {
    pub fn ensure_tangents(&mut self) {
        self.meshes.par_iter_mut().for_each(MeshData::ensure_tangents);
    }

    /// Depth-first walk from the roots, parents before children, in file order.
    /// Calls `visit(node_index, parent_index, world_matrix)` for every node.
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(usize, Option<usize>, Mat4),
    {
        let mut stack: Vec<(usize, Option<usize>, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|&root| (root, None, Mat4::IDENTITY))
            .collect();
        let mut visited = vec![false; self.nodes.len()];

        while let Some((index, parent, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            // glTF forbids cycles, but a broken file must not hang the loader.
            if std::mem::replace(&mut visited[index], true) {
                continue;
            }

            let world = parent_world * node.transform.compute_matrix();
            visit(index, parent, world);

            for &child in node.children.iter().rev() {
                stack.push((child, Some(index), world));
            }
        }
    }

    pub fn mesh_instances(&self) -> Vec<MeshInstance> {
        let mut instances = Vec::new();
        self.traverse(|index, _, world| {
            if let Some(mesh) = self.nodes[index].mesh {
                if mesh < self.meshes.len() {
                    instances.push(MeshInstance {
                        node: index,
                        mesh,
                        world,
                    });
                }
            }
        });
        instances
    }
}
