use std::{any::Any, collections::HashMap, fmt};

use glam::Vec3;
use prism_assets::{TextureData, Vertex};
use prism_core::Rgb;

use crate::shaders::{ShaderProgram, ShaderUniforms};

/// Identifies one GPU allocation. Never reused within a [`GpuResources`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Geometry,
    Material,
    Texture,
}

impl ResourceKind {
    const COUNT: usize = 3;

    fn slot(self) -> usize {
        match self {
            ResourceKind::Geometry => 0,
            ResourceKind::Material => 1,
            ResourceKind::Texture => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
}

/// Vertex + index buffers. Not `Clone`: disposing consumes the handle.
#[derive(Debug, PartialEq, Eq)]
pub struct GeometryHandle {
    id: ResourceId,
    topology: Topology,
}

impl GeometryHandle {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct TextureHandle {
    id: ResourceId,
}

impl TextureHandle {
    pub fn id(&self) -> ResourceId {
        self.id
    }
}

/// A shader program living on the GPU.
#[derive(Debug)]
pub struct Material {
    id: ResourceId,
    program: ShaderProgram,
}

impl Material {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }
}

/// Flat-colored material used by every line overlay.
#[derive(Debug)]
pub struct LineMaterial {
    id: ResourceId,
    color: Rgb,
    opacity: f32,
}

impl LineMaterial {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }
}

pub enum GeometryUpload<'a> {
    Triangles {
        vertices: &'a [Vertex],
        indices: &'a [u32],
    },
    /// Pairs of points, one segment each.
    Lines { points: &'a [Vec3] },
}

impl GeometryUpload<'_> {
    /// True when there is not a single triangle or segment to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            GeometryUpload::Triangles { vertices, indices } => {
                vertices.is_empty() || indices.len() < 3
            }
            GeometryUpload::Lines { points } => points.len() < 2,
        }
    }
}

pub enum MaterialUpload<'a> {
    Program(&'a ShaderProgram),
    Line { color: Rgb, opacity: f32 },
}

/// Where allocations actually happen. The registry owns ids and bookkeeping,
/// a backend only mirrors them.
pub trait GpuBackend: Any {
    fn upload_geometry(&mut self, id: ResourceId, data: GeometryUpload<'_>);
    fn upload_texture(&mut self, id: ResourceId, data: &TextureData);
    fn upload_material(&mut self, id: ResourceId, data: MaterialUpload<'_>);
    fn update_material(&mut self, id: ResourceId, data: MaterialUpload<'_>);
    fn release(&mut self, id: ResourceId, kind: ResourceKind);

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Backend that allocates nothing. Used for headless runs and tests.
#[derive(Debug, Default)]
pub struct NullBackend;

impl GpuBackend for NullBackend {
    fn upload_geometry(&mut self, _id: ResourceId, _data: GeometryUpload<'_>) {}
    fn upload_texture(&mut self, _id: ResourceId, _data: &TextureData) {}
    fn upload_material(&mut self, _id: ResourceId, _data: MaterialUpload<'_>) {}
    fn update_material(&mut self, _id: ResourceId, _data: MaterialUpload<'_>) {}
    fn release(&mut self, _id: ResourceId, _kind: ResourceKind) {}

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceStats {
    created: [u64; ResourceKind::COUNT],
    disposed: [u64; ResourceKind::COUNT],
}

impl ResourceStats {
    pub fn created(&self, kind: ResourceKind) -> u64 {
        self.created[kind.slot()]
    }

    pub fn disposed(&self, kind: ResourceKind) -> u64 {
        self.disposed[kind.slot()]
    }

    pub fn live(&self, kind: ResourceKind) -> u64 {
        self.created(kind) - self.disposed(kind)
    }

    pub fn total_live(&self) -> u64 {
        [ResourceKind::Geometry, ResourceKind::Material, ResourceKind::Texture]
            .into_iter()
            .map(|kind| self.live(kind))
            .sum()
    }
}

/// Registry of every live GPU allocation.
///
/// Handles are only minted here and only come back through the `dispose_*`
/// methods, which take them by value. Counters make leaks observable.
pub struct GpuResources {
    backend: Box<dyn GpuBackend>,
    next_id: u64,
    live: HashMap<ResourceId, ResourceKind>,
    stats: ResourceStats,
}

impl GpuResources {
    pub fn new(backend: Box<dyn GpuBackend>) -> Self {
        Self {
            backend,
            next_id: 1,
            live: HashMap::new(),
            stats: ResourceStats::default(),
        }
    }

    pub fn headless() -> Self {
        Self::new(Box::new(NullBackend))
    }

    pub fn stats(&self) -> ResourceStats {
        self.stats
    }

    pub fn is_live(&self, id: ResourceId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn backend<B: GpuBackend>(&self) -> Option<&B> {
        self.backend.as_any().downcast_ref()
    }

    pub fn backend_mut<B: GpuBackend>(&mut self) -> Option<&mut B> {
        self.backend.as_any_mut().downcast_mut()
    }

    fn allocate(&mut self, kind: ResourceKind) -> ResourceId {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.live.insert(id, kind);
        self.stats.created[kind.slot()] += 1;
        id
    }

    fn free(&mut self, id: ResourceId, kind: ResourceKind) {
        if self.live.remove(&id).is_none() {
            // Handles are unique, so this means they came from another registry.
            log::error!("Disposing unknown {:?} {}", kind, id);
            return;
        }
        self.backend.release(id, kind);
        self.stats.disposed[kind.slot()] += 1;
    }

    /// Empty geometry still gets a handle, but nothing reaches the backend,
    /// which then skips it when drawing.
    fn create_geometry(&mut self, data: GeometryUpload<'_>, topology: Topology) -> GeometryHandle {
        let id = self.allocate(ResourceKind::Geometry);
        if data.is_empty() {
            log::debug!("Geometry {} is empty, nothing uploaded", id);
        } else {
            self.backend.upload_geometry(id, data);
        }
        GeometryHandle { id, topology }
    }

    pub fn create_mesh_geometry(&mut self, vertices: &[Vertex], indices: &[u32]) -> GeometryHandle {
        self.create_geometry(
            GeometryUpload::Triangles { vertices, indices },
            Topology::Triangles,
        )
    }

    pub fn create_line_geometry(&mut self, points: &[Vec3]) -> GeometryHandle {
        self.create_geometry(GeometryUpload::Lines { points }, Topology::Lines)
    }

    pub fn dispose_geometry(&mut self, geometry: GeometryHandle) {
        self.free(geometry.id, ResourceKind::Geometry);
    }

    pub fn create_texture(&mut self, data: &TextureData) -> TextureHandle {
        let id = self.allocate(ResourceKind::Texture);
        self.backend.upload_texture(id, data);
        TextureHandle { id }
    }

    pub fn dispose_texture(&mut self, texture: TextureHandle) {
        self.free(texture.id, ResourceKind::Texture);
    }

    pub fn create_material(&mut self, program: ShaderProgram) -> Material {
        let id = self.allocate(ResourceKind::Material);
        self.backend.upload_material(id, MaterialUpload::Program(&program));
        Material { id, program }
    }

    /// Edits uniforms in place; the GPU copy is refreshed, nothing is reallocated.
    pub fn update_material<F>(&mut self, material: &mut Material, edit: F)
    where
        F: FnOnce(&mut ShaderUniforms),
    {
        edit(&mut material.program.uniforms);
        self.backend
            .update_material(material.id, MaterialUpload::Program(&material.program));
    }

    pub fn dispose_material(&mut self, material: Material) {
        self.free(material.id, ResourceKind::Material);
    }

    pub fn create_line_material(&mut self, color: Rgb, opacity: f32) -> LineMaterial {
        let id = self.allocate(ResourceKind::Material);
        self.backend
            .upload_material(id, MaterialUpload::Line { color, opacity });
        LineMaterial { id, color, opacity }
    }

    pub fn update_line_material(&mut self, material: &mut LineMaterial, color: Rgb, opacity: f32) {
        if material.color == color && material.opacity == opacity {
            return;
        }
        material.color = color;
        material.opacity = opacity;
        self.backend
            .update_material(material.id, MaterialUpload::Line { color, opacity });
    }

    pub fn dispose_line_material(&mut self, material: LineMaterial) {
        self.free(material.id, ResourceKind::Material);
    }
}
