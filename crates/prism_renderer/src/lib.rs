pub mod context;
pub mod overlays;
pub mod resources;
pub mod shaders;
pub mod wgpu_backend;

pub use context::{RenderContext, RenderError};
pub use overlays::OverlayKinds;
pub use resources::{
    GeometryHandle, GpuBackend, GpuResources, LineMaterial, Material, NullBackend, ResourceId,
    ResourceKind, ResourceStats, TextureHandle, Topology,
};
pub use shaders::{
    ShaderCatalog, ShaderError, ShaderFeatures, ShaderOptions, ShaderProgram, ShaderUniforms,
    toon_band,
};
pub use wgpu_backend::{DrawItem, FrameGlobals, WgpuBackend};
