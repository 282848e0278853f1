pub mod catalog;
pub mod error;
pub mod gltf_parser;
pub mod model;
pub mod source;
pub mod tangents;

pub use catalog::{AssetCatalog, ModelEntry, ViewerConfig};
pub use error::{AssetLoadError, ConfigError};
pub use model::{
    MaterialData, MeshData, MeshInstance, ParsedModel, ParsedNode, TextureData, TextureFormat, Vertex,
    valid_triangles,
};
pub use source::{GltfFileSource, ModelSource};
