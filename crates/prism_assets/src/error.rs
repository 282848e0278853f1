use std::path::PathBuf;

/// Why a model could not be fetched or decoded. Always recoverable: the
/// viewer reports it and keeps running.
#[derive(Debug, thiserror::Error)]
pub enum AssetLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse glTF {path}: {source}")]
    Gltf {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("mesh \"{mesh}\" is missing its {attribute} attribute")]
    MissingAttribute {
        mesh: String,
        attribute: &'static str,
    },
    #[error("no model available at {0}")]
    NotFound(String),
    #[error("asset worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
