use prism_assets::AssetLoadError;
use prism_renderer::ShaderError;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to build material: {0}")]
    Shader(#[from] ShaderError),
}

/// Why a load did not produce a model. The viewer stays usable afterwards.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Asset(#[from] AssetLoadError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("model \"{0}\" is not in the catalog")]
    UnknownModel(String),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
}
