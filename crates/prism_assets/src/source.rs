use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{error::AssetLoadError, gltf_parser::parse_gltf, model::ParsedModel};

/// Where parsed models come from. The result is fully decoded, with
/// tangents present on every mesh; no GPU work has happened yet.
#[async_trait]
pub trait ModelSource: Send + Sync {
    async fn fetch(&self, path: &Path) -> Result<ParsedModel, AssetLoadError>;
}

/// Reads glTF files from disk, decoding on the blocking pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct GltfFileSource;

#[async_trait]
impl ModelSource for GltfFileSource {
    async fn fetch(&self, path: &Path) -> Result<ParsedModel, AssetLoadError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(AssetLoadError::NotFound(path.display().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AssetLoadError::NotFound(path.display().to_string()));
            }
            Err(source) => {
                return Err(AssetLoadError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        log::info!("[ModelSource] Loading: {}", path.display());
        let owned: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let mut model = parse_gltf(&owned)?;
            model.ensure_tangents();
            Ok(model)
        })
        .await
        .map_err(|e| AssetLoadError::Worker(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{GltfFileSource, ModelSource};
    use crate::error::AssetLoadError;

    #[tokio::test]
    async fn fixture_loads_with_tangents() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/quads.gltf");
        let model = GltfFileSource.fetch(&path).await.expect("fixture loads");

        assert_eq!(model.name, "quads");
        assert!(model.meshes.iter().all(|m| m.has_tangents));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = GltfFileSource
            .fetch(Path::new("does/not/exist.glb"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssetLoadError::NotFound(_)));
    }
}
