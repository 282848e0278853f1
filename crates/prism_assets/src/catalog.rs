use std::path::{Path, PathBuf};

use prism_core::{ParameterState, ShaderKind};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub path: PathBuf,
}

impl ModelEntry {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// The static menu of models and shaders offered to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetCatalog {
    models: Vec<ModelEntry>,
    shaders: Vec<ShaderKind>,
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self {
            models: vec![
                ModelEntry::new("Duck", "assets/models/duck.glb"),
                ModelEntry::new("Boxes", "assets/models/boxes.glb"),
            ],
            shaders: ShaderKind::ALL.to_vec(),
        }
    }
}

impl AssetCatalog {
    pub fn new(models: Vec<ModelEntry>, shaders: Vec<ShaderKind>) -> Self {
        Self { models, shaders }
    }

    pub fn models(&self) -> &[ModelEntry] {
        &self.models
    }

    pub fn shaders(&self) -> &[ShaderKind] {
        &self.shaders
    }

    pub fn find(&self, name: &str) -> Option<&ModelEntry> {
        self.models.iter().find(|entry| entry.name == name)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for entry in &mut self.models {
            if entry.path.is_relative() {
                entry.path = base.join(&entry.path);
            }
        }
    }
}

/// Startup configuration file: what to offer and what to start with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub catalog: AssetCatalog,
    pub parameters: ParameterState,
}

impl ViewerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads a config file. Relative model paths are resolved against the
    /// directory that contains it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(dir) = path.parent() {
            config.catalog.resolve_paths(dir);
        }
        log::info!(
            "Loaded config {} ({} models)",
            path.display(),
            config.catalog.models().len()
        );
        Ok(config)
    }

    /// Like [`ViewerConfig::load`], but a missing file means built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                log::warn!("Config {} not found, using built-in catalog", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// The starting parameters with an empty model or an unoffered shader
    /// replaced by the first catalog entry.
    pub fn initial_parameters(&self) -> ParameterState {
        let mut state = self.parameters.clone();

        if self.catalog.find(&state.selected_model).is_none() {
            if let Some(first) = self.catalog.models().first() {
                state.selected_model = first.name.clone();
            }
        }
        if !self.catalog.shaders().contains(&state.selected_shader) {
            if let Some(&first) = self.catalog.shaders().first() {
                state.selected_shader = first;
            }
        }
        state
    }
}
