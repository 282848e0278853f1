use std::path::{Path, PathBuf};

use prism_assets::{AssetLoadError, ModelSource, ParsedModel};
use prism_core::{Aabb, EventChannel, ShaderKind, tokio::sync::mpsc::UnboundedReceiver};

use crate::{
    builder::ModelBuilder,
    error::LoadError,
    model::{BuildContext, BuildParams, LoadedModel},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Empty,
    Loading,
    Ready,
}

/// Proof of a started load. Only the ticket of the latest request can publish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    path: PathBuf,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Emitted once per published model.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelLoaded {
    pub generation: u64,
    pub path: PathBuf,
    pub bounds: Aabb,
    pub mesh_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Published,
    /// A newer request superseded this one; its result was dropped.
    Discarded,
}

/// Owns the one current model and sequences load, publish and teardown.
pub struct ModelLifecycle {
    current: Option<LoadedModel>,
    state: LoadState,
    generation: u64,
    loaded: EventChannel<ModelLoaded>,
}

impl Default for ModelLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelLifecycle {
    pub fn new() -> Self {
        Self {
            current: None,
            state: LoadState::Empty,
            generation: 0,
            loaded: EventChannel::new(),
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current(&self) -> Option<&LoadedModel> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut LoadedModel> {
        self.current.as_mut()
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<ModelLoaded> {
        self.loaded.subscribe()
    }

    /// Tears the current model down right away and invalidates any load in flight.
    pub fn begin_load(&mut self, path: impl Into<PathBuf>, ctx: &mut BuildContext<'_>) -> LoadTicket {
        self.teardown(ctx);
        self.generation += 1;
        self.state = LoadState::Loading;

        let ticket = LoadTicket {
            generation: self.generation,
            path: path.into(),
        };
        log::debug!(
            "Load #{} started for {}",
            ticket.generation,
            ticket.path.display()
        );
        ticket
    }

    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        fetched: Result<ParsedModel, AssetLoadError>,
        shader: ShaderKind,
        params: &BuildParams,
        ctx: &mut BuildContext<'_>,
    ) -> Result<LoadOutcome, LoadError> {
        if ticket.generation != self.generation || self.state != LoadState::Loading {
            log::debug!(
                "Dropping stale load #{} of {} (latest is #{})",
                ticket.generation,
                ticket.path.display(),
                self.generation
            );
            return Ok(LoadOutcome::Discarded);
        }

        let built = fetched.map_err(LoadError::from).and_then(|parsed| {
            ModelBuilder::new(shader, params)
                .build(parsed, ticket.path.clone(), ctx)
                .map_err(LoadError::from)
        });

        match built {
            Ok(model) => {
                let event = ModelLoaded {
                    generation: ticket.generation,
                    path: ticket.path,
                    bounds: model.bounds(),
                    mesh_count: model.mesh_count(),
                };
                self.current = Some(model);
                self.state = LoadState::Ready;
                self.loaded.emit(&event);
                Ok(LoadOutcome::Published)
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", ticket.path.display(), e);
                self.state = LoadState::Empty;
                Err(e)
            }
        }
    }

    /// Starts a load, waits for the source and publishes the result.
    pub async fn load(
        &mut self,
        source: &dyn ModelSource,
        path: impl Into<PathBuf>,
        shader: ShaderKind,
        params: &BuildParams,
        ctx: &mut BuildContext<'_>,
    ) -> Result<LoadOutcome, LoadError> {
        let ticket = self.begin_load(path, ctx);
        let fetched = source.fetch(ticket.path()).await;
        self.complete_load(ticket, fetched, shader, params, ctx)
    }

    /// Releases the current model, if any. Pending loads will not publish.
    pub fn dispose(&mut self, ctx: &mut BuildContext<'_>) {
        self.teardown(ctx);
        if self.state == LoadState::Loading {
            self.generation += 1;
        }
        self.state = LoadState::Empty;
    }

    fn teardown(&mut self, ctx: &mut BuildContext<'_>) {
        if let Some(model) = self.current.take() {
            model.dispose(ctx);
        }
    }
}
