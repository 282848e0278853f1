use std::sync::Arc;

use glam::Mat4;
use prism_assets::{AssetCatalog, AssetLoadError, ModelSource, ParsedModel, ViewerConfig};
use prism_core::{
    IoTaskPool, ParameterState, ParameterStore, ParameterUpdate, Rgb, ShaderKind, UnknownShader,
    camera::OrbitController,
    tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
};
use prism_renderer::{
    DrawItem, FrameGlobals, GpuResources, ResourceStats, ShaderCatalog, ShaderError,
};

use crate::{
    error::ViewerError,
    lifecycle::{LoadState, LoadTicket, ModelLifecycle, ModelLoaded},
    model::{BuildContext, BuildParams, LoadedModel},
    scene::{Scene, SceneEnvironment},
    switcher::ShaderSwitcher,
};

/// A fetch that finished on the IO pool, waiting to be built on the main thread.
struct FetchResult {
    ticket: LoadTicket,
    result: Result<ParsedModel, AssetLoadError>,
}

/// The whole interactive session: parameters, scene, current model, camera.
///
/// Everything here lives on the main thread. Only fetching and parsing leave
/// it, through the IO pool, and come back in [`Viewer::poll`].
pub struct Viewer {
    store: ParameterStore,
    parameter_changes: UnboundedReceiver<ParameterState>,
    catalog: AssetCatalog,
    shaders: ShaderCatalog,
    scene: Scene,
    resources: GpuResources,
    lifecycle: ModelLifecycle,
    loaded: UnboundedReceiver<ModelLoaded>,
    switcher: ShaderSwitcher,
    camera: OrbitController,
    source: Arc<dyn ModelSource>,
    io: IoTaskPool,
    fetch_tx: UnboundedSender<FetchResult>,
    fetch_rx: UnboundedReceiver<FetchResult>,
    last_error: Option<String>,
}

impl Viewer {
    pub fn new(
        config: ViewerConfig,
        source: Arc<dyn ModelSource>,
        io: IoTaskPool,
        resources: GpuResources,
    ) -> Result<Self, ViewerError> {
        let initial = config.initial_parameters();
        let shaders = ShaderCatalog::builtin();
        for kind in config.catalog.shaders() {
            if !shaders.contains(*kind) {
                return Err(ShaderError::from(UnknownShader(kind.name().to_owned())).into());
            }
        }

        let mut store = ParameterStore::new(initial.clone());
        let parameter_changes = store.subscribe();
        let mut lifecycle = ModelLifecycle::new();
        let loaded = lifecycle.subscribe();
        let (fetch_tx, fetch_rx) = unbounded_channel();

        Ok(Self {
            store,
            parameter_changes,
            catalog: config.catalog,
            shaders,
            scene: Scene::new(SceneEnvironment::from_params(&initial)),
            resources,
            lifecycle,
            loaded,
            switcher: ShaderSwitcher::new(initial.selected_shader),
            camera: OrbitController::default(),
            source,
            io,
            fetch_tx,
            fetch_rx,
            last_error: None,
        })
    }

    /// Requests the initially selected model.
    pub fn start(&mut self) -> Result<(), ViewerError> {
        let name = self.store.state().selected_model.clone();
        if name.is_empty() {
            log::warn!("No model in the catalog, starting empty");
            return Ok(());
        }
        self.request_model(&name)
    }

    /// Starts loading a catalog model. The current model goes away right now;
    /// its replacement shows up in a later [`Viewer::poll`].
    pub fn request_model(&mut self, name: &str) -> Result<(), ViewerError> {
        let entry = self
            .catalog
            .find(name)
            .ok_or_else(|| ViewerError::UnknownModel(name.to_owned()))?;
        let path = entry.path.clone();

        let mut ctx = BuildContext {
            scene: &mut self.scene,
            resources: &mut self.resources,
            shaders: &self.shaders,
        };
        let ticket = self.lifecycle.begin_load(path, &mut ctx);
        log::info!("Loading model {} from {}", name, ticket.path().display());

        let source = Arc::clone(&self.source);
        let tx = self.fetch_tx.clone();
        self.io.handle().spawn(async move {
            let result = source.fetch(ticket.path()).await;
            if tx.send(FetchResult { ticket, result }).is_err() {
                log::debug!("Viewer dropped before a fetch finished");
            }
        });
        Ok(())
    }

    /// Applies everything that arrived since the last call: finished fetches,
    /// published models and parameter broadcasts.
    pub fn poll(&mut self) {
        while let Ok(FetchResult { ticket, result }) = self.fetch_rx.try_recv() {
            let params = BuildParams::from_state(self.store.state());
            let mut ctx = BuildContext {
                scene: &mut self.scene,
                resources: &mut self.resources,
                shaders: &self.shaders,
            };
            match self
                .lifecycle
                .complete_load(ticket, result, self.switcher.active(), &params, &mut ctx)
            {
                Ok(_) => {}
                Err(e) => self.last_error = Some(e.to_string()),
            }
        }

        while let Ok(event) = self.loaded.try_recv() {
            self.camera.frame_bounds(&event.bounds);
            self.last_error = None;
        }

        self.sync_parameters();
    }

    /// Stores `update`, then reloads, switches shader or just restyles,
    /// depending on which fields it carries.
    pub fn apply(&mut self, update: ParameterUpdate) -> Result<(), ViewerError> {
        if update.is_empty() {
            return Ok(());
        }
        // Reselecting the model after a failed load retries it.
        let model_changed = update.selected_model.as_ref().is_some_and(|name| {
            *name != self.store.state().selected_model || self.load_state() == LoadState::Empty
        });
        let shader = update.selected_shader;

        if let Some(name) = &update.selected_model {
            if self.catalog.find(name).is_none() {
                return Err(ViewerError::UnknownModel(name.clone()));
            }
        }
        if let Some(kind) = shader {
            if !self.shaders.contains(kind) {
                return Err(ShaderError::from(UnknownShader(kind.name().to_owned())).into());
            }
        }

        self.store.update(update);
        self.sync_parameters();

        if let Some(kind) = shader {
            let params = BuildParams::from_state(self.store.state());
            let mut ctx = BuildContext {
                scene: &mut self.scene,
                resources: &mut self.resources,
                shaders: &self.shaders,
            };
            self.switcher
                .switch(kind, self.lifecycle.current_mut(), &params, &mut ctx)?;
        }

        if model_changed {
            let name = self.store.state().selected_model.clone();
            self.request_model(&name)?;
        }
        Ok(())
    }

    fn sync_parameters(&mut self) {
        let mut latest = None;
        while let Ok(state) = self.parameter_changes.try_recv() {
            latest = Some(state);
        }
        let Some(state) = latest else {
            return;
        };

        self.scene.environment.sync(&state);
        let params = BuildParams::from_state(&state);
        let mut ctx = BuildContext {
            scene: &mut self.scene,
            resources: &mut self.resources,
            shaders: &self.shaders,
        };
        if let Some(model) = self.lifecycle.current_mut() {
            model.apply_cosmetics(&params, &mut ctx);
        }
    }

    pub fn draw_list(&self) -> Vec<DrawItem> {
        self.scene.draw_list()
    }

    pub fn frame_globals(&self) -> FrameGlobals {
        let env = &self.scene.environment;
        FrameGlobals {
            view: self.camera.view_matrix(),
            projection: self.camera.camera.compute_projection_matrix(),
            camera_position: self.camera.position(),
            sun_direction: env.sun_direction(),
            sun_color: env.sun_color.scaled(env.sun_intensity),
            ambient_color: env.ambient_color.scaled(env.ambient_intensity),
        }
    }

    pub fn background(&self) -> Rgb {
        self.scene.environment.background
    }

    pub fn camera(&self) -> &OrbitController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitController {
        &mut self.camera
    }

    pub fn view_projection(&self) -> Mat4 {
        self.camera.view_projection()
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.camera.camera.set_viewport(width, height);
    }

    pub fn state(&self) -> &ParameterState {
        self.store.state()
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn load_state(&self) -> LoadState {
        self.lifecycle.state()
    }

    pub fn current_model(&self) -> Option<&LoadedModel> {
        self.lifecycle.current()
    }

    pub fn active_shader(&self) -> ShaderKind {
        self.switcher.active()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn resource_stats(&self) -> ResourceStats {
        self.resources.stats()
    }

    /// The renderer reaches its backend through here.
    pub fn resources_mut(&mut self) -> &mut GpuResources {
        &mut self.resources
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Releases the current model. Used on shutdown.
    pub fn shutdown(&mut self) {
        let mut ctx = BuildContext {
            scene: &mut self.scene,
            resources: &mut self.resources,
            shaders: &self.shaders,
        };
        self.lifecycle.dispose(&mut ctx);
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use prism_assets::{AssetCatalog, ModelEntry, ViewerConfig};
    use prism_core::{IoTaskPool, ParameterState, ParameterUpdate, Rgb, ShaderKind};
    use prism_renderer::{GpuResources, ResourceKind, ShaderUniforms};

    use super::Viewer;
    use crate::{
        error::ViewerError,
        lifecycle::LoadState,
        testing::{MemorySource, one_mesh_model, two_mesh_model},
    };

    fn config() -> ViewerConfig {
        ViewerConfig {
            catalog: AssetCatalog::new(
                vec![
                    ModelEntry::new("Two", "two.gltf"),
                    ModelEntry::new("One", "one.gltf"),
                    ModelEntry::new("Missing", "missing.gltf"),
                ],
                ShaderKind::ALL.to_vec(),
            ),
            parameters: ParameterState::default(),
        }
    }

    fn viewer(runtime: &prism_core::tokio::runtime::Runtime) -> Viewer {
        let source = MemorySource::default()
            .with("two.gltf", two_mesh_model())
            .with("one.gltf", one_mesh_model());
        Viewer::new(
            config(),
            Arc::new(source),
            IoTaskPool::from_runtime(runtime),
            GpuResources::headless(),
        )
        .unwrap()
    }

    /// Polls until the pending load settled.
    fn settle(viewer: &mut Viewer) {
        for _ in 0..200 {
            viewer.poll();
            if viewer.load_state() != LoadState::Loading {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("load never settled");
    }

    #[test]
    fn start_loads_the_first_catalog_model_and_frames_it() {
        let runtime = IoTaskPool::build_runtime().unwrap();
        let mut viewer = viewer(&runtime);
        assert_eq!(viewer.state().selected_model, "Two");

        viewer.start().unwrap();
        assert_eq!(viewer.load_state(), LoadState::Loading);
        settle(&mut viewer);

        assert_eq!(viewer.load_state(), LoadState::Ready);
        assert_eq!(viewer.current_model().unwrap().mesh_count(), 2);
        assert_eq!(viewer.camera().target, viewer.current_model().unwrap().bounds().center());
        // One mesh node per mesh, plus all four overlays.
        assert_eq!(viewer.draw_list().len(), 2 * 5);
    }

    #[test]
    fn model_change_reloads_and_failure_is_reported() {
        let runtime = IoTaskPool::build_runtime().unwrap();
        let mut viewer = viewer(&runtime);
        viewer.start().unwrap();
        settle(&mut viewer);

        viewer
            .apply(ParameterUpdate {
                selected_model: Some("One".into()),
                ..Default::default()
            })
            .unwrap();
        settle(&mut viewer);
        assert_eq!(viewer.current_model().unwrap().mesh_count(), 1);
        assert_eq!(viewer.resource_stats().live(ResourceKind::Texture), 0);

        viewer
            .apply(ParameterUpdate {
                selected_model: Some("Missing".into()),
                ..Default::default()
            })
            .unwrap();
        settle(&mut viewer);
        assert_eq!(viewer.load_state(), LoadState::Empty);
        assert!(viewer.last_error().is_some());
        assert_eq!(viewer.resource_stats().total_live(), 0);
    }

    #[test]
    fn reselecting_after_a_failed_load_retries() {
        let runtime = IoTaskPool::build_runtime().unwrap();
        let mut viewer = viewer(&runtime);
        let missing = || ParameterUpdate {
            selected_model: Some("Missing".into()),
            ..Default::default()
        };

        viewer.apply(missing()).unwrap();
        settle(&mut viewer);
        assert_eq!(viewer.load_state(), LoadState::Empty);
        let generation = viewer.lifecycle.generation();

        viewer.apply(missing()).unwrap();
        assert_eq!(viewer.load_state(), LoadState::Loading);
        assert_eq!(viewer.lifecycle.generation(), generation + 1);
        settle(&mut viewer);

        // With a model on screen the same name is a no-op.
        viewer
            .apply(ParameterUpdate {
                selected_model: Some("One".into()),
                ..Default::default()
            })
            .unwrap();
        settle(&mut viewer);
        let generation = viewer.lifecycle.generation();
        viewer
            .apply(ParameterUpdate {
                selected_model: Some("One".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(viewer.load_state(), LoadState::Ready);
        assert_eq!(viewer.lifecycle.generation(), generation);
    }

    #[test]
    fn unknown_model_is_rejected_before_anything_changes() {
        let runtime = IoTaskPool::build_runtime().unwrap();
        let mut viewer = viewer(&runtime);

        let err = viewer
            .apply(ParameterUpdate {
                selected_model: Some("Teapot".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ViewerError::UnknownModel(name) if name == "Teapot"));
        assert_eq!(viewer.state().selected_model, "Two");
    }

    #[test]
    fn shader_and_cosmetic_updates_reach_the_model() {
        let runtime = IoTaskPool::build_runtime().unwrap();
        let mut viewer = viewer(&runtime);
        viewer.start().unwrap();
        settle(&mut viewer);

        viewer
            .apply(ParameterUpdate {
                selected_shader: Some(ShaderKind::Silhouette),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(viewer.active_shader(), ShaderKind::Silhouette);

        viewer
            .apply(ParameterUpdate {
                color: Some(Rgb::BLUE),
                ..Default::default()
            })
            .unwrap();
        let model = viewer.current_model().unwrap();
        assert!(model.materials().iter().all(|m| matches!(
            m.program().uniforms,
            ShaderUniforms::Silhouette { color } if color == Rgb::BLUE
        )));

        viewer
            .apply(ParameterUpdate {
                normals_visible: Some(false),
                tangents_visible: Some(false),
                bounding_box_visible: Some(false),
                wireframe_visible: Some(false),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(viewer.draw_list().len(), 2);

        viewer
            .apply(ParameterUpdate {
                background_color: Some(Rgb::BLACK),
                sun_light_intensity: Some(0.0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(viewer.background(), Rgb::BLACK);
        assert_eq!(viewer.frame_globals().sun_color, Rgb::BLACK);
    }
}
