pub mod builder;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod scene;
pub mod switcher;
pub mod viewer;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::ModelBuilder;
pub use error::{BuildError, LoadError, ViewerError};
pub use lifecycle::{LoadOutcome, LoadState, LoadTicket, ModelLifecycle, ModelLoaded};
pub use model::{
    BuildContext, BuildDiagnostic, BuildParams, LoadedModel, MeshRecord, Overlay, Overlays,
};
pub use scene::{NodeContent, NodeId, Scene, SceneEnvironment, SceneNode};
pub use switcher::{ShaderSwitcher, SwitchOutcome};
pub use viewer::Viewer;
