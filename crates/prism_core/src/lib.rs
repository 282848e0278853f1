pub use glam;
pub use tokio;

pub mod bounds;
pub mod camera;
pub mod color;
pub mod events;
pub mod params;
pub mod shader;
pub mod transform;

pub use bounds::Aabb;
pub use color::Rgb;
pub use events::EventChannel;
pub use params::{ParameterState, ParameterStore, ParameterUpdate};
pub use shader::{ShaderKind, UnknownShader};

/// Handle to the dedicated I/O runtime.
/// Anything that may block (file reads, glTF decoding) is spawned through it,
/// the main thread only ever receives the finished results.
#[derive(Clone)]
pub struct IoTaskPool(pub tokio::runtime::Handle);

impl IoTaskPool {
    /// Builds the multi-threaded runtime that backs the pool.
    /// The caller keeps the runtime alive for as long as the pool is used.
    pub fn build_runtime() -> std::io::Result<tokio::runtime::Runtime> {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("prism-io")
            .build()
    }

    pub fn from_runtime(runtime: &tokio::runtime::Runtime) -> Self {
        Self(runtime.handle().clone())
    }

    pub fn handle(&self) -> &tokio::runtime::Handle {
        &self.0
    }
}
