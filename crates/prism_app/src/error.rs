use prism_assets::ConfigError;
use prism_renderer::RenderError;
use prism_scene::ViewerError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start the IO runtime: {0}")]
    Runtime(std::io::Error),
    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Viewer(#[from] ViewerError),
}
