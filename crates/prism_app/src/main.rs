//! Prism, an interactive glTF shader viewer.
//!
//! ```bash
//! prism
//! prism --config assets/prism.json
//! prism --model Boxes
//! ```
//!
//! Drag with the left mouse button to orbit, scroll to zoom.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use prism_assets::ViewerConfig;
use prism_core::IoTaskPool;

mod error;
mod gui;
mod input;
mod runner;

use crate::error::AppError;

#[derive(Parser)]
#[command(name = "prism")]
#[command(version, about = "Interactive glTF shader viewer")]
struct Args {
    /// JSON config with the model catalog and starting parameters
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Catalog model to show first, overrides the config
    #[arg(long, short = 'm')]
    model: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let mut config = ViewerConfig::load_or_default(args.config.as_deref())?;
    if let Some(model) = args.model {
        config.parameters.selected_model = model;
    }

    // Keep the runtime alive until the window closes.
    let runtime = IoTaskPool::build_runtime().map_err(AppError::Runtime)?;
    runner::run(config, IoTaskPool::from_runtime(&runtime))
}
