//! Batch baker for static storefront assets.
//!
//! Reads an ordered run description from `bake.ron`, bakes one palette texture
//! per texture job, then rewrites each mesh with planar UVs and a material link.
//!
//! Run with: `cargo run -p glaze-bake -- --config bake.ron`

mod pipeline;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use glaze_config::{CliArgs, Config};
use tracing::{error, info};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let existed = args.config.exists();
    let loaded = Config::load_or_create(&args.config).map(|mut config| {
        config.apply_cli_overrides(&args);
        if let Some(dir) = args.config.parent() {
            config.resolve_paths(dir);
        }
        config
    });

    let log_dir = log_dir_for(&args.config);
    glaze_log::init_logging(Some(&log_dir), cfg!(debug_assertions), loaded.as_ref().ok());

    let config = match loaded {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    // The subscriber did not exist yet while the config was loading.
    if existed {
        info!("Loaded config from {}", args.config.display());
    } else {
        info!("Created default config at {}", args.config.display());
    }

    info!(
        "Config {} | seed={} | {} texture job(s), {} mesh job(s)",
        args.config.display(),
        config.run.seed,
        config.textures.len(),
        config.meshes.len(),
    );

    match pipeline::run(&config) {
        Ok(report) => {
            info!(
                "Done: {} texture(s), {} mesh(es)",
                report.textures, report.meshes
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Debug-build JSON logs go to `logs/` beside the config file.
fn log_dir_for(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("logs")
}
