//! Command-line argument parsing for the glaze baker.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// glaze command-line arguments.
///
/// CLI values override settings loaded from the config file.
#[derive(Parser, Debug)]
#[command(
    name = "glaze-bake",
    about = "Bake palette textures and planar UVs into static 3D assets"
)]
pub struct CliArgs {
    /// Path to the RON run configuration.
    #[arg(long, default_value = "bake.ron")]
    pub config: PathBuf,

    /// Seed for the shared random stream.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Edge length of generated textures in pixels.
    #[arg(long)]
    pub texture_size: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Only bake textures; skip mesh rewriting.
    #[arg(long, conflicts_with = "meshes_only")]
    pub textures_only: bool,

    /// Only rewrite meshes; skip texture baking.
    #[arg(long)]
    pub meshes_only: bool,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.run.seed = seed;
        }
        if let Some(size) = args.texture_size {
            self.texture.size = size;
        }
        if let Some(ref level) = args.log_level {
            self.run.log_level = level.clone();
        }
        if args.textures_only {
            self.meshes.clear();
        }
        if args.meshes_only {
            self.textures.clear();
        }
    }
}
