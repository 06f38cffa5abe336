//! Configuration system for the glaze asset baker.
//!
//! A run is described by a single RON file holding the tuning parameters for
//! palette extraction and texture synthesis plus two ordered job lists: textures
//! to bake and meshes to rewrite. Supports CLI overrides via clap and validation
//! of the job lists before any output is touched.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, MeshJob, PaletteConfig, RunConfig, TextureConfig, TextureJob};
pub use error::ConfigError;
