//! Configuration structs with sensible defaults and RON persistence.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level baker configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Run-wide settings.
    pub run: RunConfig,
    /// Palette extraction tuning.
    pub palette: PaletteConfig,
    /// Texture synthesis tuning.
    pub texture: TextureConfig,
    /// Textures to bake, in declared order.
    pub textures: Vec<TextureJob>,
    /// Meshes to rewrite, in declared order.
    pub meshes: Vec<MeshJob>,
}

/// Run-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Seed for the single random stream shared by every texture job.
    pub seed: u64,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

/// Palette extraction tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaletteConfig {
    /// Samples whose mean channel value is at or below this are ignored.
    pub brightness_threshold: f32,
    /// Maximum number of clustering iterations.
    pub max_iterations: u32,
    /// Clustering stops once every centroid moves less than this.
    pub convergence_tolerance: f32,
    /// Reference images are downsampled so their longer side fits this bound.
    pub downsample_limit: u32,
}

/// Texture synthesis tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextureConfig {
    /// Edge length of the square output texture in pixels.
    pub size: u32,
    /// Standard deviation of the per-channel Gaussian noise.
    pub noise_sigma: f32,
}

/// One texture to bake from a reference photograph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextureJob {
    /// Reference image the palette is extracted from.
    pub reference: PathBuf,
    /// Destination PNG.
    pub output: PathBuf,
    /// Requested palette size.
    #[serde(default = "default_clusters")]
    pub clusters: usize,
}

/// One mesh to rewrite with planar UVs and a material link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeshJob {
    /// OBJ file, rewritten in place.
    pub mesh: PathBuf,
    /// Texture path written verbatim into the material file (relative to the mesh).
    pub texture_path: String,
    /// Material name used by `newmtl` and `usemtl`.
    pub material_name: String,
}

fn default_clusters() -> usize {
    5
}

// --- Default implementations ---

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            log_level: "info".to_string(),
        }
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            brightness_threshold: 0.05,
            max_iterations: 12,
            convergence_tolerance: 1e-3,
            downsample_limit: 256,
        }
    }
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            size: 1024,
            noise_sigma: 0.035,
        }
    }
}

// --- Load / Save ---

impl Config {
    /// Load and parse the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load the config at `path`, or write a default one there if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Config::default();
            config.save(path)?;
            log::info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config to `path` as pretty-printed RON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(ConfigError::WriteError)?;
        }

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Rebase relative input and output paths onto `base` (usually the config file's directory).
    ///
    /// `MeshJob::texture_path` is left untouched: it is a reference stored in the
    /// material file, not a path this process opens.
    pub fn resolve_paths(&mut self, base: &Path) {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for job in &mut self.textures {
            rebase(&mut job.reference);
            rebase(&mut job.output);
        }
        for job in &mut self.meshes {
            rebase(&mut job.mesh);
        }
    }

    /// Check that the run is executable and that no two jobs write the same file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.texture.size < 2 {
            return Err(ConfigError::Invalid(format!(
                "texture size {} must be at least 2",
                self.texture.size
            )));
        }
        if !self.texture.noise_sigma.is_finite() || self.texture.noise_sigma < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "noise sigma {} must be finite and non-negative",
                self.texture.noise_sigma
            )));
        }
        if self.palette.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.palette.downsample_limit == 0 {
            return Err(ConfigError::Invalid(
                "downsample_limit must be at least 1".to_string(),
            ));
        }

        let mut outputs: HashSet<PathBuf> = HashSet::new();
        let mut claim = |path: PathBuf| {
            if outputs.insert(path.clone()) {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!(
                    "{} is written by more than one job",
                    path.display()
                )))
            }
        };

        for job in &self.textures {
            if job.clusters == 0 {
                return Err(ConfigError::Invalid(format!(
                    "texture job for {} requests zero clusters",
                    job.output.display()
                )));
            }
            claim(job.output.clone())?;
        }
        for job in &self.meshes {
            if job.material_name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "mesh job for {} has an empty material name",
                    job.mesh.display()
                )));
            }
            claim(job.mesh.clone())?;
            claim(job.mesh.with_extension("mtl"))?;
        }
        Ok(())
    }
}
