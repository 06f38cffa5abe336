//! Executes a validated run: texture jobs first, then mesh jobs, each list in
//! declared order.
//!
//! The random stream is seeded once per run and threaded through every texture
//! job, so reordering jobs changes their output while a fixed config and seed
//! reproduce it exactly.

use std::path::PathBuf;

use glaze_assets::obj::{self, ObjError, RewriteSummary};
use glaze_assets::{
    Palette, PaletteError, PaletteParams, TextureError, TextureParams, extract_palette,
    load_reference_pixels, save_texture, synthesize_texture,
};
use glaze_config::{Config, ConfigError, MeshJob, TextureJob};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::info;

/// Any failure that aborts a run.
#[derive(Debug, Error)]
pub enum BakeError {
    /// The configuration describes an impossible run.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reading or clustering a reference image failed.
    #[error(transparent)]
    Palette(#[from] PaletteError),

    /// Synthesizing or writing a texture failed.
    #[error(transparent)]
    Texture(#[from] TextureError),

    /// Rewriting a mesh failed.
    #[error("mesh {}: {source}", path.display())]
    Mesh {
        /// Mesh being rewritten.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: ObjError,
    },
}

/// Counts of completed jobs.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub textures: usize,
    pub meshes: usize,
}

/// Texture baking state for one run: tuning plus the shared random stream.
pub struct TextureBaker {
    rng: ChaCha8Rng,
    palette: PaletteParams,
    texture: TextureParams,
    downsample_limit: u32,
}

impl TextureBaker {
    pub fn new(config: &Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.run.seed),
            palette: PaletteParams {
                brightness_threshold: config.palette.brightness_threshold,
                max_iterations: config.palette.max_iterations,
                convergence_tolerance: config.palette.convergence_tolerance,
            },
            texture: TextureParams {
                size: config.texture.size,
                noise_sigma: config.texture.noise_sigma,
            },
            downsample_limit: config.palette.downsample_limit,
        }
    }

    /// Reference image → palette → texture on disk.
    pub fn bake(&mut self, job: &TextureJob) -> Result<Palette, BakeError> {
        let pixels = load_reference_pixels(&job.reference, self.downsample_limit)?;
        let palette = extract_palette(&pixels, job.clusters, &self.palette, &mut self.rng)?;
        let image = synthesize_texture(&palette, &self.texture, &mut self.rng)?;
        save_texture(&image, &job.output)?;

        info!(
            "Wrote {} using palette {:?}",
            job.output.display(),
            palette.to_rgb8()
        );
        Ok(palette)
    }
}

/// Rewrites one mesh and its material file.
pub fn rewrite_mesh(job: &MeshJob) -> Result<RewriteSummary, BakeError> {
    let summary = obj::rewrite_obj(&job.mesh, &job.texture_path, &job.material_name).map_err(
        |source| BakeError::Mesh {
            path: job.mesh.clone(),
            source,
        },
    )?;

    info!(
        "Rewrote {} ({} vertices, {} faces) with material {} -> {}",
        summary.mesh_path.display(),
        summary.vertex_count,
        summary.face_count,
        job.material_name,
        summary.material_path.display(),
    );
    Ok(summary)
}

/// Validates `config` and runs every job, stopping at the first failure.
pub fn run(config: &Config) -> Result<RunReport, BakeError> {
    config.validate()?;

    let mut report = RunReport::default();

    let mut baker = TextureBaker::new(config);
    for job in &config.textures {
        baker.bake(job)?;
        report.textures += 1;
    }

    for job in &config.meshes {
        rewrite_mesh(job)?;
        report.meshes += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const CAKE: &str = "# cake\n\
                        o Cake\n\
                        v 0 0 0\n\
                        v 1 0.5 0\n\
                        v 1 0.5 1\n\
                        v 0 0 1\n\
                        s off\n\
                        f 1 2 3 4\n";

    fn write_reference(path: &Path) {
        let mut img = image::RgbImage::new(40, 30);
        for (x, _, px) in img.enumerate_pixels_mut() {
            *px = if x < 20 {
                image::Rgb([240, 220, 200])
            } else {
                image::Rgb([150, 80, 40])
            };
        }
        img.save(path).unwrap();
    }

    fn site(dir: &Path) -> Config {
        write_reference(&dir.join("photo.png"));
        std::fs::write(dir.join("cake.obj"), CAKE).unwrap();

        let mut config = Config {
            textures: vec![TextureJob {
                reference: "photo.png".into(),
                output: "assets/textures/cake_palette.png".into(),
                clusters: 2,
            }],
            meshes: vec![MeshJob {
                mesh: "cake.obj".into(),
                texture_path: "assets/textures/cake_palette.png".to_string(),
                material_name: "cake_texture".to_string(),
            }],
            ..Config::default()
        };
        config.texture.size = 64;
        config.resolve_paths(dir);
        config
    }

    #[test]
    fn test_full_run_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = site(dir.path());

        let report = run(&config).unwrap();

        assert_eq!(report, RunReport { textures: 1, meshes: 1 });
        let texture = image::open(dir.path().join("assets/textures/cake_palette.png")).unwrap();
        assert_eq!((texture.width(), texture.height()), (64, 64));

        let obj = std::fs::read_to_string(dir.path().join("cake.obj")).unwrap();
        assert!(obj.contains("mtllib cake.mtl\n"));
        assert!(obj.contains("usemtl cake_texture\nf 1/1 2/2 3/3 4/4\n"));

        let mtl = std::fs::read_to_string(dir.path().join("cake.mtl")).unwrap();
        assert!(mtl.contains("map_Kd assets/textures/cake_palette.png\n"));
    }

    #[test]
    fn test_same_seed_reproduces_texture() {
        let dir = tempfile::tempdir().unwrap();
        let config = site(dir.path());
        let output = dir.path().join("assets/textures/cake_palette.png");

        let mut first = TextureBaker::new(&config);
        let palette_a = first.bake(&config.textures[0]).unwrap();
        let bytes_a = std::fs::read(&output).unwrap();

        let mut second = TextureBaker::new(&config);
        let palette_b = second.bake(&config.textures[0]).unwrap();
        let bytes_b = std::fs::read(&output).unwrap();

        assert_eq!(palette_a, palette_b);
        assert_eq!(bytes_a, bytes_b);
    }

    #[test]
    fn test_palette_from_two_tone_photo() {
        let dir = tempfile::tempdir().unwrap();
        let config = site(dir.path());
        let palette = TextureBaker::new(&config).bake(&config.textures[0]).unwrap();
        assert_eq!(palette.to_rgb8(), vec![[240, 220, 200], [150, 80, 40]]);
    }

    #[test]
    fn test_rerun_is_stable_for_meshes() {
        let dir = tempfile::tempdir().unwrap();
        let config = site(dir.path());
        run(&config).unwrap();
        let first = std::fs::read_to_string(dir.path().join("cake.obj")).unwrap();
        run(&config).unwrap();
        let second = std::fs::read_to_string(dir.path().join("cake.obj")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_vertices_aborts_with_mesh_context() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = site(dir.path());
        config.textures.clear();
        std::fs::write(&config.meshes[0].mesh, "# no geometry\n").unwrap();

        let err = run(&config).unwrap_err();
        assert!(matches!(
            err,
            BakeError::Mesh {
                source: ObjError::NoVertices,
                ..
            }
        ));
        assert!(!dir.path().join("cake.mtl").exists());
    }

    #[test]
    fn test_invalid_config_rejected_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = site(dir.path());
        config.textures[0].clusters = 0;

        assert!(matches!(run(&config), Err(BakeError::Config(_))));
        assert!(!dir.path().join("assets").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("cake.obj")).unwrap(),
            CAKE
        );
    }

    #[test]
    fn test_undecodable_reference_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = site(dir.path());
        std::fs::write(&config.textures[0].reference, b"garbage").unwrap();

        let err = run(&config).unwrap_err();
        assert!(matches!(err, BakeError::Palette(PaletteError::Decode { .. })));
    }
}
