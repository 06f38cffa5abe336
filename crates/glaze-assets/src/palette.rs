//! Palette extraction: reduces a reference photograph to a handful of
//! representative colors with k-means clustering in RGB space.
//!
//! Dark samples (background, shadows) are filtered out before clustering so the
//! palette reflects the subject. Centroids are seeded from a caller-supplied
//! random stream, which makes the result reproducible for a fixed seed.

use std::path::{Path, PathBuf};

use glam::Vec3;
use image::DynamicImage;
use image::imageops::FilterType;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// PaletteError
// ---------------------------------------------------------------------------

/// Errors returned while reading a reference image or clustering its samples.
#[derive(Debug, Error)]
pub enum PaletteError {
    /// The reference image could not be opened or decoded.
    #[error("failed to decode reference image {}: {source}", path.display())]
    Decode {
        /// Reference image path.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// There were no samples to cluster.
    #[error("no samples to cluster")]
    NoSamples,
}

// ---------------------------------------------------------------------------
// PaletteParams
// ---------------------------------------------------------------------------

/// Tuning for [`extract_palette`].
#[derive(Clone, Debug, PartialEq)]
pub struct PaletteParams {
    /// Samples whose mean channel value is `<=` this are excluded.
    pub brightness_threshold: f32,
    /// Upper bound on assignment/update rounds.
    pub max_iterations: u32,
    /// Clustering stops once no centroid moved this far in one round.
    pub convergence_tolerance: f32,
}

impl Default for PaletteParams {
    fn default() -> Self {
        Self {
            brightness_threshold: 0.05,
            max_iterations: 12,
            convergence_tolerance: 1e-3,
        }
    }
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// A non-empty list of RGB colors (channels in `[0, 1]`), brightest first.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: Vec<Vec3>,
}

impl Palette {
    /// Builds a palette from arbitrary colors, sorting them by descending brightness.
    ///
    /// Returns `None` if `colors` is empty.
    pub fn new(mut colors: Vec<Vec3>) -> Option<Self> {
        if colors.is_empty() {
            return None;
        }
        colors.sort_by(|a, b| brightness(*b).total_cmp(&brightness(*a)));
        Some(Self { colors })
    }

    /// Colors in palette order.
    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    /// Number of colors.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the palette has no colors.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colors rounded to 8-bit channels, for reporting.
    pub fn to_rgb8(&self) -> Vec<[u8; 3]> {
        self.colors
            .iter()
            .map(|c| {
                let c = (c.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
                [c.x as u8, c.y as u8, c.z as u8]
            })
            .collect()
    }
}

/// Mean of the three channels.
#[inline]
pub(crate) fn brightness(color: Vec3) -> f32 {
    color.element_sum() / 3.0
}

// ---------------------------------------------------------------------------
// Reference image loading
// ---------------------------------------------------------------------------

/// Opens a reference image and returns its samples, downsampled so the longer
/// side is at most `max_dimension` pixels.
pub fn load_reference_pixels(path: &Path, max_dimension: u32) -> Result<Vec<Vec3>, PaletteError> {
    let image = image::open(path).map_err(|source| PaletteError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(pixels_from_image(&image, max_dimension))
}

/// Converts a decoded image into row-major RGB samples in `[0, 1]`.
///
/// Images larger than `max_dimension` on their longer side are shrunk with a
/// Lanczos filter, preserving aspect ratio.
pub fn pixels_from_image(image: &DynamicImage, max_dimension: u32) -> Vec<Vec3> {
    let (width, height) = (image.width(), image.height());
    let scale = width.max(height) as f32 / max_dimension.max(1) as f32;

    let rgb = if scale > 1.0 {
        let w = ((width as f32 / scale) as u32).max(1);
        let h = ((height as f32 / scale) as u32).max(1);
        debug!(width, height, w, h, "downsampling reference image");
        image.resize_exact(w, h, FilterType::Lanczos3).to_rgb8()
    } else {
        image.to_rgb8()
    };

    rgb.pixels()
        .map(|p| Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32) / 255.0)
        .collect()
}

// ---------------------------------------------------------------------------
// Clustering
// ---------------------------------------------------------------------------

/// Derives a palette of at most `clusters` colors from `samples`.
///
/// Consumes `rng` for the initial centroid draw and for re-seeding clusters that
/// end a round with no members. `clusters` is clamped to `1..=pool size`.
pub fn extract_palette<R: Rng + ?Sized>(
    samples: &[Vec3],
    clusters: usize,
    params: &PaletteParams,
    rng: &mut R,
) -> Result<Palette, PaletteError> {
    if samples.is_empty() {
        return Err(PaletteError::NoSamples);
    }

    let bright: Vec<Vec3> = samples
        .iter()
        .copied()
        .filter(|&c| brightness(c) > params.brightness_threshold)
        .collect();
    let pool: &[Vec3] = if bright.is_empty() {
        warn!(
            threshold = params.brightness_threshold,
            "every sample is below the brightness threshold; clustering all samples"
        );
        samples
    } else {
        &bright
    };

    let k = clusters.clamp(1, pool.len());
    if k != clusters {
        warn!(requested = clusters, used = k, "cluster count reduced to fit the sample pool");
    }

    let mut centroids: Vec<Vec3> = rand::seq::index::sample(rng, pool.len(), k)
        .iter()
        .map(|i| pool[i])
        .collect();

    for iteration in 0..params.max_iterations {
        let next = refine(pool, &centroids, rng);
        let converged = centroids
            .iter()
            .zip(&next)
            .all(|(old, new)| old.distance(*new) < params.convergence_tolerance);
        centroids = next;
        if converged {
            debug!(iteration, "palette converged");
            break;
        }
    }

    Palette::new(centroids).ok_or(PaletteError::NoSamples)
}

/// One assignment/update round. Returns the next centroid snapshot.
fn refine<R: Rng + ?Sized>(pool: &[Vec3], centroids: &[Vec3], rng: &mut R) -> Vec<Vec3> {
    let mut sums = vec![Vec3::ZERO; centroids.len()];
    let mut counts = vec![0u32; centroids.len()];

    for &sample in pool {
        let nearest = nearest_centroid(sample, centroids);
        sums[nearest] += sample;
        counts[nearest] += 1;
    }

    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            if count == 0 {
                pool[rng.random_range(0..pool.len())]
            } else {
                sum / count as f32
            }
        })
        .collect()
}

/// Index of the closest centroid; ties go to the lowest index.
fn nearest_centroid(sample: Vec3, centroids: &[Vec3]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = sample.distance_squared(*c);
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const EPS: f32 = 1e-4;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_solid_color_yields_that_color_for_any_k() {
        let color = Vec3::new(0.9, 0.6, 0.3);
        let samples = vec![color; 64];
        for k in 1..=6 {
            let palette =
                extract_palette(&samples, k, &PaletteParams::default(), &mut rng()).unwrap();
            assert_eq!(palette.len(), k);
            for c in palette.colors() {
                assert!(c.distance(color) < EPS, "k={k}: {c:?} != {color:?}");
            }
        }
    }

    #[test]
    fn test_palette_sorted_by_descending_brightness() {
        let mut samples = Vec::new();
        for _ in 0..50 {
            samples.push(Vec3::new(0.2, 0.2, 0.2));
            samples.push(Vec3::new(0.95, 0.9, 0.85));
            samples.push(Vec3::new(0.6, 0.3, 0.1));
        }
        let palette = extract_palette(&samples, 3, &PaletteParams::default(), &mut rng()).unwrap();
        let levels: Vec<f32> = palette.colors().iter().map(|c| brightness(*c)).collect();
        assert!(levels.windows(2).all(|w| w[0] >= w[1]), "{levels:?}");
    }

    #[test]
    fn test_well_separated_clusters_are_recovered() {
        let a = Vec3::new(0.9, 0.1, 0.1);
        let b = Vec3::new(0.1, 0.1, 0.9);
        let samples: Vec<Vec3> = (0..40).map(|i| if i % 2 == 0 { a } else { b }).collect();
        let palette = extract_palette(&samples, 2, &PaletteParams::default(), &mut rng()).unwrap();
        assert!(palette.colors().iter().any(|c| c.distance(a) < EPS));
        assert!(palette.colors().iter().any(|c| c.distance(b) < EPS));
    }

    #[test]
    fn test_dark_samples_are_ignored() {
        let bright = Vec3::new(0.8, 0.7, 0.6);
        let mut samples = vec![Vec3::ZERO; 500];
        samples.extend(std::iter::repeat_n(bright, 10));
        let palette = extract_palette(&samples, 2, &PaletteParams::default(), &mut rng()).unwrap();
        for c in palette.colors() {
            assert!(c.distance(bright) < EPS);
        }
    }

    #[test]
    fn test_all_dark_falls_back_to_unfiltered() {
        let dark = Vec3::new(0.01, 0.02, 0.03);
        let samples = vec![dark; 20];
        let palette = extract_palette(&samples, 3, &PaletteParams::default(), &mut rng()).unwrap();
        assert_eq!(palette.len(), 3);
        assert!(palette.colors()[0].distance(dark) < EPS);
    }

    #[test]
    fn test_cluster_count_reduced_to_pool_size() {
        let samples = vec![
            Vec3::new(0.9, 0.9, 0.9),
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(0.01, 0.01, 0.01),
        ];
        let palette = extract_palette(&samples, 8, &PaletteParams::default(), &mut rng()).unwrap();
        // The dark sample is filtered out, leaving a pool of two.
        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn test_same_seed_same_palette() {
        let samples: Vec<Vec3> = (0..300)
            .map(|i| {
                let t = i as f32 / 300.0;
                Vec3::new(t, 1.0 - t, (t * 7.0).fract())
            })
            .collect();
        let params = PaletteParams::default();
        let a = extract_palette(&samples, 4, &params, &mut rng()).unwrap();
        let b = extract_palette(&samples, 4, &params, &mut rng()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_samples_rejected() {
        let result = extract_palette(&[], 3, &PaletteParams::default(), &mut rng());
        assert!(matches!(result, Err(PaletteError::NoSamples)));
    }

    #[test]
    fn test_palette_new_rejects_empty_and_sorts() {
        assert!(Palette::new(Vec::new()).is_none());
        let palette = Palette::new(vec![Vec3::splat(0.1), Vec3::splat(0.9)]).unwrap();
        assert_eq!(palette.colors()[0], Vec3::splat(0.9));
    }

    #[test]
    fn test_to_rgb8_rounds() {
        let palette = Palette::new(vec![Vec3::new(1.0, 0.5, 0.0)]).unwrap();
        assert_eq!(palette.to_rgb8(), vec![[255, 128, 0]]);
    }

    #[test]
    fn test_large_image_is_downsampled() {
        let image = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            1024,
            512,
            image::Rgb([200, 100, 50]),
        ));
        let pixels = pixels_from_image(&image, 256);
        assert_eq!(pixels.len(), 256 * 128);
    }

    #[test]
    fn test_small_image_is_untouched() {
        let image = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            10,
            20,
            image::Rgb([255, 0, 0]),
        ));
        let pixels = pixels_from_image(&image, 256);
        assert_eq!(pixels.len(), 200);
        assert_eq!(pixels[0], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_undecodable_reference_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"not a png").unwrap();
        let result = load_reference_pixels(&path, 256);
        assert!(matches!(result, Err(PaletteError::Decode { .. })));
    }
}
