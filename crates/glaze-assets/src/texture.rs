//! Procedural palette textures: a swirling radial gradient through the palette
//! bands, darkened toward the rim and speckled with Gaussian noise.

use std::f32::consts::{PI, TAU};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};
use image::{ImageFormat, Rgb, RgbImage};
use rand::Rng;
use thiserror::Error;

use crate::palette::Palette;
use crate::persist::write_atomic;

/// Weight of the normalized radius in the band coordinate.
const RADIAL_WEIGHT: f32 = 0.8;
/// Weight of the normalized angle in the band coordinate.
const ANGULAR_WEIGHT: f32 = 0.6;
/// Fraction of brightness removed at the rim.
const RIM_DARKENING: f32 = 0.25;
/// Falloff exponent of the rim darkening.
const RIM_EXPONENT: f32 = 1.8;

// ---------------------------------------------------------------------------
// TextureError
// ---------------------------------------------------------------------------

/// Errors returned while synthesizing or persisting a texture.
#[derive(Debug, Error)]
pub enum TextureError {
    /// The texture must be at least 2 pixels wide so it has a distinct center and edge.
    #[error("texture size {0} is too small (minimum 2)")]
    InvalidSize(u32),

    /// PNG encoding failed.
    #[error("failed to encode texture: {0}")]
    Encode(#[source] image::ImageError),

    /// Writing the texture to disk failed.
    #[error("failed to write texture {}: {source}", path.display())]
    Io {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// TextureParams
// ---------------------------------------------------------------------------

/// Tuning for [`synthesize_texture`].
#[derive(Clone, Debug, PartialEq)]
pub struct TextureParams {
    /// Edge length of the square output in pixels.
    pub size: u32,
    /// Standard deviation of the per-channel noise.
    pub noise_sigma: f32,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            size: 1024,
            noise_sigma: 0.035,
        }
    }
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// Paints a `size × size` RGB texture from `palette`.
///
/// Pixels are visited row by row and each draws three noise samples from `rng`,
/// so the output is a pure function of the palette, the params, and the stream state.
pub fn synthesize_texture<R: Rng + ?Sized>(
    palette: &Palette,
    params: &TextureParams,
    rng: &mut R,
) -> Result<RgbImage, TextureError> {
    let size = params.size;
    if size < 2 {
        return Err(TextureError::InvalidSize(size));
    }

    let mut bands: Vec<Vec3> = palette
        .colors()
        .iter()
        .map(|c| c.clamp(Vec3::ZERO, Vec3::ONE))
        .collect();
    if bands.len() == 1 {
        bands.push(bands[0]);
    }

    let center = (size - 1) as f32 / 2.0;
    let mut image = RgbImage::new(size, size);

    for y in 0..size {
        for x in 0..size {
            let offset = (Vec2::new(x as f32, y as f32) - center) / center;
            let base = band_color(&bands, offset);

            let mut pixel = [0u8; 3];
            for (channel, out) in pixel.iter_mut().enumerate() {
                let value = base[channel] + gaussian(rng, params.noise_sigma);
                *out = (value.clamp(0.0, 1.0) * 255.0) as u8;
            }
            image.put_pixel(x, y, Rgb(pixel));
        }
    }

    Ok(image)
}

/// Noise-free color at `offset`, measured from the image center in units of the half-size.
fn band_color(bands: &[Vec3], offset: Vec2) -> Vec3 {
    let radial = offset.length().clamp(0.0, 1.0);
    let angle = (offset.y.atan2(offset.x) + PI) / TAU;

    let last = bands.len() - 1;
    let swirl = (radial * RADIAL_WEIGHT + angle * ANGULAR_WEIGHT) * last as f32;
    let lower = (swirl.floor().max(0.0) as usize).min(last);
    let upper = (lower + 1).min(last);
    let blend = (swirl - lower as f32).clamp(0.0, 1.0);

    let color = bands[lower].lerp(bands[upper], blend);
    let rim = radial.powf(RIM_EXPONENT).clamp(0.0, 1.0);
    color * (1.0 - RIM_DARKENING * rim)
}

/// Zero-mean normal sample with standard deviation `sigma` (Box–Muller).
fn gaussian<R: Rng + ?Sized>(rng: &mut R, sigma: f32) -> f32 {
    // 1 - [0, 1) keeps the logarithm finite.
    let u1 = 1.0 - rng.random::<f32>();
    let u2 = rng.random::<f32>();
    sigma * (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Encodes `image` as a lossless 8-bit RGB PNG.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, TextureError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(TextureError::Encode)?;
    Ok(bytes)
}

/// Encodes `image` and atomically replaces `path`, creating parent directories as needed.
pub fn save_texture(image: &RgbImage, path: &Path) -> Result<(), TextureError> {
    let bytes = encode_png(image)?;
    let io_err = |source: std::io::Error| TextureError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    write_atomic(path, &bytes).map_err(io_err)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
