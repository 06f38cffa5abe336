//! Static asset preprocessing: palette extraction from reference photographs,
//! procedural palette textures, and planar UV rewriting of OBJ meshes.
//!
//! Two independent flows share nothing but a caller-owned random stream:
//!
//! - reference image → [`extract_palette`] → [`Palette`] → [`synthesize_texture`] → PNG
//! - OBJ text → [`obj::MeshDocument`] → [`obj::project_planar_uvs`] → [`obj::rewrite_obj`]

pub mod obj;
mod palette;
mod persist;
mod texture;

pub use palette::{
    Palette, PaletteError, PaletteParams, extract_palette, load_reference_pixels,
    pixels_from_image,
};
pub use persist::write_atomic;
pub use texture::{TextureError, TextureParams, encode_png, save_texture, synthesize_texture};
