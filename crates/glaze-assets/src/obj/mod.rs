//! Wavefront OBJ handling for single-material static meshes.
//!
//! The mesh is treated as text: a header, one contiguous block of `v` lines,
//! and a tail. Planar UVs are derived from the vertex block and the faces are
//! rewritten to reference them one-to-one.

mod document;
mod rewrite;
mod uv;

use thiserror::Error;

pub use document::{LineKind, MeshDocument};
pub use rewrite::{
    RewriteSummary, RewrittenMesh, material_file, rewrite_face, rewrite_obj, rewrite_obj_text,
};
pub use uv::{TexCoord, project_planar_uvs};

/// Errors returned while parsing or rewriting a mesh.
#[derive(Debug, Error)]
pub enum ObjError {
    /// A vertex line is not `v <x> <y> <z>`.
    #[error("vertex {vertex} is malformed: {text:?}")]
    VertexFormat {
        /// 1-based vertex index within the vertex block.
        vertex: usize,
        /// The offending line, without its terminator.
        text: String,
    },

    /// The mesh contains no vertex lines.
    #[error("mesh has no vertex lines")]
    NoVertices,

    /// The mesh path has no file name to derive the material file from.
    #[error("cannot derive a material file name from {}", .0.display())]
    InvalidPath(std::path::PathBuf),

    /// Reading or writing a mesh or material file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read or written.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
