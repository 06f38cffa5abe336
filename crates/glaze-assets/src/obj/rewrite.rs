//! Reassembles a mesh with planar UVs, a single material, and a companion MTL file.
//!
//! Output layout:
//!
//! ```text
//! <header without mtllib/vt/usemtl>
//! mtllib <mesh>.mtl
//! v ...            (unchanged)
//! vt ...           (one per vertex)
//! <tail without vt/usemtl; usemtl inserted before the first face>
//! f a/a b/b c/c
//! ```
//!
//! Running the rewrite on its own output produces the same text again.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::document::{LineKind, MeshDocument};
use super::uv::project_planar_uvs;
use super::ObjError;
use crate::persist::write_atomic;

/// In-memory result of a rewrite, ready to persist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewrittenMesh {
    /// Full replacement text of the OBJ file.
    pub obj: String,
    /// Number of vertices (and therefore `vt` lines).
    pub vertex_count: usize,
    /// Number of rewritten faces.
    pub face_count: usize,
}

/// What [`rewrite_obj`] wrote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteSummary {
    /// The rewritten mesh file.
    pub mesh_path: PathBuf,
    /// The companion material file.
    pub material_path: PathBuf,
    /// Number of vertices (and `vt` lines).
    pub vertex_count: usize,
    /// Number of faces.
    pub face_count: usize,
}

/// Rewrites OBJ `text` to carry planar UVs, link `mtllib_name`, and use `material_name`.
///
/// Fails with [`ObjError::NoVertices`] if the text has no vertex line and with
/// [`ObjError::VertexFormat`] if a vertex line is malformed.
pub fn rewrite_obj_text(
    text: &str,
    mtllib_name: &str,
    material_name: &str,
) -> Result<RewrittenMesh, ObjError> {
    let doc = MeshDocument::parse(text);
    if doc.vertices.is_empty() {
        return Err(ObjError::NoVertices);
    }
    let uvs = project_planar_uvs(&doc.vertices)?;

    let mut out = String::with_capacity(text.len() + uvs.len() * 24 + 64);

    for line in &doc.header {
        match LineKind::of(line) {
            LineKind::MaterialLib | LineKind::TexCoord | LineKind::UseMaterial => {}
            _ => push_line(&mut out, line),
        }
    }
    push_line(&mut out, &format!("mtllib {mtllib_name}\n"));

    for line in &doc.vertices {
        push_line(&mut out, line);
    }
    for uv in &uvs {
        start_line(&mut out);
        let _ = writeln!(out, "{uv}");
    }

    let use_material = format!("usemtl {material_name}\n");
    let mut face_count = 0;
    for line in &doc.tail {
        match LineKind::of(line) {
            LineKind::TexCoord | LineKind::UseMaterial => {}
            LineKind::Face => {
                if face_count == 0 {
                    push_line(&mut out, &use_material);
                }
                push_line(&mut out, &rewrite_face(line));
                face_count += 1;
            }
            LineKind::Vertex | LineKind::MaterialLib | LineKind::Other => push_line(&mut out, line),
        }
    }
    if face_count == 0 {
        push_line(&mut out, &use_material);
    }

    debug!(
        vertices = doc.vertices.len(),
        faces = face_count,
        "rewrote mesh text"
    );

    Ok(RewrittenMesh {
        obj: out,
        vertex_count: uvs.len(),
        face_count,
    })
}

/// Rewrites one `f` line so every reference reads `i/i`.
///
/// Existing texture/normal sub-indices are discarded; the vertex index doubles as
/// the UV index because UVs are emitted one per vertex in vertex order.
pub fn rewrite_face(line: &str) -> String {
    let refs: Vec<&str> = line
        .split_whitespace()
        .skip(1)
        .map(|token| token.split_once('/').map_or(token, |(vertex, _)| vertex))
        .collect();

    let mut face = String::from("f ");
    for (i, vertex) in refs.iter().enumerate() {
        if i > 0 {
            face.push(' ');
        }
        let _ = write!(face, "{vertex}/{vertex}");
    }
    face.push('\n');
    face
}

/// Material file body linking `material_name` to the diffuse texture at `texture_path`.
pub fn material_file(material_name: &str, texture_path: &str) -> String {
    format!(
        "newmtl {material_name}\n\
         Ka 1.000000 1.000000 1.000000\n\
         Kd 1.000000 1.000000 1.000000\n\
         Ks 0.000000 0.000000 0.000000\n\
         d 1.000000\n\
         illum 2\n\
         map_Kd {texture_path}\n"
    )
}

/// Rewrites the OBJ file at `path` in place and writes `<stem>.mtl` beside it.
///
/// Both files are built fully in memory and then replaced atomically, the
/// material file before the mesh. Nothing is written if the mesh fails to parse,
/// and the mesh is left untouched if the material file cannot be written.
pub fn rewrite_obj(
    path: &Path,
    texture_path: &str,
    material_name: &str,
) -> Result<RewriteSummary, ObjError> {
    let material_path = path.with_extension("mtl");
    let mtllib_name = material_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ObjError::InvalidPath(path.to_path_buf()))?
        .to_string();

    let text = std::fs::read_to_string(path).map_err(|source| ObjError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rewritten = rewrite_obj_text(&text, &mtllib_name, material_name)?;
    let material = material_file(material_name, texture_path);

    // Material first: the mesh must never link an MTL that was not written.
    write_atomic(&material_path, material.as_bytes()).map_err(|source| ObjError::Io {
        path: material_path.clone(),
        source,
    })?;
    write_atomic(path, rewritten.obj.as_bytes()).map_err(|source| ObjError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(RewriteSummary {
        mesh_path: path.to_path_buf(),
        material_path,
        vertex_count: rewritten.vertex_count,
        face_count: rewritten.face_count,
    })
}

/// Ensures the next write starts on a fresh line.
fn start_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn push_line(out: &mut String, line: &str) {
    start_line(out);
    out.push_str(line);
}
