//! Line classification and the header / vertex block / tail split.

/// The closed set of OBJ line kinds this crate distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    /// `v x y z`
    Vertex,
    /// `vt u v`
    TexCoord,
    /// `f a b c ...`
    Face,
    /// `mtllib name`
    MaterialLib,
    /// `usemtl name`
    UseMaterial,
    /// Comments, groups, normals, smoothing flags, blank lines, anything else.
    Other,
}

impl LineKind {
    /// Classifies a line by its directive prefix.
    pub fn of(line: &str) -> Self {
        if line.starts_with("v ") {
            Self::Vertex
        } else if line.starts_with("vt ") {
            Self::TexCoord
        } else if line.starts_with("f ") {
            Self::Face
        } else if line.starts_with("mtllib ") {
            Self::MaterialLib
        } else if line.starts_with("usemtl ") {
            Self::UseMaterial
        } else {
            Self::Other
        }
    }
}

/// A mesh split around its first contiguous run of vertex lines.
///
/// Lines keep their terminators. Vertex lines that appear after the first run
/// has ended are not part of `vertices`; they stay in `tail` untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshDocument<'a> {
    /// Everything before the first vertex line.
    pub header: Vec<&'a str>,
    /// The first contiguous run of vertex lines.
    pub vertices: Vec<&'a str>,
    /// Everything after that run.
    pub tail: Vec<&'a str>,
}

impl<'a> MeshDocument<'a> {
    /// Splits `text` into lines (terminators preserved) and sections them.
    pub fn parse(text: &'a str) -> Self {
        let lines: Vec<&'a str> = text.split_inclusive('\n').collect();
        Self::from_lines(&lines)
    }

    /// Sections an already split list of lines.
    ///
    /// With no vertex line at all, every line lands in `header`.
    pub fn from_lines(lines: &[&'a str]) -> Self {
        let is_vertex = |line: &&str| LineKind::of(line) == LineKind::Vertex;

        let Some(start) = lines.iter().position(is_vertex) else {
            return Self {
                header: lines.to_vec(),
                ..Self::default()
            };
        };
        let end = start + lines[start..].iter().take_while(|l| is_vertex(l)).count();

        Self {
            header: lines[..start].to_vec(),
            vertices: lines[start..end].to_vec(),
            tail: lines[end..].to_vec(),
        }
    }
}
