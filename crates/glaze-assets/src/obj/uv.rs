//! Top-down planar UV projection.
//!
//! Vertices are projected onto the horizontal x/z plane and normalized to the
//! unit square. Height (y) does not influence the result.

use std::fmt;

use glam::DVec2;

use super::ObjError;

/// A texture coordinate in `[0, 1]²`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexCoord {
    /// Horizontal coordinate, from x.
    pub u: f64,
    /// Vertical coordinate, from z, flipped so minimum z is the top edge.
    pub v: f64,
}

impl fmt::Display for TexCoord {
    /// Formats as an OBJ `vt` directive with six decimals, without a terminator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vt {:.6} {:.6}", self.u, self.v)
    }
}

/// Computes one UV per vertex line, in the same order.
///
/// Each line must split into exactly `v x y z` with finite x and z. An axis with zero extent is
/// treated as having extent 1, which maps it to a constant 0.
pub fn project_planar_uvs(vertex_lines: &[&str]) -> Result<Vec<TexCoord>, ObjError> {
    let points = vertex_lines
        .iter()
        .enumerate()
        .map(|(i, line)| parse_xz(line, i + 1))
        .collect::<Result<Vec<DVec2>, _>>()?;

    let Some(first) = points.first() else {
        return Ok(Vec::new());
    };
    let (min, max) = points
        .iter()
        .fold((*first, *first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
    let extent = max - min;
    let range = DVec2::new(non_zero(extent.x), non_zero(extent.y));

    Ok(points
        .iter()
        .map(|p| {
            let n = (*p - min) / range;
            TexCoord {
                u: n.x,
                v: 1.0 - n.y,
            }
        })
        .collect())
}

fn non_zero(extent: f64) -> f64 {
    if extent == 0.0 { 1.0 } else { extent }
}

/// Parses `v x y z` and returns `(x, z)`.
fn parse_xz(line: &str, vertex: usize) -> Result<DVec2, ObjError> {
    let malformed = || ObjError::VertexFormat {
        vertex,
        text: line.trim_end_matches(['\r', '\n']).to_string(),
    };

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [_, x, y, z] = tokens.as_slice() else {
        return Err(malformed());
    };
    let x: f64 = x.parse().map_err(|_| malformed())?;
    let _y: f64 = y.parse().map_err(|_| malformed())?;
    let z: f64 = z.parse().map_err(|_| malformed())?;
    if !x.is_finite() || !z.is_finite() {
        return Err(malformed());
    }
    Ok(DVec2::new(x, z))
}
