//! Meshes: CPU geometry plus the backend buffers it was uploaded to.
//!
//! Meshes are shared: many objects hold the same `Rc<Mesh>`, and the GPU
//! buffers live as long as the backend does, so they outlive every object
//! referencing them.
//!
//! ## `.nfg` text format
//!
//! ```text
//! NrVertices: 4
//!    0. pos:[0.0, 0.0, 0.0], uv:[0.0, 0.0]
//!    1. pos:[1.0, 0.0, 0.0], uv:[1.0, 0.0]
//!    ...
//! NrIndices: 6
//!    0, 1, 2,
//!    0, 2, 3,
//! ```

use thiserror::Error;

use super::vertex::Vertex;
use super::{MeshId, RenderBackend};
use crate::error::RenderError;

/// Errors from [`MeshData::parse_nfg`].
#[derive(Debug, Error, PartialEq)]
pub enum MeshParseError {
    #[error("missing `{0}` header")]
    MissingHeader(&'static str),

    #[error("invalid count after `{header}`: {value:?}")]
    BadCount { header: &'static str, value: String },

    #[error("vertex {index}: {reason}")]
    BadVertex { index: usize, reason: String },

    #[error("invalid index {0:?}")]
    BadIndex(String),

    #[error("expected {expected} {what}, found {found}")]
    CountMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// Geometry that has not been uploaded yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// A unit quad spanning `0..1` with its origin at the bottom-left corner.
    ///
    /// `v` grows with `y`, so images are upright under a Y-down screen
    /// projection.
    pub fn quad() -> Self {
        Self {
            vertices: vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0], [1.0, 0.0]),
                Vertex::new([1.0, 1.0, 0.0], [1.0, 1.0]),
                Vertex::new([0.0, 1.0, 0.0], [0.0, 1.0]),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// A unit quad spanning `-0.5..0.5`, centered on its origin.
    pub fn quad_centered() -> Self {
        let mut data = Self::quad();
        for v in &mut data.vertices {
            v.position[0] -= 0.5;
            v.position[1] -= 0.5;
        }
        data
    }

    /// Parse the `.nfg` text mesh format.
    pub fn parse_nfg(source: &str) -> Result<Self, MeshParseError> {
        let mut lines = source.lines().map(str::trim).filter(|l| !l.is_empty());

        let vertex_count = parse_header(lines.next(), "NrVertices:")?;
        let mut vertices = Vec::with_capacity(vertex_count);
        for index in 0..vertex_count {
            let line = lines.next().ok_or(MeshParseError::CountMismatch {
                what: "vertices",
                expected: vertex_count,
                found: index,
            })?;
            vertices.push(parse_vertex(index, line)?);
        }

        let index_count = parse_header(lines.next(), "NrIndices:")?;
        let mut indices = Vec::with_capacity(index_count);
        for token in lines
            .flat_map(|l| l.split(|c: char| c == ',' || c.is_whitespace()))
            .filter(|t| !t.is_empty())
        {
            let index: u32 = token
                .parse()
                .map_err(|_| MeshParseError::BadIndex(token.to_owned()))?;
            if index as usize >= vertex_count {
                return Err(MeshParseError::IndexOutOfRange {
                    index,
                    vertex_count,
                });
            }
            indices.push(index);
        }
        if indices.len() != index_count {
            return Err(MeshParseError::CountMismatch {
                what: "indices",
                expected: index_count,
                found: indices.len(),
            });
        }

        Ok(Self { vertices, indices })
    }
}

fn parse_header(line: Option<&str>, header: &'static str) -> Result<usize, MeshParseError> {
    let line = line.ok_or(MeshParseError::MissingHeader(header))?;
    let value = line
        .strip_prefix(header)
        .ok_or(MeshParseError::MissingHeader(header))?
        .trim();
    value.parse().map_err(|_| MeshParseError::BadCount {
        header,
        value: value.to_owned(),
    })
}

/// `0. pos:[x, y, z], uv:[u, v]`
fn parse_vertex(index: usize, line: &str) -> Result<Vertex, MeshParseError> {
    let bad = |reason: &str| MeshParseError::BadVertex {
        index,
        reason: reason.to_owned(),
    };

    let pos = bracketed(line, "pos:").ok_or_else(|| bad("missing pos:[..]"))?;
    let uv = bracketed(line, "uv:").ok_or_else(|| bad("missing uv:[..]"))?;
    let pos = parse_floats::<3>(pos).ok_or_else(|| bad("pos needs 3 numbers"))?;
    let uv = parse_floats::<2>(uv).ok_or_else(|| bad("uv needs 2 numbers"))?;
    Ok(Vertex::new(pos, uv))
}

fn bracketed<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let start = line.find(key)? + key.len();
    let rest = line[start..].trim_start().strip_prefix('[')?;
    let end = rest.find(']')?;
    Some(&rest[..end])
}

fn parse_floats<const N: usize>(list: &str) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    let mut parts = list.split(',').map(str::trim);
    for slot in &mut out {
        *slot = parts.next()?.parse().ok()?;
    }
    parts.next().is_none().then_some(out)
}

/// Uploaded geometry.
#[derive(Debug)]
pub struct Mesh {
    id: MeshId,
    data: MeshData,
}

impl Mesh {
    /// Upload `data` through `backend`. The CPU copy is kept for batching.
    pub fn upload(
        backend: &mut dyn RenderBackend,
        label: &str,
        data: MeshData,
    ) -> Result<Self, RenderError> {
        let id = backend.create_mesh(label, &data.vertices, &data.indices)?;
        Ok(Self { id, data })
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.data.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.data.indices
    }

    pub fn index_count(&self) -> u32 {
        self.data.indices.len() as u32
    }
}
