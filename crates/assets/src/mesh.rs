use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Per-vertex attribute packing of an interleaved vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexLayout {
    /// position (3) + normal (3)
    PositionNormal,
    /// position (3) + normal (3) + texcoord (2)
    PositionNormalUv,
}

impl VertexLayout {
    /// Floats per vertex.
    pub const fn stride(self) -> usize {
        match self {
            VertexLayout::PositionNormal => 6,
            VertexLayout::PositionNormalUv => 8,
        }
    }

    pub const fn stride_bytes(self) -> u64 {
        (self.stride() * std::mem::size_of::<f32>()) as u64
    }

    pub const fn has_texcoords(self) -> bool {
        matches!(self, VertexLayout::PositionNormalUv)
    }
}

/// Errors from constructing a [`MeshData`] out of raw buffers.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MeshError {
    #[error("vertex buffer of {len} floats is not a multiple of stride {stride}")]
    VertexStride { len: usize, stride: usize },
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("index count {0} is not a multiple of 3")]
    PartialTriangle(usize),
    #[error("mesh has no triangles")]
    Empty,
}

/// CPU-side triangle mesh: interleaved vertices and a triangle-list index buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    vertices: Vec<f32>,
    indices: Vec<u32>,
    layout: VertexLayout,
}

impl MeshData {
    /// Build a mesh from raw buffers, checking stride and index bounds.
    pub fn new(vertices: Vec<f32>, indices: Vec<u32>, layout: VertexLayout) -> Result<Self, MeshError> {
        let stride = layout.stride();
        if vertices.len() % stride != 0 {
            return Err(MeshError::VertexStride {
                len: vertices.len(),
                stride,
            });
        }
        if indices.is_empty() {
            return Err(MeshError::Empty);
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::PartialTriangle(indices.len()));
        }
        let vertex_count = vertices.len() / stride;
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        Ok(Self {
            vertices,
            indices,
            layout,
        })
    }

    /// Construct without validation. Callers guarantee the invariants.
    pub(crate) fn from_parts(vertices: Vec<f32>, indices: Vec<u32>, layout: VertexLayout) -> Self {
        debug_assert_eq!(vertices.len() % layout.stride(), 0);
        Self {
            vertices,
            indices,
            layout,
        }
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn has_texcoords(&self) -> bool {
        self.layout.has_texcoords()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.layout.stride()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn position(&self, vertex: usize) -> Vec3 {
        let base = vertex * self.layout.stride();
        Vec3::from_slice(&self.vertices[base..base + 3])
    }

    pub fn normal(&self, vertex: usize) -> Vec3 {
        let base = vertex * self.layout.stride() + 3;
        Vec3::from_slice(&self.vertices[base..base + 3])
    }

    /// Texture coordinate of a vertex, for layouts that carry one.
    pub fn texcoord(&self, vertex: usize) -> Option<[f32; 2]> {
        if !self.has_texcoords() {
            return None;
        }
        let base = vertex * self.layout.stride() + 6;
        Some([self.vertices[base], self.vertices[base + 1]])
    }

    /// Axis-aligned bounds of all vertex positions.
    pub fn bounds(&self) -> Option<Bounds> {
        (0..self.vertex_count())
            .map(|i| self.position(i))
            .fold(None, |acc: Option<Bounds>, p| match acc {
                None => Some(Bounds { min: p, max: p }),
                Some(b) => Some(Bounds {
                    min: b.min.min(p),
                    max: b.max.max(p),
                }),
            })
    }

    /// Line-list indices tracing every triangle edge.
    pub fn wireframe_indices(&self) -> Vec<u32> {
        wireframe_indices(&self.indices)
    }

    pub fn stats(&self) -> MeshStats {
        MeshStats {
            vertex_count: self.vertex_count(),
            triangle_count: self.triangle_count(),
            index_count: self.indices.len(),
            layout: self.layout,
            bounds: self.bounds(),
        }
    }
}

/// Expand a triangle list into a line list: (a, b, c) -> a-b, b-c, c-a.
pub fn wireframe_indices(triangles: &[u32]) -> Vec<u32> {
    let mut lines = Vec::with_capacity(triangles.len() * 2);
    for tri in triangles.chunks_exact(3) {
        lines.extend_from_slice(&[tri[0], tri[1], tri[1], tri[2], tri[2], tri[0]]);
    }
    lines
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Summary numbers for logging and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct MeshStats {
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub index_count: usize,
    pub layout: VertexLayout,
    pub bounds: Option<Bounds>,
}
