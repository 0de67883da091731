//! Reconstructed 3D mesh payload.

use serde::{Deserialize, Serialize};

/// A reconstructed face mesh: 3D vertices plus triangular face indices.
///
/// Produced once per successful inference and transmitted immediately;
/// never retained by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshData {
    /// Vertex positions as (x, y, z) triples.
    pub vertices: Vec<[f32; 3]>,
    /// Triangle vertex indices as (i, j, k) triples into `vertices`.
    pub faces: Vec<[u32; 3]>,
}

impl MeshData {
    /// Create a new mesh.
    pub fn new(vertices: Vec<[f32; 3]>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangle faces.
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Check that every face index references an existing vertex.
    pub fn is_valid(&self) -> bool {
        let n = self.vertices.len() as u32;
        self.faces.iter().all(|f| f.iter().all(|&i| i < n))
    }
}
