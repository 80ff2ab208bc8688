//! Manifold checks for 3D printing.
//!
//! A mesh is printable here when every edge is shared by exactly two faces.
//! Vertices at bit-identical positions are welded first, since imported meshes
//! are routinely split along UV and normal seams.

use std::collections::HashMap;

use crate::data_structures::{model::Mesh, scene::Object};

/// Edge-to-face adjacency over welded vertex ids.
#[derive(Debug, Clone)]
pub struct MeshAdjacency {
    /// Maps edge (min_idx, max_idx) → faces using it.
    pub edge_to_faces: HashMap<(u32, u32), Vec<u32>>,
}

impl MeshAdjacency {
    /// Build adjacency, welding vertices that share a position.
    ///
    /// Faces with two corners on the same welded vertex have no area and
    /// contribute no edges.
    pub fn build(mesh: &Mesh) -> Self {
        let welded = weld_positions(mesh);
        let mut edge_to_faces: HashMap<(u32, u32), Vec<u32>> = HashMap::new();

        for (face_idx, face) in mesh.faces.iter().enumerate() {
            let [v0, v1, v2] = face.vertices.map(|v| welded.get(v as usize).copied().unwrap_or(v));
            if v0 == v1 || v1 == v2 || v2 == v0 {
                continue;
            }
            for (a, b) in [(v0, v1), (v1, v2), (v2, v0)] {
                let edge_key = if a < b { (a, b) } else { (b, a) };
                edge_to_faces
                    .entry(edge_key)
                    .or_default()
                    .push(face_idx as u32);
            }
        }

        Self { edge_to_faces }
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to_faces.len()
    }

    /// Edges with exactly one face (holes in the surface).
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_to_faces.values().filter(|f| f.len() == 1).count()
    }

    /// Edges with more than two faces.
    pub fn over_shared_edge_count(&self) -> usize {
        self.edge_to_faces.values().filter(|f| f.len() > 2).count()
    }

    /// Every edge is shared by exactly two faces.
    pub fn is_manifold(&self) -> bool {
        self.edge_to_faces.values().all(|f| f.len() == 2)
    }

    pub fn faces_for_edge(&self, v0: u32, v1: u32) -> Option<&[u32]> {
        let edge_key = if v0 < v1 { (v0, v1) } else { (v1, v0) };
        self.edge_to_faces.get(&edge_key).map(|v| v.as_slice())
    }
}

/// Map each vertex to the first vertex with the same position bits.
fn weld_positions(mesh: &Mesh) -> Vec<u32> {
    let mut first_at: HashMap<[u32; 3], u32> = HashMap::new();
    mesh.vertices
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let key = v.position.map(|c| if c == 0.0 { 0 } else { c.to_bits() });
            *first_at.entry(key).or_insert(i as u32)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintabilityReport {
    pub name: String,
    pub is_manifold: bool,
    pub vertex_count: usize,
    pub face_count: usize,
    pub edge_count: usize,
    pub boundary_edge_count: usize,
    pub over_shared_edge_count: usize,
}

impl PrintabilityReport {
    pub fn for_mesh(name: &str, mesh: &Mesh) -> Self {
        let adjacency = MeshAdjacency::build(mesh);
        Self {
            name: name.to_string(),
            is_manifold: adjacency.is_manifold(),
            vertex_count: mesh.vertex_count(),
            face_count: mesh.face_count(),
            edge_count: adjacency.edge_count(),
            boundary_edge_count: adjacency.boundary_edge_count(),
            over_shared_edge_count: adjacency.over_shared_edge_count(),
        }
    }
}

impl std::fmt::Display for PrintabilityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}:", self.name)?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Faces: {}", self.face_count)?;
        writeln!(f, "  Edges: {}", self.edge_count)?;
        writeln!(
            f,
            "  Manifold: {} (boundary edges: {}, edges with >2 faces: {})",
            if self.is_manifold { "yes" } else { "NO" },
            self.boundary_edge_count,
            self.over_shared_edge_count
        )
    }
}

/// Check whether a mesh object is manifold. Non-manifold geometry is reported, not fixed.
///
/// Returns `None` for objects that are not meshes.
pub fn check_3d_printability(object: &Object) -> Option<PrintabilityReport> {
    let Some(mesh) = object.mesh() else {
        log::info!("Object {} is not a mesh. Skipping.", object.name);
        return None;
    };
    let report = PrintabilityReport::for_mesh(&object.name, mesh);
    if report.is_manifold {
        log::info!("{} is manifold and suitable for 3D printing.", object.name);
    } else {
        log::warn!(
            "{} is not manifold. Fix required. ({} boundary edges, {} edges with more than two faces)",
            object.name,
            report.boundary_edge_count,
            report.over_shared_edge_count
        );
    }
    Some(report)
}
