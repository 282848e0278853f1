use std::collections::HashSet;

use bitflags::bitflags;
use glam::{Mat4, Vec3};
use prism_assets::Vertex;
use prism_core::{Aabb, Rgb, transform::normal_matrix};

/// Length of each normal/tangent helper segment, in world units.
pub const HELPER_LENGTH: f32 = 0.25;
pub const NORMALS_COLOR: Rgb = Rgb::GREEN;
pub const TANGENTS_COLOR: Rgb = Rgb::BLUE;
pub const BOUNDS_COLOR: Rgb = Rgb::YELLOW;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct OverlayKinds: u8 {
        const WIREFRAME = 1 << 0;
        const NORMALS = 1 << 1;
        const TANGENTS = 1 << 2;
        const BOUNDING_BOX = 1 << 3;
    }
}

/// Unique undirected triangle edges, first-seen order.
pub fn wireframe_edges(indices: &[u32]) -> Vec<(u32, u32)> {
    let mut seen = HashSet::new();
    let mut edges = Vec::new();

    for tri in indices.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let key = (a.min(b), a.max(b));
            if seen.insert(key) {
                edges.push((a, b));
            }
        }
    }
    edges
}

/// Wireframe segments in the mesh's local space.
pub fn wireframe_lines(vertices: &[Vertex], indices: &[u32]) -> Vec<Vec3> {
    wireframe_edges(indices)
        .into_iter()
        .filter_map(|(a, b)| {
            let a = vertices.get(a as usize)?;
            let b = vertices.get(b as usize)?;
            Some([Vec3::from(a.position), Vec3::from(b.position)])
        })
        .flatten()
        .collect()
}

/// One world-space segment per vertex along its normal.
pub fn normal_lines(vertices: &[Vertex], world: &Mat4, length: f32) -> Vec<Vec3> {
    let normals = normal_matrix(world);
    vertices
        .iter()
        .flat_map(|v| {
            let start = world.transform_point3(Vec3::from(v.position));
            let dir = normals
                .transform_vector3(Vec3::from(v.normal))
                .normalize_or_zero();
            [start, start + dir * length]
        })
        .collect()
}

/// One world-space segment per vertex along its tangent.
pub fn tangent_lines(vertices: &[Vertex], world: &Mat4, length: f32) -> Vec<Vec3> {
    vertices
        .iter()
        .flat_map(|v| {
            let start = world.transform_point3(Vec3::from(v.position));
            let tangent = Vec3::new(v.tangent[0], v.tangent[1], v.tangent[2]);
            let dir = world.transform_vector3(tangent).normalize_or_zero();
            [start, start + dir * length]
        })
        .collect()
}

/// The 12 edges of a box.
pub fn box_lines(bounds: &Aabb) -> Vec<Vec3> {
    if bounds.is_empty() {
        return Vec::new();
    }
    let corners = bounds.corners();
    Aabb::EDGES
        .iter()
        .flat_map(|&(a, b)| [corners[a], corners[b]])
        .collect()
}
