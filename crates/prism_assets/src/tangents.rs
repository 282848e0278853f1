use glam::{Vec2, Vec3};

use crate::model::Vertex;

pub(crate) fn triangles(indices: &[u32], vertex_count: usize) -> impl Iterator<Item = [usize; 3]> + '_ {
    indices
        .chunks_exact(3)
        .map(|tri| [tri[0] as usize, tri[1] as usize, tri[2] as usize])
        .filter(move |tri| tri.iter().all(|&i| i < vertex_count))
}

/// Area-weighted smooth normals, for primitives that ship without any.
pub fn generate_normals(vertices: &mut [Vertex], indices: &[u32]) {
    let mut accum = vec![Vec3::ZERO; vertices.len()];

    for [a, b, c] in triangles(indices, vertices.len()) {
        let p0 = Vec3::from(vertices[a].position);
        let p1 = Vec3::from(vertices[b].position);
        let p2 = Vec3::from(vertices[c].position);
        let face = (p1 - p0).cross(p2 - p0);
        accum[a] += face;
        accum[b] += face;
        accum[c] += face;
    }

    for (vertex, normal) in vertices.iter_mut().zip(accum) {
        vertex.normal = normal.try_normalize().unwrap_or(Vec3::Y).to_array();
    }
}

/// Per-vertex tangents from UV gradients (Lengyel's method).
///
/// Vertices whose UVs are degenerate get an arbitrary unit vector orthogonal
/// to their normal so helpers still have something sensible to draw.
pub fn generate_tangents(vertices: &mut [Vertex], indices: &[u32]) {
    let mut tan1 = vec![Vec3::ZERO; vertices.len()];
    let mut tan2 = vec![Vec3::ZERO; vertices.len()];

    for [a, b, c] in triangles(indices, vertices.len()) {
        let p0 = Vec3::from(vertices[a].position);
        let p1 = Vec3::from(vertices[b].position);
        let p2 = Vec3::from(vertices[c].position);
        let uv0 = Vec2::from(vertices[a].uv);
        let uv1 = Vec2::from(vertices[b].uv);
        let uv2 = Vec2::from(vertices[c].uv);

        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let d1 = uv1 - uv0;
        let d2 = uv2 - uv0;

        let det = d1.x * d2.y - d2.x * d1.y;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let sdir = (e1 * d2.y - e2 * d1.y) * r;
        let tdir = (e2 * d1.x - e1 * d2.x) * r;

        for i in [a, b, c] {
            tan1[i] += sdir;
            tan2[i] += tdir;
        }
    }

    for (i, vertex) in vertices.iter_mut().enumerate() {
        let n = Vec3::from(vertex.normal);
        // Gram-Schmidt
        let t = (tan1[i] - n * n.dot(tan1[i]))
            .try_normalize()
            .unwrap_or_else(|| n.any_orthonormal_vector());
        let w = if n.cross(t).dot(tan2[i]) < 0.0 { -1.0 } else { 1.0 };
        vertex.tangent = [t.x, t.y, t.z, w];
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::{generate_normals, generate_tangents};
    use crate::model::Vertex;

    #[test]
    fn normals_follow_winding() {
        let mut vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
            Vertex::new([1.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
            Vertex::new([0.0, 1.0, 0.0], [0.0; 3], [0.0; 2]),
        ];
        generate_normals(&mut vertices, &[0, 1, 2]);
        for v in &vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn degenerate_uvs_still_produce_unit_tangents() {
        let n = [0.0, 1.0, 0.0];
        let mut vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], n, [0.5, 0.5]),
            Vertex::new([1.0, 0.0, 0.0], n, [0.5, 0.5]),
            Vertex::new([0.0, 0.0, 1.0], n, [0.5, 0.5]),
        ];
        generate_tangents(&mut vertices, &[0, 1, 2]);

        for v in &vertices {
            let t = Vec3::new(v.tangent[0], v.tangent[1], v.tangent[2]);
            assert!((t.length() - 1.0).abs() < 1e-5);
            assert!(t.dot(Vec3::from(n)).abs() < 1e-5);
        }
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let mut vertices = vec![Vertex::new([0.0; 3], [0.0, 0.0, 1.0], [0.0; 2])];
        generate_tangents(&mut vertices, &[0, 7, 9]);
        assert_eq!(vertices[0].tangent[3], 1.0);
    }
}
