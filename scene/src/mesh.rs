use cgmath::Point3;

use crate::common::{Aabb, Ray};

/// Unique identifier for a mesh in the scene.
pub type MeshId = u32;

/// A mesh vertex. Only what picking and bounds need is kept on the CPU side.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Result of a ray-mesh intersection test in local mesh space.
#[derive(Debug, Clone)]
pub struct MeshHit {
    /// Distance along the ray (local space)
    pub distance: f32,
    pub hit_point: Point3<f32>,
    /// Index into the index buffer divided by 3
    pub triangle_index: usize,
}

/// Indexed triangle mesh.
///
/// Geometry is immutable once built; the host renderer uploads it and the
/// core only reads it for bounds and picking.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Assigned by Scene
    pub id: MeshId,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Builds a mesh from vertices and a triangle-list index buffer.
    ///
    /// A trailing partial triangle and any triangle that references a missing
    /// vertex are dropped.
    pub fn from_raw(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let vertex_count = vertices.len() as u32;
        let indices = indices
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&i| i < vertex_count))
            .flatten()
            .copied()
            .collect();

        Self {
            id: 0,
            vertices,
            indices,
        }
    }

    /// Axis-aligned box centered at the origin.
    pub fn box_mesh(width: f32, height: f32, depth: f32) -> Self {
        let (hw, hh, hd) = (width / 2.0, height / 2.0, depth / 2.0);

        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-hw, -hh, hd], [hw, -hh, hd], [hw, hh, hd], [-hw, hh, hd]]),
            ([0.0, 0.0, -1.0], [[hw, -hh, -hd], [-hw, -hh, -hd], [-hw, hh, -hd], [hw, hh, -hd]]),
            ([0.0, 1.0, 0.0], [[-hw, hh, hd], [hw, hh, hd], [hw, hh, -hd], [-hw, hh, -hd]]),
            ([0.0, -1.0, 0.0], [[-hw, -hh, -hd], [hw, -hh, -hd], [hw, -hh, hd], [-hw, -hh, hd]]),
            ([1.0, 0.0, 0.0], [[hw, -hh, hd], [hw, -hh, -hd], [hw, hh, -hd], [hw, hh, hd]]),
            ([-1.0, 0.0, 0.0], [[-hw, -hh, -hd], [-hw, -hh, hd], [-hw, hh, hd], [-hw, hh, -hd]]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, corners) in faces {
            let base = vertices.len() as u32;
            vertices.extend(corners.iter().map(|&position| Vertex { position, normal }));
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::from_raw(vertices, indices)
    }

    pub fn cube(size: f32) -> Self {
        Self::box_mesh(size, size, size)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Local-space bounds, None for a mesh without vertices.
    pub fn bounding(&self) -> Option<Aabb> {
        let positions: Vec<Point3<f32>> = self
            .vertices
            .iter()
            .map(|v| Point3::from(v.position))
            .collect();
        Aabb::from_points(&positions)
    }

    /// Tests a local-space ray against every triangle. Hits are unsorted.
    pub fn intersect_ray(&self, ray: &Ray) -> Vec<MeshHit> {
        self.indices
            .chunks_exact(3)
            .enumerate()
            .filter_map(|(triangle_index, tri)| {
                let corner = |i: u32| Point3::from(self.vertices[i as usize].position);
                let (t, _, _) = ray.intersect_triangle(corner(tri[0]), corner(tri[1]), corner(tri[2]))?;
                Some(MeshHit {
                    distance: t,
                    hit_point: ray.point_at(t),
                    triangle_index,
                })
            })
            .collect()
    }
}
