use cgmath::{InnerSpace, Matrix4, Point3};

use crate::common::{Aabb, Ray};
use crate::{Mesh, NodeId, Scene};

use super::pick_query::{pick_all, PickQuery};

/// Result of a ray-mesh node intersection test.
#[derive(Debug, Clone)]
pub struct RayPickResult {
    /// The mesh node that was hit
    pub node_id: NodeId,
    /// World-space distance from the ray origin
    pub distance: f32,
    /// World-space hit location
    pub hit_point: Point3<f32>,
    /// Index of the triangle that was hit (index into the mesh's index buffer / 3)
    pub triangle_index: usize,
}

/// Ray picking query that implements the generic PickQuery trait.
///
/// Keeps the original world-space ray next to the transformed one so that
/// distances come out in world units.
pub struct RayPickQuery {
    ray: Ray,
    world_ray: Ray,
}

impl RayPickQuery {
    pub fn new(ray: Ray) -> Self {
        Self {
            ray,
            world_ray: ray,
        }
    }
}

impl PickQuery for RayPickQuery {
    type Result = RayPickResult;

    fn might_intersect_bounds(&self, bounds: &Aabb) -> bool {
        bounds.intersects_ray(&self.ray).is_some()
    }

    fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        Self {
            ray: self.ray.transform(matrix),
            world_ray: self.world_ray,
        }
    }

    fn collect_mesh_hits(
        &self,
        mesh: &Mesh,
        node_id: NodeId,
        world_transform: &Matrix4<f32>,
        results: &mut Vec<Self::Result>,
    ) {
        for mesh_hit in mesh.intersect_ray(&self.ray) {
            let world_hit_point =
                Point3::from_homogeneous(world_transform * mesh_hit.hit_point.to_homogeneous());
            let distance = (world_hit_point - self.world_ray.origin).magnitude();

            results.push(RayPickResult {
                node_id,
                distance,
                hit_point: world_hit_point,
                triangle_index: mesh_hit.triangle_index,
            });
        }
    }
}

/// Picks every mesh node under `roots` hit by a world-space ray, sorted
/// nearest first.
pub fn pick_all_from_ray(ray: &Ray, scene: &Scene, roots: &[NodeId]) -> Vec<RayPickResult> {
    let query = RayPickQuery::new(*ray);
    let mut results = pick_all(&query, scene, roots);

    results.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    results
}
