use cgmath::{Matrix4, SquareMatrix};

use crate::common::Aabb;
use crate::{Mesh, NodeId, Scene};

/// A query that can pick mesh nodes by traversing the scene tree.
///
/// The generic traversal handles tree walking, world transforms and the
/// move into mesh-local space; implementors only define the tests.
pub trait PickQuery: Sized {
    /// Result type returned for hits. A single mesh test may produce several.
    type Result;

    /// Broad phase: may this query touch geometry inside `bounds`?
    ///
    /// Called with local-space mesh bounds on the already transformed query.
    /// False positives are fine, false negatives lose hits.
    fn might_intersect_bounds(&self, bounds: &Aabb) -> bool;

    /// Transform this query to a different coordinate space.
    fn transform(&self, matrix: &Matrix4<f32>) -> Self;

    /// Narrow phase: test the local-space query against a mesh.
    ///
    /// # Arguments
    /// * `mesh` - The mesh to test against (in local space)
    /// * `node_id` - ID of the mesh node being tested
    /// * `world_transform` - The node's world transform (for result computation)
    /// * `results` - Vector to push results into
    fn collect_mesh_hits(
        &self,
        mesh: &Mesh,
        node_id: NodeId,
        world_transform: &Matrix4<f32>,
        results: &mut Vec<Self::Result>,
    );
}

/// Runs a query against every visible mesh node under `roots`.
///
/// Invisible nodes hide their whole subtree. Unknown roots are ignored.
pub fn pick_all<Q: PickQuery>(query: &Q, scene: &Scene, roots: &[NodeId]) -> Vec<Q::Result> {
    let mut results = Vec::new();

    for &root_id in roots {
        let parent_world = scene
            .get_node(root_id)
            .and_then(|node| node.parent())
            .map(|parent| scene.nodes_transform(parent))
            .unwrap_or_else(Matrix4::identity);
        pick_node(query, root_id, &parent_world, scene, &mut results);
    }

    results
}

fn pick_node<Q: PickQuery>(
    query: &Q,
    node_id: NodeId,
    parent_world: &Matrix4<f32>,
    scene: &Scene,
    results: &mut Vec<Q::Result>,
) {
    let Some(node) = scene.get_node(node_id) else {
        return;
    };
    if !node.is_visible() {
        return;
    }

    let world_transform = parent_world * node.compute_local_transform();

    if let Some(mesh) = node.mesh().and_then(|id| scene.get_mesh(id)) {
        // A collapsed (zero-scale) node cannot be hit
        if let Some(world_to_local) = world_transform.invert() {
            let local_query = query.transform(&world_to_local);
            let in_bounds = mesh
                .bounding()
                .is_some_and(|bounds| local_query.might_intersect_bounds(&bounds));
            if in_bounds {
                local_query.collect_mesh_hits(mesh, node_id, &world_transform, results);
            }
        }
    }

    for &child_id in node.children() {
        pick_node(query, child_id, &world_transform, scene, results);
    }
}
