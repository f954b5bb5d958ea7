use crate::node::{Node, NodeId};
use crate::scene::Scene;

/// Trait for implementing tree traversal operations.
///
/// The visitor receives callbacks when entering and exiting nodes.
pub trait TreeVisitor {
    /// Called before the node's children.
    ///
    /// Returns true to continue into the children, false to skip the subtree.
    fn enter_node(&mut self, node: &Node) -> bool;

    /// Called after the node's children.
    fn exit_node(&mut self, _node: &Node) {}
}

/// Walks the scene tree depth-first starting from a given node.
/// Unknown nodes are skipped.
pub fn walk_tree<V: TreeVisitor>(scene: &Scene, node_id: NodeId, visitor: &mut V) {
    let Some(node) = scene.get_node(node_id) else {
        return;
    };

    if visitor.enter_node(node) {
        for &child_id in node.children() {
            walk_tree(scene, child_id, visitor);
        }
    }

    visitor.exit_node(node);
}

/// Collects the ids of mesh nodes in visit order.
#[derive(Default)]
pub(crate) struct MeshNodeCollector {
    pub nodes: Vec<NodeId>,
}

impl TreeVisitor for MeshNodeCollector {
    fn enter_node(&mut self, node: &Node) -> bool {
        if node.is_mesh() {
            self.nodes.push(node.id);
        }
        true
    }
}
