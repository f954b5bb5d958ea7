use cgmath::{EuclideanSpace, Matrix4, Point3, Quaternion, Vector3};

use crate::material::MaterialId;
use crate::mesh::MeshId;

/// Unique identifier for a Node in the scene tree.
pub type NodeId = u32;

/// What a node carries besides its transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Transform-only node grouping its children.
    Group,
    /// Renderable node. Each entry in `materials` is one material slot.
    Mesh {
        mesh: MeshId,
        materials: Vec<MaterialId>,
    },
}

/// Explicit visibility state set by the user or the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Invisible,
}

/// A node in the scene tree hierarchy.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: Option<String>,

    position: Point3<f32>,
    rotation: Quaternion<f32>,
    scale: Vector3<f32>,

    parent: Option<NodeId>,
    children: Vec<NodeId>,

    kind: NodeKind,
    visibility: Visibility,
}

impl Node {
    pub fn new(
        id: NodeId,
        name: Option<String>,
        position: Point3<f32>,
        rotation: Quaternion<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        Self {
            id,
            name,
            position,
            rotation,
            scale,
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Group,
            visibility: Visibility::default(),
        }
    }

    /// Creates a group node with an identity transform.
    pub fn new_default(id: NodeId) -> Self {
        Self::new(
            id,
            None,
            Point3::origin(),
            Quaternion::new(1.0, 0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
        )
    }

    /// Local transform, composed as Translation * Rotation * Scale.
    pub fn compute_local_transform(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position.to_vec())
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn set_position(&mut self, position: Point3<f32>) {
        self.position = position;
    }

    pub fn rotation(&self) -> Quaternion<f32> {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quaternion<f32>) {
        self.rotation = rotation;
    }

    pub fn scale(&self) -> Vector3<f32> {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Internal use only; Scene keeps both sides of the link consistent.
    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    /// Children in sibling order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(crate) fn add_child(&mut self, child: NodeId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|&id| id != child);
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn set_kind(&mut self, kind: NodeKind) {
        self.kind = kind;
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh { .. })
    }

    pub fn mesh(&self) -> Option<MeshId> {
        match &self.kind {
            NodeKind::Mesh { mesh, .. } => Some(*mesh),
            NodeKind::Group => None,
        }
    }

    /// Material slots of a mesh node; empty for groups.
    pub fn materials(&self) -> &[MaterialId] {
        match &self.kind {
            NodeKind::Mesh { materials, .. } => materials,
            NodeKind::Group => &[],
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::EPSILON;
    use cgmath::{Deg, Rotation3, SquareMatrix};

    #[test]
    fn test_node_default_values() {
        let node = Node::new_default(7);

        assert_eq!(node.id, 7);
        assert_eq!(node.name, None);
        assert_eq!(node.parent(), None);
        assert!(node.children().is_empty());
        assert_eq!(node.kind(), &NodeKind::Group);
        assert!(node.is_visible());
        assert!(!node.is_mesh());
        assert!(node.materials().is_empty());
    }

    #[test]
    fn test_local_transform_identity() {
        let node = Node::new_default(0);
        let transform = node.compute_local_transform();
        let identity = Matrix4::<f32>::identity();

        for i in 0..4 {
            for j in 0..4 {
                assert!((transform[i][j] - identity[i][j]).abs() < EPSILON);
            }
        }
    }

    #[test]
    fn test_local_transform_trs_order() {
        let mut node = Node::new_default(0);
        node.set_position(Point3::new(10.0, 0.0, 0.0));
        node.set_rotation(Quaternion::from_angle_z(Deg(90.0)));
        node.set_scale(Vector3::new(2.0, 2.0, 2.0));

        // (1, 0, 0) -> scale (2, 0, 0) -> rotate (0, 2, 0) -> translate (10, 2, 0)
        let p = node.compute_local_transform() * Point3::new(1.0, 0.0, 0.0).to_homogeneous();
        let p = Point3::from_homogeneous(p);

        assert!((p.x - 10.0).abs() < 1e-5);
        assert!((p.y - 2.0).abs() < 1e-5);
        assert!(p.z.abs() < 1e-5);
    }

    #[test]
    fn test_mesh_kind_accessors() {
        let mut node = Node::new_default(1);
        node.set_kind(NodeKind::Mesh {
            mesh: 4,
            materials: vec![2, 3],
        });

        assert!(node.is_mesh());
        assert_eq!(node.mesh(), Some(4));
        assert_eq!(node.materials(), &[2, 3]);
    }

    #[test]
    fn test_child_list_has_no_duplicates() {
        let mut node = Node::new_default(0);
        node.add_child(3);
        node.add_child(3);
        node.add_child(5);
        assert_eq!(node.children(), &[3, 5]);

        node.remove_child(3);
        assert_eq!(node.children(), &[5]);
    }
}
