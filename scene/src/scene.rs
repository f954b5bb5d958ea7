use std::collections::{BTreeSet, HashMap};
use std::fmt;

use cgmath::{Matrix4, Point3, Quaternion, SquareMatrix, Vector3};

use crate::common::Aabb;
use crate::material::{Material, MaterialId};
use crate::mesh::{Mesh, MeshId};
use crate::node::{Node, NodeId, NodeKind};
use crate::tree::{walk_tree, MeshNodeCollector};

/// A resource dropped from the scene because no node references it anymore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleasedResource {
    Mesh(MeshId),
    Material(MaterialId),
}

/// Everything freed by a single removal, in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleasedResources {
    pub nodes: Vec<NodeId>,
    pub meshes: Vec<MeshId>,
    pub materials: Vec<MaterialId>,
}

impl ReleasedResources {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.meshes.is_empty() && self.materials.is_empty()
    }
}

/// Old-to-new id maps used while adopting a subtree from another scene.
#[derive(Default)]
struct AdoptRemap {
    meshes: HashMap<MeshId, MeshId>,
    materials: HashMap<MaterialId, MaterialId>,
}

impl AdoptRemap {
    fn mesh(&mut self, target: &mut Scene, source: &mut Scene, id: MeshId) -> anyhow::Result<MeshId> {
        if let Some(&mapped) = self.meshes.get(&id) {
            return Ok(mapped);
        }
        let Some(mesh) = source.meshes.remove(&id) else {
            anyhow::bail!("Mesh with ID {} not found in source scene", id);
        };
        let mapped = target.add_mesh(mesh);
        self.meshes.insert(id, mapped);
        Ok(mapped)
    }

    fn material(
        &mut self,
        target: &mut Scene,
        source: &mut Scene,
        id: MaterialId,
    ) -> anyhow::Result<MaterialId> {
        if let Some(&mapped) = self.materials.get(&id) {
            return Ok(mapped);
        }
        let Some(material) = source.materials.remove(&id) else {
            anyhow::bail!("Material with ID {} not found in source scene", id);
        };
        let mapped = target.add_material(material);
        self.materials.insert(id, mapped);
        Ok(mapped)
    }
}

/// Callback notified once per released mesh or material. Hosts use it to
/// free the matching GPU buffers.
pub type ReleaseHook = Box<dyn FnMut(ReleasedResource)>;

/// The scene container holding all meshes, materials and nodes.
///
/// Node, mesh and material ids are assigned sequentially and never reused
/// within the lifetime of a scene, so a stale handle from a previous model
/// can never alias a node of the current one.
///
/// # Examples
///
/// ```
/// use partview_scene::{Material, Mesh, Scene};
/// use cgmath::{Point3, Quaternion, Vector3};
///
/// let mut scene = Scene::new();
/// let mesh = scene.add_mesh(Mesh::cube(1.0));
/// let material = scene.add_material(Material::new());
///
/// let root = scene.add_default_node(None, Some("assembly".into())).unwrap();
/// let part = scene
///     .add_mesh_node(
///         Some(root),
///         mesh,
///         vec![material],
///         Some("bracket".into()),
///         Point3::new(2.0, 0.0, 0.0),
///         Quaternion::new(1.0, 0.0, 0.0, 0.0),
///         Vector3::new(1.0, 1.0, 1.0),
///     )
///     .unwrap();
///
/// let bounds = scene.nodes_bounding(root).unwrap();
/// assert_eq!(bounds.center(), Point3::new(2.0, 0.0, 0.0));
/// assert!(scene.get_node(part).unwrap().is_mesh());
/// ```
pub struct Scene {
    pub meshes: HashMap<MeshId, Mesh>,
    pub materials: HashMap<MaterialId, Material>,

    // Scene tree
    pub nodes: HashMap<NodeId, Node>,
    pub root_nodes: Vec<NodeId>,

    release_hook: Option<ReleaseHook>,

    next_mesh_id: MeshId,
    next_node_id: NodeId,
    next_material_id: MaterialId,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.nodes.len())
            .field("meshes", &self.meshes.len())
            .field("materials", &self.materials.len())
            .field("root_nodes", &self.root_nodes)
            .finish()
    }
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self {
            meshes: HashMap::new(),
            materials: HashMap::new(),
            nodes: HashMap::new(),
            root_nodes: Vec::new(),
            release_hook: None,
            next_mesh_id: 0,
            next_node_id: 0,
            next_material_id: 0,
        }
    }

    /// Installs the callback run for every mesh and material the scene
    /// releases. Replaces any previous hook.
    pub fn set_release_hook(&mut self, hook: ReleaseHook) {
        self.release_hook = Some(hook);
    }

    // ========== Mesh API ==========

    pub fn add_mesh(&mut self, mut mesh: Mesh) -> MeshId {
        let id = self.next_mesh_id;
        self.next_mesh_id += 1;

        mesh.id = id;
        self.meshes.insert(id, mesh);
        id
    }

    pub fn get_mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(&id)
    }

    // ========== Material API ==========

    pub fn add_material(&mut self, mut material: Material) -> MaterialId {
        let id = self.next_material_id;
        self.next_material_id += 1;

        material.id = id;
        self.materials.insert(id, material);
        id
    }

    pub fn get_material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    pub fn get_material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(&id)
    }

    // ========== Node API ==========

    /// Adds a new group node to the scene tree.
    ///
    /// # Errors
    /// Returns an error if `parent` is `Some` but the specified node doesn't exist.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: Option<String>,
        position: Point3<f32>,
        rotation: Quaternion<f32>,
        scale: Vector3<f32>,
    ) -> anyhow::Result<NodeId> {
        let id = self.next_node_id;

        match parent {
            Some(parent_id) => {
                let Some(parent_node) = self.nodes.get_mut(&parent_id) else {
                    anyhow::bail!("Parent node with ID {} not found in scene", parent_id);
                };
                parent_node.add_child(id);
            }
            None => self.root_nodes.push(id),
        }

        let mut node = Node::new(id, name, position, rotation, scale);
        node.set_parent(parent);

        self.next_node_id += 1;
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Adds a renderable node referencing an existing mesh and material slots.
    ///
    /// # Errors
    /// Returns an error if the parent, the mesh or any material doesn't exist.
    #[allow(clippy::too_many_arguments)]
    pub fn add_mesh_node(
        &mut self,
        parent: Option<NodeId>,
        mesh: MeshId,
        materials: Vec<MaterialId>,
        name: Option<String>,
        position: Point3<f32>,
        rotation: Quaternion<f32>,
        scale: Vector3<f32>,
    ) -> anyhow::Result<NodeId> {
        if !self.meshes.contains_key(&mesh) {
            anyhow::bail!("Mesh with ID {} not found in scene", mesh);
        }
        if let Some(missing) = materials.iter().find(|id| !self.materials.contains_key(id)) {
            anyhow::bail!("Material with ID {} not found in scene", missing);
        }

        let node_id = self.add_node(parent, name, position, rotation, scale)?;
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.set_kind(NodeKind::Mesh { mesh, materials });
        }

        Ok(node_id)
    }

    /// Adds a group node with an identity transform.
    pub fn add_default_node(
        &mut self,
        parent: Option<NodeId>,
        name: Option<String>,
    ) -> anyhow::Result<NodeId> {
        self.add_node(
            parent,
            name,
            Point3::new(0.0, 0.0, 0.0),
            Quaternion::new(1.0, 0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
        )
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn root_nodes(&self) -> &[NodeId] {
        &self.root_nodes
    }

    /// Mesh nodes in the subtree under `root`, depth-first in sibling order.
    pub fn mesh_nodes(&self, root: NodeId) -> Vec<NodeId> {
        let mut collector = MeshNodeCollector::default();
        walk_tree(self, root, &mut collector);
        collector.nodes
    }

    /// Removes a node and its subtree, then releases every mesh and material
    /// that no remaining node references.
    ///
    /// The release hook runs once per released resource, meshes first.
    /// Removing an unknown node releases nothing.
    pub fn remove_node(&mut self, node_id: NodeId) -> ReleasedResources {
        let mut released = ReleasedResources::default();
        let Some(node) = self.nodes.get(&node_id) else {
            return released;
        };

        // Unlink from the parent once; descendants go with the subtree
        let parent = node.parent();
        match parent {
            Some(parent_id) => {
                if let Some(parent) = self.nodes.get_mut(&parent_id) {
                    parent.remove_child(node_id);
                }
            }
            None => self.root_nodes.retain(|&id| id != node_id),
        }

        let mut meshes = BTreeSet::new();
        let mut materials = BTreeSet::new();
        let mut stack = vec![node_id];
        while let Some(id) = stack.pop() {
            let Some(removed) = self.nodes.remove(&id) else {
                continue;
            };
            if let Some(mesh) = removed.mesh() {
                meshes.insert(mesh);
            }
            materials.extend(removed.materials().iter().copied());
            stack.extend(removed.children().iter().copied());
            released.nodes.push(id);
        }
        released.nodes.sort_unstable();

        // Shared resources survive while any remaining node uses them
        for node in self.nodes.values() {
            if let Some(mesh) = node.mesh() {
                meshes.remove(&mesh);
            }
            for material in node.materials() {
                materials.remove(material);
            }
        }

        for mesh in meshes {
            if self.meshes.remove(&mesh).is_some() {
                released.meshes.push(mesh);
                self.notify_release(ReleasedResource::Mesh(mesh));
            }
        }
        for material in materials {
            if self.materials.remove(&material).is_some() {
                released.materials.push(material);
                self.notify_release(ReleasedResource::Material(material));
            }
        }

        log::debug!(
            "Removed {} nodes, released {} meshes and {} materials",
            released.nodes.len(),
            released.meshes.len(),
            released.materials.len()
        );

        released
    }

    /// Removes every node and releases every mesh and material.
    ///
    /// Id counters keep counting so handles from before the clear stay invalid.
    pub fn clear(&mut self) -> ReleasedResources {
        let mut released = ReleasedResources {
            nodes: self.nodes.keys().copied().collect(),
            meshes: self.meshes.keys().copied().collect(),
            materials: self.materials.keys().copied().collect(),
        };
        released.nodes.sort_unstable();
        released.meshes.sort_unstable();
        released.materials.sort_unstable();

        self.nodes.clear();
        self.root_nodes.clear();
        self.meshes.clear();
        self.materials.clear();

        for &mesh in &released.meshes {
            self.notify_release(ReleasedResource::Mesh(mesh));
        }
        for &material in &released.materials {
            self.notify_release(ReleasedResource::Material(material));
        }

        released
    }

    /// Moves the subtree under `root` of `other` into this scene as a new
    /// root node and returns its id.
    ///
    /// Meshes and materials referenced by the subtree come along under fresh
    /// ids; sharing between nodes is preserved. Nothing is released.
    pub fn adopt(&mut self, mut other: Scene, root: NodeId) -> anyhow::Result<NodeId> {
        if !other.contains_node(root) {
            anyhow::bail!("Node with ID {} not found in source scene", root);
        }

        let mut remap = AdoptRemap::default();
        self.adopt_node(&mut other, root, None, &mut remap)
    }

    fn adopt_node(
        &mut self,
        other: &mut Scene,
        node_id: NodeId,
        parent: Option<NodeId>,
        remap: &mut AdoptRemap,
    ) -> anyhow::Result<NodeId> {
        let Some(node) = other.nodes.remove(&node_id) else {
            anyhow::bail!("Node with ID {} not found in source scene", node_id);
        };

        let new_id = self.add_node(
            parent,
            node.name.clone(),
            node.position(),
            node.rotation(),
            node.scale(),
        )?;

        let kind = match node.kind() {
            NodeKind::Group => NodeKind::Group,
            NodeKind::Mesh { mesh, materials } => NodeKind::Mesh {
                mesh: remap.mesh(self, other, *mesh)?,
                materials: materials
                    .iter()
                    .map(|&material| remap.material(self, other, material))
                    .collect::<anyhow::Result<_>>()?,
            },
        };

        if let Some(adopted) = self.nodes.get_mut(&new_id) {
            adopted.set_kind(kind);
            adopted.set_visibility(node.visibility());
        }

        for &child in node.children() {
            self.adopt_node(other, child, Some(new_id), remap)?;
        }

        Ok(new_id)
    }

    fn notify_release(&mut self, resource: ReleasedResource) {
        if let Some(hook) = self.release_hook.as_mut() {
            hook(resource);
        }
    }

    // ========== Transforms and bounds ==========

    /// World transform of a node, composed from the root down.
    /// Unknown nodes yield the identity.
    pub fn nodes_transform(&self, node_id: NodeId) -> Matrix4<f32> {
        let mut world_transform = Matrix4::identity();
        let mut current = Some(node_id);

        // Walk up, pre-multiplying each parent's local transform
        while let Some(id) = current {
            let Some(node) = self.get_node(id) else {
                break;
            };
            world_transform = node.compute_local_transform() * world_transform;
            current = node.parent();
        }

        world_transform
    }

    /// World-space bounding box of a node and its subtree.
    ///
    /// Computed fresh on every call, so it always reflects the current
    /// positions (including exploded ones). Returns None when the subtree
    /// holds no geometry or the node is unknown.
    pub fn nodes_bounding(&self, node_id: NodeId) -> Option<Aabb> {
        self.get_node(node_id)?;
        self.subtree_bounding(node_id, &self.parent_transform(node_id))
    }

    fn parent_transform(&self, node_id: NodeId) -> Matrix4<f32> {
        self.get_node(node_id)
            .and_then(Node::parent)
            .map(|parent| self.nodes_transform(parent))
            .unwrap_or_else(Matrix4::identity)
    }

    fn subtree_bounding(&self, node_id: NodeId, parent_world: &Matrix4<f32>) -> Option<Aabb> {
        let node = self.get_node(node_id)?;
        let world_transform = parent_world * node.compute_local_transform();

        let own = node
            .mesh()
            .and_then(|mesh| self.meshes.get(&mesh))
            .and_then(Mesh::bounding)
            .map(|bounds| bounds.transform(&world_transform));

        node.children().iter().fold(own, |merged, &child_id| {
            Aabb::merge_optional(merged, self.subtree_bounding(child_id, &world_transform))
        })
    }

    /// World-space bounding box of the entire scene.
    pub fn bounding(&self) -> Option<Aabb> {
        self.root_nodes
            .iter()
            .fold(None, |merged, &root_id| {
                Aabb::merge_optional(merged, self.nodes_bounding(root_id))
            })
    }
}
