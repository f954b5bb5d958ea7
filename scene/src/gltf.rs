use std::collections::HashSet;

use cgmath::{Point3, Quaternion, Vector3};

use crate::common::{RgbColor, RgbaColor};
use crate::loader::{ImportError, ModelFormat, ModelImporter};
use crate::material::{Material, MaterialFlags};
use crate::mesh::{Mesh, MeshId, Vertex};
use crate::{NodeId, Scene};

/// Imports GLB and glTF JSON (embedded buffers only) through the `gltf` crate.
///
/// The model lands under one new group node. Meshes used by several glTF
/// nodes are shared, but every mesh node gets its own copy of its materials
/// so that highlighting or fading one part never bleeds into another.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfImporter;

impl ModelImporter for GltfImporter {
    fn name(&self) -> &str {
        "gltf"
    }

    fn supports(&self, format: ModelFormat) -> bool {
        matches!(format, ModelFormat::Glb | ModelFormat::GltfJson)
    }

    fn import(&self, bytes: &[u8], scene: &mut Scene) -> Result<NodeId, ImportError> {
        let (document, buffers, _images) = gltf::import_slice(bytes)?;

        let Some(gltf_scene) = document.default_scene().or_else(|| document.scenes().next()) else {
            return Err(ImportError::EmptyModel);
        };
        if gltf_scene.nodes().next().is_none() {
            return Err(ImportError::EmptyModel);
        }

        // Decode everything before touching the scene
        let materials: Vec<Material> = document.materials().map(|m| load_material(&m)).collect();
        let meshes: Vec<Vec<DecodedPrimitive>> = document
            .meshes()
            .map(|mesh| load_primitives(&mesh, &buffers))
            .collect();

        let name = gltf_scene.name().unwrap_or("Model").to_string();
        let root = scene
            .add_default_node(None, Some(name))
            .map_err(|e| ImportError::Scene(e.to_string()))?;

        let mut builder = SceneBuilder {
            scene,
            meshes,
            materials,
            visited: HashSet::new(),
        };

        let built = gltf_scene
            .nodes()
            .try_for_each(|gltf_node| builder.add_node(&gltf_node, root));

        if let Err(err) = built {
            // Leave the scene as it was
            builder.scene.remove_node(root);
            return Err(ImportError::Scene(err.to_string()));
        }

        log::info!(
            "Imported glTF scene: {} mesh nodes, {} meshes",
            builder.scene.mesh_nodes(root).len(),
            builder.meshes.iter().flatten().filter(|p| p.id.is_some()).count()
        );

        Ok(root)
    }
}

/// A triangle primitive decoded from the buffers, added to the scene on
/// first use.
struct DecodedPrimitive {
    mesh: Option<Mesh>,
    id: Option<MeshId>,
    material: Option<usize>,
}

impl DecodedPrimitive {
    fn mesh_id(&mut self, scene: &mut Scene) -> Option<MeshId> {
        if self.id.is_none() {
            let mesh = self.mesh.take()?;
            self.id = Some(scene.add_mesh(mesh));
        }
        self.id
    }
}

struct SceneBuilder<'a> {
    scene: &'a mut Scene,
    meshes: Vec<Vec<DecodedPrimitive>>,
    materials: Vec<Material>,
    visited: HashSet<usize>,
}

impl SceneBuilder<'_> {
    /// Recursively adds a glTF node and its children.
    fn add_node(&mut self, gltf_node: &gltf::Node, parent: NodeId) -> anyhow::Result<()> {
        if !self.visited.insert(gltf_node.index()) {
            anyhow::bail!("glTF node {} is reachable twice", gltf_node.index());
        }

        let (position, rotation, scale) = decompose_transform(&gltf_node.transform());
        let name = gltf_node.name().map(|s| s.to_string());

        let node_id = match gltf_node.mesh() {
            Some(mesh) => {
                let slots = self.mesh_slots(mesh.index());
                match slots.as_slice() {
                    // Only lines or points: keep the transform
                    [] => self.scene.add_node(Some(parent), name, position, rotation, scale)?,
                    [(mesh_id, material)] => self.scene.add_mesh_node(
                        Some(parent),
                        *mesh_id,
                        vec![*material],
                        name,
                        position,
                        rotation,
                        scale,
                    )?,
                    // One child per primitive, identity transform
                    _ => {
                        let group = self.scene.add_node(Some(parent), name, position, rotation, scale)?;
                        for &(mesh_id, material) in &slots {
                            self.scene.add_mesh_node(
                                Some(group),
                                mesh_id,
                                vec![material],
                                None,
                                Point3::new(0.0, 0.0, 0.0),
                                Quaternion::new(1.0, 0.0, 0.0, 0.0),
                                Vector3::new(1.0, 1.0, 1.0),
                            )?;
                        }
                        group
                    }
                }
            }
            None => self.scene.add_node(Some(parent), name, position, rotation, scale)?,
        };

        for child in gltf_node.children() {
            self.add_node(&child, node_id)?;
        }

        Ok(())
    }

    /// Scene mesh and a fresh material per usable primitive of a glTF mesh.
    fn mesh_slots(&mut self, mesh_index: usize) -> Vec<(MeshId, crate::MaterialId)> {
        let Some(primitives) = self.meshes.get_mut(mesh_index) else {
            return Vec::new();
        };

        let mut slots = Vec::with_capacity(primitives.len());
        for primitive in primitives.iter_mut() {
            let Some(mesh_id) = primitive.mesh_id(self.scene) else {
                continue;
            };
            let material = primitive
                .material
                .and_then(|index| self.materials.get(index))
                .cloned()
                .unwrap_or_default();
            slots.push((mesh_id, self.scene.add_material(material)));
        }
        slots
    }
}

/// Decodes the triangle primitives of a glTF mesh. Anything else is skipped.
fn load_primitives(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Vec<DecodedPrimitive> {
    let mesh_name = mesh.name().unwrap_or("unnamed");

    mesh.primitives()
        .filter_map(|primitive| {
            if !matches!(primitive.mode(), gltf::mesh::Mode::Triangles) {
                log::warn!(
                    "Skipping unsupported primitive mode {:?} in mesh {}",
                    primitive.mode(),
                    mesh_name
                );
                return None;
            }

            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

            let Some(positions) = reader.read_positions() else {
                log::warn!("Skipping primitive without positions in mesh {}", mesh_name);
                return None;
            };

            let vertices: Vec<Vertex> = match reader.read_normals() {
                Some(normals) => positions
                    .zip(normals)
                    .map(|(position, normal)| Vertex { position, normal })
                    .collect(),
                None => positions
                    .map(|position| Vertex {
                        position,
                        normal: [0.0, 0.0, 0.0],
                    })
                    .collect(),
            };

            // Non-indexed primitives draw the vertices in order
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..vertices.len() as u32).collect(),
            };

            Some(DecodedPrimitive {
                mesh: Some(Mesh::from_raw(vertices, indices)),
                id: None,
                material: primitive.material().index(),
            })
        })
        .collect()
}

/// Maps a glTF material onto the properties the viewer uses.
fn load_material(gltf_material: &gltf::Material) -> Material {
    let pbr = gltf_material.pbr_metallic_roughness();
    let base_color = RgbaColor::from_array(pbr.base_color_factor());

    let mut flags = MaterialFlags::DEPTH_WRITE;
    if matches!(gltf_material.alpha_mode(), gltf::material::AlphaMode::Blend) {
        flags |= MaterialFlags::TRANSPARENT;
    }
    if gltf_material.double_sided() {
        flags |= MaterialFlags::DOUBLE_SIDED;
    }

    let mut material = Material::new()
        .with_base_color(base_color)
        .with_emissive(RgbColor::from_array(gltf_material.emissive_factor()))
        .with_flags(flags);
    material.set_opacity(base_color.a);

    match gltf_material.name() {
        Some(name) => material.with_name(name),
        None => material,
    }
}

/// Splits a glTF transform into position, rotation and scale.
fn decompose_transform(transform: &gltf::scene::Transform) -> (Point3<f32>, Quaternion<f32>, Vector3<f32>) {
    let (translation, [x, y, z, w], scale) = transform.clone().decomposed();
    (
        Point3::from(translation),
        // glTF stores (x, y, z, w); cgmath takes w first
        Quaternion::new(w, x, y, z),
        Vector3::from(scale),
    )
}
