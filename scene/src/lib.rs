pub use partview_common as common;

mod material;
mod mesh;
mod node;
mod scene;
mod tree;

pub mod geom_query;
pub mod gltf;
pub mod loader;

pub use self::gltf::GltfImporter;
pub use loader::{ImportError, ImportedModel, ImporterRegistry, ModelFormat, ModelImporter};
pub use material::{Material, MaterialFlags, MaterialId};
pub use mesh::{Mesh, MeshHit, MeshId, Vertex};
pub use node::{Node, NodeId, NodeKind, Visibility};
pub use scene::{ReleaseHook, ReleasedResource, ReleasedResources, Scene};
pub use tree::{walk_tree, TreeVisitor};

#[cfg(test)]
mod scene_tests;
