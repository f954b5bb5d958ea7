use super::*;
use cgmath::{Deg, InnerSpace, Matrix4, Point3, Quaternion, Rotation3, SquareMatrix, Vector3};
use std::cell::RefCell;
use std::rc::Rc;

use crate::common::{Ray, EPSILON};
use crate::geom_query::pick_all_from_ray;

fn identity_rotation() -> Quaternion<f32> {
    Quaternion::new(1.0, 0.0, 0.0, 0.0)
}

fn unit_scale() -> Vector3<f32> {
    Vector3::new(1.0, 1.0, 1.0)
}

/// Adds a unit cube part with its own material at `position` under `parent`.
fn add_cube_part(scene: &mut Scene, parent: Option<NodeId>, position: Point3<f32>) -> NodeId {
    let mesh = scene.add_mesh(Mesh::cube(1.0));
    let material = scene.add_material(Material::new());
    scene
        .add_mesh_node(parent, mesh, vec![material], None, position, identity_rotation(), unit_scale())
        .unwrap()
}

/// Records every resource the scene releases.
fn install_recorder(scene: &mut Scene) -> Rc<RefCell<Vec<ReleasedResource>>> {
    let released = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&released);
    scene.set_release_hook(Box::new(move |resource| sink.borrow_mut().push(resource)));
    released
}

// ========================================================================
// Scene Creation and Basic Operations
// ========================================================================

#[test]
fn test_scene_new() {
    let scene = Scene::new();

    assert_eq!(scene.meshes.len(), 0);
    assert_eq!(scene.materials.len(), 0);
    assert_eq!(scene.nodes.len(), 0);
    assert_eq!(scene.root_nodes.len(), 0);
    assert!(scene.bounding().is_none());
}

#[test]
fn test_ids_are_sequential() {
    let mut scene = Scene::new();

    assert_eq!(scene.add_mesh(Mesh::cube(1.0)), 0);
    assert_eq!(scene.add_mesh(Mesh::cube(2.0)), 1);
    assert_eq!(scene.add_material(Material::new()), 0);
    assert_eq!(scene.add_material(Material::new()), 1);
    assert_eq!(scene.get_mesh(1).unwrap().id, 1);
    assert_eq!(scene.get_material(1).unwrap().id, 1);
}

// ========================================================================
// Scene Tree Construction
// ========================================================================

#[test]
fn test_add_root_node() {
    let mut scene = Scene::new();

    let node_id = scene.add_default_node(None, None).unwrap();

    assert_eq!(node_id, 0);
    assert_eq!(scene.root_nodes(), &[node_id]);

    let node = scene.get_node(node_id).unwrap();
    assert_eq!(node.parent(), None);
    assert!(node.children().is_empty());
}

#[test]
fn test_add_child_node() {
    let mut scene = Scene::new();

    let root = scene.add_default_node(None, None).unwrap();
    let child = scene.add_default_node(Some(root), Some("child".into())).unwrap();

    assert_eq!(scene.nodes.len(), 2);
    assert_eq!(scene.root_nodes.len(), 1);

    // Verify parent-child relationship is bidirectional
    assert_eq!(scene.get_node(root).unwrap().children(), &[child]);
    assert_eq!(scene.get_node(child).unwrap().parent(), Some(root));
    assert_eq!(scene.get_node(child).unwrap().name.as_deref(), Some("child"));
}

#[test]
fn test_add_node_with_invalid_parent_fails() {
    let mut scene = Scene::new();

    assert!(scene.add_default_node(Some(99), None).is_err());
    assert!(scene.nodes.is_empty());
    assert!(scene.root_nodes.is_empty());

    // The failed call must not burn an id
    assert_eq!(scene.add_default_node(None, None).unwrap(), 0);
}

#[test]
fn test_add_mesh_node_validates_references() {
    let mut scene = Scene::new();
    let mesh = scene.add_mesh(Mesh::cube(1.0));
    let material = scene.add_material(Material::new());

    let missing_mesh = scene.add_mesh_node(
        None, 7, vec![material], None, Point3::new(0.0, 0.0, 0.0), identity_rotation(), unit_scale(),
    );
    let missing_material = scene.add_mesh_node(
        None, mesh, vec![material, 9], None, Point3::new(0.0, 0.0, 0.0), identity_rotation(), unit_scale(),
    );

    assert!(missing_mesh.is_err());
    assert!(missing_material.is_err());
    assert!(scene.nodes.is_empty());
}

#[test]
fn test_mesh_nodes_depth_first() {
    let mut scene = Scene::new();
    let root = scene.add_default_node(None, None).unwrap();
    let a = add_cube_part(&mut scene, Some(root), Point3::new(0.0, 0.0, 0.0));
    let group = scene.add_default_node(Some(root), None).unwrap();
    let b = add_cube_part(&mut scene, Some(group), Point3::new(1.0, 0.0, 0.0));
    let c = add_cube_part(&mut scene, Some(root), Point3::new(2.0, 0.0, 0.0));

    assert_eq!(scene.mesh_nodes(root), vec![a, b, c]);
    assert_eq!(scene.mesh_nodes(group), vec![b]);
    assert!(scene.mesh_nodes(1234).is_empty());
}

// ========================================================================
// Transforms and Bounds
// ========================================================================

#[test]
fn test_root_node_identity_transform() {
    let mut scene = Scene::new();
    let root = scene.add_default_node(None, None).unwrap();

    let transform = scene.nodes_transform(root);
    let identity = Matrix4::<f32>::identity();
    for i in 0..4 {
        for j in 0..4 {
            assert!((transform[i][j] - identity[i][j]).abs() < EPSILON);
        }
    }
}

#[test]
fn test_child_transform_accumulation() {
    let mut scene = Scene::new();

    let root = scene
        .add_node(None, None, Point3::new(10.0, 0.0, 0.0), identity_rotation(), Vector3::new(2.0, 2.0, 2.0))
        .unwrap();
    let child = scene
        .add_node(Some(root), None, Point3::new(1.0, 0.0, 0.0), identity_rotation(), unit_scale())
        .unwrap();

    let world = scene.nodes_transform(child);
    let origin = Point3::from_homogeneous(world * Point3::new(0.0, 0.0, 0.0).to_homogeneous());

    // Child offset is scaled by the parent
    assert!((origin.x - 12.0).abs() < EPSILON);
    assert!(origin.y.abs() < EPSILON);
}

#[test]
fn test_group_without_geometry_has_no_bounds() {
    let mut scene = Scene::new();
    let root = scene.add_default_node(None, None).unwrap();
    scene.add_default_node(Some(root), None).unwrap();

    assert!(scene.nodes_bounding(root).is_none());
    assert!(scene.nodes_bounding(42).is_none());
}

#[test]
fn test_bounds_merge_children_in_world_space() {
    let mut scene = Scene::new();
    let root = scene
        .add_node(None, None, Point3::new(0.0, 5.0, 0.0), identity_rotation(), unit_scale())
        .unwrap();
    add_cube_part(&mut scene, Some(root), Point3::new(-3.0, 0.0, 0.0));
    add_cube_part(&mut scene, Some(root), Point3::new(3.0, 0.0, 0.0));

    let bounds = scene.nodes_bounding(root).unwrap();

    assert!((bounds.min.x + 3.5).abs() < EPSILON);
    assert!((bounds.max.x - 3.5).abs() < EPSILON);
    assert!((bounds.min.y - 4.5).abs() < EPSILON);
    assert!((bounds.max.y - 5.5).abs() < EPSILON);
    assert_eq!(scene.bounding(), Some(bounds));
}

#[test]
fn test_bounds_follow_moved_nodes() {
    let mut scene = Scene::new();
    let root = scene.add_default_node(None, None).unwrap();
    let part = add_cube_part(&mut scene, Some(root), Point3::new(0.0, 0.0, 0.0));

    let before = scene.nodes_bounding(root).unwrap();
    let node = scene.get_node_mut(part).unwrap();
    node.set_position(node.position() + Vector3::new(0.0, 0.0, 4.0));
    let after = scene.nodes_bounding(root).unwrap();

    assert!((after.center().z - before.center().z - 4.0).abs() < EPSILON);
}

#[test]
fn test_bounds_of_rotated_child() {
    let mut scene = Scene::new();
    let root = scene.add_default_node(None, None).unwrap();
    let mesh = scene.add_mesh(Mesh::box_mesh(4.0, 1.0, 1.0));
    let material = scene.add_material(Material::new());
    scene
        .add_mesh_node(
            Some(root),
            mesh,
            vec![material],
            None,
            Point3::new(0.0, 0.0, 0.0),
            Quaternion::from_angle_z(Deg(90.0)),
            unit_scale(),
        )
        .unwrap();

    let size = scene.nodes_bounding(root).unwrap().size();
    assert!((size.x - 1.0).abs() < 1e-5);
    assert!((size.y - 4.0).abs() < 1e-5);
}

// ========================================================================
// Removal and Resource Release
// ========================================================================

#[test]
fn test_remove_node_releases_subtree_resources() {
    let mut scene = Scene::new();
    let released = install_recorder(&mut scene);

    let root = scene.add_default_node(None, None).unwrap();
    add_cube_part(&mut scene, Some(root), Point3::new(0.0, 0.0, 0.0));
    add_cube_part(&mut scene, Some(root), Point3::new(1.0, 0.0, 0.0));

    let result = scene.remove_node(root);

    assert_eq!(result.nodes.len(), 3);
    assert_eq!(result.meshes, vec![0, 1]);
    assert_eq!(result.materials, vec![0, 1]);
    assert!(scene.nodes.is_empty());
    assert!(scene.meshes.is_empty());
    assert!(scene.materials.is_empty());
    assert!(scene.root_nodes.is_empty());

    assert_eq!(
        *released.borrow(),
        vec![
            ReleasedResource::Mesh(0),
            ReleasedResource::Mesh(1),
            ReleasedResource::Material(0),
            ReleasedResource::Material(1),
        ]
    );
}

#[test]
fn test_remove_node_keeps_shared_resources() {
    let mut scene = Scene::new();
    let released = install_recorder(&mut scene);

    let mesh = scene.add_mesh(Mesh::cube(1.0));
    let shared = scene.add_material(Material::new());
    let origin = Point3::new(0.0, 0.0, 0.0);
    let a = scene
        .add_mesh_node(None, mesh, vec![shared], None, origin, identity_rotation(), unit_scale())
        .unwrap();
    let b = scene
        .add_mesh_node(None, mesh, vec![shared], None, origin, identity_rotation(), unit_scale())
        .unwrap();

    let first = scene.remove_node(a);
    assert_eq!(first.nodes, vec![a]);
    assert!(first.meshes.is_empty());
    assert!(first.materials.is_empty());
    assert!(released.borrow().is_empty());

    let second = scene.remove_node(b);
    assert_eq!(second.meshes, vec![mesh]);
    assert_eq!(second.materials, vec![shared]);
    assert_eq!(released.borrow().len(), 2);
}

#[test]
fn test_remove_child_unlinks_from_parent() {
    let mut scene = Scene::new();
    let root = scene.add_default_node(None, None).unwrap();
    let keep = add_cube_part(&mut scene, Some(root), Point3::new(0.0, 0.0, 0.0));
    let removed = add_cube_part(&mut scene, Some(root), Point3::new(1.0, 0.0, 0.0));

    scene.remove_node(removed);

    assert_eq!(scene.get_node(root).unwrap().children(), &[keep]);
    assert!(!scene.contains_node(removed));
    assert_eq!(scene.meshes.len(), 1);
}

#[test]
fn test_remove_unknown_node_is_noop() {
    let mut scene = Scene::new();
    let released = install_recorder(&mut scene);
    add_cube_part(&mut scene, None, Point3::new(0.0, 0.0, 0.0));

    assert!(scene.remove_node(77).is_empty());
    assert_eq!(scene.nodes.len(), 1);
    assert!(released.borrow().is_empty());
}

#[test]
fn test_clear_releases_everything_without_reusing_ids() {
    let mut scene = Scene::new();
    let released = install_recorder(&mut scene);
    let first = add_cube_part(&mut scene, None, Point3::new(0.0, 0.0, 0.0));

    let result = scene.clear();
    assert_eq!(result.meshes, vec![0]);
    assert_eq!(released.borrow().len(), 2);

    let second = add_cube_part(&mut scene, None, Point3::new(0.0, 0.0, 0.0));
    assert_ne!(first, second);
}

// ========================================================================
// Ray Picking
// ========================================================================

#[test]
fn test_pick_nearest_first() {
    let mut scene = Scene::new();
    let root = scene.add_default_node(None, None).unwrap();
    let near = add_cube_part(&mut scene, Some(root), Point3::new(0.0, 0.0, 2.0));
    let far = add_cube_part(&mut scene, Some(root), Point3::new(0.0, 0.0, -2.0));

    let ray = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0));
    let hits = pick_all_from_ray(&ray, &scene, &[root]);

    assert_eq!(hits.first().map(|hit| hit.node_id), Some(near));
    assert!(hits.iter().any(|hit| hit.node_id == far));
    assert!((hits[0].distance - 7.5).abs() < 1e-4);
    assert!(hits.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
}

#[test]
fn test_pick_respects_node_transforms() {
    let mut scene = Scene::new();
    let root = scene
        .add_node(None, None, Point3::new(5.0, 0.0, 0.0), identity_rotation(), Vector3::new(2.0, 2.0, 2.0))
        .unwrap();
    let part = add_cube_part(&mut scene, Some(root), Point3::new(0.0, 0.0, 0.0));

    // Scaled cube spans x in [4, 6]
    let hit_ray = Ray::new(Point3::new(5.8, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0));
    let miss_ray = Ray::new(Point3::new(6.2, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0));

    let hits = pick_all_from_ray(&hit_ray, &scene, &[root]);
    assert_eq!(hits[0].node_id, part);
    assert!((hits[0].distance - 9.0).abs() < 1e-4);
    assert!((hits[0].hit_point.z - 1.0).abs() < 1e-4);

    assert!(pick_all_from_ray(&miss_ray, &scene, &[root]).is_empty());
}

#[test]
fn test_pick_limited_to_given_roots() {
    let mut scene = Scene::new();
    let model = scene.add_default_node(None, None).unwrap();
    let other = scene.add_default_node(None, None).unwrap();
    add_cube_part(&mut scene, Some(other), Point3::new(0.0, 0.0, 0.0));

    let ray = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0));
    assert!(pick_all_from_ray(&ray, &scene, &[model]).is_empty());
    assert!(!pick_all_from_ray(&ray, &scene, &[other]).is_empty());
}

#[test]
fn test_pick_skips_invisible_subtrees() {
    let mut scene = Scene::new();
    let root = scene.add_default_node(None, None).unwrap();
    let hidden = add_cube_part(&mut scene, Some(root), Point3::new(0.0, 0.0, 2.0));
    let behind = add_cube_part(&mut scene, Some(root), Point3::new(0.0, 0.0, -2.0));
    scene.get_node_mut(hidden).unwrap().set_visibility(Visibility::Invisible);

    let ray = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0));
    let hits = pick_all_from_ray(&ray, &scene, &[root]);

    assert_eq!(hits[0].node_id, behind);
    assert!(hits.iter().all(|hit| hit.node_id != hidden));
}

#[test]
fn test_pick_distances_are_world_units() {
    let mut scene = Scene::new();
    let root = scene.add_default_node(None, None).unwrap();
    let mesh = scene.add_mesh(Mesh::cube(1.0));
    let material = scene.add_material(Material::new());
    scene
        .add_mesh_node(
            Some(root),
            mesh,
            vec![material],
            None,
            Point3::new(0.0, 0.0, 0.0),
            identity_rotation(),
            Vector3::new(1.0, 1.0, 10.0),
        )
        .unwrap();

    let direction = Vector3::new(0.0, 0.0, -1.0);
    let ray = Ray::new(Point3::new(0.0, 0.0, 20.0), direction);
    let hits = pick_all_from_ray(&ray, &scene, &[root]);

    // Front face sits at z = 5 after the stretch
    assert!((hits[0].distance - 15.0).abs() < 1e-3);
    assert!((hits[0].hit_point - Point3::new(0.0, 0.0, 5.0)).magnitude() < 1e-3);
}

// ========================================================================
// Adopting Subtrees
// ========================================================================

#[test]
fn test_adopt_moves_subtree_with_fresh_ids() {
    let mut staging = Scene::new();
    let staged_root = staging.add_default_node(None, Some("model".into())).unwrap();
    let mesh = staging.add_mesh(Mesh::cube(1.0));
    let material = staging.add_material(Material::new());
    let origin = Point3::new(0.0, 0.0, 0.0);
    for x in [1.0, 2.0] {
        staging
            .add_mesh_node(
                Some(staged_root),
                mesh,
                vec![material],
                None,
                Point3::new(x, 0.0, 0.0),
                identity_rotation(),
                unit_scale(),
            )
            .unwrap();
    }
    let hidden = staging.add_default_node(Some(staged_root), None).unwrap();
    staging.get_node_mut(hidden).unwrap().set_visibility(Visibility::Invisible);

    let mut scene = Scene::new();
    add_cube_part(&mut scene, None, origin);
    let root = scene.adopt(staging, staged_root).unwrap();

    assert_eq!(scene.root_nodes().len(), 2);
    assert_eq!(scene.get_node(root).unwrap().name.as_deref(), Some("model"));
    assert_eq!(scene.get_node(root).unwrap().children().len(), 3);

    // Shared mesh and material stay shared
    let parts = scene.mesh_nodes(root);
    assert_eq!(parts.len(), 2);
    let first = scene.get_node(parts[0]).unwrap();
    let second = scene.get_node(parts[1]).unwrap();
    assert_eq!(first.mesh(), second.mesh());
    assert_eq!(first.materials(), second.materials());
    assert_eq!(scene.meshes.len(), 2);
    assert_eq!(scene.materials.len(), 2);

    let adopted_hidden = scene.get_node(root).unwrap().children()[2];
    assert!(!scene.get_node(adopted_hidden).unwrap().is_visible());

    let bounds = scene.nodes_bounding(root).unwrap();
    assert!((bounds.min.x - 0.5).abs() < EPSILON);
    assert!((bounds.max.x - 2.5).abs() < EPSILON);
}

#[test]
fn test_adopt_unknown_root_fails() {
    let mut scene = Scene::new();
    assert!(scene.adopt(Scene::new(), 3).is_err());
    assert!(scene.nodes.is_empty());
}
