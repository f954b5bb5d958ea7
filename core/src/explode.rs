//! Exploded-view layout.
//!
//! Each visible child of the model root is pushed away from the model centre
//! along the line through its own centre. Parts further down the child list
//! travel further, so nested parts fan out instead of overlapping.

use cgmath::{InnerSpace, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::scene::{NodeId, Scene};

/// Direction used for a part whose centre coincides with the model centre,
/// or that has no geometry of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionFallback {
    /// The part stays put.
    Zero,
    /// Cycle through +X, +Y, +Z, -X, -Y, -Z by sibling index.
    #[default]
    AxisCycle,
}

impl DirectionFallback {
    const AXES: [[f32; 3]; 6] = [
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [-1.0, 0.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, -1.0],
    ];

    pub fn direction(self, index: usize) -> Vector3<f32> {
        match self {
            DirectionFallback::Zero => Vector3::new(0.0, 0.0, 0.0),
            DirectionFallback::AxisCycle => Vector3::from(Self::AXES[index % Self::AXES.len()]),
        }
    }
}

/// Placement data for one exploded part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplodeEntry {
    pub node: NodeId,
    /// Unit vector, or zero for a part that doesn't move.
    pub direction: Vector3<f32>,
    /// Local position when the plan was built.
    pub base_offset: Point3<f32>,
    pub magnitude: f32,
}

impl ExplodeEntry {
    /// Local position at interpolation factor `k` (0 collapsed, 1 exploded).
    pub fn position_at(&self, k: f32) -> Point3<f32> {
        self.base_offset + self.direction * (self.magnitude * k)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplodePlan {
    pub root: NodeId,
    pub entries: Vec<ExplodeEntry>,
}

impl ExplodePlan {
    /// Snapshots the visible direct children of `root`.
    ///
    /// Returns None if `root` is not in the scene.
    pub fn build(
        scene: &Scene,
        root: NodeId,
        step: f32,
        fallback: DirectionFallback,
    ) -> Option<Self> {
        let root_node = scene.get_node(root)?;
        let center = scene.nodes_bounding(root).map(|bounds| bounds.center());

        let entries: Vec<ExplodeEntry> = root_node
            .children()
            .iter()
            .filter_map(|&id| scene.get_node(id))
            .filter(|child| child.is_visible())
            .enumerate()
            .map(|(index, child)| {
                let offset = center.zip(scene.nodes_bounding(child.id)).map(
                    |(model_center, bounds)| bounds.center() - model_center,
                );
                let direction = match offset {
                    Some(offset) if offset.magnitude2() >= 1e-12 => offset.normalize(),
                    _ => fallback.direction(index),
                };

                ExplodeEntry {
                    node: child.id,
                    direction,
                    base_offset: child.position(),
                    magnitude: step * (index + 1) as f32,
                }
            })
            .collect();

        log::debug!(
            "Explode plan for node {}: {} parts, step {}",
            root,
            entries.len(),
            step
        );
        Some(Self { root, entries })
    }

    /// Moves every planned part to its position at factor `k`.
    ///
    /// Parts removed from the scene since the plan was built are skipped.
    pub fn apply(&self, scene: &mut Scene, k: f32) {
        for entry in &self.entries {
            if let Some(node) = scene.get_node_mut(entry.node) {
                node.set_position(entry.position_at(k));
            }
        }
    }
}

/// Explode state of the loaded model.
///
/// The plan is built on the first toggle and kept until [`invalidate`]
/// (called on every model change).
///
/// [`invalidate`]: ExplodeLayout::invalidate
#[derive(Debug, Clone)]
pub struct ExplodeLayout {
    plan: Option<ExplodePlan>,
    exploded: bool,
    step: f32,
    fallback: DirectionFallback,
}

impl Default for ExplodeLayout {
    fn default() -> Self {
        Self::new(0.22, DirectionFallback::default())
    }
}

impl ExplodeLayout {
    pub fn new(step: f32, fallback: DirectionFallback) -> Self {
        Self {
            plan: None,
            exploded: false,
            step,
            fallback,
        }
    }

    pub fn is_exploded(&self) -> bool {
        self.exploded
    }

    pub fn plan(&self) -> Option<&ExplodePlan> {
        self.plan.as_ref()
    }

    /// (Re)builds the plan for `root` and marks the layout collapsed.
    pub fn build_plan(&mut self, scene: &Scene, root: NodeId) -> Option<&ExplodePlan> {
        self.plan = ExplodePlan::build(scene, root, self.step, self.fallback);
        self.exploded = false;
        self.plan.as_ref()
    }

    /// Flips between collapsed and exploded and returns the new state.
    ///
    /// A plan for a different root is rebuilt first. Unknown roots leave the
    /// layout unchanged.
    pub fn toggle(&mut self, scene: &mut Scene, root: NodeId) -> bool {
        let needs_plan = self.plan.as_ref().map_or(true, |plan| plan.root != root);
        if needs_plan && self.build_plan(scene, root).is_none() {
            log::debug!("Explode: node {} not in scene", root);
            return self.exploded;
        }

        self.exploded = !self.exploded;
        let k = if self.exploded { 1.0 } else { 0.0 };
        self.apply(scene, k);
        log::debug!("Explode: {}", if self.exploded { "exploded" } else { "collapsed" });
        self.exploded
    }

    /// Places parts at an arbitrary factor without changing the toggle state.
    pub fn apply(&self, scene: &mut Scene, k: f32) {
        if let Some(plan) = &self.plan {
            plan.apply(scene, k);
        }
    }

    /// Forgets the plan. Part positions are left as they are.
    pub fn invalidate(&mut self) {
        self.plan = None;
        self.exploded = false;
    }
}
