//! Part selection with emissive highlighting.
//!
//! Selecting a node stashes the emissive colour of each of its material
//! slots and replaces it with the highlight colour; deselecting puts the
//! stashed colours back. A node is selected exactly when its slots carry the
//! highlight, so the manager must see every change to the selection.

use std::collections::HashMap;

use crate::common::{Ray, RgbColor};
use crate::scene::geom_query::pick_all_from_ray;
use crate::scene::{MaterialId, NodeId, Scene};

/// Configuration for selection visual feedback.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Emissive colour written to every material slot of a selected node.
    pub highlight_color: RgbColor,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            highlight_color: RgbColor::from_hex(0x5ab6ff),
        }
    }
}

/// Stashed state of one selected node.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEntry {
    pub node: NodeId,
    /// Material slots at selection time.
    pub materials: Vec<MaterialId>,
    /// Emissive colour of each slot before highlighting, aligned with `materials`.
    pub saved: Vec<RgbColor>,
}

impl SelectionEntry {
    fn saved_color(&self, material: MaterialId) -> Option<RgbColor> {
        self.materials
            .iter()
            .position(|&id| id == material)
            .and_then(|slot| self.saved.get(slot).copied())
    }
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Selected,
    Deselected,
    Unchanged,
}

/// Manages the current selection state.
///
/// Keeps the entries in a map for lookup and a vector for selection order.
#[derive(Debug, Default)]
pub struct SelectionManager {
    entries: HashMap<NodeId, SelectionEntry>,
    selection_order: Vec<NodeId>,
    primary: Option<NodeId>,
    config: SelectionConfig,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SelectionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    // ========== Query API ==========

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_selected(&self, node: NodeId) -> bool {
        self.entries.contains_key(&node)
    }

    /// The most recently selected node still in the selection.
    pub fn primary(&self) -> Option<NodeId> {
        self.primary
    }

    /// Selected nodes in order of selection.
    pub fn selected_nodes(&self) -> &[NodeId] {
        &self.selection_order
    }

    pub fn entry(&self, node: NodeId) -> Option<&SelectionEntry> {
        self.entries.get(&node)
    }

    /// Nearest mesh node hit by `ray` under `roots`.
    ///
    /// Never changes the selection. A missing ray picks nothing.
    pub fn pick(&self, scene: &Scene, roots: &[NodeId], ray: Option<&Ray>) -> Option<NodeId> {
        let ray = ray?;
        let hit = pick_all_from_ray(ray, scene, roots).into_iter().next()?;
        log::debug!("Picked node {} at distance {}", hit.node_id, hit.distance);
        Some(hit.node_id)
    }

    // ========== Mutation API ==========

    /// Highlights `node` and adds it to the selection.
    ///
    /// Returns false if the node was already selected or is not in `scene`.
    pub fn select(&mut self, scene: &mut Scene, node: NodeId) -> bool {
        if self.entries.contains_key(&node) {
            return false;
        }
        let Some(materials) = scene.get_node(node).map(|n| n.materials().to_vec()) else {
            log::debug!("Ignoring selection of unknown node {}", node);
            return false;
        };

        let highlight = self.config.highlight_color;
        let mut saved = Vec::with_capacity(materials.len());
        for (slot, &material_id) in materials.iter().enumerate() {
            // A material shared with an already highlighted slot keeps the
            // colour stashed there, not the highlight.
            let stashed = materials[..slot]
                .iter()
                .position(|&id| id == material_id)
                .map(|earlier| saved[earlier])
                .or_else(|| {
                    self.entries
                        .values()
                        .find_map(|entry| entry.saved_color(material_id))
                });

            let color = match scene.get_material_mut(material_id) {
                Some(material) => {
                    let original = stashed.unwrap_or_else(|| material.emissive());
                    material.set_emissive(highlight);
                    original
                }
                None => RgbColor::BLACK,
            };
            saved.push(color);
        }

        log::debug!("Selected node {} ({} slots)", node, materials.len());
        self.entries.insert(
            node,
            SelectionEntry {
                node,
                materials,
                saved,
            },
        );
        self.selection_order.push(node);
        self.primary = Some(node);
        true
    }

    /// Restores the node's stashed colours and removes it from the selection.
    ///
    /// Slots whose material is still used by another selected node stay
    /// highlighted. Returns false if the node was not selected.
    pub fn deselect(&mut self, scene: &mut Scene, node: NodeId) -> bool {
        let Some(entry) = self.entries.remove(&node) else {
            return false;
        };

        for (&material_id, &color) in entry.materials.iter().zip(&entry.saved) {
            let still_highlighted = self
                .entries
                .values()
                .any(|other| other.materials.contains(&material_id));
            if still_highlighted {
                continue;
            }
            if let Some(material) = scene.get_material_mut(material_id) {
                material.set_emissive(color);
            }
        }

        self.selection_order.retain(|&id| id != node);
        if self.primary == Some(node) {
            self.primary = self.selection_order.last().copied();
        }
        log::debug!("Deselected node {}", node);
        true
    }

    /// Flips the selection state of `node`.
    ///
    /// With `exclusive`, everything else is deselected first and `node` ends
    /// up as the only selected node.
    pub fn toggle_select(
        &mut self,
        scene: &mut Scene,
        node: NodeId,
        exclusive: bool,
    ) -> SelectionChange {
        if exclusive {
            self.clear(scene);
            return if self.select(scene, node) {
                SelectionChange::Selected
            } else {
                SelectionChange::Unchanged
            };
        }

        if self.deselect(scene, node) {
            SelectionChange::Deselected
        } else if self.select(scene, node) {
            SelectionChange::Selected
        } else {
            SelectionChange::Unchanged
        }
    }

    /// Deselects everything, restoring all stashed colours.
    pub fn clear(&mut self, scene: &mut Scene) {
        while let Some(&node) = self.selection_order.last() {
            if !self.deselect(scene, node) {
                self.selection_order.pop();
            }
        }
        self.primary = None;
    }

    /// Sets opacity on every material slot of the selected nodes.
    ///
    /// Fully opaque materials write depth again; translucent ones don't.
    pub fn set_opacity(&self, scene: &mut Scene, value: f32) {
        let depth_write = value >= 1.0;
        for entry in self.entries.values() {
            for &material_id in &entry.materials {
                if let Some(material) = scene.get_material_mut(material_id) {
                    material.set_opacity(value);
                    material.set_depth_write(depth_write);
                }
            }
        }
    }

    /// Drops every entry without touching materials.
    ///
    /// For when the selected nodes and their materials are being released.
    pub fn forget_all(&mut self) {
        self.entries.clear();
        self.selection_order.clear();
        self.primary = None;
    }
}
