use std::fmt;
use std::path::Path;

use crate::common::RgbColor;
use crate::config::ViewerConfig;
use crate::error::Result;
use crate::explode::ExplodeLayout;
use crate::scene::{ImportError, ImporterRegistry, NodeId, ReleasedResources, Scene};
use crate::selection::{SelectionChange, SelectionConfig, SelectionManager};
use crate::viewport::ViewportController;

/// One-line status shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerStatus {
    Ready,
    Loading(String),
    Loaded(String),
    Cleared,
    Error(String),
}

impl fmt::Display for ViewerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerStatus::Ready => f.write_str("Ready. Load a model file."),
            ViewerStatus::Loading(name) => write!(f, "Loading {} …", name),
            ViewerStatus::Loaded(name) => write!(f, "Loaded: {}", name),
            ViewerStatus::Cleared => f.write_str("Scene cleared"),
            ViewerStatus::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Per-model interaction state.
#[derive(Debug)]
pub struct ViewerState {
    /// Root node of the loaded model.
    pub model: Option<NodeId>,
    pub selection: SelectionManager,
    pub explode: ExplodeLayout,
    /// Opacity applied to the selection on each click.
    pub opacity: f32,
}

impl ViewerState {
    fn new(config: &ViewerConfig) -> Self {
        Self {
            model: None,
            selection: SelectionManager::with_config(SelectionConfig {
                highlight_color: RgbColor::from_hex(config.selection_color),
            }),
            explode: ExplodeLayout::new(config.explode_step, config.explode_fallback),
            opacity: 1.0,
        }
    }
}

/// Headless viewer: owns the scene, the view and the interaction state.
///
/// Rendering is up to the host, which should draw whenever
/// [`take_redraw`](Viewer::take_redraw) returns true.
pub struct Viewer {
    scene: Scene,
    viewport: ViewportController,
    state: ViewerState,
    importers: ImporterRegistry,
    config: ViewerConfig,
    status: ViewerStatus,
}

impl Viewer {
    pub fn new(config: ViewerConfig, width: u32, height: u32) -> Self {
        let viewport = ViewportController::new(&config, width, height);
        let state = ViewerState::new(&config);
        Self {
            scene: Scene::new(),
            viewport,
            state,
            importers: ImporterRegistry::new(),
            config,
            status: ViewerStatus::Ready,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn camera(&self) -> &crate::camera::Camera {
        &self.viewport.camera
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn status(&self) -> &ViewerStatus {
        &self.status
    }

    pub fn model(&self) -> Option<NodeId> {
        self.state.model
    }

    /// Register extra importers (e.g. a STEP tessellator) here.
    pub fn importers_mut(&mut self) -> &mut ImporterRegistry {
        &mut self.importers
    }

    // ========== Loading ==========

    /// Imports a model and makes it the current one.
    ///
    /// The model is imported into a staging scene first, so a failed load
    /// leaves the current model untouched.
    pub fn load_model_bytes(&mut self, bytes: &[u8], name: &str) -> Result<NodeId> {
        self.status = ViewerStatus::Loading(name.to_string());

        let mut staging = Scene::new();
        let imported = match self.importers.import(bytes, Some(name), &mut staging) {
            Ok(imported) => imported,
            Err(err) => {
                log::warn!("Failed to load '{}': {}", name, err);
                self.status = ViewerStatus::Error(err.to_string());
                return Err(err.into());
            }
        };

        self.clear_model();
        let root = match self.scene.adopt(staging, imported.root) {
            Ok(root) => root,
            Err(err) => {
                log::warn!("Failed to add '{}' to the scene: {}", name, err);
                self.status = ViewerStatus::Error(err.to_string());
                return Err(ImportError::Scene(err.to_string()).into());
            }
        };

        self.set_model(root);
        self.fit_view();
        self.status = ViewerStatus::Loaded(name.to_string());
        log::info!("Loaded {} model '{}' as node {}", imported.format, name, root);
        Ok(root)
    }

    pub fn load_model_path(&mut self, path: impl AsRef<Path>) -> Result<NodeId> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("model")
            .to_string();

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("Failed to read {}: {}", path.display(), err);
                self.status = ViewerStatus::Error(err.to_string());
                return Err(err.into());
            }
        };
        self.load_model_bytes(&bytes, &name)
    }

    /// Makes `root` (already in the scene) the current model.
    ///
    /// Any other current model is cleared first. Every material under `root`
    /// is made blendable at full opacity, and selection and explode state
    /// start over. Returns false if `root` is not in the scene.
    pub fn set_model(&mut self, root: NodeId) -> bool {
        if !self.scene.contains_node(root) {
            log::warn!("set_model: node {} not in scene", root);
            return false;
        }
        match self.state.model {
            Some(current) if current != root => self.clear_model(),
            _ => self.state.selection.clear(&mut self.scene),
        }

        for node_id in self.scene.mesh_nodes(root) {
            let materials = match self.scene.get_node(node_id) {
                Some(node) => node.materials().to_vec(),
                None => continue,
            };
            for material_id in materials {
                if let Some(material) = self.scene.get_material_mut(material_id) {
                    material.set_transparent(true);
                    material.set_opacity(1.0);
                    material.set_depth_write(true);
                }
            }
        }

        self.state.model = Some(root);
        self.state.explode.invalidate();
        self.viewport.request_redraw();
        true
    }

    /// Removes the current model and releases its meshes and materials.
    ///
    /// Highlight colours are not restored since the materials go away.
    pub fn clear_model(&mut self) {
        let Some(root) = self.state.model.take() else {
            return;
        };

        self.state.selection.forget_all();
        self.state.explode.invalidate();
        let released = self.scene.remove_node(root);
        log::info!(
            "Cleared model: {} nodes, {} meshes, {} materials released",
            released.nodes.len(),
            released.meshes.len(),
            released.materials.len()
        );

        self.status = ViewerStatus::Cleared;
        self.viewport.request_redraw();
    }

    /// Tears the viewer down: drops all interaction state and releases every
    /// mesh and material in the scene, model or not.
    ///
    /// The viewer is back to its initial status afterwards and can load again.
    pub fn teardown(&mut self) -> ReleasedResources {
        self.state.model = None;
        self.state.selection.forget_all();
        self.state.explode.invalidate();
        self.state.opacity = 1.0;

        let released = self.scene.clear();
        log::info!(
            "Viewer teardown: {} nodes, {} meshes, {} materials released",
            released.nodes.len(),
            released.meshes.len(),
            released.materials.len()
        );

        self.status = ViewerStatus::Ready;
        self.viewport.request_redraw();
        released
    }

    // ========== View ==========

    /// Frames the current model. No-op without a model.
    pub fn fit_view(&mut self) {
        if let Some(root) = self.state.model {
            self.viewport.fit_to_bounds(&self.scene, root);
        }
    }

    /// Explodes or collapses the current model and returns the new state.
    pub fn toggle_explode(&mut self) -> bool {
        let Some(root) = self.state.model else {
            return false;
        };
        let exploded = self.state.explode.toggle(&mut self.scene, root);
        self.viewport.request_redraw();
        exploded
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport.resize(width, height);
    }

    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.viewport.orbit(dx, dy);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.viewport.zoom(delta);
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.viewport.pan(dx, dy);
    }

    /// Per-frame tick. Returns true if the camera moved.
    pub fn update(&mut self) -> bool {
        self.viewport.update()
    }

    pub fn take_redraw(&mut self) -> bool {
        self.viewport.take_redraw()
    }

    // ========== Selection ==========

    /// Mesh node of the current model under a viewport pixel.
    pub fn pick(&self, x: f32, y: f32) -> Option<NodeId> {
        let root = self.state.model?;
        let ray = self.viewport.ray_at(x, y);
        self.state.selection.pick(&self.scene, &[root], ray.as_ref())
    }

    /// Pointer click at a viewport pixel.
    ///
    /// A plain click selects only the hit part; an additive (ctrl/cmd) click
    /// toggles it. The current opacity is then applied to the selection.
    /// Clicking empty space does nothing.
    pub fn click(&mut self, x: f32, y: f32, additive: bool) -> Option<NodeId> {
        let hit = self.pick(x, y)?;
        self.toggle_select(hit, !additive);
        self.state.selection.set_opacity(&mut self.scene, self.state.opacity);
        Some(hit)
    }

    pub fn toggle_select(&mut self, node: NodeId, exclusive: bool) -> SelectionChange {
        let change = self
            .state
            .selection
            .toggle_select(&mut self.scene, node, exclusive);
        if change != SelectionChange::Unchanged {
            self.viewport.request_redraw();
        }
        change
    }

    pub fn clear_selection(&mut self) {
        self.state.selection.clear(&mut self.scene);
        self.viewport.request_redraw();
    }

    pub fn selected_nodes(&self) -> &[NodeId] {
        self.state.selection.selected_nodes()
    }

    /// Sets the opacity used for selected parts, clamped to `0..=1`.
    pub fn set_opacity(&mut self, value: f32) {
        if value.is_nan() {
            return;
        }
        self.state.opacity = value.clamp(0.0, 1.0);
        self.state
            .selection
            .set_opacity(&mut self.scene, self.state.opacity);
        self.viewport.request_redraw();
    }

    pub fn opacity(&self) -> f32 {
        self.state.opacity
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(ViewerConfig::default(), 800, 600)
    }
}
