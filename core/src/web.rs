use wasm_bindgen::prelude::*;

use crate::config::ViewerConfig;
use crate::viewer::Viewer;

#[wasm_bindgen]
pub struct WebViewer {
    viewer: Viewer,
}

#[wasm_bindgen]
impl WebViewer {
    /// Create a viewer for a canvas of the given pixel size.
    ///
    /// `config_json` may be empty to use the defaults.
    ///
    /// Usage from JS: `const viewer = new WebViewer(canvas.width, canvas.height, "");`
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, config_json: &str) -> Result<WebViewer, JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();

        let config = if config_json.trim().is_empty() {
            ViewerConfig::default()
        } else {
            ViewerConfig::from_json_str(config_json).map_err(to_js)?
        };

        Ok(WebViewer {
            viewer: Viewer::new(config, width, height),
        })
    }

    /// Load a model from raw file bytes. `name` is the file name, used for
    /// format detection and the status line.
    ///
    /// Returns the model's root node id.
    pub fn load_model(&mut self, data: &[u8], name: &str) -> Result<u32, JsValue> {
        self.viewer.load_model_bytes(data, name).map_err(to_js)
    }

    pub fn clear_model(&mut self) {
        self.viewer.clear_model();
    }

    /// Release all scene resources before dropping the viewer.
    pub fn dispose(&mut self) {
        self.viewer.teardown();
    }

    pub fn fit_view(&mut self) {
        self.viewer.fit_view();
    }

    /// Returns true if the model is now exploded.
    pub fn toggle_explode(&mut self) -> bool {
        self.viewer.toggle_explode()
    }

    /// Forward a pointerdown. `x`, `y` are canvas pixel coordinates; pass
    /// `ctrlKey || metaKey` as `additive`.
    ///
    /// Returns the picked node id, if any.
    pub fn on_pointer_down(&mut self, x: f32, y: f32, additive: bool) -> Option<u32> {
        self.viewer.click(x, y, additive)
    }

    pub fn clear_selection(&mut self) {
        self.viewer.clear_selection();
    }

    /// Opacity slider value, 0 to 1.
    pub fn set_opacity(&mut self, value: f32) {
        self.viewer.set_opacity(value);
    }

    /// Notify the viewer that the canvas was resized.
    /// Pass the canvas pixel dimensions (CSS size * devicePixelRatio).
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewer.resize(width, height);
    }

    /// Forward a drag with the rotate button held. `dx`, `dy` in pixels.
    pub fn on_orbit_drag(&mut self, dx: f32, dy: f32) {
        self.viewer.orbit(dx, dy);
    }

    /// Forward a drag with the pan button held. `dx`, `dy` in pixels.
    pub fn on_pan_drag(&mut self, dx: f32, dy: f32) {
        self.viewer.pan(dx, dy);
    }

    /// Forward a wheel event. Negative `delta_y` (scrolling up) zooms in.
    pub fn on_wheel(&mut self, delta_y: f32) {
        self.viewer.zoom(-delta_y / 100.0);
    }

    /// Call once per frame from requestAnimationFrame.
    /// Returns true when the host should redraw.
    pub fn update(&mut self) -> bool {
        self.viewer.update();
        self.viewer.take_redraw()
    }

    pub fn status(&self) -> String {
        self.viewer.status().to_string()
    }

    /// Camera eye, target and clip planes as
    /// `[ex, ey, ez, tx, ty, tz, near, far, fovy]` for the host renderer.
    pub fn camera_state(&self) -> Vec<f32> {
        let camera = self.viewer.camera();
        vec![
            camera.eye.x,
            camera.eye.y,
            camera.eye.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.znear,
            camera.zfar,
            camera.fovy,
        ]
    }

    /// Local position of a node as `[x, y, z]`, for syncing explode moves.
    pub fn node_position(&self, node: u32) -> Option<Vec<f32>> {
        let position = self.viewer.scene().get_node(node)?.position();
        Some(vec![position.x, position.y, position.z])
    }

    /// Ids of the selected nodes, in selection order.
    pub fn selected_nodes(&self) -> Vec<u32> {
        self.viewer.selected_nodes().to_vec()
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
