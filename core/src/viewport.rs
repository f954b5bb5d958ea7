use crate::camera::Camera;
use crate::common::Ray;
use crate::config::ViewerConfig;
use crate::controls::OrbitControls;
use crate::scene::{NodeId, Scene};

/// Wheel step multiplier, per unit of wheel delta.
const ZOOM_BASE: f32 = 0.95;

/// Owns the camera and its orbit controls for one drawing surface.
#[derive(Debug, Clone)]
pub struct ViewportController {
    pub camera: Camera,
    pub controls: OrbitControls,
    width: u32,
    height: u32,
    distance_factor: f32,
    needs_redraw: bool,
}

impl ViewportController {
    pub fn new(config: &ViewerConfig, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let camera = config.initial_camera(width as f32 / height as f32);

        let mut controls = OrbitControls::new(camera.target);
        controls.enable_damping = config.enable_damping;
        controls.damping_factor = config.damping_factor;
        controls.rotate_speed = config.rotate_speed;
        controls.zoom_speed = config.zoom_speed;
        controls.pan_speed = config.pan_speed;

        Self {
            camera,
            controls,
            width,
            height,
            distance_factor: config.fit_distance_factor,
            needs_redraw: true,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Frames the subtree under `root` from the (1, 1, 1) diagonal.
    ///
    /// Returns false and leaves the view untouched when the subtree has no
    /// geometry.
    pub fn fit_to_bounds(&mut self, scene: &Scene, root: NodeId) -> bool {
        let Some(bounds) = scene.nodes_bounding(root) else {
            log::debug!("Fit view: node {} has no geometry", root);
            return false;
        };

        self.camera.fit_to_bounds(&bounds, self.distance_factor);
        self.controls.stop();
        self.controls.set_target(self.camera.target);
        self.controls.update(&mut self.camera);
        self.request_redraw();

        log::info!(
            "Fit view: target {:?}, eye {:?}, near {}, far {}",
            self.camera.target,
            self.camera.eye,
            self.camera.znear,
            self.camera.zfar
        );
        true
    }

    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Returns whether a redraw was requested since the last call, and resets it.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Updates the aspect ratio. Zero sizes are treated as one pixel.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.camera.aspect = self.width as f32 / self.height as f32;
        self.request_redraw();
    }

    /// World-space picking ray through a viewport pixel.
    pub fn ray_at(&self, x: f32, y: f32) -> Option<Ray> {
        self.camera.ray_from_screen(x, y, self.width, self.height)
    }

    /// Pointer-drag orbit, in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.controls.rotate(dx, dy, self.height);
        self.request_redraw();
    }

    /// Wheel zoom. Positive deltas move towards the target.
    pub fn zoom(&mut self, delta: f32) {
        self.controls
            .dolly(ZOOM_BASE.powf(delta * self.controls.zoom_speed));
        self.request_redraw();
    }

    /// Pointer-drag pan, in pixels.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.controls.pan(dx, dy, &self.camera, self.height);
        self.request_redraw();
    }

    /// Per-frame tick. Returns true if the camera moved.
    pub fn update(&mut self) -> bool {
        let moved = self.controls.update(&mut self.camera);
        if moved {
            self.request_redraw();
        }
        moved
    }
}
