use std::f32::consts::{FRAC_PI_2, PI};

use cgmath::{InnerSpace, Point3, Vector3};

use crate::camera::Camera;

/// Just under 90 degrees, so the view never flips over the pole.
const MAX_ELEVATION: f32 = FRAC_PI_2 - 0.01;

/// Pending rotation, in radians, below which the controls come to rest.
const REST_ANGLE: f32 = 1e-5;

/// Movement below this fraction of the orbit radius is not noticeable.
const REST_FRACTION: f32 = 1e-5;

const MIN_DISTANCE: f32 = 1e-4;

/// Damped orbit navigation around a target point.
///
/// Input methods only accumulate deltas; [`OrbitControls::update`] applies
/// them to the camera once per frame. With damping enabled each update
/// consumes `damping_factor` of the pending rotation and pan, so the camera
/// glides to rest over several frames.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Point the camera orbits around.
    pub target: Point3<f32>,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,

    azimuth_delta: f32,
    elevation_delta: f32,
    scale: f32,
    pan_offset: Vector3<f32>,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Point3::new(0.0, 0.0, 0.0),
            enable_damping: true,
            damping_factor: 0.07,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            azimuth_delta: 0.0,
            elevation_delta: 0.0,
            scale: 1.0,
            pan_offset: Vector3::new(0.0, 0.0, 0.0),
        }
    }
}

impl OrbitControls {
    pub fn new(target: Point3<f32>) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    /// Moves the orbit centre without disturbing pending motion.
    pub fn set_target(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    /// Rotates around the vertical axis. Positive angles swing the eye to the right.
    pub fn rotate_left(&mut self, angle: f32) {
        self.azimuth_delta -= angle;
    }

    /// Raises the eye towards the top pole.
    pub fn rotate_up(&mut self, angle: f32) {
        self.elevation_delta += angle;
    }

    /// Pointer-drag rotation: a drag across the full viewport height is one turn.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: u32) {
        let height = viewport_height.max(1) as f32;
        self.rotate_left(2.0 * PI * dx / height * self.rotate_speed);
        self.rotate_up(2.0 * PI * dy / height * self.rotate_speed);
    }

    /// Scales the eye-target distance on the next update. `factor < 1` moves in.
    pub fn dolly(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.scale *= factor;
        }
    }

    /// Pointer-drag pan in pixels. The point under the cursor follows the
    /// pointer at the target's depth.
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &Camera, viewport_height: u32) {
        let height = viewport_height.max(1) as f32;
        let half_fov = cgmath::Rad::from(cgmath::Deg(camera.fovy * 0.5)).0;
        let target_distance = (camera.eye - self.target).magnitude() * half_fov.tan();

        let left = 2.0 * dx * target_distance / height * self.pan_speed;
        let up = 2.0 * dy * target_distance / height * self.pan_speed;

        let right = camera.right();
        let view_up = right.cross(camera.forward()).normalize();
        self.pan_offset += right * -left + view_up * up;
    }

    /// Drops all pending motion.
    pub fn stop(&mut self) {
        self.azimuth_delta = 0.0;
        self.elevation_delta = 0.0;
        self.scale = 1.0;
        self.pan_offset = Vector3::new(0.0, 0.0, 0.0);
    }

    /// True while there is motion left to apply.
    pub fn is_moving(&self) -> bool {
        self.azimuth_delta != 0.0
            || self.elevation_delta != 0.0
            || self.scale != 1.0
            || self.pan_offset != Vector3::new(0.0, 0.0, 0.0)
    }

    /// Applies pending motion to `camera` and re-aims it at the target.
    ///
    /// Returns true if the camera moved noticeably or motion is still
    /// pending. Thresholds are relative to the orbit radius, so models of
    /// any scale settle the same way. Calling this right after changing the
    /// target re-synchronises the camera with the controls.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let last_eye = camera.eye;
        let last_target = camera.target;

        let offset = camera.eye - self.target;
        let mut radius = offset.magnitude();
        let (mut azimuth, mut elevation) = if radius > 0.0 {
            let horizontal = (offset.x * offset.x + offset.z * offset.z).sqrt();
            (offset.x.atan2(offset.z), offset.y.atan2(horizontal))
        } else {
            radius = MIN_DISTANCE;
            (0.0, 0.0)
        };

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        azimuth += self.azimuth_delta * step;
        elevation = (elevation + self.elevation_delta * step).clamp(-MAX_ELEVATION, MAX_ELEVATION);
        radius = (radius * self.scale).max(MIN_DISTANCE);
        self.target += self.pan_offset * step;

        camera.eye = Point3::new(
            self.target.x + radius * elevation.cos() * azimuth.sin(),
            self.target.y + radius * elevation.sin(),
            self.target.z + radius * elevation.cos() * azimuth.cos(),
        );
        camera.target = self.target;
        camera.up = Vector3::unit_y();

        self.scale = 1.0;
        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.azimuth_delta *= decay;
            self.elevation_delta *= decay;
            self.pan_offset *= decay;
        } else {
            self.stop();
        }

        let rest = radius * REST_FRACTION;
        if self.azimuth_delta.abs() < REST_ANGLE
            && self.elevation_delta.abs() < REST_ANGLE
            && self.pan_offset.magnitude() < rest
        {
            self.stop();
        }

        let moved = (camera.eye - last_eye).magnitude() > rest
            || (camera.target - last_target).magnitude() > rest;
        moved || self.is_moving()
    }
}
