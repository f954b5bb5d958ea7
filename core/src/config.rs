//! Viewer tunables.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```
//! use partview::ViewerConfig;
//!
//! let config = ViewerConfig::from_json_str(r#"{ "explode_step": 0.15 }"#).unwrap();
//! assert_eq!(config.explode_step, 0.15);
//! assert_eq!(config.fov, 50.0);
//! ```

use std::path::Path;

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::error::Result;
use crate::explode::DirectionFallback;

/// Allowed range for [`ViewerConfig::fit_distance_factor`].
pub const FIT_DISTANCE_RANGE: (f32, f32) = (1.8, 2.2);

/// Allowed range for [`ViewerConfig::explode_step`].
pub const EXPLODE_STEP_RANGE: (f32, f32) = (0.15, 0.22);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub initial_eye: [f32; 3],
    pub near: f32,
    pub far: f32,

    /// Camera distance per unit of model extent when fitting the view.
    pub fit_distance_factor: f32,

    /// Explode distance added per sibling index.
    pub explode_step: f32,
    pub explode_fallback: DirectionFallback,

    /// Emissive highlight for selected parts, as `0xRRGGBB`.
    pub selection_color: u32,

    pub damping_factor: f32,
    pub enable_damping: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fov: 50.0,
            initial_eye: [6.0, 4.5, 6.0],
            near: 0.1,
            far: 5000.0,
            fit_distance_factor: 1.8,
            explode_step: 0.22,
            explode_fallback: DirectionFallback::default(),
            selection_color: 0x5ab6ff,
            damping_factor: 0.07,
            enable_damping: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

impl ViewerConfig {
    /// Parses a JSON config and clamps it into range.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut config: ViewerConfig = serde_json::from_str(json)?;
        config.validate();
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Clamps out-of-range values, warning about each one.
    pub fn validate(&mut self) {
        clamp_field(
            "fit_distance_factor",
            &mut self.fit_distance_factor,
            FIT_DISTANCE_RANGE,
        );
        clamp_field("explode_step", &mut self.explode_step, EXPLODE_STEP_RANGE);
        clamp_field("damping_factor", &mut self.damping_factor, (0.0, 1.0));
        clamp_field("fov", &mut self.fov, (1.0, 179.0));

        if !(self.near > 0.0 && self.near < self.far) {
            log::warn!(
                "Config: near/far ({}, {}) invalid, using defaults",
                self.near,
                self.far
            );
            let defaults = Self::default();
            self.near = defaults.near;
            self.far = defaults.far;
        }
    }

    /// Camera in the start-up pose described by this config.
    pub fn initial_camera(&self, aspect: f32) -> Camera {
        Camera {
            eye: Point3::from(self.initial_eye),
            fovy: self.fov,
            znear: self.near,
            zfar: self.far,
            aspect,
            ..Camera::default()
        }
    }
}

fn clamp_field(name: &str, value: &mut f32, (min, max): (f32, f32)) {
    if value.is_nan() {
        log::warn!("Config: {} is NaN, using {}", name, min);
        *value = min;
    } else if *value < min || *value > max {
        let clamped = value.clamp(min, max);
        log::warn!(
            "Config: {} = {} outside [{}, {}], using {}",
            name,
            value,
            min,
            max,
            clamped
        );
        *value = clamped;
    }
}
