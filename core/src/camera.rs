use cgmath::{InnerSpace, MetricSpace, Point3, SquareMatrix, Vector3};

use crate::common::{Aabb, Ray};

/// A perspective camera. Clip space follows the OpenGL convention
/// (NDC depth in [-1, 1]), which is what WebGL hosts expect.
///
/// # Example
///
/// ```
/// use cgmath::{Point3, Vector3};
/// use partview::Camera;
///
/// let camera = Camera {
///     eye: Point3::new(0.0, 0.0, 5.0),
///     target: Point3::new(0.0, 0.0, 0.0),
///     up: Vector3::new(0.0, 1.0, 0.0),
///     aspect: 16.0 / 9.0,
///     fovy: 50.0,
///     znear: 0.1,
///     zfar: 100.0,
/// };
/// assert!((camera.length() - 5.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// The position of the camera in world space.
    pub eye: Point3<f32>,
    /// The point the camera is looking at in world space.
    pub target: Point3<f32>,
    /// The up direction vector (Y-up).
    pub up: Vector3<f32>,
    /// The aspect ratio of the viewport (width / height).
    pub aspect: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Distance to the near clipping plane.
    pub znear: f32,
    /// Distance to the far clipping plane.
    pub zfar: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Point3::new(6.0, 4.5, 6.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::unit_y(),
            aspect: 1.0,
            fovy: 50.0,
            znear: 0.1,
            zfar: 5000.0,
        }
    }
}

impl Camera {
    /// Builds the combined view-projection matrix for this camera.
    pub fn build_view_projection_matrix(&self) -> cgmath::Matrix4<f32> {
        let view = cgmath::Matrix4::look_at_rh(self.eye, self.target, self.up);
        let proj = cgmath::perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar);
        proj * view
    }

    /// Returns the camera's forward vector
    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.eye).normalize()
    }

    /// Returns the right vector of the camera
    pub fn right(&self) -> Vector3<f32> {
        self.forward().cross(self.up).normalize()
    }

    /// Distance from the eye to the target
    pub fn length(&self) -> f32 {
        self.eye.distance(self.target)
    }

    /// Frames a bounding box from the fixed (1, 1, 1) diagonal.
    ///
    /// The eye lands at `center + (d, d, d)` with `d = max_dim * distance_factor`,
    /// where `max_dim` is the largest extent (1 for flat or degenerate boxes).
    /// Clip planes scale with the model: `znear = max(0.01, max_dim / 1000)`
    /// and `zfar = max_dim * 100`. For sub-millimetre models `zfar` is kept
    /// at `100 * znear` so that `0 < znear < zfar` always holds.
    pub fn fit_to_bounds(&mut self, bounds: &Aabb, distance_factor: f32) {
        let center = bounds.center();
        let max_dim = match bounds.max_extent() {
            extent if extent > 0.0 && extent.is_finite() => extent,
            _ => 1.0,
        };

        let d = max_dim * distance_factor;
        self.target = center;
        self.eye = center + Vector3::new(d, d, d);

        self.znear = (max_dim / 1000.0).max(0.01);
        self.zfar = (max_dim * 100.0).max(self.znear * 100.0);
    }

    /// Projects a 3D world-space point to normalized device coordinates (NDC).
    pub fn project_point_ndc(&self, world_point: Point3<f32>) -> Point3<f32> {
        let vp = self.build_view_projection_matrix();
        Point3::from_homogeneous(vp * world_point.to_homogeneous())
    }

    /// Unprojects a point from NDC to world space.
    ///
    /// Returns None if the view-projection matrix is not invertible.
    pub fn unproject_point_ndc(&self, ndc_point: Point3<f32>) -> Option<Point3<f32>> {
        let inv_vp = self.build_view_projection_matrix().invert()?;
        Some(Point3::from_homogeneous(inv_vp * ndc_point.to_homogeneous()))
    }

    /// Projects a 3D world-space point to screen-space pixel coordinates.
    ///
    /// X grows to the right and Y grows downward; Z is NDC depth.
    pub fn project_point_screen(
        &self,
        world_point: Point3<f32>,
        screen_width: u32,
        screen_height: u32,
    ) -> Point3<f32> {
        let ndc = self.project_point_ndc(world_point);

        let screen_x = (ndc.x + 1.0) * 0.5 * screen_width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * screen_height as f32; // Flip Y

        Point3::new(screen_x, screen_y, ndc.z)
    }

    /// Unprojects a screen-space pixel coordinate at NDC depth `depth`.
    pub fn unproject_point_screen(
        &self,
        screen_x: f32,
        screen_y: f32,
        depth: f32,
        screen_width: u32,
        screen_height: u32,
    ) -> Option<Point3<f32>> {
        if screen_width == 0 || screen_height == 0 {
            return None;
        }

        let ndc_x = (screen_x / screen_width as f32) * 2.0 - 1.0;
        let ndc_y = 1.0 - (screen_y / screen_height as f32) * 2.0; // Flip Y

        self.unproject_point_ndc(Point3::new(ndc_x, ndc_y, depth))
    }

    /// World-space picking ray through a pixel.
    ///
    /// The direction comes from unprojecting the pixel on the near and far
    /// planes. The ray starts at the eye so geometry closer than `znear`
    /// can still be hit.
    pub fn ray_from_screen(
        &self,
        screen_x: f32,
        screen_y: f32,
        screen_width: u32,
        screen_height: u32,
    ) -> Option<Ray> {
        let near = self.unproject_point_screen(screen_x, screen_y, -1.0, screen_width, screen_height)?;
        let far = self.unproject_point_screen(screen_x, screen_y, 1.0, screen_width, screen_height)?;
        let ray = Ray::through(near, far)?;
        Some(Ray::new(self.eye, ray.direction))
    }
}
