use cgmath::{InnerSpace, Matrix4, Point3, Vector3};

use crate::EPSILON;

/// A half-line with an origin and a unit direction.
#[derive(Debug, Copy, Clone)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Creates a ray, normalizing `direction`.
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Creates a ray from `origin` through `target`.
    /// Returns None if the two points coincide.
    pub fn through(origin: Point3<f32>, target: Point3<f32>) -> Option<Self> {
        let direction = target - origin;
        if direction.magnitude2() < EPSILON * EPSILON {
            return None;
        }
        Some(Self::new(origin, direction))
    }

    /// `origin + t * direction`
    pub fn point_at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }

    /// Moves the ray into another coordinate space.
    ///
    /// The direction is re-normalized, so distances measured along the
    /// transformed ray are in the target space's units.
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let origin = Point3::from_homogeneous(matrix * self.origin.to_homogeneous());
        let direction = (matrix * self.direction.extend(0.0)).truncate();

        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Double-sided Möller–Trumbore ray/triangle test.
    ///
    /// Returns `(t, u, v)` where `t` is the distance along the ray and
    /// `(u, v)` are barycentric weights of `v1` and `v2`. Hits behind the
    /// origin are rejected.
    pub fn intersect_triangle(
        &self,
        v0: Point3<f32>,
        v1: Point3<f32>,
        v2: Point3<f32>,
    ) -> Option<(f32, f32, f32)> {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        // Relative to the edge lengths so small triangles stay pickable
        if det.abs() <= EPSILON * edge1.magnitude() * edge2.magnitude() {
            // Parallel to the triangle plane, or degenerate
            return None;
        }
        let inv_det = 1.0 / det;

        let s = self.origin - v0;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t > 0.0).then_some((t, u, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Rad;

    fn triangle() -> (Point3<f32>, Point3<f32>, Point3<f32>) {
        (
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_new_normalizes_direction() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(3.0, 4.0, 0.0));
        assert!((ray.direction.magnitude() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_through_coincident_points() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert!(Ray::through(p, p).is_none());

        let ray = Ray::through(p, Point3::new(1.0, 2.0, 10.0)).unwrap();
        assert!((ray.direction.z - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_point_at() {
        let ray = Ray::new(Point3::new(1.0, 2.0, 3.0), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(ray.point_at(0.0), ray.origin);

        let point = ray.point_at(5.0);
        assert!((point.x - 6.0).abs() < EPSILON);
        assert!((point.y - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_transform_translation_and_rotation() {
        let ray = Ray::new(Point3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        let matrix = Matrix4::from_translation(Vector3::new(0.0, 5.0, 0.0))
            * Matrix4::from_angle_z(Rad(std::f32::consts::FRAC_PI_2));

        let moved = ray.transform(&matrix);

        assert!(moved.origin.x.abs() < 1e-5);
        assert!((moved.origin.y - 6.0).abs() < 1e-5);
        assert!((moved.direction.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_transform_scale_keeps_unit_direction() {
        let ray = Ray::new(Point3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 0.0));
        let moved = ray.transform(&Matrix4::from_scale(3.0));

        assert!((moved.origin.x - 3.0).abs() < EPSILON);
        assert!((moved.direction.magnitude() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_triangle_hit_front_and_back() {
        let (v0, v1, v2) = triangle();

        let front = Ray::new(Point3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        let (t, u, v) = front.intersect_triangle(v0, v1, v2).unwrap();
        assert!((t - 5.0).abs() < EPSILON);
        assert!(u >= 0.0 && v >= 0.0 && u + v <= 1.0);

        let back = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(back.intersect_triangle(v0, v1, v2).is_some());
    }

    #[test]
    fn test_triangle_miss() {
        let (v0, v1, v2) = triangle();
        let ray = Ray::new(Point3::new(4.0, 4.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(ray.intersect_triangle(v0, v1, v2).is_none());
    }

    #[test]
    fn test_triangle_parallel() {
        let (v0, v1, v2) = triangle();
        let ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 0.0));
        assert!(ray.intersect_triangle(v0, v1, v2).is_none());
    }

    #[test]
    fn test_tiny_triangle_hit() {
        let (v0, v1, v2) = triangle();
        let s = 1e-4;
        let ray = Ray::new(Point3::new(0.0, 0.0, 3.0 * s), Vector3::new(0.0, 0.0, -1.0));

        let (t, _, _) = ray
            .intersect_triangle(v0 * s, v1 * s, v2 * s)
            .expect("sub-millimetre triangle should be hit");
        assert!((t - 3.0 * s).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_triangle_is_missed() {
        let p = Point3::new(0.0, 0.0, 0.0);
        let ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(ray.intersect_triangle(p, p, Point3::new(1.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_triangle_behind_origin() {
        let (v0, v1, v2) = triangle();
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(ray.intersect_triangle(v0, v1, v2).is_none());
    }
}
