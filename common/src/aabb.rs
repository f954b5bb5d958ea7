use cgmath::{Matrix4, Point3, Vector3};

use crate::{Ray, EPSILON};

/// An axis-aligned bounding box in 3D space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Creates the smallest box containing every point.
    /// Returns None if `points` is empty.
    pub fn from_points(points: &[Point3<f32>]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let start = Self::new(*first, *first);
        Some(rest.iter().fold(start, |bounds, point| bounds.expand(*point)))
    }

    /// Returns the 8 corner points of the box.
    pub fn corners(&self) -> [Point3<f32>; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Transforms the box by a 4x4 matrix.
    ///
    /// All 8 corners are transformed and re-enclosed, so rotations grow the
    /// box rather than shear it.
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = self.corners().map(|corner| {
            let homogeneous = matrix * corner.to_homogeneous();
            Point3::from_homogeneous(homogeneous)
        });

        let start = Self::new(corners[0], corners[0]);
        corners[1..]
            .iter()
            .fold(start, |bounds, corner| bounds.expand(*corner))
    }

    /// Slab test against a ray.
    ///
    /// Returns the ray parameter of the entry point, `Some(0.0)` when the
    /// origin is inside the box, or None on a miss.
    pub fn intersects_ray(&self, ray: &Ray) -> Option<f32> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        let slabs = [
            (ray.origin.x, ray.direction.x, self.min.x, self.max.x),
            (ray.origin.y, ray.direction.y, self.min.y, self.max.y),
            (ray.origin.z, ray.direction.z, self.min.z, self.max.z),
        ];

        for (origin, direction, lo, hi) in slabs {
            if direction.abs() < EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction;
            let (t1, t2) = ((lo - origin) * inv, (hi - origin) * inv);
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));

            if t_enter > t_exit {
                return None;
            }
        }

        if t_enter >= 0.0 {
            Some(t_enter)
        } else if t_exit >= 0.0 {
            Some(0.0)
        } else {
            None
        }
    }

    /// Returns a copy grown to include `point`.
    pub fn expand(&self, point: Point3<f32>) -> Self {
        Self {
            min: Point3::new(
                self.min.x.min(point.x),
                self.min.y.min(point.y),
                self.min.z.min(point.z),
            ),
            max: Point3::new(
                self.max.x.max(point.x),
                self.max.y.max(point.y),
                self.max.z.max(point.z),
            ),
        }
    }

    /// Returns the box enclosing both `self` and `other`.
    pub fn merge(&self, other: &Aabb) -> Self {
        self.expand(other.min).expand(other.max)
    }

    /// Merges two optional boxes, treating None as empty.
    pub fn merge_optional(a: Option<Aabb>, b: Option<Aabb>) -> Option<Aabb> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.merge(&b)),
            (a, None) => a,
            (None, b) => b,
        }
    }

    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Extents along each axis.
    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Largest of the three extents.
    pub fn max_extent(&self) -> f32 {
        let size = self.size();
        size.x.max(size.y).max(size.z)
    }

    /// Radius of the sphere through the box corners.
    pub fn bounding_sphere_radius(&self) -> f32 {
        use cgmath::InnerSpace;
        self.size().magnitude() * 0.5
    }

    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        (self.min.x..=self.max.x).contains(&point.x)
            && (self.min.y..=self.max.y).contains(&point.y)
            && (self.min.z..=self.max.z).contains(&point.z)
    }
}
