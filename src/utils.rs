//! Utils
//!
//! Vector helpers and the ray/shape intersection primitives every surface is built from.

use serde::{Deserialize, Serialize};

use crate::{Point, Ray, Vec2};

/// Smallest ray parameter accepted as a hit
///
/// A ray spawned on a surface would otherwise hit that same surface again at t = 0.
pub const T_MIN: f64 = 1e-7;

/// Lengths, areas and determinants below this are treated as zero
pub const EPSILON: f64 = 1e-12;

/// 2D operations nalgebra does not provide for `Vector2`
pub trait VecExt {
    /// Scalar cross product `x1 * y2 - y1 * x2`
    fn cross_2d(&self, other: &Vec2) -> f64;

    fn distance_to(&self, other: &Point) -> f64;

    /// Angle to the +x axis in degrees, in [0, 360)
    ///
    /// `None` for a zero-length vector.
    fn angle_deg(&self) -> Option<f64>;

    /// Unit vector in the same direction, `None` if the length is zero or not finite
    fn try_unit(&self) -> Option<Vec2>;

    /// The vector rotated by +90 degrees
    fn left_normal(&self) -> Vec2;

    /// The vector rotated counter-clockwise by `angle_deg`
    fn rotate_deg(&self, angle_deg: f64) -> Vec2;
}

impl VecExt for Vec2 {
    fn cross_2d(&self, other: &Vec2) -> f64 {
        self[0] * other[1] - self[1] * other[0]
    }

    fn distance_to(&self, other: &Point) -> f64 {
        (other - self).norm()
    }

    fn angle_deg(&self) -> Option<f64> {
        let len = self.norm();
        if len < EPSILON || !len.is_finite() {
            return None;
        }
        // asin only covers [-90, 90], fold the left half-plane over
        let mut angle = (self[1] / len).clamp(-1.0, 1.0).asin();
        if self[0] < 0.0 {
            angle = std::f64::consts::PI - angle;
        }
        if angle < 0.0 {
            angle += 2.0 * std::f64::consts::PI;
        }
        Some(angle.to_degrees())
    }

    fn try_unit(&self) -> Option<Vec2> {
        let len = self.norm();
        if len < EPSILON || !len.is_finite() {
            None
        } else {
            Some(self / len)
        }
    }

    fn left_normal(&self) -> Vec2 {
        Vec2::new(-self[1], self[0])
    }

    fn rotate_deg(&self, angle_deg: f64) -> Vec2 {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        Vec2::new(
            cos * self[0] - sin * self[1],
            sin * self[0] + cos * self[1],
        )
    }
}

/// A 2D coordinate as it appears in scene files: `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SerdeVector(pub [f64; 2]);
impl From<SerdeVector> for Vec2 {
    fn from(v: SerdeVector) -> Self {
        Vec2::new(v.0[0], v.0[1])
    }
}
impl From<Vec2> for SerdeVector {
    fn from(v: Vec2) -> Self {
        Self([v[0], v[1]])
    }
}

/// Mirror `v` about the line whose unit normal is `n`
pub fn reflect(v: &Vec2, n: &Vec2) -> Vec2 {
    v - 2.0 * v.dot(n) * n
}

/// Refract the unit vector `uv` through a boundary with unit normal `n`
///
/// `n` must face the incoming ray (`uv . n <= 0`) and `etai_over_etat` is the index of the medium
/// being left over the index of the medium being entered. The caller checks for total internal
/// reflection first; past the critical angle the parallel component is meaningless.
pub fn refract(uv: &Vec2, n: &Vec2, etai_over_etat: f64) -> Vec2 {
    let cos_theta = (-uv.dot(n)).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.norm_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Ray parameter of the nearest forward hit with a circle
///
/// Returns the smallest root greater than [`T_MIN`]: the entry point for a ray outside the
/// circle, the exit point for a ray starting inside or on it.
pub fn circle_intersection(center: &Point, radius: f64, ray: &Ray) -> Option<f64> {
    if !(radius > EPSILON) {
        return None;
    }
    let oc = ray.orig - center;
    let a = ray.dir.norm_squared();
    if a < EPSILON {
        return None;
    }
    let half_b = oc.dot(&ray.dir);
    let c = oc.norm_squared() - radius.powi(2);
    let discriminant = half_b.powi(2) - a * c;
    if discriminant < 0.0 {
        return None;
    }

    // Find the nearest root that lies in front of the origin
    let sqrtd = discriminant.sqrt();
    let root = (-half_b - sqrtd) / a;
    if root > T_MIN {
        return Some(root);
    }
    let root = (-half_b + sqrtd) / a;
    (root > T_MIN).then_some(root)
}

/// Ray parameter where the ray crosses the segment `a`-`b`
///
/// Solves `orig + t * dir = a + u * (b - a)`. Parallel rays never hit, the hit must satisfy
/// `u` in [0, 1] and `t` > [`T_MIN`].
pub fn segment_intersection(a: &Point, b: &Point, ray: &Ray) -> Option<f64> {
    let edge = b - a;
    let denom = ray.dir.cross_2d(&edge);
    if denom.abs() < EPSILON {
        return None;
    }
    let w = a - ray.orig;
    let t = w.cross_2d(&edge) / denom;
    let u = w.cross_2d(&ray.dir) / denom;
    if t > T_MIN && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}

/// Shortest distance from `p` to the closed segment `a`-`b`
pub fn segment_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let seg = b - a;
    let len2 = seg.norm_squared();
    if len2 < EPSILON {
        return a.distance_to(p);
    }
    let u = ((p - a).dot(&seg) / len2).clamp(0.0, 1.0);
    (a + u * seg).distance_to(p)
}

/// Whether the closed segments `p1`-`p2` and `q1`-`q2` share a point
pub fn segments_cross(p1: &Point, p2: &Point, q1: &Point, q2: &Point) -> bool {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = r.cross_2d(&s);
    let w = q1 - p1;
    if denom.abs() < EPSILON {
        // Parallel: only a collinear overlap counts
        if w.cross_2d(&r).abs() > EPSILON {
            return false;
        }
        let rr = r.norm_squared();
        if rr < EPSILON {
            return false;
        }
        let t0 = w.dot(&r) / rr;
        let t1 = t0 + s.dot(&r) / rr;
        let (lo, hi) = if t0 < t1 { (t0, t1) } else { (t1, t0) };
        return hi >= 0.0 && lo <= 1.0;
    }
    let t = w.cross_2d(&s) / denom;
    let u = w.cross_2d(&r) / denom;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ray(orig: [f64; 2], dir: [f64; 2]) -> Ray {
        Ray::new(Point::new(orig[0], orig[1]), Vec2::new(dir[0], dir[1]), 1.0)
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(4.0, 0.0);
        assert_relative_eq!(segment_distance(&Point::new(2.0, 3.0), &a, &b), 3.0);
        assert_relative_eq!(segment_distance(&Point::new(7.0, 4.0), &a, &b), 5.0);
        assert_relative_eq!(segment_distance(&Point::new(1.0, 1.0), &a, &a), 2f64.sqrt());
    }

    #[test]
    fn angle_covers_all_quadrants() {
        assert_relative_eq!(Vec2::new(1.0, 0.0).angle_deg().unwrap(), 0.0);
        assert_relative_eq!(Vec2::new(1.0, 1.0).angle_deg().unwrap(), 45.0, epsilon = 1e-12);
        assert_relative_eq!(Vec2::new(-1.0, 1.0).angle_deg().unwrap(), 135.0, epsilon = 1e-12);
        assert_relative_eq!(Vec2::new(-1.0, -1.0).angle_deg().unwrap(), 225.0, epsilon = 1e-12);
        assert_relative_eq!(Vec2::new(0.0, -2.0).angle_deg().unwrap(), 270.0, epsilon = 1e-12);
        assert!(Vec2::zeros().angle_deg().is_none());
    }

    #[test]
    fn zero_vector_has_no_unit() {
        assert!(Vec2::zeros().try_unit().is_none());
        let u = Vec2::new(3.0, 4.0).try_unit().unwrap();
        assert_relative_eq!(u, Vec2::new(0.6, 0.8));
    }

    #[test]
    fn cross_and_distance() {
        assert_relative_eq!(Vec2::new(1.0, 0.0).cross_2d(&Vec2::new(0.0, 1.0)), 1.0);
        assert_relative_eq!(Vec2::new(0.0, 1.0).cross_2d(&Vec2::new(1.0, 0.0)), -1.0);
        assert_relative_eq!(Point::new(1.0, 1.0).distance_to(&Point::new(4.0, 5.0)), 5.0);
    }

    #[test]
    fn rotation_quarter_turn() {
        let v = Vec2::new(1.0, 0.0).rotate_deg(90.0);
        assert_relative_eq!(v, Vec2::new(0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(Vec2::new(2.0, 1.0).left_normal(), Vec2::new(-1.0, 2.0));
    }

    #[test]
    fn reflect_flips_normal_component() {
        let r = reflect(&Vec2::new(1.0, -1.0), &Vec2::new(0.0, 1.0));
        assert_relative_eq!(r, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn refract_at_normal_incidence_goes_straight() {
        let r = refract(&Vec2::new(1.0, 0.0), &Vec2::new(-1.0, 0.0), 1.0 / 1.5);
        assert_relative_eq!(r, Vec2::new(1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn circle_from_outside_hits_entry() {
        let t = circle_intersection(&Point::new(10.0, 0.0), 2.0, &ray([0.0, 0.0], [1.0, 0.0]));
        assert_relative_eq!(t.unwrap(), 8.0);
    }

    #[test]
    fn circle_from_inside_hits_exit() {
        let t = circle_intersection(&Point::new(10.0, 0.0), 2.0, &ray([10.0, 0.0], [1.0, 0.0]));
        assert_relative_eq!(t.unwrap(), 2.0);
        // Starting on the boundary and heading in crosses to the far side
        let t = circle_intersection(&Point::new(10.0, 0.0), 2.0, &ray([8.0, 0.0], [1.0, 0.0]));
        assert_relative_eq!(t.unwrap(), 4.0);
    }

    #[test]
    fn circle_miss_behind_and_tangent() {
        let center = Point::new(10.0, 0.0);
        assert!(circle_intersection(&center, 2.0, &ray([0.0, 5.0], [1.0, 0.0])).is_none());
        assert!(circle_intersection(&center, 2.0, &ray([20.0, 0.0], [1.0, 0.0])).is_none());
        let t = circle_intersection(&center, 2.0, &ray([0.0, 2.0], [1.0, 0.0]));
        assert_relative_eq!(t.unwrap(), 10.0, epsilon = 1e-6);
        assert!(circle_intersection(&center, 0.0, &ray([0.0, 0.0], [1.0, 0.0])).is_none());
    }

    #[test]
    fn segment_hits_inside_range_only() {
        let a = Point::new(5.0, -1.0);
        let b = Point::new(5.0, 1.0);
        assert_relative_eq!(segment_intersection(&a, &b, &ray([0.0, 0.0], [1.0, 0.0])).unwrap(), 5.0);
        assert!(segment_intersection(&a, &b, &ray([0.0, 2.0], [1.0, 0.0])).is_none());
        assert!(segment_intersection(&a, &b, &ray([6.0, 0.0], [1.0, 0.0])).is_none());
        assert!(segment_intersection(&a, &b, &ray([0.0, 0.0], [0.0, 1.0])).is_none());
    }

    #[test]
    fn crossing_segments() {
        let p = |x, y| Point::new(x, y);
        assert!(segments_cross(&p(0.0, 0.0), &p(2.0, 2.0), &p(0.0, 2.0), &p(2.0, 0.0)));
        assert!(!segments_cross(&p(0.0, 0.0), &p(1.0, 0.0), &p(0.0, 1.0), &p(1.0, 1.0)));
        assert!(segments_cross(&p(0.0, 0.0), &p(2.0, 0.0), &p(1.0, 0.0), &p(3.0, 0.0)));
        assert!(!segments_cross(&p(0.0, 0.0), &p(1.0, 0.0), &p(2.0, 0.0), &p(3.0, 0.0)));
    }
}
