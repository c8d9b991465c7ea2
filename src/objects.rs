//! Objects
//!
//! Optical surfaces: the shape a ray can hit, paired with the material deciding what leaves it.

use std::fmt;

use crate::{
    materials::{Dielectric, Redirect, Reflective},
    utils::{self, SerdeVector, VecExt},
    OpticsError, Point, Ray, Result, Vec2,
};
use serde::{Deserialize, Serialize};

/// Number of points used to draw a circle
pub const CIRCLE_OUTLINE_POINTS: usize = 72;

/// Relative gap in ray parameter under which a prism hit counts as landing on a corner
pub const VERTEX_TOLERANCE: f64 = 1e-9;

/// Capabilities shared by every optical surface
pub trait Optic {
    /// Nearest forward hit of `ray` with this surface
    fn try_hit(&self, ray: &Ray) -> Option<Hit>;

    /// The ray produced when `ray_in` arrives at `hit`
    fn try_redirect(&self, ray_in: &Ray, hit: &Hit, ambient_index: f64) -> Option<Ray>;

    /// Display name
    fn label(&self) -> &'static str;

    /// Reference point used for describing, moving and rotating the surface
    fn position(&self) -> Point;

    /// Boundary as an ordered list of points
    fn outline(&self) -> Vec<Point>;

    fn translate(&mut self, offset: &Vec2);

    /// Rotate counter-clockwise about [`Optic::position`]
    fn rotate(&mut self, angle_deg: f64);

    /// Shortest distance from `p` to the boundary, used to pick a surface under the cursor
    fn distance_to_point(&self, p: &Point) -> f64;
}

/// Represents a hit
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Point of intersection
    pub p: Point,
    /// Ray parameter, equal to the distance for a unit direction
    pub t: f64,
    /// Unit normal, always facing the incoming ray
    pub normal: Vec2,
    /// Whether the ray arrived on the outward side of the surface
    pub front_face: bool,
    /// Polygon edge that was hit
    pub edge: Option<usize>,
}
impl Hit {
    pub fn new(p: Point, t: f64, ray: &Ray, outward_normal: &Vec2, edge: Option<usize>) -> Self {
        let front_face = ray.dir.dot(outward_normal) < 0.0;
        let mut normal = outward_normal.to_owned();
        if !front_face {
            normal = -normal;
        }
        Self {
            p,
            t,
            normal,
            front_face,
            edge,
        }
    }
}

/// Flat mirror between two endpoints
///
/// The reflective face is the one the left normal of `a -> b` points to.
#[derive(Debug, Clone, PartialEq)]
pub struct Mirror {
    pub a: Point,
    pub b: Point,
    material: Reflective,
}
impl Mirror {
    pub fn new(a: Point, b: Point, two_sided: bool) -> Result<Self> {
        if !(a - b).norm().is_finite() || (b - a).norm() < utils::EPSILON {
            return Err(OpticsError::DegenerateMirror);
        }
        Ok(Self {
            a,
            b,
            material: Reflective::new(two_sided),
        })
    }

    pub fn from_config(config: MirrorConfig) -> Result<Self> {
        Self::new(config.a.into(), config.b.into(), config.two_sided)
    }

    pub fn is_two_sided(&self) -> bool {
        self.material.two_sided
    }

    /// Unit normal of the reflective face
    pub fn normal(&self) -> Vec2 {
        let edge = self.b - self.a;
        edge.left_normal() / edge.norm()
    }
}
impl Optic for Mirror {
    fn try_hit(&self, ray: &Ray) -> Option<Hit> {
        let t = utils::segment_intersection(&self.a, &self.b, ray)?;
        Some(Hit::new(ray.get(t), t, ray, &self.normal(), None))
    }

    fn try_redirect(&self, ray_in: &Ray, hit: &Hit, ambient_index: f64) -> Option<Ray> {
        self.material.try_redirect(ray_in, hit, ambient_index)
    }

    fn label(&self) -> &'static str {
        "Mirror"
    }

    fn position(&self) -> Point {
        (self.a + self.b) / 2.0
    }

    fn outline(&self) -> Vec<Point> {
        vec![self.a, self.b]
    }

    fn translate(&mut self, offset: &Vec2) {
        self.a += offset;
        self.b += offset;
    }

    fn rotate(&mut self, angle_deg: f64) {
        let c = self.position();
        self.a = c + (self.a - c).rotate_deg(angle_deg);
        self.b = c + (self.b - c).rotate_deg(angle_deg);
    }

    fn distance_to_point(&self, p: &Point) -> f64 {
        utils::segment_distance(p, &self.a, &self.b)
    }
}

/// Mirror Config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub a: SerdeVector,
    pub b: SerdeVector,
    #[serde(default = "default_two_sided")]
    pub two_sided: bool,
}

fn default_two_sided() -> bool {
    true
}

/// Circular lens
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub center: Point,
    pub radius: f64,
    material: Dielectric,
}
impl Sphere {
    pub fn new(center: Point, radius: f64, ir: f64) -> Result<Self> {
        if !radius.is_finite() || radius < utils::EPSILON {
            return Err(OpticsError::InvalidRadius(radius));
        }
        Ok(Self {
            center,
            radius,
            material: Dielectric::new(check_index(ir)?),
        })
    }

    pub fn from_config(config: SphereConfig) -> Result<Self> {
        Self::new(config.center.into(), config.radius, config.ir)
    }

    pub fn ir(&self) -> f64 {
        self.material.ir
    }
}
impl Optic for Sphere {
    fn try_hit(&self, ray: &Ray) -> Option<Hit> {
        let t = utils::circle_intersection(&self.center, self.radius, ray)?;
        let p = ray.get(t);
        let outward_normal = (p - self.center) / self.radius;
        Some(Hit::new(p, t, ray, &outward_normal, None))
    }

    fn try_redirect(&self, ray_in: &Ray, hit: &Hit, ambient_index: f64) -> Option<Ray> {
        self.material.try_redirect(ray_in, hit, ambient_index)
    }

    fn label(&self) -> &'static str {
        "Sphere"
    }

    fn position(&self) -> Point {
        self.center
    }

    fn outline(&self) -> Vec<Point> {
        (0..CIRCLE_OUTLINE_POINTS)
            .map(|i| {
                let phi = 2.0 * std::f64::consts::PI * i as f64 / CIRCLE_OUTLINE_POINTS as f64;
                self.center + self.radius * Vec2::new(phi.cos(), phi.sin())
            })
            .collect()
    }

    fn translate(&mut self, offset: &Vec2) {
        self.center += offset;
    }

    fn rotate(&mut self, _angle_deg: f64) {}

    fn distance_to_point(&self, p: &Point) -> f64 {
        (p.distance_to(&self.center) - self.radius).abs()
    }
}

/// Sphere config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SphereConfig {
    pub center: SerdeVector,
    pub radius: f64,
    pub ir: f64,
}

/// Simple polygon of glass
#[derive(Debug, Clone, PartialEq)]
pub struct Prism {
    vertices: Vec<Point>,
    /// Vertices wind counter-clockwise
    ccw: bool,
    material: Dielectric,
}
impl Prism {
    pub fn new(vertices: Vec<Point>, ir: f64) -> Result<Self> {
        let n = vertices.len();
        if n < 3 {
            return Err(OpticsError::TooFewVertices(n));
        }
        if vertices.iter().any(|v| !v[0].is_finite() || !v[1].is_finite()) {
            return Err(OpticsError::DegeneratePolygon);
        }
        let edge = |i: usize| (vertices[i], vertices[(i + 1) % n]);
        for i in 0..n {
            let (a, b) = edge(i);
            let (_, c) = edge((i + 1) % n);
            let e1 = b - a;
            let e2 = c - b;
            if e1.norm() < utils::EPSILON {
                return Err(OpticsError::DegeneratePolygon);
            }
            // Consecutive edges doubling back over each other
            if e1.cross_2d(&e2).abs() < utils::EPSILON && e1.dot(&e2) < 0.0 {
                return Err(OpticsError::DegeneratePolygon);
            }
        }
        for i in 0..n {
            // Adjacent edges share a vertex, skip them
            for j in i + 2..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                let (a, b) = edge(i);
                let (c, d) = edge(j);
                if utils::segments_cross(&a, &b, &c, &d) {
                    return Err(OpticsError::SelfIntersectingPolygon(i, j));
                }
            }
        }
        let area = signed_area(&vertices);
        if area.abs() < utils::EPSILON {
            return Err(OpticsError::DegeneratePolygon);
        }
        Ok(Self {
            vertices,
            ccw: area > 0.0,
            material: Dielectric::new(check_index(ir)?),
        })
    }

    pub fn from_config(config: PrismConfig) -> Result<Self> {
        Self::new(
            config.vertices.into_iter().map(Point::from).collect(),
            config.ir,
        )
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn ir(&self) -> f64 {
        self.material.ir
    }

    /// Endpoints of edge `i`, in winding order
    pub fn edge(&self, i: usize) -> (Point, Point) {
        let n = self.vertices.len();
        (self.vertices[i % n], self.vertices[(i + 1) % n])
    }

    /// Unit normal of edge `i` pointing out of the prism
    pub fn edge_normal(&self, i: usize) -> Vec2 {
        let (a, b) = self.edge(i);
        let inward = (b - a).left_normal() / (b - a).norm();
        if self.ccw {
            -inward
        } else {
            inward
        }
    }

    fn centroid(&self) -> Point {
        self.vertices.iter().sum::<Vec2>() / self.vertices.len() as f64
    }

    /// Outward normal at the hit on edge `i`
    ///
    /// A hit on a corner meets both edges sharing it; their normals are averaged so the result
    /// does not depend on which edge comes first in winding order.
    fn vertex_aware_normal(&self, i: usize, t: f64, ray: &Ray) -> Vec2 {
        let n = self.vertices.len();
        let normal = self.edge_normal(i);
        let tolerance = VERTEX_TOLERANCE * t.max(1.0);
        for j in [(i + n - 1) % n, (i + 1) % n] {
            let (a, b) = self.edge(j);
            let shares_hit = utils::segment_intersection(&a, &b, ray)
                .map_or(false, |tj| (tj - t).abs() <= tolerance);
            if shares_hit {
                return (normal + self.edge_normal(j)).try_unit().unwrap_or(normal);
            }
        }
        normal
    }
}
impl Optic for Prism {
    fn try_hit(&self, ray: &Ray) -> Option<Hit> {
        let mut closest: Option<(usize, f64)> = None;
        for i in 0..self.vertices.len() {
            let (a, b) = self.edge(i);
            if let Some(t) = utils::segment_intersection(&a, &b, ray) {
                if closest.map_or(true, |(_, best)| t < best) {
                    closest = Some((i, t));
                }
            }
        }
        let (i, t) = closest?;
        Some(Hit::new(ray.get(t), t, ray, &self.vertex_aware_normal(i, t, ray), Some(i)))
    }

    fn try_redirect(&self, ray_in: &Ray, hit: &Hit, ambient_index: f64) -> Option<Ray> {
        self.material.try_redirect(ray_in, hit, ambient_index)
    }

    fn label(&self) -> &'static str {
        "Prism"
    }

    fn position(&self) -> Point {
        self.centroid()
    }

    fn outline(&self) -> Vec<Point> {
        self.vertices.clone()
    }

    fn translate(&mut self, offset: &Vec2) {
        for v in self.vertices.iter_mut() {
            *v += offset;
        }
    }

    fn rotate(&mut self, angle_deg: f64) {
        let c = self.centroid();
        for v in self.vertices.iter_mut() {
            *v = c + (*v - c).rotate_deg(angle_deg);
        }
    }

    fn distance_to_point(&self, p: &Point) -> f64 {
        (0..self.vertices().len())
            .map(|i| {
                let (a, b) = self.edge(i);
                utils::segment_distance(p, &a, &b)
            })
            .fold(f64::INFINITY, f64::min)
    }
}

/// Prism config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrismConfig {
    pub vertices: Vec<SerdeVector>,
    pub ir: f64,
}

/// Shoelace area, positive for counter-clockwise winding
fn signed_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| vertices[i].cross_2d(&vertices[(i + 1) % n]))
        .sum::<f64>()
        / 2.0
}

fn check_index(ir: f64) -> Result<f64> {
    if ir.is_finite() && ir >= 1.0 {
        Ok(ir)
    } else {
        Err(OpticsError::InvalidIndex(ir))
    }
}

/// Any optical surface a scene can hold
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    Mirror(Mirror),
    Sphere(Sphere),
    Prism(Prism),
}
impl Surface {
    pub fn from_config(config: SurfaceConfig) -> Result<Self> {
        Ok(match config {
            SurfaceConfig::Mirror(c) => Surface::Mirror(Mirror::from_config(c)?),
            SurfaceConfig::Sphere(c) => Surface::Sphere(Sphere::from_config(c)?),
            SurfaceConfig::Prism(c) => Surface::Prism(Prism::from_config(c)?),
        })
    }

    fn as_optic(&self) -> &dyn Optic {
        match self {
            Surface::Mirror(m) => m,
            Surface::Sphere(s) => s,
            Surface::Prism(p) => p,
        }
    }

    fn as_optic_mut(&mut self) -> &mut dyn Optic {
        match self {
            Surface::Mirror(m) => m,
            Surface::Sphere(s) => s,
            Surface::Prism(p) => p,
        }
    }
}
impl Optic for Surface {
    fn try_hit(&self, ray: &Ray) -> Option<Hit> {
        self.as_optic().try_hit(ray)
    }

    fn try_redirect(&self, ray_in: &Ray, hit: &Hit, ambient_index: f64) -> Option<Ray> {
        self.as_optic().try_redirect(ray_in, hit, ambient_index)
    }

    fn label(&self) -> &'static str {
        self.as_optic().label()
    }

    fn position(&self) -> Point {
        self.as_optic().position()
    }

    fn outline(&self) -> Vec<Point> {
        self.as_optic().outline()
    }

    fn translate(&mut self, offset: &Vec2) {
        self.as_optic_mut().translate(offset)
    }

    fn rotate(&mut self, angle_deg: f64) {
        self.as_optic_mut().rotate(angle_deg)
    }

    fn distance_to_point(&self, p: &Point) -> f64 {
        self.as_optic().distance_to_point(p)
    }
}
impl From<Mirror> for Surface {
    fn from(m: Mirror) -> Self {
        Surface::Mirror(m)
    }
}
impl From<Sphere> for Surface {
    fn from(s: Sphere) -> Self {
        Surface::Sphere(s)
    }
}
impl From<Prism> for Surface {
    fn from(p: Prism) -> Self {
        Surface::Prism(p)
    }
}
impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.position();
        write!(f, "{}, ({:.3}, {:.3})", self.label(), p[0], p[1])
    }
}

/// Config for surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SurfaceConfig {
    Mirror(MirrorConfig),
    Sphere(SphereConfig),
    Prism(PrismConfig),
}

/// Index and hit of the surface `ray` meets first
///
/// Surfaces are tried in order and only a strictly closer hit replaces the current one, so on an
/// exact tie the earlier surface wins.
pub fn nearest_hit(surfaces: &[Surface], ray: &Ray) -> Option<(usize, Hit)> {
    let mut closest_so_far = f64::INFINITY;
    let mut hit_final = None;

    for (i, surface) in surfaces.iter().enumerate() {
        if let Some(hit) = surface.try_hit(ray) {
            if hit.t < closest_so_far {
                closest_so_far = hit.t;
                hit_final = Some((i, hit));
            }
        }
    }
    hit_final
}
