//! Ray Optics Library
//!
//! Traces rays through a flat scene of mirrors, lenses and prisms. Each ray that meets a surface
//! is reflected or refracted into a child ray, building a chain that ends when the ray escapes,
//! is absorbed, or becomes too dim.

use nalgebra::Vector2;

pub mod error;
pub use error::{OpticsError, Result};

pub mod materials;

pub mod objects;

pub mod scene;

pub mod utils;
use utils::VecExt;

pub type Vec2 = Vector2<f64>;
pub type Point = Vec2;

/// Rays dimmer than this are not continued
pub const MIN_INTENSITY: f64 = 0.01;

/// Prelude
pub mod prelude {
    pub use crate::materials::{Dielectric, Redirect, Reflective};
    pub use crate::objects::{Hit, Mirror, Optic, Prism, Sphere, Surface};
    pub use crate::scene::{RayChain, Scene, SceneConfig};
    pub use crate::utils::VecExt;
    pub use crate::{OpticsError, Point, Ray, Result, Vec2, MIN_INTENSITY};
}

/// Where a ray segment ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Hit point
    pub point: Point,
    /// Distance travelled from the segment's origin
    pub distance: f64,
    /// Index of the surface in the scene's surface list
    pub surface: usize,
}

/// One straight segment of a light path
#[derive(Debug, Clone, PartialEq)]
pub struct Ray {
    pub orig: Point,
    /// Unit direction
    pub dir: Vec2,
    pub intensity: f64,
    /// Index of the previous segment in the owning chain, `None` for an emitter
    pub parent: Option<usize>,
    /// Cached nearest hit, valid only while `stale` is false
    pub intersection: Option<Intersection>,
    /// The cached intersection and any child must be rebuilt
    pub stale: bool,
}
impl Ray {
    /// Build a segment without validation
    ///
    /// `dir` is expected to be unit length; use [`Ray::emit`] for input coming from outside.
    pub fn new(orig: Point, dir: Vec2, intensity: f64) -> Self {
        Self {
            orig,
            dir,
            intensity,
            parent: None,
            intersection: None,
            stale: true,
        }
    }

    /// An emitter ray, the root of a chain
    pub fn emit(orig: Point, dir: Vec2, intensity: f64) -> Result<Self> {
        let dir = dir.try_unit().ok_or(OpticsError::DegenerateDirection)?;
        if !intensity.is_finite() || intensity < 0.0 {
            return Err(OpticsError::InvalidIntensity(intensity));
        }
        Ok(Self::new(orig, dir, intensity))
    }

    /// A segment spawned from `parent` at `orig`, inheriting its intensity
    pub fn spawn(parent: &Ray, orig: Point, dir: Vec2) -> Self {
        Self::new(orig, dir, parent.intensity)
    }

    pub fn get(&self, t: f64) -> Point {
        self.orig + t * self.dir
    }

    pub fn is_emitter(&self) -> bool {
        self.parent.is_none()
    }

    /// End of the drawn segment: the hit point, or `far` units ahead for an escaping ray
    pub fn end_point(&self, far: f64) -> Point {
        match &self.intersection {
            Some(hit) => hit.point,
            None => self.get(far),
        }
    }

    /// The segment as a polyline for the drawing layer
    pub fn path(&self, far: f64) -> [Point; 2] {
        [self.orig, self.end_point(far)]
    }

    /// Shortest distance from `p` to the drawn segment
    pub fn distance_to_point(&self, p: &Point, far: f64) -> f64 {
        let [a, b] = self.path(far);
        utils::segment_distance(p, &a, &b)
    }
}
