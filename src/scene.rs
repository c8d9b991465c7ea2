//! Scene
//!
//! Holds the emitters and surfaces and rebuilds every light path from its emitter whenever the
//! geometry changes.

use std::path::Path;

use log::{debug, trace};
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::{
    objects::{self, Optic, Surface, SurfaceConfig},
    utils::{self, SerdeVector, VecExt},
    Intersection, OpticsError, Point, Ray, Result,
};

/// Longest chain a single emitter may produce
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// How many links [`Scene::focal_point`] follows looking for the last segment
pub const FOCAL_SEARCH_DEPTH: usize = 10;

/// All segments of one light path, emitter first
///
/// Segment `i + 1` is the child of segment `i`; dropping the chain drops the whole path.
#[derive(Debug, Clone, PartialEq)]
pub struct RayChain {
    rays: Vec<Ray>,
}
impl RayChain {
    /// Start a chain at `root`, normalizing its direction
    pub fn new(mut root: Ray) -> Result<Self> {
        root.dir = root.dir.try_unit().ok_or(OpticsError::DegenerateDirection)?;
        if !root.intensity.is_finite() || root.intensity < 0.0 {
            return Err(OpticsError::InvalidIntensity(root.intensity));
        }
        root.parent = None;
        root.intersection = None;
        root.stale = true;
        Ok(Self { rays: vec![root] })
    }

    pub fn root(&self) -> &Ray {
        &self.rays[0]
    }

    pub fn rays(&self) -> &[Ray] {
        &self.rays
    }

    /// Number of segments, at least one
    pub fn len(&self) -> usize {
        self.rays.len()
    }

    /// Always false, a chain keeps its emitter
    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }

    pub fn child(&self, i: usize) -> Option<&Ray> {
        self.rays.get(i + 1)
    }

    pub fn parent(&self, i: usize) -> Option<&Ray> {
        self.rays.get(i)?.parent.and_then(|p| self.rays.get(p))
    }

    /// The segment without a child
    pub fn terminal(&self) -> &Ray {
        &self.rays[self.rays.len() - 1]
    }

    /// Whether the cached path no longer matches the scene
    pub fn is_stale(&self) -> bool {
        self.rays.iter().any(|r| r.stale)
    }

    /// Drop every derived segment and mark the emitter for retracing
    fn invalidate(&mut self) {
        self.rays.truncate(1);
        let root = &mut self.rays[0];
        root.intersection = None;
        root.stale = true;
    }

    /// Rebuild the path from the emitter
    fn trace(&mut self, surfaces: &[Surface], ambient_index: f64, max_depth: usize) {
        self.invalidate();
        let mut current = 0;
        loop {
            let ray = &mut self.rays[current];
            let found = objects::nearest_hit(surfaces, ray);
            ray.intersection = found.as_ref().map(|(surface, hit)| Intersection {
                point: hit.p,
                distance: hit.t,
                surface: *surface,
            });
            ray.stale = false;

            let Some((surface, hit)) = found else {
                trace!("segment {current} escapes");
                break;
            };
            if self.rays.len() >= max_depth {
                debug!("chain cut at {max_depth} segments");
                break;
            }
            let Some(mut child) =
                surfaces[surface].try_redirect(&self.rays[current], &hit, ambient_index)
            else {
                trace!("segment {current} ends on surface {surface}");
                break;
            };
            child.parent = Some(current);
            child.intersection = None;
            child.stale = true;
            self.rays.push(child);
            current += 1;
        }
    }
}

/// Emitters, surfaces and the light paths between them
#[derive(Debug, Clone)]
pub struct Scene {
    chains: Vec<RayChain>,
    surfaces: Vec<Surface>,
    ambient_index: f64,
    max_depth: usize,
}
impl Default for Scene {
    fn default() -> Self {
        Self {
            chains: Vec::new(),
            surfaces: Vec::new(),
            ambient_index: 1.0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap on segments per chain, never below one
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self.invalidate();
        self
    }

    pub fn from_config(config: SceneConfig) -> Result<Self> {
        let mut scene = Self::new().with_max_depth(config.max_depth);
        scene.set_ambient_index(config.ambient_index)?;
        for emitter in config.emitters {
            scene.add_ray(Ray::emit(
                emitter.origin.into(),
                emitter.direction.into(),
                emitter.intensity,
            )?)?;
        }
        for surface in config.surfaces {
            scene.add_surface(Surface::from_config(surface)?);
        }
        Ok(scene)
    }

    /// Add an emitter, returning its index
    ///
    /// The direction is normalized; a zero direction or a negative intensity is rejected.
    pub fn add_ray(&mut self, root: Ray) -> Result<usize> {
        self.chains.push(RayChain::new(root)?);
        self.invalidate();
        Ok(self.chains.len() - 1)
    }

    /// Add a surface, returning its index
    pub fn add_surface(&mut self, surface: impl Into<Surface>) -> usize {
        self.surfaces.push(surface.into());
        self.invalidate();
        self.surfaces.len() - 1
    }

    /// Remove an emitter together with its whole chain
    ///
    /// Later emitters shift down by one.
    pub fn remove_ray(&mut self, index: usize) -> Result<RayChain> {
        check_index(index, self.chains.len())?;
        let chain = self.chains.remove(index);
        self.invalidate();
        Ok(chain)
    }

    /// Remove a surface; later surfaces shift down by one
    pub fn remove_surface(&mut self, index: usize) -> Result<Surface> {
        check_index(index, self.surfaces.len())?;
        let surface = self.surfaces.remove(index);
        self.invalidate();
        Ok(surface)
    }

    /// Mutable access to a surface, for moving or rotating it
    pub fn surface_mut(&mut self, index: usize) -> Result<&mut Surface> {
        check_index(index, self.surfaces.len())?;
        self.invalidate();
        Ok(&mut self.surfaces[index])
    }

    pub fn set_ambient_index(&mut self, ambient_index: f64) -> Result<()> {
        if !ambient_index.is_finite() || ambient_index < 1.0 {
            return Err(OpticsError::InvalidIndex(ambient_index));
        }
        self.ambient_index = ambient_index;
        self.invalidate();
        Ok(())
    }

    pub fn ambient_index(&self) -> f64 {
        self.ambient_index
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn chains(&self) -> &[RayChain] {
        &self.chains
    }

    pub fn chain(&self, index: usize) -> Option<&RayChain> {
        self.chains.get(index)
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn surface(&self, index: usize) -> Option<&Surface> {
        self.surfaces.get(index)
    }

    /// Whether [`Scene::recalculate`] must run before the chains are read
    pub fn is_stale(&self) -> bool {
        self.chains.iter().any(RayChain::is_stale)
    }

    fn invalidate(&mut self) {
        for chain in self.chains.iter_mut() {
            chain.invalidate();
        }
    }

    /// Surface whose boundary lies closest to `p`, if within `tolerance`
    pub fn surface_at(&self, p: &Point, tolerance: f64) -> Option<usize> {
        nearest_within(
            self.surfaces.iter().map(|s| s.distance_to_point(p)),
            tolerance,
        )
    }

    /// Chain with a drawn segment closest to `p`, if within `tolerance`
    ///
    /// Escaping segments count as `far` units long.
    pub fn ray_at(&self, p: &Point, tolerance: f64, far: f64) -> Option<usize> {
        nearest_within(
            self.chains.iter().map(|chain| {
                chain
                    .rays()
                    .iter()
                    .map(|r| r.distance_to_point(p, far))
                    .fold(f64::INFINITY, f64::min)
            }),
            tolerance,
        )
    }

    /// Rebuild every chain from its emitter
    ///
    /// Always a full retrace: moving one surface can change which surface any ray meets first.
    pub fn recalculate(&mut self) {
        for chain in self.chains.iter_mut() {
            chain.trace(&self.surfaces, self.ambient_index, self.max_depth);
        }
        debug!(
            "recalculated {} chains, {} segments, {} surfaces",
            self.chains.len(),
            self.segment_count(),
            self.surfaces.len()
        );
    }

    /// Total number of segments over all chains
    pub fn segment_count(&self) -> usize {
        self.chains.iter().map(RayChain::len).sum()
    }

    /// One line per surface: label and position
    pub fn describe(&self) -> Vec<String> {
        self.surfaces.iter().map(Surface::to_string).collect()
    }

    /// Where the last segments of the first and last chain cross
    ///
    /// A visual aid for lens setups with two marginal rays. Each chain is followed for at most
    /// [`FOCAL_SEARCH_DEPTH`] links. The crossing may lie behind the segments (a virtual focus).
    /// `None` with fewer than two chains or parallel segments.
    pub fn focal_point(&self) -> Option<Point> {
        if self.chains.len() < 2 {
            return None;
        }
        let r1 = focal_segment(&self.chains[0]);
        let r2 = focal_segment(&self.chains[self.chains.len() - 1]);
        if r1.dir.cross_2d(&r2.dir).abs() < utils::EPSILON {
            return None;
        }

        // r1.orig + s * r1.dir = r2.orig + u * r2.dir
        let a = Matrix2::new(r1.dir[0], -r2.dir[0], r1.dir[1], -r2.dir[1]);
        let b: Vector2<f64> = r2.orig - r1.orig;
        let x = a.lu().solve(&b)?;
        Some(r1.get(x[0]))
    }

    /// Serializable snapshot of the traced scene
    ///
    /// Escaping segments are drawn `far` units long.
    pub fn report(&self, far: f64) -> SceneReport {
        SceneReport {
            surfaces: self
                .surfaces
                .iter()
                .map(|s| SurfaceReport {
                    label: s.label().to_string(),
                    position: s.position().into(),
                    outline: s.outline().into_iter().map(SerdeVector::from).collect(),
                })
                .collect(),
            chains: self
                .chains
                .iter()
                .map(|chain| {
                    chain
                        .rays()
                        .iter()
                        .map(|r| {
                            let [origin, end] = r.path(far);
                            SegmentReport {
                                origin: origin.into(),
                                    end: end.into(),
                                intensity: r.intensity,
                                emitter: r.is_emitter(),
                                surface: r.intersection.map(|i| i.surface),
                            }
                        })
                        .collect()
                })
                .collect(),
            focal_point: self.focal_point().map(SerdeVector::from),
        }
    }
}

/// Index of the smallest distance not above `tolerance`, earliest on ties
fn nearest_within(distances: impl Iterator<Item = f64>, tolerance: f64) -> Option<usize> {
    distances
        .enumerate()
        .filter(|(_, d)| *d <= tolerance)
        .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
            Some((_, best_d)) if best_d <= d => best,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}

/// Last segment of `chain` within [`FOCAL_SEARCH_DEPTH`] links of the emitter
fn focal_segment(chain: &RayChain) -> &Ray {
    &chain.rays()[FOCAL_SEARCH_DEPTH.min(chain.len() - 1)]
}

fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(OpticsError::IndexOutOfRange { index, len })
    }
}

/// Scene Config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_ambient_index")]
    pub ambient_index: f64,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub emitters: Vec<EmitterConfig>,
    #[serde(default)]
    pub surfaces: Vec<SurfaceConfig>,
}
impl SceneConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }
}

/// Emitter Config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterConfig {
    pub origin: SerdeVector,
    pub direction: SerdeVector,
    #[serde(default = "default_intensity")]
    pub intensity: f64,
}

fn default_ambient_index() -> f64 {
    1.0
}
fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}
fn default_intensity() -> f64 {
    1.0
}

/// Traced scene as handed to a drawing layer or dumped by the CLI
#[derive(Debug, Clone, Serialize)]
pub struct SceneReport {
    pub surfaces: Vec<SurfaceReport>,
    pub chains: Vec<Vec<SegmentReport>>,
    pub focal_point: Option<SerdeVector>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurfaceReport {
    pub label: String,
    pub position: SerdeVector,
    pub outline: Vec<SerdeVector>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentReport {
    pub origin: SerdeVector,
    pub end: SerdeVector,
    pub intensity: f64,
    pub emitter: bool,
    /// Surface the segment ends on
    pub surface: Option<usize>,
}
