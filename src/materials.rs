//! Implementation of materials
//!
//! A material decides what leaves a surface once a ray has hit it.

use crate::{
    objects::Hit,
    utils::{self, VecExt},
    Point, Ray, Vec2, MIN_INTENSITY,
};

/// Ray generation rule of a surface
pub trait Redirect {
    /// The ray leaving the surface, `None` if the chain ends here
    ///
    /// `ambient_index` is the refractive index of the medium surrounding every surface.
    fn try_redirect(&self, ray_in: &Ray, hit: &Hit, ambient_index: f64) -> Option<Ray>;
}

/// Flat reflector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflective {
    /// Reflect from the back face too; otherwise back-face hits absorb the ray
    pub two_sided: bool,
}
impl Reflective {
    pub fn new(two_sided: bool) -> Self {
        Self { two_sided }
    }
}
impl Redirect for Reflective {
    fn try_redirect(&self, ray_in: &Ray, hit: &Hit, _ambient_index: f64) -> Option<Ray> {
        if ray_in.intensity < MIN_INTENSITY {
            return None;
        }
        if !self.two_sided && !hit.front_face {
            log::trace!("ray absorbed by back face at {:?}", hit.p);
            return None;
        }
        let reflected = utils::reflect(&ray_in.dir, &hit.normal).try_unit()?;
        Some(Ray::spawn(ray_in, hit.p, reflected))
    }
}

/// A Dielectric is a refractive material, such as glass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dielectric {
    /// Index of refraction
    pub ir: f64,
}
impl Dielectric {
    pub fn new(ir: f64) -> Self {
        Self { ir }
    }
}
impl Redirect for Dielectric {
    fn try_redirect(&self, ray_in: &Ray, hit: &Hit, ambient_index: f64) -> Option<Ray> {
        if ray_in.intensity < MIN_INTENSITY {
            return None;
        }
        // Going in, light leaves the ambient medium; going out, it leaves the glass
        let refraction_ratio = if hit.front_face {
            ambient_index / self.ir
        } else {
            self.ir / ambient_index
        };
        snell_ray(&hit.p, &hit.normal, refraction_ratio, ray_in)
    }
}

/// Refract `ray_in` at `p` by Snell's law, or reflect it past the critical angle
///
/// `normal` may point either way across the boundary, it is turned to face the incoming ray.
/// `refraction_ratio` is the index of the medium being left over the index of the medium being
/// entered.
pub fn snell_ray(p: &Point, normal: &Vec2, refraction_ratio: f64, ray_in: &Ray) -> Option<Ray> {
    let unit_direction = ray_in.dir.try_unit()?;
    let mut normal = normal.try_unit()?;
    if unit_direction.dot(&normal) > 0.0 {
        normal = -normal;
    }

    let cos_theta = (-unit_direction.dot(&normal)).min(1.0);
    let sin_theta = (1.0 - cos_theta.powi(2)).sqrt();
    let cannot_refract = refraction_ratio * sin_theta > 1.0;

    let direction = if cannot_refract {
        utils::reflect(&unit_direction, &normal)
    } else {
        utils::refract(&unit_direction, &normal, refraction_ratio)
    };
    Some(Ray::spawn(ray_in, *p, direction.try_unit()?))
}
