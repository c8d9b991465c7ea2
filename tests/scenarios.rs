use approx::assert_relative_eq;
use ray_optics::prelude::*;

fn p(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn emitter(orig: Point, dir: Vec2) -> Ray {
    Ray::emit(orig, dir, 1.0).unwrap()
}

#[test]
fn horizontal_ray_reflects_off_vertical_mirror() {
    let mut scene = Scene::new();
    scene.add_ray(emitter(p(0.0, 0.0), Vec2::new(1.0, 0.0))).unwrap();
    scene.add_surface(Mirror::new(p(5.0, -1.0), p(5.0, 1.0), true).unwrap());
    scene.recalculate();

    let chain = scene.chain(0).unwrap();
    let child = chain.child(0).unwrap();
    assert_relative_eq!(child.orig, p(5.0, 0.0));
    assert_relative_eq!(child.dir, Vec2::new(-1.0, 0.0));
    assert!(chain.child(1).is_none());
}

#[test]
fn ray_entering_sphere_bends_toward_normal() {
    let mut scene = Scene::new();
    scene.add_ray(emitter(p(0.0, 0.0), Vec2::new(1.0, 0.0))).unwrap();
    scene.add_surface(Sphere::new(p(10.0, 0.0), 2.0, 1.5).unwrap());
    scene.recalculate();

    let chain = scene.chain(0).unwrap();
    let inside = chain.child(0).unwrap();
    assert_relative_eq!(inside.orig, p(8.0, 0.0));
    // On axis the normal is the ray itself, nothing to bend
    assert_relative_eq!(inside.dir, Vec2::new(1.0, 0.0), epsilon = 1e-12);

    // Off axis: 30 degrees of incidence refract to asin(sin 30 / 1.5)
    let mut scene = Scene::new();
    scene.add_ray(emitter(p(0.0, 1.0), Vec2::new(1.0, 0.0))).unwrap();
    scene.add_surface(Sphere::new(p(10.0, 0.0), 2.0, 1.5).unwrap());
    scene.recalculate();
    let chain = scene.chain(0).unwrap();
    let entry = chain.root().intersection.unwrap().point;
    let inward = (p(10.0, 0.0) - entry) / 2.0;
    let incidence = Vec2::new(1.0, 0.0).dot(&inward).acos();
    let refraction = chain.child(0).unwrap().dir.dot(&inward).acos();
    assert_relative_eq!(incidence.to_degrees(), 30.0, epsilon = 1e-9);
    assert!(refraction < incidence);
    assert_relative_eq!(refraction.sin(), incidence.sin() / 1.5, epsilon = 1e-12);
}

#[test]
fn dim_emitter_never_spawns() {
    let mut scene = Scene::new();
    scene.add_ray(Ray::emit(p(0.0, 0.0), Vec2::new(1.0, 0.0), MIN_INTENSITY * 0.99).unwrap()).unwrap();
    scene.add_surface(Mirror::new(p(5.0, -1.0), p(5.0, 1.0), true).unwrap());
    scene.add_surface(Sphere::new(p(-5.0, 0.0), 1.0, 1.5).unwrap());
    scene.recalculate();
    assert_eq!(scene.chain(0).unwrap().len(), 1);
}

#[test]
fn nearer_of_overlapping_surfaces_wins() {
    let mut scene = Scene::new();
    scene.add_ray(emitter(p(0.0, 0.0), Vec2::new(1.0, 0.0))).unwrap();
    // Farther surface first in insertion order
    scene.add_surface(Sphere::new(p(10.0, 0.0), 3.0, 1.5).unwrap());
    scene.add_surface(Mirror::new(p(6.5, -2.0), p(6.5, 2.0), true).unwrap());
    scene.recalculate();
    let hit = scene.chain(0).unwrap().root().intersection.unwrap();
    assert_eq!(hit.surface, 1);
    assert_relative_eq!(hit.distance, 6.5, epsilon = 1e-12);
}

#[test]
fn glass_block_totally_reflects_steep_rays() {
    // Right-angle prism: light entering the short face hits the hypotenuse at 45 degrees,
    // past the 41.8 degree critical angle of n = 1.5, and is turned through 90 degrees.
    let prism = Prism::new(vec![p(0.0, 0.0), p(4.0, 0.0), p(0.0, 4.0)], 1.5).unwrap();
    let mut scene = Scene::new();
    scene.add_ray(emitter(p(1.0, -3.0), Vec2::new(0.0, 1.0))).unwrap();
    scene.add_surface(prism);
    scene.recalculate();

    let rays = scene.chain(0).unwrap().rays();
    assert_eq!(rays.len(), 4);
    // Up through the bottom face, reflected off the hypotenuse, out through the left face
    assert_relative_eq!(rays[1].dir, Vec2::new(0.0, 1.0), epsilon = 1e-12);
    assert_relative_eq!(rays[2].orig, p(1.0, 3.0), epsilon = 1e-12);
    assert_relative_eq!(rays[2].dir, Vec2::new(-1.0, 0.0), epsilon = 1e-12);
    assert_relative_eq!(rays[3].orig, p(0.0, 3.0), epsilon = 1e-12);
    assert!(rays[3].intersection.is_none());
}

#[test]
fn prism_deviates_toward_its_base() {
    let prism = Prism::new(vec![p(4.0, -2.0), p(8.0, -2.0), p(6.0, 2.0)], 1.5).unwrap();
    let mut scene = Scene::new();
    scene.add_ray(emitter(p(0.0, 0.0), Vec2::new(1.0, 0.0))).unwrap();
    scene.add_surface(prism);
    scene.recalculate();

    let chain = scene.chain(0).unwrap();
    assert_eq!(chain.len(), 3);
    let out = chain.terminal();
    assert!(out.dir[1] < 0.0);
    assert!(out.intersection.is_none());
    assert!(scene.chains().iter().all(|c| !c.is_stale()));
}

#[test]
fn recalculation_is_repeatable_for_a_loaded_scene() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/scenes/lens_and_prism.yaml");
    let mut scene = Scene::from_config(SceneConfig::from_file(path).unwrap()).unwrap();
    assert_eq!(scene.surfaces().len(), 3);
    assert_eq!(scene.max_depth(), 64);

    scene.recalculate();
    let first = scene.chains().to_vec();
    let count = scene.segment_count();
    scene.recalculate();
    assert_eq!(first, scene.chains());
    assert_eq!(count, scene.segment_count());

    for chain in scene.chains() {
        assert!(chain.len() <= scene.max_depth());
        for (i, ray) in chain.rays().iter().enumerate().skip(1) {
            assert_eq!(ray.parent, Some(i - 1));
        }
    }
    // The lens rays are the first and last emitters
    assert_eq!(scene.chain(0).unwrap().len(), 3);
    let focus = scene.focal_point().unwrap();
    assert_relative_eq!(focus[1], 0.0, epsilon = 1e-9);
}

#[test]
fn moving_a_surface_changes_what_is_hit() {
    let mut scene = Scene::new();
    scene.add_ray(emitter(p(0.0, 0.0), Vec2::new(1.0, 0.0))).unwrap();
    scene.add_surface(Mirror::new(p(5.0, -1.0), p(5.0, 1.0), true).unwrap());
    scene.add_surface(Sphere::new(p(10.0, 0.0), 1.0, 1.5).unwrap());
    scene.recalculate();
    assert_eq!(scene.chain(0).unwrap().root().intersection.unwrap().surface, 0);

    scene.surface_mut(0).unwrap().rotate(90.0);
    scene.recalculate();
    // Mirror now lies along the ray, the lens is hit instead
    assert_eq!(scene.chain(0).unwrap().root().intersection.unwrap().surface, 1);
}
