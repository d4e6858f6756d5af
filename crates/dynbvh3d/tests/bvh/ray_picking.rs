use crate::scene::Scene;
use dynbvh3d::math::{Point, Vector};
use dynbvh3d::partitioning::{Bvh, BvhNodeAdaptor};
use dynbvh3d::query::Ray;

#[test]
fn ray_traversal_reaches_every_hit_body() {
    let len = 300;
    let mut bvh = Bvh::new(Scene::random(5, len, 50.0), 0..len);
    let mut rng = oorandom::Rand32::new(6);

    for _ in 0..50 {
        let origin = Point::new(-10.0, rng.rand_float() * 50.0, rng.rand_float() * 50.0);
        let dir = Vector::new(1.0, rng.rand_float() - 0.5, rng.rand_float() - 0.5);
        let ray = Ray::new(origin, dir);
        let hits = bvh.traverse_ray(&ray);

        for i in 0..len {
            if bvh.adaptor().object_aabb(&i).intersects_ray(&ray).is_some() {
                assert!(hits.contains(&bvh.leaf_of(&i).unwrap()));
            }
        }

        bvh.adaptor_mut().step(1.0);
        for i in 0..len {
            bvh.notify_object_changed(&i).unwrap();
        }
        let _ = bvh.optimize().unwrap();
    }
}

#[test]
fn ray_behind_the_scene_hits_nothing() {
    let len = 50;
    let bvh = Bvh::new(Scene::random(8, len, 20.0), 0..len);
    let ray = Ray::new(Point::new(-100.0, 10.0, 10.0), -Vector::x());

    assert!(bvh.traverse_ray(&ray).is_empty());
    assert!(bvh.root_aabb().intersects_ray(&ray).is_none());
}
