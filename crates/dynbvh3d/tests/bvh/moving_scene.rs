use crate::scene::Scene;
use dynbvh3d::bounding_volume::{Aabb, BoundingVolume};
use dynbvh3d::math::{Point, Real, Vector};
use dynbvh3d::partitioning::{Bvh, BvhNodeAdaptor};

fn assert_volume_query_is_complete(bvh: &Bvh<usize, Scene>, volume: &Aabb) {
    let hits = bvh.traverse_volume(volume);

    for (i, body) in bvh.adaptor().bodies.iter().enumerate() {
        if body.leaf.is_some() && bvh.adaptor().object_aabb(&i).intersects(volume) {
            let leaf = bvh.leaf_of(&i).unwrap();
            assert!(hits.contains(&leaf), "Missed body {} in {:?}.", i, volume);
        }
    }
}

#[test]
fn frame_loop_keeps_tree_consistent() {
    let len = 200;
    let scene = Scene::random(1234, len, 60.0);
    let mut bvh = Bvh::new(scene, 0..len);
    bvh.assert_well_formed();

    let mut rotations = 0;

    for frame in 0..50 {
        bvh.adaptor_mut().step(0.5);
        for i in 0..len {
            bvh.notify_object_changed(&i).unwrap();
        }
        bvh.assert_well_formed_topology_only();

        rotations += bvh.optimize().unwrap();
        bvh.assert_well_formed();
        assert_eq!(bvh.count_nodes(), 2 * len as u32 - 1);

        let center = Point::new(frame as Real, 30.0, 30.0);
        let volume = Aabb::from_half_extents(center, Vector::repeat(8.0));
        assert_volume_query_is_complete(&bvh, &volume);
    }

    // Bodies drift apart from their initial neighbors, which the rotations fix up.
    assert!(rotations > 0);
}

#[test]
fn churn_removes_and_reinserts_bodies() {
    let len = 120;
    let scene = Scene::random(99, len, 40.0);
    let mut bvh = Bvh::new(scene, 0..len / 2);

    for i in len / 2..len {
        bvh.insert(i);
    }
    bvh.assert_well_formed();

    for round in 0..5 {
        let removed: Vec<usize> = (0..len).filter(|i| i % 5 == round).collect();

        for i in &removed {
            bvh.remove(i).unwrap();
            assert!(bvh.adaptor().bodies[*i].leaf.is_none());
        }
        bvh.assert_well_formed();
        assert_eq!(bvh.object_count(), len - removed.len());

        bvh.adaptor_mut().step(1.0);
        for i in (0..len).filter(|i| i % 5 != round) {
            bvh.notify_object_changed(&i).unwrap();
        }
        let _ = bvh.optimize().unwrap();

        for i in &removed {
            bvh.insert(*i);
        }
        bvh.assert_well_formed();
        assert_eq!(bvh.object_count(), len);

        let volume = Aabb::from_half_extents(Point::new(20.0, 20.0, 20.0), Vector::repeat(10.0));
        assert_volume_query_is_complete(&bvh, &volume);
    }

    for i in 0..len {
        bvh.remove(&i).unwrap();
    }
    assert_eq!(bvh.count_nodes(), 1);
    assert!(bvh.is_empty());
}
