use dynbvh3d::math::{Point, Real, Vector};
use dynbvh3d::partitioning::{BvhNodeAdaptor, BvhNodeId};

pub struct Body {
    pub position: Point<Real>,
    pub velocity: Vector<Real>,
    pub radius: Real,
    pub leaf: Option<BvhNodeId>,
}

/// A scene storing its bodies in a plain vector, indexed by `usize` handles.
#[derive(Default)]
pub struct Scene {
    pub bodies: Vec<Body>,
}

impl Scene {
    pub fn random(seed: u64, len: usize, extent: Real) -> Self {
        let mut rng = oorandom::Rand32::new(seed);
        let mut coord = |scale: Real| rng.rand_float() as Real * scale;
        let bodies = (0..len)
            .map(|_| Body {
                position: Point::new(coord(extent), coord(extent), coord(extent)),
                velocity: Vector::new(coord(2.0) - 1.0, coord(2.0) - 1.0, coord(2.0) - 1.0),
                radius: 0.25 + coord(2.0),
                leaf: None,
            })
            .collect();
        Self { bodies }
    }

    pub fn step(&mut self, dt: Real) {
        for body in &mut self.bodies {
            body.position += body.velocity * dt;
        }
    }
}

impl BvhNodeAdaptor<usize> for Scene {
    fn object_position(&self, object: &usize) -> Point<Real> {
        self.bodies[*object].position
    }

    fn radius(&self, object: &usize) -> Real {
        self.bodies[*object].radius
    }

    fn map_object_to_leaf(&mut self, object: &usize, leaf: BvhNodeId) {
        self.bodies[*object].leaf = Some(leaf);
    }

    fn unmap_object(&mut self, object: &usize) {
        self.bodies[*object].leaf = None;
    }

    fn leaf(&self, object: &usize) -> Option<BvhNodeId> {
        self.bodies[*object].leaf
    }
}
