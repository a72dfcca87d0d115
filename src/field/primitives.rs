use super::{Scalar, length2, length3};
use crate::types::Value;

/// Sphere of `radius` centred at the origin.
#[derive(Clone, Copy, Debug)]
pub struct Sphere {
    pub radius: Value,
}

impl Sphere {
    pub fn distance<S: Scalar>(&self, [x, y, z]: [S; 3]) -> S {
        length3(x, y, z) - S::constant(self.radius)
    }
}

impl_field!(Sphere);

/// Axis-aligned box with half-extents `extents`, centred at the origin.
#[derive(Clone, Copy, Debug)]
pub struct Cuboid {
    pub extents: [Value; 3],
}

impl Cuboid {
    pub fn distance<S: Scalar>(&self, [x, y, z]: [S; 3]) -> S {
        let [ex, ey, ez] = self.extents;
        let dx = x.abs() - S::constant(ex);
        let dy = y.abs() - S::constant(ey);
        let dz = z.abs() - S::constant(ez);
        let zero = S::constant(0.0);

        let face = dx.max(dy.max(dz)).min(zero);
        let edge = length3(dx.max(zero), dy.max(zero), dz.max(zero));
        face + edge
    }
}

impl_field!(Cuboid);

/// Cone standing on the xy-plane: base disc of `radius` at `z = 0`, apex at `z = height`.
#[derive(Clone, Copy, Debug)]
pub struct Cone {
    pub radius: Value,
    pub height: Value,
}

impl Cone {
    pub fn distance<S: Scalar>(&self, [x, y, z]: [S; 3]) -> S {
        let q = length2(x, y);
        if z.value() <= 0.0 {
            length2(z, (q - S::constant(self.radius)).max(S::constant(0.0)))
        } else if z.value() > self.height {
            length3(x, y, z - S::constant(self.height))
        } else {
            q - (S::constant(1.0) - z / self.height) * self.radius
        }
    }
}

impl_field!(Cone);

pub fn sphere(radius: Value) -> Sphere {
    Sphere { radius }
}

/// Box primitive with half-extents `ex`, `ey`, `ez`.
pub fn cuboid(ex: Value, ey: Value, ez: Value) -> Cuboid {
    Cuboid {
        extents: [ex, ey, ez],
    }
}

pub fn cone(radius: Value, height: Value) -> Cone {
    Cone { radius, height }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::field::Field;
    use crate::types::{Point, Vector};

    use super::*;

    #[test]
    fn sphere_distance() {
        let s = sphere(2.0);
        assert_relative_eq!(s.evaluate(Point::origin()), -2.0);
        assert_relative_eq!(s.evaluate(Point::new(0.0, 3.0, 0.0)), 1.0);
        assert_relative_eq!(s.evaluate(Point::new(2.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn cuboid_distance_inside_face_and_corner() {
        let b = cuboid(1.0, 2.0, 3.0);
        assert_relative_eq!(b.evaluate(Point::origin()), -1.0);
        assert_relative_eq!(b.evaluate(Point::new(3.0, 0.0, 0.0)), 2.0);
        assert_relative_eq!(
            b.evaluate(Point::new(2.0, 3.0, 0.0)),
            2f32.sqrt(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn cone_regions() {
        let c = cone(2.0, 6.0);
        // Below the base, beside the rim.
        assert_relative_eq!(c.evaluate(Point::new(3.0, 0.0, -1.0)), 2f32.sqrt());
        // Below the base, under the disc.
        assert_relative_eq!(c.evaluate(Point::new(0.5, 0.0, -1.0)), 1.0);
        // Above the apex.
        assert_relative_eq!(c.evaluate(Point::new(0.0, 0.0, 8.0)), 2.0);
        // On the slanted side halfway up.
        assert_relative_eq!(c.evaluate(Point::new(1.0, 0.0, 3.0)), 0.0);
    }

    #[test]
    fn exact_gradient_of_sphere_is_radial() {
        let (iso, grad) = sphere(1.0).evaluate_with_exact_gradient(Point::new(0.0, 3.0, 4.0));
        assert_relative_eq!(iso, 4.0);
        assert_relative_eq!(grad, Vector::new(0.0, 0.6, 0.8), epsilon = 1e-6);
    }
}
