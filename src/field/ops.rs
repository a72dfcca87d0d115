//! Combinators: rigid transforms, boolean operations and twist.

use nalgebra::{Isometry3, Matrix3, Rotation3, Translation3, Unit, UnitQuaternion};

use super::{FieldNode, Scalar};
use crate::types::{Value, Vector};

/// Evaluates `child` at the inverse-transformed point.
#[derive(Clone)]
pub struct Transform {
    pub child: FieldNode,
    /// Rotation part of the inverse transform.
    inverse_rotation: Matrix3<Value>,
    /// Translation part of the inverse transform.
    inverse_translation: Vector,
}

impl Transform {
    pub fn new(child: FieldNode, transform: Isometry3<Value>) -> Self {
        let inverse = transform.inverse();
        Self {
            child,
            inverse_rotation: inverse.rotation.to_rotation_matrix().into_inner(),
            inverse_translation: inverse.translation.vector,
        }
    }

    pub fn translation(child: FieldNode, offset: Vector) -> Self {
        Self::new(
            child,
            Isometry3::from_parts(Translation3::from(offset), UnitQuaternion::identity()),
        )
    }

    /// Rotation by `angle` radians about `axis`. A zero axis leaves the child unrotated.
    pub fn rotation(child: FieldNode, angle: Value, axis: Vector) -> Self {
        let rotation = Unit::try_new(axis, Value::EPSILON)
            .map(|axis| Rotation3::from_axis_angle(&axis, angle))
            .unwrap_or_else(Rotation3::identity);
        Self::new(
            child,
            Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_rotation_matrix(&rotation),
            ),
        )
    }

    pub fn distance<S: Scalar>(&self, p: [S; 3]) -> S {
        let m = &self.inverse_rotation;
        let t = &self.inverse_translation;
        let row = |r: usize| {
            p[0] * m[(r, 0)] + p[1] * m[(r, 1)] + p[2] * m[(r, 2)] + S::constant(t[r])
        };
        S::eval(&self.child, [row(0), row(1), row(2)])
    }
}

impl_field!(Transform);

/// Union of two fields (`min`).
#[derive(Clone)]
pub struct Union {
    pub a: FieldNode,
    pub b: FieldNode,
}

impl Union {
    pub fn new(a: FieldNode, b: FieldNode) -> Self {
        Self { a, b }
    }

    pub fn distance<S: Scalar>(&self, p: [S; 3]) -> S {
        S::eval(&self.a, p).min(S::eval(&self.b, p))
    }
}

impl_field!(Union);

/// `b` cut out of `a` (`max(a, -b)`).
#[derive(Clone)]
pub struct Subtract {
    pub a: FieldNode,
    pub b: FieldNode,
}

impl Subtract {
    pub fn new(a: FieldNode, b: FieldNode) -> Self {
        Self { a, b }
    }

    pub fn distance<S: Scalar>(&self, p: [S; 3]) -> S {
        S::eval(&self.a, p).max(-S::eval(&self.b, p))
    }
}

impl_field!(Subtract);

/// Overlap of two fields (`max`).
#[derive(Clone)]
pub struct Intersect {
    pub a: FieldNode,
    pub b: FieldNode,
}

impl Intersect {
    pub fn new(a: FieldNode, b: FieldNode) -> Self {
        Self { a, b }
    }

    pub fn distance<S: Scalar>(&self, p: [S; 3]) -> S {
        S::eval(&self.a, p).max(S::eval(&self.b, p))
    }
}

impl_field!(Intersect);

/// Rotates each horizontal slice of `child` about the z-axis in proportion to its height.
#[derive(Clone)]
pub struct Twist {
    pub child: FieldNode,
    /// Radians of twist per unit of z.
    pub scale: Value,
}

impl Twist {
    pub fn new(child: FieldNode, scale: Value) -> Self {
        Self { child, scale }
    }

    pub fn distance<S: Scalar>(&self, [x, y, z]: [S; 3]) -> S {
        let angle = -z * self.scale;
        let (sin, cos) = (angle.sin(), angle.cos());
        let rx = x * cos + y * sin;
        let ry = -x * sin + y * cos;
        S::eval(&self.child, [rx, ry, z])
    }
}

impl_field!(Twist);

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use crate::field::{Field, FieldExt, cone, cuboid, sphere};
    use crate::types::{Point, Vector};

    #[test]
    fn translate_moves_the_shape() {
        let s = sphere(1.0).translate(Vector::new(5.0, 0.0, 0.0));
        assert_relative_eq!(s.evaluate(Point::new(5.0, 0.0, 0.0)), -1.0);
        assert_relative_eq!(s.evaluate(Point::origin()), 4.0);
    }

    #[test]
    fn rotate_about_y_lays_the_cone_along_x() {
        // The apex at (0, 0, 6) swings round to (6, 0, 0).
        let c = cone(2.0, 6.0).rotate(FRAC_PI_2, Vector::y());
        assert_relative_eq!(c.evaluate(Point::new(6.0, 0.0, 0.0)), 0.0, epsilon = 1e-5);
        assert_relative_eq!(c.evaluate(Point::new(8.0, 0.0, 0.0)), 2.0, epsilon = 1e-5);
    }

    #[test]
    fn booleans() {
        let a = sphere(2.0);
        let b = sphere(1.0).translate(Vector::new(2.0, 0.0, 0.0));
        let p = Point::new(1.5, 0.0, 0.0);
        let (da, db) = (a.evaluate(p), b.evaluate(p));

        assert_relative_eq!(a.clone().union(b.clone()).evaluate(p), da.min(db));
        assert_relative_eq!(a.clone().subtract(b.clone()).evaluate(p), da.max(-db));
        assert_relative_eq!(a.intersect(b).evaluate(p), da.max(db));
    }

    #[test]
    fn twist_leaves_the_base_slice_alone() {
        let plain = cuboid(4.0, 1.0, 10.0);
        let twisted = plain.twist(0.1);
        let p = Point::new(3.0, 0.5, 0.0);
        assert_relative_eq!(twisted.evaluate(p), plain.evaluate(p));
    }

    #[test]
    fn twist_rotates_higher_slices() {
        let twisted = cuboid(4.0, 1.0, 10.0).twist(FRAC_PI_2 / 5.0);
        // At z = 5 the slice is turned by a quarter turn, so the long side lies along y.
        assert!(twisted.evaluate(Point::new(0.0, 3.0, 5.0)) < 0.0);
        assert!(twisted.evaluate(Point::new(3.0, 0.0, 5.0)) > 0.0);
    }
}
