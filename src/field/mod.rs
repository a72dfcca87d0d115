//! Composable signed distance fields.
//!
//! A field maps a point to a signed distance: negative inside, positive outside.
//! Fields are immutable once built and evaluated purely, so one field can be sampled from
//! many threads at once.
//!
//! ```rust,ignore
//! use bevy_isosurface::field::{FieldExt, cuboid, sphere};
//!
//! let field = sphere(7.0)
//!     .translate(Vector::new(-7.0, 0.0, 0.0))
//!     .union(cuboid(10.0, 8.0, 1.0))
//!     .subtract(cuboid(2.0, 2.0, 2.0).translate(Vector::new(0.0, 7.5, 0.0)));
//! ```
//!
//! Every primitive and combinator is written once, generically over [`Scalar`], and
//! evaluated either with plain floats ([`Field::evaluate`]) or with forward-mode dual
//! numbers ([`Field::evaluate_dual`]) which carry the exact gradient alongside the value.

use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

use crate::types::{Point, Value, Vector};

/// Implements [`Field`] for a type with a generic `distance<S: Scalar>(&self, [S; 3]) -> S`.
macro_rules! impl_field {
    ($ty:ty) => {
        impl $crate::field::Field for $ty {
            fn evaluate(&self, p: $crate::types::Point) -> $crate::types::Value {
                self.distance([p.x, p.y, p.z])
            }

            fn evaluate_dual(
                &self,
                p: [$crate::field::Dual; 3],
            ) -> $crate::field::Dual {
                self.distance(p)
            }
        }
    };
}

pub mod dual;
pub mod ops;
pub mod primitives;

pub use dual::Dual;
pub use ops::{Intersect, Subtract, Transform, Twist, Union};
pub use primitives::{Cone, Cuboid, Sphere, cone, cuboid, sphere};

/// A scalar signed distance field.
pub trait Field: Send + Sync {
    /// Signed distance at `p`.
    fn evaluate(&self, p: Point) -> Value;

    /// Signed distance at `p` with derivatives carried along each axis.
    fn evaluate_dual(&self, p: [Dual; 3]) -> Dual;

    /// Value and exact gradient at `p`.
    fn evaluate_with_exact_gradient(&self, p: Point) -> (Value, Vector) {
        let d = self.evaluate_dual(Dual::point(&p));
        (d.v, d.d)
    }
}

/// Number type the field formulas are written against: `f32` or [`Dual`].
pub trait Scalar:
    Copy
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + Mul<Value, Output = Self>
    + Div<Value, Output = Self>
{
    fn constant(v: Value) -> Self;

    /// The plain value, used for branching.
    fn value(self) -> Value;

    fn abs(self) -> Self;
    fn sqrt(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn min(self, other: Self) -> Self;
    fn max(self, other: Self) -> Self;

    /// Evaluates a child field in this number type.
    fn eval(field: &dyn Field, p: [Self; 3]) -> Self;
}

impl Scalar for Value {
    fn constant(v: Value) -> Self {
        v
    }

    fn value(self) -> Value {
        self
    }

    fn abs(self) -> Self {
        Value::abs(self)
    }

    fn sqrt(self) -> Self {
        Value::sqrt(self)
    }

    fn sin(self) -> Self {
        Value::sin(self)
    }

    fn cos(self) -> Self {
        Value::cos(self)
    }

    fn min(self, other: Self) -> Self {
        Value::min(self, other)
    }

    fn max(self, other: Self) -> Self {
        Value::max(self, other)
    }

    fn eval(field: &dyn Field, p: [Self; 3]) -> Self {
        field.evaluate(Point::new(p[0], p[1], p[2]))
    }
}

pub(crate) fn length2<S: Scalar>(x: S, y: S) -> S {
    (x * x + y * y).sqrt()
}

pub(crate) fn length3<S: Scalar>(x: S, y: S, z: S) -> S {
    (x * x + y * y + z * z).sqrt()
}

/// Shared handle to a built field.
#[derive(Clone)]
pub struct FieldNode {
    inner: Arc<dyn Field>,
}

impl FieldNode {
    pub fn new<F: Field + 'static>(field: F) -> Self {
        Self {
            inner: Arc::new(field),
        }
    }
}

impl Field for FieldNode {
    fn evaluate(&self, p: Point) -> Value {
        self.inner.evaluate(p)
    }

    fn evaluate_dual(&self, p: [Dual; 3]) -> Dual {
        self.inner.evaluate_dual(p)
    }
}

/// Chainable combinators available on every field.
pub trait FieldExt: Field + Sized + 'static {
    /// Moves the shape by `offset`.
    fn translate(self, offset: Vector) -> FieldNode {
        FieldNode::new(Transform::translation(FieldNode::new(self), offset))
    }

    /// Rotates the shape by `angle` radians about `axis`.
    fn rotate(self, angle: Value, axis: Vector) -> FieldNode {
        FieldNode::new(Transform::rotation(FieldNode::new(self), angle, axis))
    }

    /// Union (`min`).
    fn union<F: Field + 'static>(self, other: F) -> FieldNode {
        FieldNode::new(Union::new(FieldNode::new(self), FieldNode::new(other)))
    }

    /// Removes `other` from this shape (`max(a, -b)`).
    fn subtract<F: Field + 'static>(self, other: F) -> FieldNode {
        FieldNode::new(Subtract::new(FieldNode::new(self), FieldNode::new(other)))
    }

    /// Keeps only the overlap (`max`).
    fn intersect<F: Field + 'static>(self, other: F) -> FieldNode {
        FieldNode::new(Intersect::new(FieldNode::new(self), FieldNode::new(other)))
    }

    /// Twists the shape about the z-axis by `scale` radians per unit of height.
    fn twist(self, scale: Value) -> FieldNode {
        FieldNode::new(Twist::new(FieldNode::new(self), scale))
    }
}

impl<F: Field + 'static> FieldExt for F {}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn builder_composes_nested_fields() {
        let field = sphere(5.0)
            .translate(Vector::new(7.0, 0.0, 0.0))
            .union(sphere(7.0).translate(Vector::new(-7.0, 0.0, 0.0)));

        assert_relative_eq!(field.evaluate(Point::new(7.0, 0.0, 0.0)), -5.0);
        assert_relative_eq!(field.evaluate(Point::new(-7.0, 0.0, 0.0)), -7.0);
        assert_relative_eq!(
            field.evaluate(Point::new(0.0, 20.0, 0.0)),
            449f32.sqrt() - 7.0,
            epsilon = 1e-5
        );
    }

    #[test]
    fn exact_gradient_matches_finite_differences() {
        let field = cuboid(3.0, 2.0, 1.0)
            .rotate(0.4, Vector::new(1.0, 1.0, 0.0))
            .twist(0.1)
            .translate(Vector::new(1.0, -2.0, 0.5));
        let p = Point::new(3.1, 0.7, 1.9);

        let (iso, grad) = field.evaluate_with_exact_gradient(p);
        assert_relative_eq!(iso, field.evaluate(p), epsilon = 1e-5);

        let h = 1e-3;
        let fd = Vector::new(
            field.evaluate(p + Vector::x() * h) - field.evaluate(p - Vector::x() * h),
            field.evaluate(p + Vector::y() * h) - field.evaluate(p - Vector::y() * h),
            field.evaluate(p + Vector::z() * h) - field.evaluate(p - Vector::z() * h),
        ) / (2.0 * h);
        assert_relative_eq!(grad, fd, epsilon = 1e-2);
    }
}
