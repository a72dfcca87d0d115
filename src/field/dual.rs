//! Forward-mode dual numbers: a value plus its partial derivatives along x, y and z.

use std::ops::{Add, Div, Mul, Neg, Sub};

use super::{Field, Scalar};
use crate::types::{Point, Value, Vector};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dual {
    /// Value.
    pub v: Value,
    /// Gradient `[d/dx, d/dy, d/dz]`.
    pub d: Vector,
}

impl Dual {
    pub fn new(v: Value, d: Vector) -> Self {
        Self { v, d }
    }

    /// A constant: zero derivative.
    pub fn c(v: Value) -> Self {
        Self::new(v, Vector::zeros())
    }

    /// The three coordinate variables of `p`, each seeded with its own unit derivative.
    pub fn point(p: &Point) -> [Self; 3] {
        [
            Self::new(p.x, Vector::x()),
            Self::new(p.y, Vector::y()),
            Self::new(p.z, Vector::z()),
        ]
    }
}

impl Neg for Dual {
    type Output = Dual;

    fn neg(self) -> Dual {
        Dual::new(-self.v, -self.d)
    }
}

impl Add for Dual {
    type Output = Dual;

    fn add(self, r: Dual) -> Dual {
        Dual::new(self.v + r.v, self.d + r.d)
    }
}

impl Sub for Dual {
    type Output = Dual;

    fn sub(self, r: Dual) -> Dual {
        Dual::new(self.v - r.v, self.d - r.d)
    }
}

impl Mul for Dual {
    type Output = Dual;

    fn mul(self, r: Dual) -> Dual {
        Dual::new(self.v * r.v, self.d * r.v + r.d * self.v)
    }
}

impl Mul<Value> for Dual {
    type Output = Dual;

    fn mul(self, r: Value) -> Dual {
        Dual::new(self.v * r, self.d * r)
    }
}

impl Div<Value> for Dual {
    type Output = Dual;

    fn div(self, r: Value) -> Dual {
        Dual::new(self.v / r, self.d / r)
    }
}

impl Scalar for Dual {
    fn constant(v: Value) -> Self {
        Dual::c(v)
    }

    fn value(self) -> Value {
        self.v
    }

    fn abs(self) -> Self {
        if self.v >= 0.0 { self } else { -self }
    }

    // Non-positive arguments collapse to a constant zero; the derivative is unbounded there.
    fn sqrt(self) -> Self {
        if self.v > 0.0 {
            let root = self.v.sqrt();
            Dual::new(root, self.d * (0.5 / root))
        } else {
            Dual::c(0.0)
        }
    }

    fn sin(self) -> Self {
        Dual::new(self.v.sin(), self.d * self.v.cos())
    }

    fn cos(self) -> Self {
        Dual::new(self.v.cos(), self.d * -self.v.sin())
    }

    fn min(self, other: Self) -> Self {
        if self.v <= other.v { self } else { other }
    }

    fn max(self, other: Self) -> Self {
        if self.v >= other.v { self } else { other }
    }

    fn eval(field: &dyn Field, p: [Self; 3]) -> Self {
        field.evaluate_dual(p)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn product_rule() {
        let [x, y, _] = Dual::point(&Point::new(3.0, 2.0, 0.0));
        let f = x * y * 2.0;
        assert_relative_eq!(f.v, 12.0);
        assert_relative_eq!(f.d, Vector::new(4.0, 6.0, 0.0));
    }

    #[test]
    fn sqrt_of_zero_is_a_flat_constant() {
        let z = Dual::new(0.0, Vector::x()).sqrt();
        assert_eq!(z, Dual::c(0.0));
    }

    #[test]
    fn trig_chain_rule() {
        let [x, _, _] = Dual::point(&Point::new(0.5, 0.0, 0.0));
        let s = (x * 2.0).sin();
        assert_relative_eq!(s.v, 1f32.sin());
        assert_relative_eq!(s.d.x, 2.0 * 1f32.cos());
        let c = x.cos();
        assert_relative_eq!(c.d.x, -(0.5f32).sin());
    }

    #[test]
    fn min_max_select_by_value() {
        let a = Dual::new(1.0, Vector::x());
        let b = Dual::new(2.0, Vector::y());
        assert_eq!(Scalar::min(a, b), a);
        assert_eq!(Scalar::max(a, b), b);
        assert_eq!(Scalar::abs(-b), b);
    }
}
