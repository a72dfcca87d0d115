use nalgebra::{Point3, Vector3};

/// Scalar field value at a point in space.
pub type Value = f32;

/// A 3D point with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D vector with [`Value`] components.
pub type Vector = Vector3<Value>;

/// Axis-aligned box that an extraction samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Returns the box of size `dims` centred on `center`.
    ///
    /// ```text
    ///  min = center - dims/2
    ///  max = center + dims/2
    /// ```
    pub fn centered(center: Point, dims: Vector) -> Self {
        Self {
            min: center - dims / 2.0,
            max: center + dims / 2.0,
        }
    }

    /// Edge lengths of the box. Negative when `max < min` on some axis.
    pub fn extent(&self) -> Vector {
        self.max - self.min
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::centered(Point::origin(), Vector::repeat(16.0))
    }
}
