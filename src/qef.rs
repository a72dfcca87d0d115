use nalgebra::Matrix3;

use crate::{
    interp::clamp_vector,
    types::{Value, Vector},
};

/// Singular values below this fraction of the largest one are truncated.
pub const SVD_THRESHOLD: Value = 0.1;

/// Accumulated quadratic error function for one cell.
///
/// Minimises `Σ (nᵢ · (x - pᵢ))²` over the (position, normal) samples added to it.
/// The normal equations are stored packed:
///
/// ```text
/// ata = [a00, a01, a02, a11, a12, a22]   (Σ n nᵀ, upper triangle)
/// atb = Σ n (n · p)
/// btb = Σ (n · p)²
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Qef {
    pub ata: [Value; 6],
    pub atb: Vector,
    pub btb: Value,
    mass_sum: Vector,
    count: usize,
}

/// Minimiser found by [`Qef::solve`] and the residual error there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QefSolution {
    pub point: Vector,
    pub error: Value,
}

impl Qef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the plane through `position` with normal `normal`.
    pub fn add(&mut self, position: &Vector, normal: &Vector) {
        let n = normal;
        let d = n.dot(position);

        self.ata[0] += n.x * n.x;
        self.ata[1] += n.x * n.y;
        self.ata[2] += n.x * n.z;
        self.ata[3] += n.y * n.y;
        self.ata[4] += n.y * n.z;
        self.ata[5] += n.z * n.z;

        self.atb += n * d;
        self.btb += d * d;

        self.mass_sum += position;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Average of all added positions, or `None` when nothing was added.
    pub fn mass_point(&self) -> Option<Vector> {
        (self.count > 0).then(|| self.mass_sum / self.count as Value)
    }

    fn matrix(&self) -> Matrix3<Value> {
        let a = &self.ata;
        Matrix3::new(
            a[0], a[1], a[2], //
            a[1], a[3], a[4], //
            a[2], a[4], a[5],
        )
    }

    /// Error of the accumulated planes at `x`: `xᵀAx − 2x·b + btb`.
    pub fn error_at(&self, x: &Vector) -> Value {
        let a = self.matrix();
        (x.dot(&(a * x)) - 2.0 * x.dot(&self.atb) + self.btb).max(0.0)
    }

    /// Solves for the minimiser inside the box `[min, max]`.
    ///
    /// The system is solved relative to the mass point with a truncated SVD
    /// pseudo-inverse, so directions the samples leave unconstrained stay at the
    /// mass point. The result is clamped into the box.
    pub fn solve(&self, min: &Vector, max: &Vector) -> QefSolution {
        let Some(mass) = self.mass_point() else {
            let point = (min + max) / 2.0;
            return QefSolution { point, error: 0.0 };
        };

        let a = self.matrix();
        let rhs = self.atb - a * mass;

        let svd = a.svd(true, true);
        let largest = svd.singular_values.max();
        let offset = if largest > Value::EPSILON {
            svd.pseudo_inverse(largest * SVD_THRESHOLD)
                .map(|pinv| pinv * rhs)
                .unwrap_or_else(|_| Vector::zeros())
        } else {
            Vector::zeros()
        };

        let mut point = mass + offset;
        if !point.iter().all(|c| c.is_finite()) {
            point = mass;
        }
        let point = clamp_vector(&point, min, max);

        QefSolution {
            point,
            error: self.error_at(&point),
        }
    }
}
