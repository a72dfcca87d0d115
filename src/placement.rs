//! Per-cell vertex placement policies for the surface nets family.
//!
//! A policy decides where a cell's edge crossings are ([`CellPlacement::intersect`]) and
//! how they collapse into the cell's single vertex ([`CellPlacement::average`]). All
//! positions handed to and returned from a policy are relative to the cell's corner 0.

use crate::{
    field::Field,
    interp::{clamp_vector, find_t, lerp_vectors, normalize_or_zero, smoothstep},
    qef::Qef,
    sampler::{GridVertex, sample_vertex},
    types::{Point, Value, Vector},
};

/// Number of bisection steps used to refine a dual contouring crossing.
pub const BISECTION_STEPS: usize = 10;

/// Amplitude of the per-axis jitter of [`Blend::random`], relative to the cell centre.
pub const RANDOM_JITTER: Value = 0.3;

/// One crossed cell edge: the two end samples and their cell-relative positions.
#[derive(Clone, Copy, Debug)]
pub struct CellEdge {
    pub g0: GridVertex,
    pub g1: GridVertex,
    pub v0: Vector,
    pub v1: Vector,
}

/// An edge crossing or cell vertex: cell-relative position and (unnormalised) normal.
pub type Sample = (Vector, Vector);

/// Strategy for placing the single vertex of an active cell.
pub trait CellPlacement: Send {
    /// Locates the isolevel crossing on `edge` of the cell whose corner 0 is at `corner`.
    fn intersect(&self, field: &dyn Field, edge: &CellEdge, isolevel: Value, corner: &Point) -> Sample;

    /// Combines the crossings of one cell into its vertex. The cell spans `[v0, v1]`.
    fn average(&mut self, samples: &[Sample], v0: &Vector, v1: &Vector, corner: &Point) -> Sample;
}

fn linear_crossing(edge: &CellEdge, isolevel: Value) -> Sample {
    let t = find_t(edge.g0.iso, edge.g1.iso, isolevel);
    (
        lerp_vectors(&edge.v0, &edge.v1, t),
        lerp_vectors(&edge.g0.gradient, &edge.g1.gradient, t),
    )
}

fn mean(samples: &[Sample]) -> Option<Sample> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as Value;
    let (p, g) = samples
        .iter()
        .fold((Vector::zeros(), Vector::zeros()), |(p, g), (sp, sg)| (p + sp, g + sg));
    Some((p / n, g / n))
}

/// Places each crossing by linear interpolation and the cell vertex at their mean.
#[derive(Clone, Copy, Debug, Default)]
pub struct Naive;

impl CellPlacement for Naive {
    fn intersect(&self, _field: &dyn Field, edge: &CellEdge, isolevel: Value, _corner: &Point) -> Sample {
        linear_crossing(edge, isolevel)
    }

    fn average(&mut self, samples: &[Sample], v0: &Vector, v1: &Vector, _corner: &Point) -> Sample {
        mean(samples).unwrap_or(((v0 + v1) / 2.0, Vector::zeros()))
    }
}

type BlendFn = dyn FnMut(&Point, &Vector, &Vector) -> Vector + Send;

/// Pulls a cell's mean crossing toward the cell centre.
///
/// Called as `blend(corner, mean, centre)` with positions relative to the cell.
pub struct Blend(Box<BlendFn>);

impl Blend {
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(&Point, &Vector, &Vector) -> Vector + Send + 'static,
    {
        Self(Box::new(f))
    }

    /// Half-way between the mean and the centre everywhere.
    pub fn constant() -> Self {
        Self::new(|_, mean, center| lerp_vectors(mean, center, 0.5))
    }

    /// Smooth below `z = 2`, snapped to the centre above `z = 2.5`.
    pub fn height() -> Self {
        Self::new(|corner, mean, center| lerp_vectors(mean, center, smoothstep(2.0, 2.5, corner.z)))
    }

    /// Half-way toward a jittered centre, kept inside the cell.
    pub fn random(seed: u64) -> Self {
        let mut rng = Lcg::new(seed);
        Self::new(move |_, mean, center| jittered(&mut rng, mean, center))
    }

    /// Smooth for `x < 3`, fading into [`Blend::random`] by `x = 4`.
    pub fn random_right(seed: u64) -> Self {
        let mut rng = Lcg::new(seed);
        Self::new(move |corner, mean, center| {
            let random = jittered(&mut rng, mean, center);
            lerp_vectors(mean, &random, smoothstep(3.0, 4.0, corner.x))
        })
    }

    pub fn apply(&mut self, corner: &Point, mean: &Vector, center: &Vector) -> Vector {
        (self.0)(corner, mean, center)
    }
}

impl std::fmt::Debug for Blend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Blend")
    }
}

fn jittered(rng: &mut Lcg, mean: &Vector, center: &Vector) -> Vector {
    let jitter = Vector::new(rng.next_signed(), rng.next_signed(), rng.next_signed());
    let target = center + jitter * RANDOM_JITTER;
    // The cell starts at the origin, so its far corner is twice the centre.
    clamp_vector(&lerp_vectors(mean, &target, 0.5), &Vector::zeros(), &(center * 2.0))
}

/// 64-bit linear congruential generator.
#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Uniform in `[0, 1)`.
    fn next_unit(&mut self) -> Value {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 40) as f64 / (1u64 << 24) as f64) as Value
    }

    /// Uniform in `[-1, 1)`.
    fn next_signed(&mut self) -> Value {
        self.next_unit() * 2.0 - 1.0
    }
}

/// Linear crossings with unit normals, blended toward the cell centre by a [`Blend`].
#[derive(Debug)]
pub struct AdjustableNaive {
    pub blend: Blend,
}

impl AdjustableNaive {
    pub fn new(blend: Blend) -> Self {
        Self { blend }
    }
}

impl CellPlacement for AdjustableNaive {
    fn intersect(&self, _field: &dyn Field, edge: &CellEdge, isolevel: Value, _corner: &Point) -> Sample {
        let (position, gradient) = linear_crossing(edge, isolevel);
        (position, normalize_or_zero(&gradient))
    }

    fn average(&mut self, samples: &[Sample], v0: &Vector, v1: &Vector, corner: &Point) -> Sample {
        let center = (v0 + v1) / 2.0;
        match mean(samples) {
            Some((position, normal)) => (self.blend.apply(corner, &position, &center), normal),
            None => (center, Vector::zeros()),
        }
    }
}

/// Crossings refined against the field, cell vertex at the QEF minimiser.
#[derive(Clone, Copy, Debug, Default)]
pub struct DualContouring;

impl CellPlacement for DualContouring {
    fn intersect(&self, field: &dyn Field, edge: &CellEdge, isolevel: Value, corner: &Point) -> Sample {
        // Walk from the lower end so `lo` always stays inside.
        let (v0, v1) = if edge.g0.iso > edge.g1.iso {
            (edge.v1, edge.v0)
        } else {
            (edge.v0, edge.v1)
        };

        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..BISECTION_STEPS {
            let t = (lo + hi) / 2.0;
            if field.evaluate(corner + lerp_vectors(&v0, &v1, t)) < isolevel {
                lo = t;
            } else {
                hi = t;
            }
        }

        let position = lerp_vectors(&v0, &v1, (lo + hi) / 2.0);
        let g = sample_vertex(field, corner + position);
        (position, normalize_or_zero(&g.gradient))
    }

    fn average(&mut self, samples: &[Sample], v0: &Vector, v1: &Vector, corner: &Point) -> Sample {
        let mut qef = Qef::new();
        for (position, normal) in samples {
            qef.add(position, normal);
        }
        let solution = qef.solve(v0, v1);

        let (_, normal) = Naive.average(samples, v0, v1, corner);
        (clamp_vector(&solution.point, v0, v1), normal)
    }
}
