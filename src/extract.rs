use std::time::Instant;

use derive_more::Display;
use tracing::{debug, info};

use crate::{
    error::Result,
    field::Field,
    marching_cubes::MarchingCubes,
    mesh::IsoMesh,
    placement::{AdjustableNaive, Blend, CellPlacement, DualContouring, Naive},
    sampler::Lattice,
    surface_nets,
    types::{Bounds, Value},
};

/// The extraction configurations that can be selected at runtime.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum Algorithm {
    #[default]
    #[display("marching cubes")]
    MarchingCubes,
    #[display("surface nets")]
    SurfaceNets,
    #[display("surface nets (constant smoothing)")]
    SmoothedConstant,
    #[display("surface nets (height smoothing)")]
    SmoothedHeight,
    #[display("surface nets (random smoothing)")]
    SmoothedRandom,
    #[display("surface nets (random smoothing, right side)")]
    SmoothedRandomRight,
    #[display("dual contouring")]
    DualContouring,
    #[display("dual contouring (half cell)")]
    DualContouringFine,
}

impl Algorithm {
    pub const ALL: [Algorithm; 8] = [
        Algorithm::MarchingCubes,
        Algorithm::SurfaceNets,
        Algorithm::SmoothedConstant,
        Algorithm::SmoothedHeight,
        Algorithm::SmoothedRandom,
        Algorithm::SmoothedRandomRight,
        Algorithm::DualContouring,
        Algorithm::DualContouringFine,
    ];

    /// Maps the digit keys `1..=8` to the algorithms in [`Algorithm::ALL`] order.
    pub fn from_digit(digit: u32) -> Option<Self> {
        let index = usize::try_from(digit).ok()?.checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    /// Multiplier applied to [`ExtractionParams::cell_size`].
    pub fn cell_scale(self) -> Value {
        match self {
            Algorithm::DualContouringFine => 0.5,
            _ => 1.0,
        }
    }

    /// The vertex placement used by the surface nets variants, `None` for marching cubes.
    pub fn placement(self, seed: u64) -> Option<Box<dyn CellPlacement>> {
        let placement: Box<dyn CellPlacement> = match self {
            Algorithm::MarchingCubes => return None,
            Algorithm::SurfaceNets => Box::new(Naive),
            Algorithm::SmoothedConstant => Box::new(AdjustableNaive::new(Blend::constant())),
            Algorithm::SmoothedHeight => Box::new(AdjustableNaive::new(Blend::height())),
            Algorithm::SmoothedRandom => Box::new(AdjustableNaive::new(Blend::random(seed))),
            Algorithm::SmoothedRandomRight => {
                Box::new(AdjustableNaive::new(Blend::random_right(seed)))
            }
            Algorithm::DualContouring | Algorithm::DualContouringFine => Box::new(DualContouring),
        };
        Some(placement)
    }
}

/// Where and how finely to sample a field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtractionParams {
    pub bounds: Bounds,
    pub isolevel: Value,
    pub cell_size: Value,
    /// Seed for the random smoothing blends.
    pub seed: u64,
}

impl Default for ExtractionParams {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            isolevel: 0.01,
            cell_size: 1.0,
            seed: 0,
        }
    }
}

impl ExtractionParams {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            ..Default::default()
        }
    }

    pub fn with_isolevel(mut self, isolevel: Value) -> Self {
        self.isolevel = isolevel;
        self
    }

    pub fn with_cell_size(mut self, cell_size: Value) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Samples `field` and triangulates it with `algorithm`.
///
/// Invalid bounds or cell size are reported before any sampling. A field that never
/// crosses the isolevel inside the box gives an empty mesh, not an error.
pub fn extract(field: &dyn Field, algorithm: Algorithm, params: &ExtractionParams) -> Result<IsoMesh> {
    let start = Instant::now();
    let cell_size = params.cell_size * algorithm.cell_scale();

    let lattice = Lattice::sample(field, &params.bounds, cell_size)?;
    debug!(elapsed_ms = start.elapsed().as_secs_f64() * 1e3, "lattice sampled");

    let mesh = match algorithm.placement(params.seed) {
        None => MarchingCubes::new().extract(&lattice, params.isolevel),
        Some(mut placement) => {
            surface_nets::extract(field, &lattice, params.isolevel, placement.as_mut())
        }
    };

    info!(
        "Generated {} ({} tri) in {:.1} msec",
        algorithm,
        mesh.triangle_count(),
        start.elapsed().as_secs_f64() * 1e3
    );
    Ok(mesh)
}
