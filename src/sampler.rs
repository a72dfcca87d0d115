use ndarray::Array3;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::debug;

use crate::{
    error::{IsosurfaceError, Result},
    field::Field,
    tables::CORNER_OFFSETS,
    types::{Bounds, Point, Value, Vector},
};

/// Finite-difference step used for gradient estimates.
pub const GRADIENT_STEP: Value = 0.01;

/// One lattice sample: the field value and an (unnormalised) gradient estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GridVertex {
    pub iso: Value,
    pub gradient: Vector,
}

/// Samples `field` at `p`.
///
/// The gradient is a forward difference over [`GRADIENT_STEP`], so it is scaled by the step
/// and not normalised. With the `exact_gradient` feature it is the analytic gradient from
/// dual-number evaluation instead.
#[cfg(not(feature = "exact_gradient"))]
pub fn sample_vertex(field: &dyn Field, p: Point) -> GridVertex {
    let iso = field.evaluate(p);
    let gradient = Vector::new(
        field.evaluate(p + Vector::x() * GRADIENT_STEP) - iso,
        field.evaluate(p + Vector::y() * GRADIENT_STEP) - iso,
        field.evaluate(p + Vector::z() * GRADIENT_STEP) - iso,
    );
    GridVertex { iso, gradient }
}

#[cfg(feature = "exact_gradient")]
pub fn sample_vertex(field: &dyn Field, p: Point) -> GridVertex {
    let (iso, gradient) = field.evaluate_with_exact_gradient(p);
    GridVertex { iso, gradient }
}

/// Number of samples along each axis for `bounds` at `cell_size`.
///
/// Fails before anything is allocated when the cell size is unusable or any axis would get
/// fewer than one sample.
pub fn lattice_dims(bounds: &Bounds, cell_size: Value) -> Result<[usize; 3]> {
    if !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(IsosurfaceError::InvalidCellSize(cell_size));
    }

    let extent = bounds.extent();
    let dims = [extent.x, extent.y, extent.z].map(|e| {
        let n = (e / cell_size).ceil();
        // NaN extents fall through to 0 and are rejected below.
        if n.is_finite() { n as i64 } else { 0 }
    });

    if dims.iter().any(|&n| n < 1) {
        return Err(IsosurfaceError::InvalidBounds { dims });
    }
    Ok(dims.map(|n| n as usize))
}

/// A regular grid of [`GridVertex`] samples.
///
/// Samples are stored as `vertices[[z, y, x]]`, so x varies fastest in memory.
/// Lattice point `(x, y, z)` sits at `origin + (x, y, z) * cell_size`.
#[derive(Clone, Debug)]
pub struct Lattice {
    pub origin: Point,
    pub cell_size: Value,
    pub vertices: Array3<GridVertex>,
}

impl Lattice {
    /// Samples `field` over `bounds`.
    ///
    /// Z-slabs are evaluated in parallel and assembled in slab order, so the result is the
    /// same as a sequential scan.
    pub fn sample(field: &dyn Field, bounds: &Bounds, cell_size: Value) -> Result<Self> {
        let [size_x, size_y, size_z] = lattice_dims(bounds, cell_size)?;
        let origin = bounds.min;

        debug!(size_x, size_y, size_z, cell_size, "sampling lattice");

        let slabs: Vec<Vec<GridVertex>> = (0..size_z)
            .into_par_iter()
            .map(|z| {
                let mut slab = Vec::with_capacity(size_x * size_y);
                for y in 0..size_y {
                    for x in 0..size_x {
                        let p = origin + Vector::new(x as Value, y as Value, z as Value) * cell_size;
                        slab.push(sample_vertex(field, p));
                    }
                }
                slab
            })
            .collect();

        let vertices = Array3::from_shape_vec((size_z, size_y, size_x), slabs.concat())?;

        Ok(Self {
            origin,
            cell_size,
            vertices,
        })
    }

    /// Number of samples along x, y and z.
    pub fn dims(&self) -> [usize; 3] {
        let (z, y, x) = self.vertices.dim();
        [x, y, z]
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> &GridVertex {
        &self.vertices[[z, y, x]]
    }

    /// World position of lattice point `(x, y, z)`.
    pub fn position(&self, x: usize, y: usize, z: usize) -> Point {
        self.origin + Vector::new(x as Value, y as Value, z as Value) * self.cell_size
    }

    /// The 8 corners of cube `(x, y, z)` in the marching cubes corner order.
    ///
    /// ```text
    ///  0 = (x,   y,   z  )    4 = (x,   y,   z+1)
    ///  1 = (x+1, y,   z  )    5 = (x+1, y,   z+1)
    ///  2 = (x+1, y+1, z  )    6 = (x+1, y+1, z+1)
    ///  3 = (x,   y+1, z  )    7 = (x,   y+1, z+1)
    /// ```
    #[inline]
    pub fn cube(&self, x: usize, y: usize, z: usize) -> [GridVertex; 8] {
        CORNER_OFFSETS.map(|[dx, dy, dz]| *self.get(x + dx, y + dy, z + dz))
    }

    /// Coordinates of every cube with all 8 corners inside the lattice, in z, y, x order.
    pub fn cubes(&self) -> impl Iterator<Item = [usize; 3]> + use<> {
        let [size_x, size_y, size_z] = self.dims();
        (0..size_z.saturating_sub(1)).flat_map(move |z| {
            (0..size_y.saturating_sub(1))
                .flat_map(move |y| (0..size_x.saturating_sub(1)).map(move |x| [x, y, z]))
        })
    }
}
