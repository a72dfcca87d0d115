use derive_more::{Display, From};

use crate::types::Value;

pub type Result<T> = core::result::Result<T, IsosurfaceError>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum IsosurfaceError {
    /// The bounding box yields a lattice with fewer than one sample along some axis.
    #[from(ignore)]
    InvalidBounds { dims: [i64; 3] },
    /// Cell size must be finite and strictly positive.
    #[from(ignore)]
    InvalidCellSize(Value),
    /// The sampled values could not be arranged into the lattice shape.
    #[from]
    Lattice(ndarray::ShapeError),
}

impl std::error::Error for IsosurfaceError {}
