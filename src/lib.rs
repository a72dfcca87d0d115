pub mod error;
pub mod extract;
pub mod field;
pub mod interp;
pub mod marching_cubes;
pub mod mesh;
pub mod placement;
pub mod plugin;
pub mod qef;
pub mod sampler;
pub mod scene;
pub mod surface_nets;
pub mod tables;
pub mod types;
pub mod utils;
pub mod volume;

pub use error::{IsosurfaceError, Result};
pub use extract::{Algorithm, ExtractionParams, extract};
pub use mesh::{IsoMesh, MeshVertex, VERTEX_LAYOUT};
pub use plugin::{GeneratedMesh, IsosurfaceConfig, IsosurfacePlugin, IsosurfaceSet};
pub use volume::Volume;
