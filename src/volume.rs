use bevy::prelude::*;

use crate::{
    error::Result,
    extract::{Algorithm, ExtractionParams, extract},
    field::{Field, FieldNode},
    mesh::IsoMesh,
    types::{Bounds, Value},
};

/// A field to be meshed, with the box, resolution and algorithm to mesh it with.
///
/// Spawning one queues it for extraction when [`IsosurfacePlugin`](crate::IsosurfacePlugin)
/// runs with the `auto_queue` feature. Mutating it queues it again:
///
/// ```rust,ignore
/// commands.spawn((
///     Volume::new(scene::demo_world())
///         .with_bounds(scene::DEMO_BOUNDS)
///         .with_algorithm(Algorithm::DualContouring),
///     MeshMaterial3d(material),
/// ));
///
/// // Later, switch algorithm and the mesh is rebuilt:
/// fn cycle(mut volumes: Query<&mut Volume>) {
///     for mut volume in &mut volumes {
///         volume.algorithm = Algorithm::SurfaceNets;
///     }
/// }
/// ```
///
/// The field is shared through [`FieldNode`], so cloning a volume into a compute task
/// does not copy the field.
#[derive(Component, Clone)]
#[require(Transform)]
pub struct Volume {
    pub field: FieldNode,
    pub params: ExtractionParams,
    pub algorithm: Algorithm,
}

impl Volume {
    pub fn new<F: Field + 'static>(field: F) -> Self {
        Self {
            field: FieldNode::new(field),
            params: ExtractionParams::default(),
            algorithm: Algorithm::default(),
        }
    }

    pub fn with_params(mut self, params: ExtractionParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.params.bounds = bounds;
        self
    }

    /// Sets the world-space size of each lattice cell.
    pub fn with_cell_size(mut self, cell_size: Value) -> Self {
        self.params.cell_size = cell_size;
        self
    }

    /// Sets the iso-surface threshold.
    pub fn with_isolevel(mut self, isolevel: Value) -> Self {
        self.params.isolevel = isolevel;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.seed = seed;
        self
    }

    /// Runs the extraction on the calling thread.
    pub fn extract(&self) -> Result<IsoMesh> {
        extract(&self.field, self.algorithm, &self.params)
    }
}
