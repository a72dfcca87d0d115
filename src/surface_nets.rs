use ndarray::Array3;
use tracing::debug;

use crate::{
    field::Field,
    interp::{lerp_vectors, normalize_or_zero},
    mesh::IsoMesh,
    placement::{CellEdge, CellPlacement, Sample},
    sampler::{GridVertex, Lattice},
    tables::CORNER_POINT_INDICES,
    types::{Point, Value, Vector},
    utils::{corner_offset, edge_mask, get_state},
};

/// The vertex chosen for one active cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellVertex {
    /// Mean of the cell's edge crossings.
    pub mean: Point,
    pub position: Point,
    pub normal: Vector,
}

/// Places one vertex per active cell using `placement`, then stitches a quad across every
/// lattice edge whose end points lie on opposite sides of the surface.
///
/// Cells are visited in z, y, x order on a single thread so that stateful placements
/// (the random blends) see a reproducible call sequence.
pub fn extract(
    field: &dyn Field,
    lattice: &Lattice,
    isolevel: Value,
    placement: &mut dyn CellPlacement,
) -> IsoMesh {
    let cells = place_vertices(field, lattice, isolevel, placement);
    let mesh = stitch(lattice, &cells, isolevel);
    debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "surface nets stitched"
    );
    mesh
}

/// First pass: the vertex of every active cell, indexed `[z, y, x]` like the lattice.
pub fn place_vertices(
    field: &dyn Field,
    lattice: &Lattice,
    isolevel: Value,
    placement: &mut dyn CellPlacement,
) -> Array3<Option<CellVertex>> {
    let mut cells = Array3::from_elem(lattice.vertices.dim(), None);
    let cell = lattice.cell_size;
    let (v0, v1) = (Vector::zeros(), Vector::repeat(cell));
    let mut samples: Vec<Sample> = Vec::with_capacity(12);

    for [x, y, z] in lattice.cubes() {
        let corners = lattice.cube(x, y, z);
        let mask = edge_mask(get_state(&corners, isolevel));
        if mask == 0 {
            continue;
        }

        let corner = lattice.position(x, y, z);
        samples.clear();
        for (i, &[c0, c1]) in CORNER_POINT_INDICES.iter().enumerate() {
            if mask & (1 << i) == 0 {
                continue;
            }
            let edge = CellEdge {
                g0: corners[c0],
                g1: corners[c1],
                v0: corner_offset(c0) * cell,
                v1: corner_offset(c1) * cell,
            };
            samples.push(placement.intersect(field, &edge, isolevel, &corner));
        }

        let mean = samples.iter().map(|(p, _)| p).sum::<Vector>() / samples.len() as Value;
        let (position, normal) = placement.average(&samples, &v0, &v1, &corner);

        cells[[z, y, x]] = Some(CellVertex {
            mean: corner + mean,
            position: corner + position,
            normal: normalize_or_zero(&normal),
        });
    }

    cells
}

/// Second pass: one quad per sign-changing lattice edge.
///
/// Only lattice points with a full ring of cells behind them are visited
/// (`1 <= x, y, z <= size - 2`).
pub fn stitch(lattice: &Lattice, cells: &Array3<Option<CellVertex>>, isolevel: Value) -> IsoMesh {
    let [size_x, size_y, size_z] = lattice.dims();
    let inside = |g: &GridVertex| g.iso < isolevel;
    let cell = |x: usize, y: usize, z: usize| cells[[z, y, x]];
    let mut mesh = IsoMesh::new_empty();

    for z in 1..size_z.saturating_sub(1) {
        for y in 1..size_y.saturating_sub(1) {
            for x in 1..size_x.saturating_sub(1) {
                let v000 = inside(lattice.get(x, y, z));

                if v000 != inside(lattice.get(x + 1, y, z)) {
                    push_quad(
                        &mut mesh,
                        [
                            cell(x, y, z),
                            cell(x, y - 1, z),
                            cell(x, y - 1, z - 1),
                            cell(x, y, z - 1),
                        ],
                        !v000,
                    );
                }

                if v000 != inside(lattice.get(x, y + 1, z)) {
                    push_quad(
                        &mut mesh,
                        [
                            cell(x, y, z),
                            cell(x - 1, y, z),
                            cell(x - 1, y, z - 1),
                            cell(x, y, z - 1),
                        ],
                        v000,
                    );
                }

                if v000 != inside(lattice.get(x, y, z + 1)) {
                    push_quad(
                        &mut mesh,
                        [
                            cell(x, y, z),
                            cell(x - 1, y, z),
                            cell(x - 1, y - 1, z),
                            cell(x, y - 1, z),
                        ],
                        !v000,
                    );
                }
            }
        }
    }

    mesh
}

/// Emits the quad `q0 q1 q2 q3` as two triangles, reversed when `flip` is set.
///
/// Skipped unless all four cells are active.
fn push_quad(mesh: &mut IsoMesh, quad: [Option<CellVertex>; 4], flip: bool) {
    let [Some(q0), Some(q1), Some(q2), Some(q3)] = quad else {
        return;
    };

    let sign = if flip { -1.0 } else { 1.0 };
    let face = (q1.position - q0.position).cross(&(q2.position - q0.position));
    let quad_normal = normalize_or_zero(&face) * sign;

    let base = mesh.vertex_count() as u32;
    for q in [q0, q1, q2, q3] {
        mesh.push_vertex(&q.position, &normal_lerp(&q, &quad_normal));
    }

    if flip {
        mesh.push_triangle(base, base + 2, base + 1);
        mesh.push_triangle(base, base + 3, base + 2);
    } else {
        mesh.push_triangle(base, base + 1, base + 2);
        mesh.push_triangle(base, base + 2, base + 3);
    }
}

/// Bends a cell's normal toward the face normal by `k = 1 - (1 - d²)²`, clamped to
/// `[0, 1]`, where `d` is the distance from the cell vertex to its mean crossing.
fn normal_lerp(cell: &CellVertex, quad_normal: &Vector) -> Vector {
    if *quad_normal == Vector::zeros() {
        return cell.normal;
    }
    let d2 = (cell.position - cell.mean).norm_squared();
    let k = 1.0 - (1.0 - d2) * (1.0 - d2);
    let blended = normalize_or_zero(&lerp_vectors(&cell.normal, quad_normal, k.clamp(0.0, 1.0)));
    if blended == Vector::zeros() {
        cell.normal
    } else {
        blended
    }
}
