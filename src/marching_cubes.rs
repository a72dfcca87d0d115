use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    interp::normalize_or_zero,
    mesh::IsoMesh,
    sampler::{GridVertex, Lattice},
    tables::CORNER_OFFSETS,
    types::{Point, Value, Vector},
    utils::{edge_mask, get_edge_crossings, get_state, triangles_from_state},
};

/// Table-driven marching cubes with optional level-of-detail subdivision.
///
/// At `lod > 0` every active cube is split into a 3×3×3 sub-lattice whose values are
/// averaged from the 8 sampled corners, then each of the 8 sub-cubes is triangulated at
/// `lod - 1`. The field is not sampled again, so the mesh gets denser but not more accurate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MarchingCubes {
    pub lod: u32,
}

impl MarchingCubes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lod(mut self, lod: u32) -> Self {
        self.lod = lod;
        self
    }

    /// Triangulates every interior cube of `lattice`.
    ///
    /// Z-slabs run in parallel and are appended in slab order, so vertex and index order
    /// match a sequential z, y, x walk.
    pub fn extract(&self, lattice: &Lattice, isolevel: Value) -> IsoMesh {
        let [size_x, size_y, size_z] = lattice.dims();
        let cell = lattice.cell_size;

        let slabs: Vec<IsoMesh> = (0..size_z.saturating_sub(1))
            .into_par_iter()
            .map(|z| {
                let mut local = IsoMesh::new_empty();
                for y in 0..size_y.saturating_sub(1) {
                    for x in 0..size_x.saturating_sub(1) {
                        let offset = lattice.position(x, y, z);
                        triangulate_cube(
                            &lattice.cube(x, y, z),
                            isolevel,
                            offset,
                            cell,
                            self.lod,
                            &mut local,
                        );
                    }
                }
                local
            })
            .collect();

        let mut mesh = IsoMesh::new_empty();
        for slab in slabs {
            mesh.append(slab);
        }
        mesh
    }
}

/// Appends the triangles of one cube to `mesh`.
///
/// `offset` is the world position of corner 0 and `scale` the cube's edge length.
pub fn triangulate_cube(
    corners: &[GridVertex; 8],
    isolevel: Value,
    offset: Point,
    scale: Value,
    lod: u32,
    mesh: &mut IsoMesh,
) {
    let state = get_state(corners, isolevel);
    let mask = edge_mask(state);
    if mask == 0 {
        return;
    }

    if lod > 0 {
        let fine = subdivide(corners);
        let half = scale / 2.0;
        for z in 0..2 {
            for y in 0..2 {
                for x in 0..2 {
                    let sub = CORNER_OFFSETS.map(|[dx, dy, dz]| fine[z + dz][y + dy][x + dx]);
                    let sub_offset = offset + Vector::new(x as Value, y as Value, z as Value) * half;
                    triangulate_cube(&sub, isolevel, sub_offset, half, lod - 1, mesh);
                }
            }
        }
        return;
    }

    let crossings = get_edge_crossings(mask, corners, isolevel);
    let mut edge_vertex = [0u32; 12];
    for (edge, crossing) in crossings.iter().enumerate() {
        if let Some(c) = crossing {
            let position = offset + c.position * scale;
            edge_vertex[edge] = mesh.push_vertex(&position, &normalize_or_zero(&c.gradient));
        }
    }

    for [a, b, c] in triangles_from_state(state) {
        mesh.push_triangle(edge_vertex[a], edge_vertex[c], edge_vertex[b]);
    }
}

/// Builds the 3×3×3 sub-lattice of a cube, indexed `[z][y][x]`.
///
/// Each fine value is the mean of the 8 coarse corners picked from `x >> 1` and
/// `(x >> 1) + (x & 1)` on each axis, a trilinear blend at the half-way points.
/// Gradients are copied from the lower coarse corner.
fn subdivide(corners: &[GridVertex; 8]) -> [[[GridVertex; 3]; 3]; 3] {
    let mut coarse = [[[GridVertex::default(); 2]; 2]; 2];
    for (corner, [dx, dy, dz]) in corners.iter().zip(CORNER_OFFSETS) {
        coarse[dz][dy][dx] = *corner;
    }

    let mut fine = [[[GridVertex::default(); 3]; 3]; 3];
    for (z, plane) in fine.iter_mut().enumerate() {
        for (y, row) in plane.iter_mut().enumerate() {
            for (x, vertex) in row.iter_mut().enumerate() {
                let (x0, y0, z0) = (x >> 1, y >> 1, z >> 1);
                let (x1, y1, z1) = (x0 + (x & 1), y0 + (y & 1), z0 + (z & 1));

                let mut iso = 0.0;
                for cz in [z0, z1] {
                    for cy in [y0, y1] {
                        for cx in [x0, x1] {
                            iso += coarse[cz][cy][cx].iso;
                        }
                    }
                }

                *vertex = GridVertex {
                    iso: iso / 8.0,
                    gradient: coarse[z0][y0][x0].gradient,
                };
            }
        }
    }
    fine
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{field::sphere, types::Bounds};

    fn cube(iso: [Value; 8]) -> [GridVertex; 8] {
        iso.map(|iso| GridVertex {
            iso,
            gradient: Vector::x(),
        })
    }

    fn sphere_lattice() -> Lattice {
        let bounds = Bounds::centered(Point::origin(), Vector::repeat(16.0));
        Lattice::sample(&sphere(5.0), &bounds, 1.0).unwrap()
    }

    #[test]
    fn single_inside_corner_gives_one_triangle() {
        let mut mesh = IsoMesh::new_empty();
        let corners = cube([-1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        triangulate_cube(&corners, 0.0, Point::origin(), 2.0, 0, &mut mesh);

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        // Vertices on edges 0, 3 and 8, half-way along each.
        assert_relative_eq!(mesh.vertices[0].position(), Point::new(1.0, 0.0, 0.0));
        assert_relative_eq!(mesh.vertices[1].position(), Point::new(0.0, 1.0, 0.0));
        assert_relative_eq!(mesh.vertices[2].position(), Point::new(0.0, 0.0, 1.0));
        // Facing away from the inside corner.
        assert!(mesh.tri_normal(0).dot(&Vector::repeat(1.0)) > 0.0);
    }

    #[test]
    fn uniform_cubes_emit_nothing() {
        let mut mesh = IsoMesh::new_empty();
        triangulate_cube(&cube([-1.0; 8]), 0.0, Point::origin(), 1.0, 2, &mut mesh);
        triangulate_cube(&cube([1.0; 8]), 0.0, Point::origin(), 1.0, 2, &mut mesh);
        assert!(mesh.is_empty());
    }

    #[test]
    fn subdivision_averages_the_coarse_corners() {
        let corners = cube([0.0, 8.0, 8.0, 0.0, 0.0, 8.0, 8.0, 0.0]);
        let fine = subdivide(&corners);
        assert_eq!(fine[0][0][0].iso, 0.0);
        assert_eq!(fine[0][0][1].iso, 4.0);
        assert_eq!(fine[2][2][2].iso, 8.0);
        assert_eq!(fine[1][1][1].iso, 4.0);
    }

    #[test]
    fn lod_refines_without_leaving_the_cube() {
        let corners = cube([-1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let mut coarse = IsoMesh::new_empty();
        let mut fine = IsoMesh::new_empty();
        triangulate_cube(&corners, 0.0, Point::origin(), 1.0, 0, &mut coarse);
        triangulate_cube(&corners, 0.0, Point::origin(), 1.0, 2, &mut fine);

        assert!(fine.triangle_count() > coarse.triangle_count());
        for v in &fine.vertices {
            assert!(v.position.iter().all(|&c| (0.0..=1.0).contains(&c)));
        }
    }

    #[test]
    fn sphere_vertices_lie_near_the_surface() {
        let mesh = MarchingCubes::new().extract(&sphere_lattice(), 0.01);
        assert!(!mesh.is_empty());
        for v in &mesh.vertices {
            let r = v.position().coords.norm();
            assert!((r - 5.0).abs() < 1.0, "vertex at radius {r}");
            assert_relative_eq!(v.normal().norm(), 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn lod_uses_the_same_lattice() {
        let lattice = sphere_lattice();
        let lod0 = MarchingCubes::new().extract(&lattice, 0.01);
        let lod1 = MarchingCubes::new().with_lod(1).extract(&lattice, 0.01);
        assert!(lod1.triangle_count() > lod0.triangle_count());
    }

    #[test]
    fn parallel_walk_is_deterministic() {
        let lattice = sphere_lattice();
        let a = MarchingCubes::new().extract(&lattice, 0.01);
        let b = MarchingCubes::new().extract(&lattice, 0.01);
        assert_eq!(a, b);
    }
}
