use crate::{
    interp::{find_t, lerp_vectors},
    sampler::GridVertex,
    tables::{CORNER_OFFSETS, CORNER_POINT_INDICES, EDGE_TABLE, TRI_TABLE},
    types::{Value, Vector},
};

/// Computes the marching cubes configuration index of a cube.
///
/// Each of the 8 corners maps to one bit. A bit is set when the corner's value
/// is strictly **below** the isolevel (i.e. "inside" the surface):
///
/// ```text
/// corner index:  7  6  5  4  3  2  1  0
/// state bits:   [_][_][_][_][_][_][_][_]
///                                      ^-- corner 0 inside?
/// ```
#[inline]
pub fn get_state(corners: &[GridVertex; 8], isolevel: Value) -> usize {
    corners
        .iter()
        .enumerate()
        .filter(|(_, v)| v.iso < isolevel)
        .fold(0, |state, (i, _)| state | 1 << i)
}

/// Bitmask of the cube edges crossed by the surface; zero for cubes entirely inside or outside.
#[inline]
pub fn edge_mask(state: usize) -> u16 {
    EDGE_TABLE[state]
}

/// Unit-cube offset of corner `i` as a vector.
#[inline]
pub fn corner_offset(i: usize) -> Vector {
    let [x, y, z] = CORNER_OFFSETS[i];
    Vector::new(x as Value, y as Value, z as Value)
}

/// A surface crossing on one cube edge, in unit-cube coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeCrossing {
    pub position: Vector,
    /// Interpolated gradient, not normalised.
    pub gradient: Vector,
}

/// Interpolates the crossing point and gradient on each edge flagged in `edges_mask`.
///
/// Positions are in unit-cube coordinates. Unflagged edges are `None`.
#[inline]
pub fn get_edge_crossings(
    edges_mask: u16,
    corners: &[GridVertex; 8],
    isolevel: Value,
) -> [Option<EdgeCrossing>; 12] {
    let mut crossings: [Option<EdgeCrossing>; 12] = [None; 12];

    for (i, &[c0, c1]) in CORNER_POINT_INDICES.iter().enumerate() {
        if (edges_mask & (1 << i)) == 0 {
            continue;
        }

        let (g0, g1) = (&corners[c0], &corners[c1]);
        let t = find_t(g0.iso, g1.iso, isolevel);
        crossings[i] = Some(EdgeCrossing {
            position: lerp_vectors(&corner_offset(c0), &corner_offset(c1), t),
            gradient: lerp_vectors(&g0.gradient, &g1.gradient, t),
        });
    }

    crossings
}

/// Triangles of configuration `state` as edge-index triples.
///
/// `TRI_TABLE[state]` contains edge indices in groups of three, terminated by `-1`:
/// ```text
/// TRI_TABLE[state] = [e0, e1, e2,  e3, e4, e5,  -1, ...]
///                     \___tri0__/   \___tri1__/
/// ```
#[inline]
pub fn triangles_from_state(state: usize) -> impl Iterator<Item = [usize; 3]> {
    TRI_TABLE[state]
        .chunks_exact(3)
        .take_while(|tri| tri[0] != -1)
        .map(|tri| [tri[0] as usize, tri[1] as usize, tri[2] as usize])
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn corners(iso: [Value; 8]) -> [GridVertex; 8] {
        iso.map(|iso| GridVertex {
            iso,
            gradient: Vector::new(iso, 0.0, 0.0),
        })
    }

    #[test]
    fn state_sets_a_bit_per_inside_corner() {
        let c = corners([-1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -1.0]);
        assert_eq!(get_state(&c, 0.0), 0b1000_0001);
    }

    #[test]
    fn corners_on_the_isolevel_count_as_outside() {
        let c = corners([0.0; 8]);
        assert_eq!(get_state(&c, 0.0), 0);
        assert_eq!(edge_mask(get_state(&c, 0.0)), 0);
    }

    #[test]
    fn crossings_interpolate_position_and_gradient() {
        let c = corners([-1.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0]);
        let state = get_state(&c, 0.0);
        let crossings = get_edge_crossings(edge_mask(state), &c, 0.0);

        let flagged: Vec<usize> = (0..12).filter(|&i| crossings[i].is_some()).collect();
        assert_eq!(flagged, vec![0, 3, 8]);

        let e0 = crossings[0].unwrap();
        assert_relative_eq!(e0.position, Vector::new(0.25, 0.0, 0.0));
        assert_relative_eq!(e0.gradient.x, 0.0);

        let e8 = crossings[8].unwrap();
        assert_relative_eq!(e8.position, Vector::new(0.0, 0.0, 0.25));
    }

    #[test]
    fn triangles_stop_at_the_terminator() {
        assert_eq!(triangles_from_state(0).count(), 0);
        assert_eq!(triangles_from_state(1).collect::<Vec<_>>(), vec![[0, 8, 3]]);
        assert_eq!(triangles_from_state(7).count(), 3);
    }
}
