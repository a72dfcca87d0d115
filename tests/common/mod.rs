#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use bevy_isosurface::{IsoMesh, types::Point};

/// Positions closer than this are treated as the same vertex.
const WELD_TOLERANCE: f32 = 1e-4;

/// Maps every vertex to a welded id, merging vertices within [`WELD_TOLERANCE`].
///
/// Marching cubes emits a vertex per cube for each crossed edge, so neighbouring cubes
/// produce copies that differ only by rounding. Positions are hashed on a grid ten times
/// coarser than the tolerance and matched against the 27 neighbouring buckets.
pub fn weld(mesh: &IsoMesh) -> (Vec<usize>, usize) {
    let bucket = WELD_TOLERANCE * 10.0;
    let key = |p: &Point| [p.x, p.y, p.z].map(|c| (c / bucket).floor() as i64);

    let mut buckets: HashMap<[i64; 3], Vec<(Point, usize)>> = HashMap::new();
    let mut ids = Vec::with_capacity(mesh.vertices.len());
    let mut next = 0;

    for v in &mesh.vertices {
        let p = v.position();
        let k = key(&p);

        let mut found = None;
        'search: for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let n = [k[0] + dx, k[1] + dy, k[2] + dz];
                    if let Some(entries) = buckets.get(&n) {
                        if let Some((_, id)) =
                            entries.iter().find(|(q, _)| (q - p).norm() < WELD_TOLERANCE)
                        {
                            found = Some(*id);
                            break 'search;
                        }
                    }
                }
            }
        }

        let id = found.unwrap_or_else(|| {
            buckets.entry(k).or_default().push((p, next));
            next += 1;
            next - 1
        });
        ids.push(id);
    }

    (ids, next)
}

/// Welded triangles, dropping any that collapse onto fewer than three vertices.
pub fn welded_triangles(mesh: &IsoMesh) -> (Vec<[usize; 3]>, usize) {
    let (ids, count) = weld(mesh);
    let triangles = mesh
        .indices
        .chunks_exact(3)
        .map(|t| [ids[t[0] as usize], ids[t[1] as usize], ids[t[2] as usize]])
        .filter(|[a, b, c]| a != b && b != c && a != c)
        .collect();
    (triangles, count)
}

/// Undirected edge counts of the welded mesh.
pub fn edge_counts(triangles: &[[usize; 3]]) -> HashMap<(usize, usize), usize> {
    let mut edges = HashMap::new();
    for t in triangles {
        for i in 0..3 {
            let (a, b) = (t[i], t[(i + 1) % 3]);
            *edges.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }
    edges
}

/// `V - E + F` of the welded mesh, counting only vertices used by a triangle.
pub fn euler_characteristic(mesh: &IsoMesh) -> i64 {
    let (triangles, _) = welded_triangles(mesh);
    let used: HashSet<usize> = triangles.iter().flatten().copied().collect();
    let edges = edge_counts(&triangles);
    used.len() as i64 - edges.len() as i64 + triangles.len() as i64
}

/// Asserts every welded edge is shared by exactly two triangles.
pub fn assert_closed(mesh: &IsoMesh, label: &str) {
    let (triangles, _) = welded_triangles(mesh);
    let open: Vec<_> = edge_counts(&triangles)
        .into_iter()
        .filter(|&(_, count)| count != 2)
        .collect();
    assert!(
        open.is_empty(),
        "{label}: {} edges not shared by two triangles, e.g. {:?}",
        open.len(),
        open.iter().take(5).collect::<Vec<_>>()
    );
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Number of connected pieces of the welded mesh.
pub fn connected_components(mesh: &IsoMesh) -> usize {
    let (triangles, count) = welded_triangles(mesh);
    let mut parent: Vec<usize> = (0..count).collect();
    for [a, b, c] in &triangles {
        for (x, y) in [(*a, *b), (*b, *c)] {
            let (rx, ry) = (find(&mut parent, x), find(&mut parent, y));
            if rx != ry {
                parent[rx] = ry;
            }
        }
    }

    let used: HashSet<usize> = triangles.iter().flatten().copied().collect();
    used.into_iter()
        .map(|v| find(&mut parent, v))
        .collect::<HashSet<_>>()
        .len()
}
