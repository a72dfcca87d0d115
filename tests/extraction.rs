mod common;

use approx::assert_relative_eq;
use bevy_isosurface::{
    Algorithm, ExtractionParams, IsosurfaceError, VERTEX_LAYOUT, extract,
    field::{FieldExt, cuboid, sphere},
    scene::{DEMO_BOUNDS, demo_world},
    types::{Bounds, Point, Vector},
};

use common::{assert_closed, connected_components, euler_characteristic};

fn sphere_params() -> ExtractionParams {
    ExtractionParams::new(Bounds::new(
        Point::new(-8.0, -8.0, -8.0),
        Point::new(8.0, 8.0, 8.0),
    ))
}

#[test]
fn sphere_vertices_stay_within_a_cell_of_the_surface() {
    let params = sphere_params();
    for algorithm in Algorithm::ALL {
        let mesh = extract(&sphere(5.0), algorithm, &params).unwrap();
        assert!(!mesh.is_empty(), "{algorithm}");
        for v in &mesh.vertices {
            let r = v.position().coords.norm();
            assert!(
                (r - 5.0).abs() < params.cell_size,
                "{algorithm}: vertex at radius {r}"
            );
        }
    }
}

#[test]
fn marching_cubes_sphere_is_a_closed_genus_zero_surface() {
    let mesh = extract(&sphere(5.0), Algorithm::MarchingCubes, &sphere_params()).unwrap();

    assert_closed(&mesh, "marching cubes sphere");
    assert_eq!(euler_characteristic(&mesh), 2);
    for v in &mesh.vertices {
        assert!((v.position().coords.norm() - 5.0).abs() <= 1.5);
    }
}

#[test]
fn marching_cubes_and_surface_nets_agree_on_components() {
    let two_blobs = sphere(3.0)
        .translate(Vector::new(-4.0, 0.0, 0.0))
        .union(sphere(2.5).translate(Vector::new(4.5, 0.0, 0.0)));
    let params = ExtractionParams::new(Bounds::centered(
        Point::origin(),
        Vector::new(20.0, 12.0, 12.0),
    ));

    let mc = extract(&two_blobs, Algorithm::MarchingCubes, &params).unwrap();
    let sn = extract(&two_blobs, Algorithm::SurfaceNets, &params).unwrap();

    assert_eq!(connected_components(&mc), 2);
    assert_eq!(connected_components(&sn), connected_components(&mc));
    assert_ne!(mc.vertex_count(), sn.vertex_count());
}

#[test]
fn repeated_extractions_are_byte_identical() {
    let field = demo_world();
    let params = ExtractionParams::new(Bounds::new(
        Point::new(-16.0, -12.0, -8.0),
        Point::new(16.0, 12.0, 8.0),
    ))
    .with_seed(42);

    for algorithm in Algorithm::ALL {
        let a = extract(&field, algorithm, &params).unwrap();
        let b = extract(&field, algorithm, &params).unwrap();
        assert_eq!(a.vertex_bytes(), b.vertex_bytes(), "{algorithm}");
        assert_eq!(a.index_bytes(), b.index_bytes(), "{algorithm}");
    }
}

#[test]
fn random_smoothing_stays_inside_the_cells() {
    let params = sphere_params();
    for algorithm in [Algorithm::SmoothedRandom, Algorithm::SmoothedRandomRight] {
        for seed in [1, 2, 3] {
            let mesh = extract(&sphere(5.0), algorithm, &params.with_seed(seed)).unwrap();
            for v in &mesh.vertices {
                let p = v.position();
                assert!((p.coords.norm() - 5.0).abs() < 1.0, "{algorithm} seed {seed}");
                assert!(
                    p.iter().all(|&c| (-8.0..=8.0).contains(&c)),
                    "{algorithm} seed {seed}: {p}"
                );
            }
        }
    }
}

#[test]
fn different_seeds_move_random_vertices() {
    let params = sphere_params();
    let a = extract(&sphere(5.0), Algorithm::SmoothedRandom, &params.with_seed(1)).unwrap();
    let b = extract(&sphere(5.0), Algorithm::SmoothedRandom, &params.with_seed(2)).unwrap();
    assert_eq!(a.indices, b.indices);
    assert_ne!(a.vertex_bytes(), b.vertex_bytes());
}

#[test]
fn single_cube_with_one_corner_inside_is_one_triangle() {
    // Two samples per axis: exactly one cube, with only corner 0 inside.
    let bounds = Bounds::new(Point::origin(), Point::new(1.5, 1.5, 1.5));
    let mesh = extract(
        &sphere(0.5),
        Algorithm::MarchingCubes,
        &ExtractionParams::new(bounds),
    )
    .unwrap();

    assert_eq!(mesh.triangle_count(), 1);
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    assert_relative_eq!(mesh.vertices[0].position(), Point::new(0.51, 0.0, 0.0), epsilon = 1e-5);
    assert_relative_eq!(mesh.vertices[1].position(), Point::new(0.0, 0.51, 0.0), epsilon = 1e-5);
    assert_relative_eq!(mesh.vertices[2].position(), Point::new(0.0, 0.0, 0.51), epsilon = 1e-5);
    assert!(mesh.tri_normal(0).dot(&Vector::repeat(1.0)) > 0.0);

    // The surface nets family needs interior lattice points to stitch across.
    let sn = extract(&sphere(0.5), Algorithm::SurfaceNets, &ExtractionParams::new(bounds)).unwrap();
    assert!(sn.is_empty());
}

#[test]
fn dual_contouring_keeps_box_corners_sharp() {
    let field = cuboid(2.5, 2.5, 2.5);
    let params = ExtractionParams::new(Bounds::centered(Point::origin(), Vector::repeat(12.0)))
        .with_isolevel(0.0);
    let corner = Point::new(2.5, 2.5, 2.5);
    let nearest = |algorithm| {
        let mesh = extract(&field, algorithm, &params).unwrap();
        mesh.vertices
            .iter()
            .map(|v| (v.position() - corner).norm())
            .fold(f32::INFINITY, f32::min)
    };

    assert!(nearest(Algorithm::DualContouring) < 0.01);
    assert!(nearest(Algorithm::SurfaceNets) > 0.2);
}

#[test]
fn fine_dual_contouring_halves_the_cell() {
    let params = sphere_params();
    let coarse = extract(&sphere(5.0), Algorithm::DualContouring, &params).unwrap();
    let fine = extract(&sphere(5.0), Algorithm::DualContouringFine, &params).unwrap();
    assert!(fine.triangle_count() > 2 * coarse.triangle_count());
}

#[test]
fn degenerate_boxes_fail_and_empty_boxes_succeed() {
    let flat = Bounds::new(Point::origin(), Point::new(10.0, 0.0, 10.0));
    let err = extract(&sphere(1.0), Algorithm::DualContouring, &ExtractionParams::new(flat))
        .unwrap_err();
    assert!(matches!(err, IsosurfaceError::InvalidBounds { dims: [10, 0, 10] }));

    let empty = Bounds::centered(Point::new(0.0, 0.0, 100.0), Vector::repeat(8.0));
    let mesh = extract(&sphere(1.0), Algorithm::MarchingCubes, &ExtractionParams::new(empty))
        .unwrap();
    assert!(mesh.is_empty());
    assert!(mesh.vertex_bytes().is_empty());
}

#[test]
fn every_algorithm_meshes_the_demo_world() {
    let world = demo_world();
    let params = ExtractionParams::new(DEMO_BOUNDS);

    for algorithm in Algorithm::ALL {
        let mesh = extract(&world, algorithm, &params).unwrap();
        assert!(!mesh.is_empty(), "{algorithm}");
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
        assert!(mesh.vertices.iter().all(|v| {
            v.position.iter().chain(&v.normal).all(|c| c.is_finite())
        }));
        assert_eq!(
            mesh.vertex_bytes().len(),
            mesh.vertex_count() * (VERTEX_LAYOUT[1].offset + 12)
        );
    }
}
