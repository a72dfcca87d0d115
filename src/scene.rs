//! The demo world: one of every primitive and combinator laid out along the x-axis.

use std::f32::consts::FRAC_PI_4;

use crate::{
    field::{FieldExt, FieldNode, cone, cuboid, sphere},
    types::{Bounds, Point, Vector},
};

/// Box that encloses [`demo_world`] with a margin.
pub const DEMO_BOUNDS: Bounds = Bounds {
    min: Point::new(-40.0, -16.0, -16.0),
    max: Point::new(40.0, 16.0, 16.0),
};

/// Builds the demo scene.
///
/// ```text
///  x = -30       x = 0 .. 11                         x = 30
///  [cube ∩ tilted cube]  [two spheres + slab, notched]  [twisted bar]
///                        [cone along +x, tilted block]
/// ```
pub fn demo_world() -> FieldNode {
    let blob = sphere(5.0)
        .translate(Vector::new(7.0, 0.0, 0.0))
        .union(sphere(7.0).translate(Vector::new(-7.0, 0.0, 0.0)))
        .union(cuboid(10.0, 8.0, 1.0))
        .subtract(cuboid(2.0, 2.0, 2.0).translate(Vector::new(0.0, 7.5, 0.0)))
        .subtract(cuboid(2.0, 2.0, 2.0).translate(Vector::new(0.0, -7.0, 0.0)));

    let spike = cone(2.0, 6.0)
        .rotate(90f32.to_radians(), Vector::y())
        .translate(Vector::new(11.0, 0.0, 0.0));

    let block = cuboid(3.0, 3.0, 1.0)
        .rotate(FRAC_PI_4, Vector::z())
        .translate(Vector::new(5.0, 8.0, -2.0));

    let gem = cuboid(6.0, 6.0, 6.0)
        .rotate(FRAC_PI_4, Vector::new(1.0, 1.0, 0.0).normalize())
        .intersect(cuboid(6.0, 6.0, 6.0))
        .translate(Vector::new(-30.0, 0.0, 0.0));

    let bar = cuboid(4.0, 4.0, 10.0)
        .twist(1.0 / 10.0)
        .translate(Vector::new(30.0, 0.0, 0.0));

    blob.union(spike).union(block).union(gem).union(bar)
}
