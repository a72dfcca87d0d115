use crate::types::{Value, Vector};

/// Iso differences at or below this are treated as a flat edge.
pub const FLAT_EDGE_EPSILON: Value = 1e-4;

/// Return the interpolation factor t corresponding to `iso_val` along an edge
/// whose endpoints hold `v0` and `v1`.
///
/// Near-flat edges snap to the first endpoint (`t = 0`) instead of dividing by ~0.
pub fn find_t(v0: Value, v1: Value, iso_val: Value) -> Value {
    if (v0 - v1).abs() > FLAT_EDGE_EPSILON {
        (iso_val - v0) / (v1 - v0)
    } else {
        0.0
    }
}

// Linear interpolation
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a + (b - a) * t
}

// Linearly interpolate between two vectors by factor t
pub fn lerp_vectors(a: &Vector, b: &Vector, t: Value) -> Vector {
    a + (b - a) * t
}

/// Hermite smoothstep of `x` between `edge0` and `edge1`.
pub fn smoothstep(edge0: Value, edge1: Value, x: Value) -> Value {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Unit vector along `v`, or the zero vector when `v` has no usable direction.
pub fn normalize_or_zero(v: &Vector) -> Vector {
    v.try_normalize(Value::EPSILON).unwrap_or_else(Vector::zeros)
}

/// Component-wise clamp of `v` into the box `[min, max]`.
pub fn clamp_vector(v: &Vector, min: &Vector, max: &Vector) -> Vector {
    Vector::new(
        v.x.clamp(min.x, max.x),
        v.y.clamp(min.y, max.y),
        v.z.clamp(min.z, max.z),
    )
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn find_t_hits_the_isolevel() {
        assert_relative_eq!(find_t(-1.0, 1.0, 0.0), 0.5);
        assert_relative_eq!(find_t(2.0, -2.0, 1.0), 0.25);
    }

    #[test]
    fn flat_edges_snap_to_the_first_endpoint() {
        assert_eq!(find_t(0.5, 0.50005, 0.0), 0.0);
        assert_eq!(find_t(0.5, 0.5, 0.5), 0.0);
    }

    #[test]
    fn smoothstep_saturates() {
        assert_eq!(smoothstep(2.0, 2.5, 1.0), 0.0);
        assert_eq!(smoothstep(2.0, 2.5, 3.0), 1.0);
        assert_relative_eq!(smoothstep(2.0, 2.5, 2.25), 0.5);
    }

    #[test]
    fn zero_vectors_stay_zero() {
        assert_eq!(normalize_or_zero(&Vector::zeros()), Vector::zeros());
        assert_relative_eq!(normalize_or_zero(&Vector::new(0.0, 3.0, 0.0)), Vector::y());
    }
}
