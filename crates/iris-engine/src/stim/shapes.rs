use std::f64::consts::TAU;

use ndarray::{Array2, ArrayView2};

use crate::coords::Vec2;

/// Unit square centred on the origin, counter-clockwise from bottom-left.
pub fn rect_vertices() -> Array2<f64> {
    ndarray::array![[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]]
}

/// Regular polygon of radius 0.5 with its first vertex straight up.
///
/// Fewer than three edges are raised to three.
pub fn regular_polygon(edges: usize) -> Array2<f64> {
    let edges = edges.max(3);
    Array2::from_shape_fn((edges, 2), |(i, axis)| {
        let angle = TAU * i as f64 / edges as f64;
        match axis {
            0 => 0.5 * angle.sin(),
            _ => 0.5 * angle.cos(),
        }
    })
}

/// Even-odd test of `point` against the closed polygon `poly` (`N×2`).
///
/// Handles concave and self-intersecting outlines.
pub fn point_in_polygon(point: Vec2, poly: ArrayView2<'_, f64>) -> bool {
    let n = poly.nrows();
    if n < 3 || poly.ncols() != 2 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (poly[[i, 0]], poly[[i, 1]]);
        let (xj, yj) = (poly[[j, 0]], poly[[j, 1]]);
        if (yi > point.y) != (yj > point.y) {
            let x_cross = xi + (point.y - yi) * (xj - xi) / (yj - yi);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_is_unit_square() {
        let r = rect_vertices();
        assert_eq!(r.shape(), &[4, 2]);
        assert_eq!(r.column(0).iter().cloned().fold(f64::MIN, f64::max), 0.5);
        assert_eq!(r.column(1).iter().cloned().fold(f64::MAX, f64::min), -0.5);
    }

    #[test]
    fn polygon_vertices_on_radius() {
        let p = regular_polygon(6);
        assert_eq!(p.nrows(), 6);
        for row in p.rows() {
            assert!((row[0].hypot(row[1]) - 0.5).abs() < 1e-12);
        }
        assert!((p[[0, 1]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn polygon_has_at_least_three_edges() {
        assert_eq!(regular_polygon(0).nrows(), 3);
    }

    #[test]
    fn point_in_square() {
        let r = rect_vertices();
        assert!(point_in_polygon(Vec2::zero(), r.view()));
        assert!(point_in_polygon(Vec2::new(0.49, -0.49), r.view()));
        assert!(!point_in_polygon(Vec2::new(0.51, 0.0), r.view()));
    }

    #[test]
    fn point_in_concave_outline() {
        // U shape: the notch between the arms is outside.
        let u = ndarray::array![
            [0.0, 0.0],
            [3.0, 0.0],
            [3.0, 3.0],
            [2.0, 3.0],
            [2.0, 1.0],
            [1.0, 1.0],
            [1.0, 3.0],
            [0.0, 3.0]
        ];
        assert!(point_in_polygon(Vec2::new(0.5, 2.5), u.view()));
        assert!(!point_in_polygon(Vec2::new(1.5, 2.0), u.view()));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let line = ndarray::array![[0.0, 0.0], [1.0, 1.0]];
        assert!(!point_in_polygon(Vec2::new(0.5, 0.5), line.view()));
    }
}
