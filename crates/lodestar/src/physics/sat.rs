//! Separating Axis Theorem for small convex polygons.

use lodestar_shared::Vec2;

use super::aabb::exit_push;
use super::CollisionInfo;
use crate::components::{ColliderShape, Transform};

/// Most vertices a model can have.
pub const MAX_POLYGON_VERTICES: usize = 4;

const TRIANGLE: [Vec2; 3] = [
    Vec2::new(-0.5, -0.5),
    Vec2::new(0.5, -0.5),
    Vec2::new(0.0, 0.5),
];

const QUAD: [Vec2; 4] = [
    Vec2::new(-0.5, -0.5),
    Vec2::new(0.5, -0.5),
    Vec2::new(0.5, 0.5),
    Vec2::new(-0.5, 0.5),
];

/// Unit-size, counter-clockwise local vertices of a named model.
///
/// Unknown names fall back to the unit quad.
#[must_use]
pub fn model_vertices(model: &str) -> &'static [Vec2] {
    match model {
        "triangle" => &TRIANGLE,
        "quad" | "square" | "rect" => &QUAD,
        other => {
            tracing::trace!(model = other, "unknown collision model, using quad");
            &QUAD
        }
    }
}

/// A convex polygon in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldPolygon {
    points: [Vec2; MAX_POLYGON_VERTICES],
    len: usize,
}

impl WorldPolygon {
    /// Scales, rotates and translates `local` by `transform`.
    ///
    /// Vertices past [`MAX_POLYGON_VERTICES`] are ignored.
    #[must_use]
    pub fn from_local(local: &[Vec2], transform: &Transform) -> Self {
        let mut points = [Vec2::ZERO; MAX_POLYGON_VERTICES];
        let len = local.len().min(MAX_POLYGON_VERTICES);
        for (slot, &vertex) in points.iter_mut().zip(local) {
            *slot = vertex
                .mul_elements(transform.scale)
                .rotate(transform.rotation)
                + transform.position;
        }
        Self { points, len }
    }

    /// World polygon of a collider. A [`ColliderShape::Rect`] becomes an
    /// unrotated quad, matching its AABB.
    #[must_use]
    pub fn from_shape(transform: &Transform, shape: &ColliderShape) -> Self {
        match shape {
            ColliderShape::Rect => Self::from_local(&QUAD, &transform.with_rotation(0.0)),
            ColliderShape::Polygon { model } => Self::from_local(model_vertices(model), transform),
        }
    }

    /// World-space vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Vec2] {
        &self.points[..self.len]
    }

    /// Mean of the vertices.
    #[must_use]
    pub fn centroid(&self) -> Vec2 {
        let sum = self
            .vertices()
            .iter()
            .fold(Vec2::ZERO, |acc, &vertex| acc + vertex);
        sum / self.len.max(1) as f32
    }

    /// Unit perpendiculars of every non-degenerate edge.
    fn edge_normals(&self) -> impl Iterator<Item = Vec2> + '_ {
        let vertices = self.vertices();
        (0..vertices.len()).filter_map(move |i| {
            let edge = vertices[(i + 1) % vertices.len()] - vertices[i];
            edge.perp().try_normalize(f32::EPSILON)
        })
    }

    /// Scalar range covered on `axis`.
    fn project(&self, axis: Vec2) -> (f32, f32) {
        self.vertices()
            .iter()
            .map(|&vertex| vertex.dot(axis))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| {
                (lo.min(d), hi.max(d))
            })
    }
}

/// Tests two convex polygons with the Separating Axis Theorem.
///
/// Every edge perpendicular of both shapes is a candidate axis. If the
/// projections overlap by no more than `epsilon` on any of them the shapes
/// are apart. Otherwise the axis with the shortest way out for A, pointing
/// away from B, becomes the normal and the MTV is `normal * (push + bias)`.
/// When one projection contains the other the push is the full distance
/// to clear it, so the MTV always separates.
#[must_use]
pub fn detect_sat_collision(
    a: &WorldPolygon,
    b: &WorldPolygon,
    epsilon: f32,
    bias: f32,
) -> Option<CollisionInfo> {
    let away = a.centroid() - b.centroid();
    let mut best: Option<(Vec2, f32)> = None;

    for axis in a.edge_normals().chain(b.edge_normals()) {
        let (min_a, max_a) = a.project(axis);
        let (min_b, max_b) = b.project(axis);
        if max_a.min(max_b) - min_a.max(min_b) <= epsilon {
            return None;
        }

        let (push, sign) = exit_push((min_a, max_a), (min_b, max_b), away.dot(axis));
        if best.map_or(true, |(_, smallest)| push < smallest) {
            best = Some((axis * sign, push));
        }
    }

    let (normal, push) = best?;
    Some(CollisionInfo {
        mtv: normal * (push + bias),
        normal,
        t_first: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_4;

    use super::*;

    const EPS: f32 = 0.01;
    const BIAS: f32 = 0.001;

    fn polygon(model: &str, x: f32, y: f32, size: f32) -> WorldPolygon {
        let transform = Transform::new(Vec2::new(x, y), Vec2::splat(size));
        WorldPolygon::from_shape(&transform, &ColliderShape::polygon(model))
    }

    #[test]
    fn test_model_lookup() {
        assert_eq!(model_vertices("triangle").len(), 3);
        assert_eq!(model_vertices("square"), model_vertices("rect"));
        assert_eq!(model_vertices("hexagon"), model_vertices("quad"));
    }

    #[test]
    fn test_world_transform() {
        let transform =
            Transform::new(Vec2::new(10.0, 0.0), Vec2::new(2.0, 4.0)).with_rotation(FRAC_PI_4 * 2.0);
        let poly = WorldPolygon::from_local(&QUAD, &transform);

        // (-1, -2) rotated a quarter turn is (2, -1).
        assert!(poly.vertices()[0].abs_diff_eq(Vec2::new(12.0, -1.0), 1e-5));
        assert!(poly.centroid().abs_diff_eq(Vec2::new(10.0, 0.0), 1e-5));
    }

    #[test]
    fn test_overlapping_quads() {
        let a = polygon("quad", 0.0, 0.0, 2.0);
        let b = polygon("quad", 1.5, 0.0, 2.0);

        let info = detect_sat_collision(&a, &b, EPS, BIAS).unwrap();

        assert!(info.normal.abs_diff_eq(Vec2::new(-1.0, 0.0), 1e-6));
        assert!(info.mtv.abs_diff_eq(Vec2::new(-0.5 - BIAS, 0.0), 1e-5));
        assert_eq!(info.t_first, 0.0);
    }

    #[test]
    fn test_mtv_separates() {
        let a = polygon("triangle", 0.0, 0.0, 2.0);
        let b = polygon("quad", 0.6, 1.2, 2.0);

        let info = detect_sat_collision(&a, &b, EPS, BIAS).unwrap();
        let moved = polygon("triangle", info.mtv.x, info.mtv.y, 2.0);

        assert!(detect_sat_collision(&moved, &b, EPS, BIAS).is_none());
    }

    #[test]
    fn test_contained_polygon_is_pushed_clear() {
        let small = polygon("triangle", 0.5, 0.0, 1.0);
        let big = polygon("quad", 0.0, 0.0, 6.0);

        let info = detect_sat_collision(&small, &big, EPS, BIAS).unwrap();
        assert!(info.normal.abs_diff_eq(Vec2::X, 1e-6));

        let moved = polygon("triangle", 0.5 + info.mtv.x, info.mtv.y, 1.0);
        assert!(detect_sat_collision(&moved, &big, EPS, BIAS).is_none());
    }

    #[test]
    fn test_rotated_square_clears_corner() {
        let transform = Transform::new(Vec2::ZERO, Vec2::splat(2.0)).with_rotation(FRAC_PI_4);
        let diamond = WorldPolygon::from_shape(&transform, &ColliderShape::polygon("square"));
        let b = polygon("quad", 1.8, 1.8, 2.0);

        // The upright square's corner reaches into B; the diamond's edge
        // stops at 1.0 along the diagonal, B starts at 0.8 * sqrt(2).
        assert!(detect_sat_collision(&polygon("quad", 0.0, 0.0, 2.0), &b, EPS, BIAS).is_some());
        assert!(detect_sat_collision(&diamond, &b, EPS, BIAS).is_none());

        let closer = polygon("quad", 1.4, 1.4, 2.0);
        assert!(detect_sat_collision(&diamond, &closer, EPS, BIAS).is_some());
    }

    #[test]
    fn test_rect_shape_ignores_rotation() {
        let transform = Transform::new(Vec2::ZERO, Vec2::splat(2.0)).with_rotation(FRAC_PI_4);
        let rect = WorldPolygon::from_shape(&transform, &ColliderShape::Rect);
        assert!(rect.vertices()[0].abs_diff_eq(Vec2::new(-1.0, -1.0), 1e-6));
    }

    #[test]
    fn test_separated_triangles() {
        let a = polygon("triangle", 0.0, 0.0, 1.0);
        let b = polygon("triangle", 3.0, 0.0, 1.0);
        assert!(detect_sat_collision(&a, &b, EPS, BIAS).is_none());
    }
}
