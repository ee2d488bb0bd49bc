//! Axis-aligned box tests: static overlap first, swept test second.

use std::cmp::Ordering;

use lodestar_shared::Vec2;

use super::CollisionInfo;
use crate::components::Transform;

// ============================================================================
// AABB (Axis-Aligned Bounding Box)
// ============================================================================

/// Axis-Aligned Bounding Box for collision detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the box.
    pub min: Vec2,
    /// Maximum corner of the box.
    pub max: Vec2,
}

impl Aabb {
    /// Creates a new AABB.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Box spanning `position ± scale / 2`. Rotation is ignored.
    #[must_use]
    pub fn from_transform(transform: &Transform) -> Self {
        let half = transform.half_extents();
        Self {
            min: transform.position - half,
            max: transform.position + half,
        }
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Overlap depth on each axis. Positive = overlap, negative = gap.
    #[must_use]
    pub fn overlap(&self, other: &Self) -> Vec2 {
        self.max.min(other.max) - self.min.max(other.min)
    }

    /// True if the boxes overlap by more than `epsilon` on both axes.
    #[must_use]
    pub fn intersects(&self, other: &Self, epsilon: f32) -> bool {
        let depth = self.overlap(other);
        depth.x > epsilon && depth.y > epsilon
    }

    /// Moves the box by `delta`.
    #[must_use]
    pub fn translate(&self, delta: Vec2) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }
}

/// Shortest distance that moves interval A clear of interval B, and its
/// direction (`1.0` or `-1.0`). Equal distances are broken by `away`, the
/// offset of A's centre from B's.
pub(crate) fn exit_push((a_min, a_max): (f32, f32), (b_min, b_max): (f32, f32), away: f32) -> (f32, f32) {
    let forward = b_max - a_min;
    let backward = a_max - b_min;
    match forward.partial_cmp(&backward) {
        Some(Ordering::Less) => (forward, 1.0),
        Some(Ordering::Greater) => (backward, -1.0),
        _ if away < 0.0 => (backward, -1.0),
        _ => (forward, 1.0),
    }
}

/// Entry and exit times of a moving interval against a fixed one.
///
/// Returns `None` when the motion is below `epsilon` and the intervals are
/// disjoint: they can never meet along this axis.
fn sweep_axis(
    (a_min, a_max): (f32, f32),
    (b_min, b_max): (f32, f32),
    velocity: f32,
    epsilon: f32,
) -> Option<(f32, f32)> {
    if velocity.abs() < epsilon {
        if a_max <= b_min || a_min >= b_max {
            return None;
        }
        return Some((f32::NEG_INFINITY, f32::INFINITY));
    }

    let (near, far) = if velocity > 0.0 {
        (b_min - a_max, b_max - a_min)
    } else {
        (b_max - a_min, b_min - a_max)
    };
    Some((near / velocity, far / velocity))
}

/// Tests two axis-aligned boxes.
///
/// If they already overlap by more than `epsilon` on both axes the result
/// pushes A out along the axis with the shorter way out, away from B, with
/// `t_first = 0`.
///
/// Otherwise A is swept against B with the relative velocity over `dt`
/// seconds. On a hit the normal is the axis A enters last, facing A, and
/// the MTV is the displacement along that normal that brings A to contact.
///
/// # Arguments
///
/// * `a`, `velocity_a` - First body
/// * `b`, `velocity_b` - Second body
/// * `dt` - Length of the frame in seconds
/// * `epsilon` - Overlap tolerance and stationary-velocity threshold
#[must_use]
pub fn detect_aabb_rect_rect(
    a: &Transform,
    velocity_a: Vec2,
    b: &Transform,
    velocity_b: Vec2,
    dt: f32,
    epsilon: f32,
) -> Option<CollisionInfo> {
    let box_a = Aabb::from_transform(a);
    let box_b = Aabb::from_transform(b);

    if box_a.intersects(&box_b, epsilon) {
        let away = box_a.center() - box_b.center();
        let (push_x, sign_x) = exit_push((box_a.min.x, box_a.max.x), (box_b.min.x, box_b.max.x), away.x);
        let (push_y, sign_y) = exit_push((box_a.min.y, box_a.max.y), (box_b.min.y, box_b.max.y), away.y);

        let (normal, penetration) = if push_x < push_y {
            (Vec2::new(sign_x, 0.0), push_x)
        } else {
            (Vec2::new(0.0, sign_y), push_y)
        };
        return Some(CollisionInfo {
            mtv: normal * penetration,
            normal,
            t_first: 0.0,
        });
    }

    // Swept test: B is held still, A moves with the relative velocity.
    let relative = velocity_a - velocity_b;
    let (entry_x, exit_x) = sweep_axis(
        (box_a.min.x, box_a.max.x),
        (box_b.min.x, box_b.max.x),
        relative.x,
        epsilon,
    )?;
    let (entry_y, exit_y) = sweep_axis(
        (box_a.min.y, box_a.max.y),
        (box_b.min.y, box_b.max.y),
        relative.y,
        epsilon,
    )?;

    let t_first = entry_x.max(entry_y);
    let t_last = exit_x.min(exit_y);
    if t_first > t_last || !(0.0..=dt).contains(&t_first) {
        return None;
    }

    let normal = if entry_x >= entry_y {
        Vec2::new(-relative.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, -relative.y.signum())
    };

    Some(CollisionInfo {
        mtv: normal * (relative.dot(normal) * t_first),
        normal,
        t_first,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 0.01;

    fn boxed(x: f32, y: f32, size: f32) -> Transform {
        Transform::new(Vec2::new(x, y), Vec2::splat(size))
    }

    #[test]
    fn test_static_overlap_along_x() {
        let a = boxed(0.0, 0.0, 10.0);
        let b = boxed(5.0, 0.0, 10.0);

        let info = detect_aabb_rect_rect(&a, Vec2::ZERO, &b, Vec2::ZERO, 0.016, EPS).unwrap();

        assert_eq!(info.normal, Vec2::new(-1.0, 0.0));
        assert_eq!(info.mtv, Vec2::new(-5.0, 0.0));
        assert_eq!(info.t_first, 0.0);
    }

    #[test]
    fn test_static_overlap_is_idempotent() {
        let a = boxed(0.3, 1.7, 4.0);
        let b = boxed(2.1, 0.4, 3.0);

        let first = detect_aabb_rect_rect(&a, Vec2::X, &b, Vec2::ZERO, 0.016, EPS);
        let second = detect_aabb_rect_rect(&a, Vec2::X, &b, Vec2::ZERO, 0.016, EPS);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_mtv_separates() {
        let mut a = boxed(0.3, 1.7, 4.0);
        let b = boxed(2.1, 0.4, 3.0);

        let info = detect_aabb_rect_rect(&a, Vec2::ZERO, &b, Vec2::ZERO, 0.016, EPS).unwrap();
        a.position += info.mtv;

        let depth = Aabb::from_transform(&a).overlap(&Aabb::from_transform(&b));
        assert!(depth.x.min(depth.y) < EPS);
        assert!(detect_aabb_rect_rect(&a, Vec2::ZERO, &b, Vec2::ZERO, 0.016, EPS).is_none());
    }

    #[test]
    fn test_nested_box_is_pushed_all_the_way_out() {
        let mut a = boxed(1.0, 0.2, 2.0);
        let b = boxed(0.0, 0.0, 10.0);

        let info = detect_aabb_rect_rect(&a, Vec2::ZERO, &b, Vec2::ZERO, 0.016, EPS).unwrap();
        assert_eq!(info.normal, Vec2::new(1.0, 0.0));
        assert_eq!(info.mtv, Vec2::new(5.0, 0.0));

        a.position += info.mtv;
        assert!(detect_aabb_rect_rect(&a, Vec2::ZERO, &b, Vec2::ZERO, 0.016, EPS).is_none());
    }

    #[test]
    fn test_touching_boxes_do_not_overlap() {
        let a = boxed(0.0, 0.0, 2.0);
        let b = boxed(2.0, 0.0, 2.0);
        assert!(detect_aabb_rect_rect(&a, Vec2::ZERO, &b, Vec2::ZERO, 0.016, EPS).is_none());
    }

    #[test]
    fn test_swept_hit_within_frame() {
        let a = boxed(0.0, 0.0, 2.0);
        let b = boxed(5.0, 0.0, 2.0);

        let info =
            detect_aabb_rect_rect(&a, Vec2::new(10.0, 0.0), &b, Vec2::ZERO, 1.0, EPS).unwrap();

        assert!((info.t_first - 0.3).abs() < 1e-5);
        assert_eq!(info.normal, Vec2::new(-1.0, 0.0));
        assert!(info.mtv.abs_diff_eq(Vec2::new(3.0, 0.0), 1e-4));
    }

    #[test]
    fn test_swept_uses_relative_velocity() {
        let a = boxed(0.0, 0.0, 2.0);
        let b = boxed(5.0, 0.0, 2.0);

        // B closes the gap instead of A.
        let info =
            detect_aabb_rect_rect(&a, Vec2::ZERO, &b, Vec2::new(-10.0, 0.0), 1.0, EPS).unwrap();
        assert!((info.t_first - 0.3).abs() < 1e-5);

        // Both move right at the same speed: never meet.
        let same = Vec2::new(10.0, 0.0);
        assert!(detect_aabb_rect_rect(&a, same, &b, same, 1.0, EPS).is_none());
    }

    #[test]
    fn test_swept_miss_outside_frame() {
        let a = boxed(0.0, 0.0, 2.0);
        let b = boxed(5.0, 0.0, 2.0);
        let v = Vec2::new(10.0, 0.0);

        assert!(detect_aabb_rect_rect(&a, v, &b, Vec2::ZERO, 0.1, EPS).is_none());
        assert!(detect_aabb_rect_rect(&a, -v, &b, Vec2::ZERO, 1.0, EPS).is_none());
    }

    #[test]
    fn test_parallel_motion_never_collides() {
        let a = boxed(0.0, 0.0, 2.0);
        let b = boxed(5.0, 5.0, 2.0);
        assert!(
            detect_aabb_rect_rect(&a, Vec2::new(10.0, 0.0), &b, Vec2::ZERO, 1.0, EPS).is_none()
        );
    }

    #[test]
    fn test_diagonal_sweep_picks_latest_axis() {
        let a = boxed(0.0, 0.0, 2.0);
        let b = boxed(4.0, 6.0, 2.0);

        // x entry at 0.2, y entry at 0.4: y is the contact face.
        let info =
            detect_aabb_rect_rect(&a, Vec2::new(10.0, 10.0), &b, Vec2::ZERO, 1.0, EPS).unwrap();
        assert_eq!(info.normal, Vec2::new(0.0, -1.0));
        assert!((info.t_first - 0.4).abs() < 1e-5);
    }
}
