use crate::constants::MIN_GEOMETRY_DIST;

pub(super) fn aabb_overlap(
    ax: f32,
    ay: f32,
    aw: f32,
    ah: f32,
    bx: f32,
    by: f32,
    bw: f32,
    bh: f32,
) -> bool {
    ax < bx + bw && ax + aw > bx && ay < by + bh && ay + ah > by
}

pub(super) fn dist(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = bx - ax;
    let dy = by - ay;
    (dx * dx + dy * dy).sqrt()
}

/// Unit vector from (ax, ay) toward (bx, by), with a minimum epsilon distance
/// substituted for degenerate zero-length geometry.
pub(super) fn toward(ax: f32, ay: f32, bx: f32, by: f32) -> (f32, f32, f32) {
    let dx = bx - ax;
    let dy = by - ay;
    let d = (dx * dx + dy * dy).sqrt().max(MIN_GEOMETRY_DIST);
    (dx / d, dy / d, d)
}

/// Whether a horizontal sweep from x0 to x1 at height y crosses a box centered
/// at (cx, cy). Used for the blink path check.
pub(super) fn sweep_hits_box(
    x0: f32,
    x1: f32,
    y: f32,
    half_h: f32,
    cx: f32,
    cy: f32,
    box_half_w: f32,
    box_half_h: f32,
) -> bool {
    if (cy - y).abs() > half_h + box_half_h {
        return false;
    }
    let lo = x0.min(x1) - box_half_w;
    let hi = x0.max(x1) + box_half_w;
    cx >= lo && cx <= hi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_overlap_detects_touching_edges_as_separate() {
        assert!(!aabb_overlap(0.0, 0.0, 10.0, 10.0, 10.0, 0.0, 10.0, 10.0));
        assert!(aabb_overlap(0.0, 0.0, 10.0, 10.0, 9.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn toward_substitutes_epsilon_for_zero_distance() {
        let (dx, dy, d) = toward(5.0, 5.0, 5.0, 5.0);
        assert!(d >= MIN_GEOMETRY_DIST);
        assert!(dx.is_finite() && dy.is_finite());
    }

    #[test]
    fn toward_normalizes_direction() {
        let (dx, dy, d) = toward(0.0, 0.0, 3.0, 4.0);
        assert!((d - 5.0).abs() < 1e-5);
        assert!((dx - 0.6).abs() < 1e-5);
        assert!((dy - 0.8).abs() < 1e-5);
    }

    #[test]
    fn sweep_misses_box_outside_vertical_band() {
        assert!(!sweep_hits_box(0.0, 100.0, 0.0, 40.0, 50.0, 200.0, 18.0, 40.0));
        assert!(sweep_hits_box(0.0, 100.0, 0.0, 40.0, 50.0, 20.0, 18.0, 40.0));
    }

    #[test]
    fn sweep_works_in_both_directions() {
        assert!(sweep_hits_box(100.0, 0.0, 0.0, 40.0, 50.0, 0.0, 18.0, 40.0));
        assert!(!sweep_hits_box(100.0, 0.0, 0.0, 40.0, -50.0, 0.0, 18.0, 40.0));
    }
}
