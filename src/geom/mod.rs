//! Geometry primitives for collision queries

use tracing::warn;

/// Axis-aligned rectangle (top-left anchored, +y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Build a rect, coercing non-finite fields to zero.
    ///
    /// Malformed obstacle dimensions are logged and kept in play rather
    /// than crashing the frame loop.
    pub fn sanitized(x: f32, y: f32, w: f32, h: f32) -> Self {
        let coerce = |v: f32, label: &str| {
            if v.is_finite() {
                v
            } else {
                warn!(field = label, value = %v, "non-finite obstacle dimension coerced to 0");
                0.0
            }
        };
        Self {
            x: coerce(x, "x"),
            y: coerce(y, "y"),
            w: coerce(w, "w"),
            h: coerce(h, "h"),
        }
    }

    /// Rect centered on a point with the given half extents
    pub fn centered(cx: f32, cy: f32, half_w: f32, half_h: f32) -> Self {
        Self {
            x: cx - half_w,
            y: cy - half_h,
            w: half_w * 2.0,
            h: half_h * 2.0,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn contains_point(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Expand outward by `radius` on every side (Minkowski sum with a circle,
    /// approximated as a box)
    pub fn expanded(&self, radius: f32) -> Aabb {
        Aabb {
            x: self.x - radius,
            y: self.y - radius,
            w: self.w + radius * 2.0,
            h: self.h + radius * 2.0,
        }
    }
}

/// Penetration depths of `player` into `obs`, one per push-out direction.
///
/// Only meaningful when the rects overlap; every depth is then positive.
#[derive(Debug, Clone, Copy)]
pub struct Penetration {
    /// Depth resolved by pushing the player up (landing on top)
    pub up: f32,
    /// Depth resolved by pushing the player down (hitting the underside)
    pub down: f32,
    /// Depth resolved by pushing the player left
    pub left: f32,
    /// Depth resolved by pushing the player right
    pub right: f32,
}

pub fn penetration(player: &Aabb, obs: &Aabb) -> Penetration {
    Penetration {
        up: player.bottom() - obs.y,
        down: obs.bottom() - player.y,
        left: player.right() - obs.x,
        right: obs.right() - player.x,
    }
}

/// Which axis a swept segment entered a rect through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitAxis {
    Horizontal,
    Vertical,
}

/// Result of a segment-vs-rect sweep
#[derive(Debug, Clone, Copy)]
pub struct RectHit {
    /// Parametric entry point along the segment, in [0, 1]
    pub t: f32,
    /// Axis of the face that was crossed
    pub axis: HitAxis,
}

/// Sweep a segment against a rect (slab clipping).
///
/// A segment that *starts* inside the rect reports no hit so that a
/// projectile spawned adjacent to geometry can escape instead of detonating
/// in place. A segment that ends inside, or crosses an edge, is a hit.
pub fn segment_rect_hit(x0: f32, y0: f32, x1: f32, y1: f32, rect: &Aabb) -> Option<RectHit> {
    if rect.contains_point(x0, y0) {
        return None;
    }

    let dx = x1 - x0;
    let dy = y1 - y0;

    let mut t_enter = 0.0f32;
    let mut t_exit = 1.0f32;
    let mut axis = HitAxis::Horizontal;

    // X slab
    if dx.abs() < f32::EPSILON {
        if x0 < rect.x || x0 > rect.right() {
            return None;
        }
    } else {
        let mut t0 = (rect.x - x0) / dx;
        let mut t1 = (rect.right() - x0) / dx;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        if t0 > t_enter {
            t_enter = t0;
            axis = HitAxis::Horizontal;
        }
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    // Y slab
    if dy.abs() < f32::EPSILON {
        if y0 < rect.y || y0 > rect.bottom() {
            return None;
        }
    } else {
        let mut t0 = (rect.y - y0) / dy;
        let mut t1 = (rect.bottom() - y0) / dy;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        if t0 > t_enter {
            t_enter = t0;
            axis = HitAxis::Vertical;
        }
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_enter > 1.0 || t_exit < 0.0 {
        return None;
    }

    Some(RectHit { t: t_enter, axis })
}

/// Circle-circle overlap test (sum of radii)
pub fn circles_overlap(ax: f32, ay: f32, ar: f32, bx: f32, by: f32, br: f32) -> bool {
    let dx = bx - ax;
    let dy = by - ay;
    let combined = ar + br;
    dx * dx + dy * dy <= combined * combined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_basics() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(5.0, 5.0, 10.0, 10.0);
        let c = Aabb::new(20.0, 20.0, 5.0, 5.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn penetration_depths_on_landing() {
        // Player box sunk 5 into the top of a platform
        let player = Aabb::centered(100.0, 20.0, 25.0, 25.0);
        let obs = Aabb::new(0.0, 40.0, 200.0, 20.0);
        let pen = penetration(&player, &obs);
        assert!((pen.up - 5.0).abs() < 1e-4);
        assert!(pen.up < pen.down);
        assert!(pen.up < pen.left);
        assert!(pen.up < pen.right);
    }

    #[test]
    fn segment_crossing_thin_wall_hits() {
        let wall = Aabb::new(100.0, 0.0, 10.0, 200.0);
        let hit = segment_rect_hit(80.0, 50.0, 140.0, 50.0, &wall).expect("must hit");
        assert_eq!(hit.axis, HitAxis::Horizontal);
        assert!(hit.t > 0.0 && hit.t < 1.0);
    }

    #[test]
    fn segment_ending_inside_hits() {
        let wall = Aabb::new(100.0, 0.0, 10.0, 200.0);
        assert!(segment_rect_hit(80.0, 50.0, 105.0, 50.0, &wall).is_some());
    }

    #[test]
    fn segment_starting_inside_escapes() {
        let wall = Aabb::new(100.0, 0.0, 10.0, 200.0);
        assert!(segment_rect_hit(105.0, 50.0, 200.0, 50.0, &wall).is_none());
    }

    #[test]
    fn segment_missing_entirely() {
        let wall = Aabb::new(100.0, 0.0, 10.0, 200.0);
        assert!(segment_rect_hit(0.0, 300.0, 50.0, 300.0, &wall).is_none());
    }

    #[test]
    fn vertical_entry_reports_vertical_axis() {
        let floor = Aabb::new(0.0, 100.0, 200.0, 20.0);
        let hit = segment_rect_hit(50.0, 80.0, 50.0, 130.0, &floor).expect("must hit");
        assert_eq!(hit.axis, HitAxis::Vertical);
    }

    #[test]
    fn sanitized_coerces_non_finite() {
        let r = Aabb::sanitized(f32::NAN, 5.0, f32::INFINITY, 10.0);
        assert_eq!(r.x, 0.0);
        assert_eq!(r.y, 5.0);
        assert_eq!(r.w, 0.0);
        assert_eq!(r.h, 10.0);
    }
}
