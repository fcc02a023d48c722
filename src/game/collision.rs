//! AABB collision resolution against static obstacles
//!
//! Two passes per tick, in a fixed order: the minimum-overlap resolver
//! first, then the ground-stability probe. The probe only fires on
//! near-zero vertical velocity and never un-sets flags the resolver set,
//! so the interaction between the two is deterministic.

use crate::config::MovementTuning;
use crate::geom::{penetration, Aabb};

/// Contact flags produced by a resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contacts {
    pub grounded: bool,
    pub hit_ceiling: bool,
    /// A wall touched on the player's left side
    pub hit_left: bool,
    /// A wall touched on the player's right side
    pub hit_right: bool,
}

/// Corrected position/velocity plus contact flags
#[derive(Debug, Clone, Copy)]
pub struct Resolution {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub contacts: Contacts,
}

/// Vertical speed below which the stability probe may snap to ground
const STABILITY_VY_EPS: f32 = 20.0;

/// Margin for treating two penetration depths as tied
const TIE_EPS: f32 = 0.001;

/// Collision resolver for the player capsule-box against level AABBs
#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver {
    half_width: f32,
    half_height: f32,
    snap_tolerance: f32,
    snap_tolerance_crouched: f32,
}

impl CollisionResolver {
    pub fn new(tuning: &MovementTuning) -> Self {
        Self {
            half_width: tuning.half_width,
            half_height: tuning.half_height,
            snap_tolerance: tuning.ground_snap_tolerance,
            snap_tolerance_crouched: tuning.ground_snap_tolerance_crouched,
        }
    }

    pub fn half_width(&self) -> f32 {
        self.half_width
    }

    /// Effective half height for the current crouch factor
    pub fn half_height(&self, crouch_factor: f32) -> f32 {
        self.half_height * crouch_factor.clamp(0.1, 1.0)
    }

    /// Resolve a candidate position/velocity against every obstacle.
    ///
    /// Each overlapping obstacle is corrected along exactly one axis (the
    /// minimum penetration, tie-broken toward the axis of travel), and the
    /// corrected box carries into the test of the next obstacle so
    /// multi-obstacle corners settle without overshoot.
    pub fn resolve(
        &self,
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        obstacles: &[Aabb],
        crouch_factor: f32,
    ) -> Resolution {
        let hw = self.half_width;
        let hh = self.half_height(crouch_factor);

        let mut res = Resolution {
            x,
            y,
            vx,
            vy,
            contacts: Contacts::default(),
        };

        for raw in obstacles {
            let obs = Aabb::sanitized(raw.x, raw.y, raw.w, raw.h);
            if obs.w <= 0.0 || obs.h <= 0.0 {
                continue;
            }

            let player = Aabb::centered(res.x, res.y, hw, hh);
            if !player.intersects(&obs) {
                continue;
            }

            let pen = penetration(&player, &obs);
            let min_y = pen.up.min(pen.down);
            let min_x = pen.left.min(pen.right);

            // Pick the separating axis: minimum overlap, ties broken by
            // the dominant velocity component
            let vertical = if min_y < min_x - TIE_EPS {
                true
            } else if min_x < min_y - TIE_EPS {
                false
            } else {
                res.vy.abs() >= res.vx.abs()
            };

            if vertical {
                // Within the axis, prefer the smaller push; on a tie the
                // travel direction decides
                let push_up = if (pen.up - pen.down).abs() <= TIE_EPS {
                    res.vy >= 0.0
                } else {
                    pen.up < pen.down
                };
                if push_up {
                    res.y = obs.y - hh;
                    if res.vy > 0.0 {
                        res.vy = 0.0;
                    }
                    res.contacts.grounded = true;
                } else {
                    res.y = obs.bottom() + hh;
                    if res.vy < 0.0 {
                        res.vy = 0.0;
                    }
                    res.contacts.hit_ceiling = true;
                }
            } else {
                let push_left = if (pen.left - pen.right).abs() <= TIE_EPS {
                    res.vx >= 0.0
                } else {
                    pen.left < pen.right
                };
                if push_left {
                    res.x = obs.x - hw;
                    if res.vx > 0.0 {
                        res.vx = 0.0;
                    }
                    res.contacts.hit_right = true;
                } else {
                    res.x = obs.right() + hw;
                    if res.vx < 0.0 {
                        res.vx = 0.0;
                    }
                    res.contacts.hit_left = true;
                }
            }
        }

        self.stability_pass(&mut res, obstacles, crouch_factor);
        res
    }

    /// Ground-snap probe: at near-zero fall speed a short downward test
    /// keeps the player seated instead of floating for a frame at low
    /// speeds. Runs strictly after the resolver pass.
    fn stability_pass(&self, res: &mut Resolution, obstacles: &[Aabb], crouch_factor: f32) {
        if res.contacts.grounded || res.vy.abs() > STABILITY_VY_EPS {
            return;
        }

        let tolerance = if crouch_factor < 1.0 {
            self.snap_tolerance_crouched
        } else {
            self.snap_tolerance
        };

        let hw = self.half_width;
        let hh = self.half_height(crouch_factor);
        let probe = Aabb::centered(res.x, res.y + tolerance, hw, hh);
        let bottom = res.y + hh;

        for raw in obstacles {
            let obs = Aabb::sanitized(raw.x, raw.y, raw.w, raw.h);
            if obs.w <= 0.0 || obs.h <= 0.0 {
                continue;
            }
            // Only snap onto surfaces at or below the player's feet
            if probe.intersects(&obs) && obs.y >= bottom - TIE_EPS {
                res.y = obs.y - hh;
                res.vy = 0.0;
                res.contacts.grounded = true;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MovementTuning;

    fn resolver() -> CollisionResolver {
        CollisionResolver::new(&MovementTuning::default())
    }

    #[test]
    fn falling_player_lands_on_platform_surface() {
        // Player at (100,500) falling at vy=600, platform top at y=520:
        // corrected center is 520 - 25 (half height) = 495
        let platform = [Aabb::new(0.0, 520.0, 200.0, 20.0)];
        let res = resolver().resolve(100.0, 500.0 + 600.0 / 60.0, 0.0, 600.0, &platform, 1.0);
        assert!((res.y - 495.0).abs() < 1e-3);
        assert_eq!(res.vy, 0.0);
        assert!(res.contacts.grounded);
    }

    #[test]
    fn repeated_resolution_converges_to_grounded() {
        // Net-downward motion over arbitrary platforms must settle within
        // a bounded number of ticks
        let obstacles = [
            Aabb::new(-100.0, 600.0, 800.0, 40.0),
            Aabb::new(300.0, 560.0, 80.0, 40.0),
        ];
        let r = resolver();
        let (mut x, mut y, mut vy): (f32, f32, f32) = (320.0, 400.0, 0.0);
        let mut grounded = false;
        for _ in 0..300 {
            vy = (vy + 1800.0 / 60.0).min(900.0);
            y += vy / 60.0;
            let res = r.resolve(x, y, 0.0, vy, &obstacles, 1.0);
            x = res.x;
            y = res.y;
            vy = res.vy;
            if res.contacts.grounded {
                grounded = true;
                break;
            }
        }
        assert!(grounded);
        assert_eq!(vy, 0.0);
        assert!((y - 535.0).abs() < 1e-3);
    }

    #[test]
    fn sideways_overlap_resolves_horizontally() {
        let wall = [Aabb::new(200.0, 0.0, 40.0, 600.0)];
        // Moving right, shallow horizontal overlap
        let res = resolver().resolve(180.0, 300.0, 300.0, 0.0, &wall, 1.0);
        assert!((res.x - 175.0).abs() < 1e-3);
        assert_eq!(res.vx, 0.0);
        assert!(res.contacts.hit_right);
        assert!(!res.contacts.grounded);
    }

    #[test]
    fn ceiling_bump_zeroes_upward_velocity() {
        let ceiling = [Aabb::new(0.0, 100.0, 400.0, 30.0)];
        let res = resolver().resolve(200.0, 150.0, 0.0, -400.0, &ceiling, 1.0);
        assert!((res.y - 155.0).abs() < 1e-3);
        assert_eq!(res.vy, 0.0);
        assert!(res.contacts.hit_ceiling);
    }

    #[test]
    fn corner_of_two_obstacles_resolves_both_axes_across_passes() {
        // Floor tile plus wall tile forming an inside corner; a single
        // resolve call corrects each obstacle on its own axis
        let obstacles = [
            Aabb::new(0.0, 520.0, 300.0, 40.0),
            Aabb::new(280.0, 300.0, 40.0, 260.0),
        ];
        let res = resolver().resolve(262.0, 498.0, 120.0, 300.0, &obstacles, 1.0);
        assert!(res.contacts.grounded);
        assert!((res.y - 495.0).abs() < 1e-3);
        // Wall contact corrected without tunneling into the upright tile
        assert!(res.x <= 255.0 + 1e-3);
    }

    #[test]
    fn stability_probe_snaps_hovering_player() {
        let floor = [Aabb::new(0.0, 520.0, 400.0, 40.0)];
        // Hovering 2px above the surface at near-zero fall speed
        let res = resolver().resolve(100.0, 493.0, 0.0, 5.0, &floor, 1.0);
        assert!(res.contacts.grounded);
        assert!((res.y - 495.0).abs() < 1e-3);
        assert_eq!(res.vy, 0.0);
    }

    #[test]
    fn stability_probe_uses_wider_tolerance_while_crouched() {
        let floor = [Aabb::new(0.0, 520.0, 400.0, 40.0)];
        let r = resolver();
        let crouch = 0.6;
        let hh = r.half_height(crouch);
        // 4px above the surface: outside the standing tolerance, inside
        // the crouched one
        let y = 520.0 - hh - 4.0;
        let standing = r.resolve(100.0, 520.0 - 25.0 - 4.0, 0.0, 0.0, &floor, 1.0);
        assert!(!standing.contacts.grounded);
        let crouched = r.resolve(100.0, y, 0.0, 0.0, &floor, crouch);
        assert!(crouched.contacts.grounded);
    }

    #[test]
    fn fast_fall_skips_stability_probe() {
        let floor = [Aabb::new(0.0, 520.0, 400.0, 40.0)];
        let res = resolver().resolve(100.0, 493.0, 0.0, 400.0, &floor, 1.0);
        assert!(!res.contacts.grounded);
    }

    #[test]
    fn malformed_obstacle_is_coerced_not_fatal() {
        let obstacles = [
            Aabb::new(f32::NAN, 0.0, f32::INFINITY, 10.0),
            Aabb::new(0.0, 520.0, 400.0, 40.0),
        ];
        let res = resolver().resolve(100.0, 500.0, 0.0, 600.0, &obstacles, 1.0);
        assert!(res.contacts.grounded);
    }
}
