//! Read-only level seam
//!
//! The map collaborator owns obstacle geometry; the core sees it through
//! [`ObstacleSource`] for the lifetime of a loaded map and never mutates
//! it.

use crate::geom::Aabb;

/// Horizontal playable extent of the level
#[derive(Debug, Clone, Copy)]
pub struct LevelBounds {
    pub min_x: f32,
    pub max_x: f32,
}

impl LevelBounds {
    /// Clamp a player center into bounds, accounting for the half width
    pub fn clamp_center(&self, x: f32, half_w: f32) -> f32 {
        x.clamp(self.min_x + half_w, self.max_x - half_w)
    }
}

impl Default for LevelBounds {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            max_x: 1920.0,
        }
    }
}

/// Static obstacle provider implemented by the map collaborator
pub trait ObstacleSource: Send + Sync {
    /// All static obstacle rectangles for the loaded map
    fn obstacles(&self) -> &[Aabb];

    /// Horizontal bounds of the loaded map
    fn bounds(&self) -> LevelBounds;
}

/// Straightforward obstacle source over an owned rectangle list
#[derive(Debug, Clone, Default)]
pub struct StaticLevel {
    obstacles: Vec<Aabb>,
    bounds: LevelBounds,
}

impl StaticLevel {
    pub fn new(obstacles: Vec<Aabb>, bounds: LevelBounds) -> Self {
        Self { obstacles, bounds }
    }
}

impl ObstacleSource for StaticLevel {
    fn obstacles(&self) -> &[Aabb] {
        &self.obstacles
    }

    fn bounds(&self) -> LevelBounds {
        self.bounds
    }
}
