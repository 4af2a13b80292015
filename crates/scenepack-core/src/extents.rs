//! World-space bounding extents

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounds of a model's geometry with derived center and diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extents {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
    /// Length of the box diagonal, `|max - min|`
    pub diagonal: f32,
}

impl Extents {
    /// Extents of a scene without any vertices.
    pub const EMPTY: Extents = Extents {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
        center: Vec3::ZERO,
        diagonal: 0.0,
    };

    /// Build extents from box corners.
    pub fn from_corners(min: Vec3, max: Vec3) -> Self {
        Self {
            min,
            max,
            center: (min + max) / 2.0,
            diagonal: (max - min).length(),
        }
    }

    /// Edge lengths of the box
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

impl Default for Extents {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Running per-axis min/max over a stream of points.
///
/// Each axis is tracked independently, so the final corners are generally
/// not points of the input.
#[derive(Debug, Clone, Copy)]
pub struct ExtentsBuilder {
    min: Vec3,
    max: Vec3,
    points: usize,
}

impl ExtentsBuilder {
    pub fn new() -> Self {
        Self {
            min: Vec3::INFINITY,
            max: Vec3::NEG_INFINITY,
            points: 0,
        }
    }

    /// Grow the bounds to contain `point`.
    pub fn include(&mut self, point: Vec3) {
        for axis in 0..3 {
            if point[axis] < self.min[axis] {
                self.min[axis] = point[axis];
            }
            if point[axis] > self.max[axis] {
                self.max[axis] = point[axis];
            }
        }
        self.points += 1;
    }

    /// Transform a local-space `point` by `transform` (w = 1) and include it.
    pub fn include_transformed(&mut self, transform: &Mat4, point: Vec3) {
        self.include(transform.transform_point3(point));
    }

    /// Number of points included so far
    pub fn points(&self) -> usize {
        self.points
    }

    pub fn finish(self) -> Extents {
        if self.points == 0 {
            return Extents::EMPTY;
        }
        Extents::from_corners(self.min, self.max)
    }
}

impl Default for ExtentsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_yields_zero_extents() {
        let extents = ExtentsBuilder::new().finish();
        assert_eq!(extents, Extents::EMPTY);
        assert_eq!(extents.diagonal, 0.0);
    }

    #[test]
    fn test_axes_are_tracked_independently() {
        let mut builder = ExtentsBuilder::new();
        builder.include(Vec3::new(0.0, 5.0, -1.0));
        builder.include(Vec3::new(3.0, -2.0, 0.0));

        let extents = builder.finish();
        assert_eq!(extents.min, Vec3::new(0.0, -2.0, -1.0));
        assert_eq!(extents.max, Vec3::new(3.0, 5.0, 0.0));
        assert_eq!(extents.size(), Vec3::new(3.0, 7.0, 1.0));
    }

    #[test]
    fn test_single_point_has_zero_diagonal() {
        let mut builder = ExtentsBuilder::new();
        builder.include(Vec3::new(1.0, 2.0, 3.0));
        let extents = builder.finish();
        assert_eq!(extents.min, extents.max);
        assert_eq!(extents.center, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(extents.diagonal, 0.0);
    }

    #[test]
    fn test_origin_point_is_counted() {
        let mut builder = ExtentsBuilder::new();
        builder.include(Vec3::ZERO);
        assert_eq!(builder.points(), 1);
        assert_eq!(builder.finish(), Extents::EMPTY);
    }

    #[test]
    fn test_include_transformed_translates_point() {
        let mut builder = ExtentsBuilder::new();
        let transform = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        builder.include_transformed(&transform, Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(builder.points(), 1);
        assert_eq!(builder.finish().max, Vec3::new(7.0, 2.0, 0.0));
    }

    #[test]
    fn test_from_corners_center_and_diagonal() {
        let extents = Extents::from_corners(Vec3::ZERO, Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(extents.center, Vec3::new(1.0, 1.0, 0.0));
        assert!((extents.diagonal - 8.0_f32.sqrt()).abs() < 1e-6);
    }
}
