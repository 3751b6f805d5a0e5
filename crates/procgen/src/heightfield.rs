//! Per-vertex heights and their running range.

use glam::Vec2;

use crate::features::{HeightSource, SamplePoint};
use crate::grid::GridMesh;

/// Heights indexed like the grid's vertices, with the `(min, max)` observed
/// while they were written.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    pub heights: Vec<f32>,
    pub min: f32,
    pub max: f32,
}

impl HeightField {
    /// Evaluate `source` at every vertex of `grid`.
    pub fn synthesize<S: HeightSource + ?Sized>(grid: &GridMesh, source: &S) -> Self {
        let mut heights = Vec::with_capacity(grid.vertex_count());
        let mut min = f32::MAX;
        let mut max = f32::MIN;

        for (position, uv) in grid.positions.iter().zip(&grid.uvs) {
            let point = SamplePoint {
                uv: *uv,
                grid: *uv * grid.spec.size as f32,
                world: Vec2::new(position.x, position.y),
            };
            let z = source.height_at(&point);

            min = min.min(z);
            max = max.max(z);
            heights.push(z);
        }

        Self { heights, min, max }
    }

    /// Wrap existing heights, computing their range.
    pub fn from_heights(heights: Vec<f32>) -> Self {
        let mut field = Self {
            heights,
            min: 0.0,
            max: 0.0,
        };
        field.recompute_range();
        field
    }

    /// Refresh `(min, max)` after the heights were modified in place.
    pub fn recompute_range(&mut self) {
        let (min, max) = self
            .heights
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)));
        self.min = min;
        self.max = max;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Sum of all heights. Erosion moves height around but keeps this constant.
    pub fn total(&self) -> f64 {
        self.heights.iter().map(|&h| h as f64).sum()
    }

    /// Index and height of the highest vertex (first one on ties).
    pub fn highest(&self) -> Option<(usize, f32)> {
        self.heights
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, h)| match best {
                Some((_, bh)) if bh >= h => best,
                _ => Some((i, h)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{GaussianSpots, Spot};
    use terrain_core::GridSpec;

    struct Ramp;

    impl HeightSource for Ramp {
        fn height_at(&self, point: &SamplePoint) -> f32 {
            point.grid.x + 10.0 * point.grid.y
        }
    }

    #[test]
    fn tracks_range_while_writing() {
        let grid = GridMesh::build(GridSpec::new(2, 3.0)).unwrap();
        let field = HeightField::synthesize(&grid, &Ramp);
        assert_eq!(field.len(), 9);
        assert_eq!(field.min, 0.0);
        assert_eq!(field.max, 22.0);
        assert_eq!(field.heights[grid.index(1, 2)], 21.0);
        assert_eq!(field.highest(), Some((8, 22.0)));
    }

    #[test]
    fn single_spot_peaks_at_center() {
        let grid = GridMesh::build(GridSpec::new(2, 1.0)).unwrap();
        let spots = GaussianSpots::new(
            vec![Spot {
                center: Vec2::new(0.5, 0.5),
                height: 1.0,
            }],
            1.0,
            1.0,
        );
        let field = HeightField::synthesize(&grid, &spots);

        let center = field.heights[grid.index(1, 1)];
        assert_eq!(center, field.max);
        assert!((center - 1.0).abs() < 1e-6);

        for (x, y) in [(0, 0), (0, 2), (2, 0), (2, 2)] {
            let corner = field.heights[grid.index(x, y)];
            assert!((corner - field.min).abs() < 1e-9);
        }
        for (i, &h) in field.heights.iter().enumerate() {
            assert!(h <= center, "vertex {i} above center");
        }
    }

    #[test]
    fn recompute_range_after_edit() {
        let mut field = HeightField::from_heights(vec![1.0, 2.0, 3.0]);
        assert_eq!((field.min, field.max), (1.0, 3.0));
        field.heights[0] = -4.0;
        field.recompute_range();
        assert_eq!((field.min, field.max), (-4.0, 3.0));
        assert_eq!(field.total(), 1.0);
    }
}
