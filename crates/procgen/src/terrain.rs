//! Terrain builds: features → heights → erosion → colors.
//!
//! **Seed-based determinism:** every random draw in a build comes from a
//! generator seeded with `settings.seed`, so the same settings always produce
//! the same buffers, bit for bit.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use terrain_core::{derive_seed, streams, GridSpec, Rgb8, TerrainResult};

use crate::colorize::{colorize, ColorRamp};
use crate::erosion::{erode, ErosionSettings, ErosionTrace};
use crate::features::{FeatureSet, FeatureSettings, HeightSource};
use crate::grid::GridMesh;
use crate::heightfield::HeightField;

/// Everything needed to reproduce one terrain build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    pub grid: GridSpec,
    /// Seed for feature placement and noise.
    pub seed: u64,
    pub features: FeatureSettings,
    /// Thermal erosion pass; `None` skips it.
    pub erosion: Option<ErosionSettings>,
    pub ramp: ColorRamp,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            grid: GridSpec::default(),
            seed: 0,
            features: FeatureSettings::default(),
            erosion: Some(ErosionSettings::default()),
            ramp: ColorRamp::RedGreen,
        }
    }
}

impl TerrainSettings {
    /// Check every parameter up front so a failing build allocates nothing.
    pub fn validate(&self) -> TerrainResult<()> {
        self.grid.validate()?;
        self.features.validate()?;
        if let Some(erosion) = &self.erosion {
            erosion.validate()?;
        }
        Ok(())
    }
}

/// Buffers and intermediate results of one build. Constructed fresh per
/// build and never updated incrementally.
#[derive(Debug, Clone)]
pub struct TerrainBuildContext {
    pub grid: GridMesh,
    pub features: FeatureSet,
    pub heightfield: HeightField,
    /// Present when erosion ran.
    pub erosion: Option<ErosionTrace>,
    /// Height colors, one per vertex.
    pub colors: Vec<Rgb8>,
    /// Erosion-magnitude colors, present when erosion ran.
    pub erosion_colors: Option<Vec<Rgb8>>,
}

impl TerrainBuildContext {
    /// Generate features from the settings and build the terrain.
    pub fn build(settings: &TerrainSettings) -> TerrainResult<Self> {
        settings.validate()?;

        let mut rng = StdRng::seed_from_u64(derive_seed(settings.seed, streams::FEATURES));
        let features = settings
            .features
            .generate(&settings.grid, settings.seed, &mut rng)?;
        Self::build_inner(settings.grid, features, settings.erosion.as_ref(), &settings.ramp)
    }

    /// Build from explicitly configured features.
    pub fn from_features(
        grid: GridSpec,
        features: FeatureSet,
        erosion: Option<&ErosionSettings>,
        ramp: &ColorRamp,
    ) -> TerrainResult<Self> {
        grid.validate()?;
        features.validate()?;
        if let Some(erosion) = erosion {
            erosion.validate()?;
        }
        Self::build_inner(grid, features, erosion, ramp)
    }

    fn build_inner(
        spec: GridSpec,
        features: FeatureSet,
        erosion: Option<&ErosionSettings>,
        ramp: &ColorRamp,
    ) -> TerrainResult<Self> {
        let grid = GridMesh::build(spec)?;
        log_features(&features);

        let mut heightfield = HeightField::synthesize(&grid, &features);
        log::debug!(
            "Synthesized {} heights in [{}, {}]",
            heightfield.len(),
            heightfield.min,
            heightfield.max
        );

        let trace = match erosion {
            Some(settings) => {
                let mass_before = heightfield.total();
                let trace = erode(&mut heightfield.heights, grid.dims(), settings)?;
                heightfield.recompute_range();
                log::debug!(
                    "Erosion mass drift: {:.6}",
                    heightfield.total() - mass_before
                );
                Some(trace)
            }
            None => None,
        };

        let colors = colorize(&heightfield.heights, heightfield.min, heightfield.max, ramp);
        let erosion_colors = trace.as_ref().map(|t| {
            let (lo, hi) = t.range();
            colorize(&t.amounts, lo, hi, ramp)
        });

        if let Some((index, z)) = heightfield.highest() {
            let p = grid.positions[index];
            log::info!("Highest vertex: X={} Y={} Z={}", p.x, p.y, z);
        }
        log::info!(
            "Built {} terrain: {} vertices, {} triangles, heights [{:.3}, {:.3}]{}",
            features.name(),
            grid.vertex_count(),
            grid.triangle_count(),
            heightfield.min,
            heightfield.max,
            if trace.is_some() { ", eroded" } else { "" }
        );

        Ok(Self {
            grid,
            features,
            heightfield,
            erosion: trace,
            colors,
            erosion_colors,
        })
    }

    /// Vertex positions with heights applied as `z`.
    pub fn vertices(&self) -> Vec<Vec3> {
        self.grid
            .positions
            .iter()
            .zip(&self.heightfield.heights)
            .map(|(p, &z)| Vec3::new(p.x, p.y, z))
            .collect()
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.grid.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.grid.indices
    }

    pub fn colors(&self) -> &[Rgb8] {
        &self.colors
    }

    pub fn spec(&self) -> GridSpec {
        self.grid.spec
    }

    /// Height contribution the features would give at an arbitrary UV, before
    /// erosion. Useful for previews at a different resolution.
    pub fn feature_height_at(&self, uv: Vec2) -> f32 {
        let spec = self.grid.spec;
        let grid = uv * spec.size as f32;
        self.features.height_at(&crate::features::SamplePoint {
            uv,
            grid,
            world: grid * spec.spacing,
        })
    }
}

fn log_features(features: &FeatureSet) {
    match features {
        FeatureSet::PeakRidges(p) => {
            log::info!(
                "Peak location: X={} Y={} Z={} with {} ridges",
                p.peak.x,
                p.peak.y,
                p.peak_height,
                p.ridges.len()
            );
            for (start, end) in p.ridge_segments() {
                log::debug!("Ridge from {start} to {end}");
            }
        }
        FeatureSet::GaussianSpots(g) => {
            log::debug!("{} gaussian spots, sigma {}", g.spots.len(), g.sigma);
        }
        FeatureSet::Fractal(f) => {
            log::debug!("Fractal noise, {} octaves", f.settings.octaves);
        }
    }
}

/// Owns the current terrain snapshot. Regeneration builds a new context and
/// swaps it in whole; readers holding the old `Arc` keep a consistent view.
#[derive(Debug)]
pub struct Terrain {
    settings: TerrainSettings,
    current: Arc<TerrainBuildContext>,
}

impl Terrain {
    pub fn new(settings: TerrainSettings) -> TerrainResult<Self> {
        let current = Arc::new(TerrainBuildContext::build(&settings)?);
        Ok(Self { settings, current })
    }

    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<TerrainBuildContext> {
        Arc::clone(&self.current)
    }

    /// Rebuild with a new seed. On error the previous snapshot and settings
    /// stay in place.
    pub fn regenerate(&mut self, seed: u64) -> TerrainResult<Arc<TerrainBuildContext>> {
        let settings = TerrainSettings {
            seed,
            ..self.settings.clone()
        };
        self.apply(settings)
    }

    /// Rebuild with entirely new settings.
    pub fn apply(&mut self, settings: TerrainSettings) -> TerrainResult<Arc<TerrainBuildContext>> {
        let next = Arc::new(TerrainBuildContext::build(&settings)?);
        self.settings = settings;
        self.current = Arc::clone(&next);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erosion::RelaxationScheme;
    use crate::features::{GaussianSettings, GaussianSpots, PeakRidgeSettings, Spot};

    fn small_settings(seed: u64) -> TerrainSettings {
        TerrainSettings {
            grid: GridSpec::new(24, 2.0),
            seed,
            features: FeatureSettings::GaussianSpots(GaussianSettings::default()),
            erosion: Some(ErosionSettings {
                iterations: 10,
                ..Default::default()
            }),
            ramp: ColorRamp::RedGreen,
        }
    }

    /// Same seed and settings must produce identical heightfields.
    #[test]
    fn build_is_deterministic_for_a_seed() {
        for features in [
            FeatureSettings::GaussianSpots(GaussianSettings::default()),
            FeatureSettings::PeakRidges(PeakRidgeSettings::default()),
            FeatureSettings::Fractal(Default::default()),
        ] {
            let settings = TerrainSettings {
                features,
                ..small_settings(98765)
            };
            let a = TerrainBuildContext::build(&settings).unwrap();
            let b = TerrainBuildContext::build(&settings).unwrap();
            assert_eq!(a.heightfield.heights.len(), b.heightfield.heights.len());
            for (i, (ha, hb)) in a.heightfield.heights.iter().zip(&b.heightfield.heights).enumerate() {
                assert_eq!(ha.to_bits(), hb.to_bits(), "heights[{}] should match for same seed", i);
            }
            assert_eq!(a.colors, b.colors);
        }
    }

    /// Different seeds must produce different terrain.
    #[test]
    fn different_seed_different_heights() {
        let a = TerrainBuildContext::build(&small_settings(11111)).unwrap();
        let b = TerrainBuildContext::build(&small_settings(22222)).unwrap();
        assert_ne!(a.heightfield.heights, b.heightfield.heights);
    }

    #[test]
    fn buffers_line_up() {
        let ctx = TerrainBuildContext::build(&small_settings(1)).unwrap();
        let n = 25 * 25;
        assert_eq!(ctx.vertices().len(), n);
        assert_eq!(ctx.uvs().len(), n);
        assert_eq!(ctx.colors().len(), n);
        assert_eq!(ctx.indices().len(), 6 * 24 * 24);
        assert_eq!(ctx.erosion.as_ref().map(|t| t.amounts.len()), Some(n));
        assert_eq!(ctx.erosion_colors.as_ref().map(Vec::len), Some(n));
        assert_eq!(ctx.vertices()[ctx.grid.index(3, 7)].x, 6.0);
        assert_eq!(ctx.vertices()[ctx.grid.index(3, 7)].y, 14.0);
    }

    #[test]
    fn centered_spot_end_to_end() {
        let spots = GaussianSpots::new(
            vec![Spot {
                center: Vec2::new(0.5, 0.5),
                height: 1.0,
            }],
            1.0,
            1.0,
        );
        let ctx = TerrainBuildContext::from_features(
            GridSpec::new(2, 1.0),
            FeatureSet::GaussianSpots(spots),
            None,
            &ColorRamp::RedGreen,
        )
        .unwrap();

        let heights = &ctx.heightfield.heights;
        let center = heights[ctx.grid.index(1, 1)];
        assert!(heights.iter().all(|&h| h <= center));
        for (x, y) in [(0, 0), (0, 2), (2, 0), (2, 2)] {
            assert_eq!(heights[ctx.grid.index(x, y)], ctx.heightfield.min);
        }
        assert_eq!(ctx.colors[ctx.grid.index(1, 1)], Rgb8::GREEN);
        assert_eq!(ctx.colors[ctx.grid.index(0, 0)], Rgb8::RED);
        assert!(ctx.erosion.is_none());
    }

    #[test]
    fn erosion_conserves_mass_end_to_end() {
        for scheme in [RelaxationScheme::GaussSeidel, RelaxationScheme::Jacobi] {
            let mut settings = small_settings(5);
            let plain = TerrainBuildContext::build(&TerrainSettings {
                erosion: None,
                ..settings.clone()
            })
            .unwrap();
            settings.erosion = Some(ErosionSettings {
                iterations: 30,
                talus_angle: 0.1,
                scheme,
            });
            let eroded = TerrainBuildContext::build(&settings).unwrap();

            let before = plain.heightfield.total();
            let after = eroded.heightfield.total();
            assert!((before - after).abs() < before.abs() * 1e-4 + 1e-3, "{scheme:?}");
            assert!(eroded.heightfield.max <= plain.heightfield.max + 1e-4);
            assert!(eroded.heightfield.min >= plain.heightfield.min - 1e-4);
        }
    }

    #[test]
    fn invalid_settings_fail_the_whole_build() {
        let mut settings = small_settings(1);
        settings.grid.size = 0;
        assert!(TerrainBuildContext::build(&settings).is_err());

        let mut settings = small_settings(1);
        settings.features = FeatureSettings::GaussianSpots(GaussianSettings {
            num_spots: 0,
            ..Default::default()
        });
        assert!(TerrainBuildContext::build(&settings).is_err());
    }

    #[test]
    fn regenerate_swaps_snapshot_and_keeps_old_on_error() {
        let mut terrain = Terrain::new(small_settings(1)).unwrap();
        let first = terrain.snapshot();

        let second = terrain.regenerate(2).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &terrain.snapshot()));
        assert_eq!(terrain.settings().seed, 2);
        // The old snapshot is untouched.
        assert_eq!(first.heightfield.len(), 25 * 25);

        let mut broken = small_settings(3);
        broken.grid.spacing = -1.0;
        assert!(terrain.apply(broken).is_err());
        assert!(Arc::ptr_eq(&second, &terrain.snapshot()));
        assert_eq!(terrain.settings().seed, 2);
    }
}
