//! Feature descriptors that drive height synthesis.
//!
//! A [`FeatureSet`] is either configured directly or generated from
//! [`FeatureSettings`] with an injected random source, so the same seed always
//! yields the same peak, ridges or spots.

use std::f32::consts::PI;

use glam::Vec2;
use noise::{NoiseFn, Perlin, Simplex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use terrain_core::{derive_noise_seed, ensure_finite, streams, GridSpec, TerrainError, TerrainResult};

/// Where a vertex is when its height is evaluated, in the three coordinate
/// systems a feature may care about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    /// Normalized grid position in [0, 1]^2.
    pub uv: Vec2,
    /// Position in grid cells, in [0, size]^2.
    pub grid: Vec2,
    /// Position in world units (`grid * spacing`).
    pub world: Vec2,
}

/// Anything that can contribute a height at a sample point.
pub trait HeightSource {
    fn height_at(&self, point: &SamplePoint) -> f32;
}

/// Coordinate system used for the peak/ridge proximity test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdSpace {
    /// Sample in grid cells, the units the peak and ridges are placed in.
    #[default]
    Grid,
    /// Sample in UV space. With the usual threshold of 10 nearly every vertex
    /// passes the test, flattening the terrain into a plateau; kept for parity
    /// with older generated assets.
    Uv,
}

/// A single peak with ridges radiating out of it. Heights are a step function:
/// each feature within `threshold_distance` adds exactly `peak_height`.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakRidges {
    /// Peak location in grid cells.
    pub peak: Vec2,
    pub peak_height: f32,
    /// Ridge vectors relative to the peak; each ridge runs from `peak` to `peak + dir`.
    pub ridges: Vec<Vec2>,
    pub threshold_distance: f32,
    pub space: ThresholdSpace,
}

impl PeakRidges {
    fn validate(&self) -> TerrainResult<()> {
        ensure_finite("peak height", self.peak_height)?;
        ensure_finite("peak x", self.peak.x)?;
        ensure_finite("peak y", self.peak.y)?;
        ensure_finite("threshold distance", self.threshold_distance)?;
        if self.threshold_distance <= 0.0 {
            return Err(TerrainError::invalid_config("threshold distance must be positive"));
        }
        if self.ridges.is_empty() {
            return Err(TerrainError::invalid_config("peak needs at least one ridge"));
        }
        Ok(())
    }

    /// Endpoints of each ridge segment.
    pub fn ridge_segments(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.ridges.iter().map(move |dir| (self.peak, self.peak + *dir))
    }
}

impl HeightSource for PeakRidges {
    fn height_at(&self, point: &SamplePoint) -> f32 {
        let p = match self.space {
            ThresholdSpace::Grid => point.grid,
            ThresholdSpace::Uv => point.uv,
        };

        let mut z = 0.0;
        if p.distance(self.peak) < self.threshold_distance {
            z += self.peak_height;
        }
        for (start, end) in self.ridge_segments() {
            if point_segment_distance(p, start, end) < self.threshold_distance {
                z += self.peak_height;
            }
        }
        z
    }
}

/// Distance from `p` to the segment `a..b`.
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// One Gaussian blob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    /// Center in UV space.
    pub center: Vec2,
    /// Height weight, usually in [0.1, 1.0].
    pub height: f32,
}

/// Smooth superposition of Gaussian blobs sharing one spread.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianSpots {
    pub spots: Vec<Spot>,
    pub sigma: f32,
    pub noise_scale: f32,
}

impl GaussianSpots {
    /// `sigma` is derived as `0.1 * gaussian_scale`.
    pub fn new(spots: Vec<Spot>, gaussian_scale: f32, noise_scale: f32) -> Self {
        Self {
            spots,
            sigma: 0.1 * gaussian_scale,
            noise_scale,
        }
    }

    fn validate(&self) -> TerrainResult<()> {
        if self.spots.is_empty() {
            return Err(TerrainError::invalid_config("at least one gaussian spot is required"));
        }
        ensure_finite("sigma", self.sigma)?;
        ensure_finite("noise scale", self.noise_scale)?;
        ensure_usable_sigma(self.sigma)?;
        for spot in &self.spots {
            ensure_finite("spot height", spot.height)?;
            ensure_finite("spot center", spot.center.x + spot.center.y)?;
        }
        Ok(())
    }
}

/// `2 * sigma^2` is the Gaussian denominator and must be a normal positive
/// float, otherwise a sample on a spot center evaluates `0 / 0`.
fn ensure_usable_sigma(sigma: f32) -> TerrainResult<()> {
    let two_sigma_sq = 2.0 * sigma * sigma;
    if sigma <= 0.0 || !two_sigma_sq.is_normal() {
        return Err(TerrainError::invalid_config(format!(
            "gaussian spread {sigma} is too small (2 * sigma^2 = {two_sigma_sq})"
        )));
    }
    Ok(())
}

impl HeightSource for GaussianSpots {
    fn height_at(&self, point: &SamplePoint) -> f32 {
        let two_sigma_sq = 2.0 * self.sigma * self.sigma;
        self.spots
            .iter()
            .map(|spot| {
                let d2 = point.uv.distance_squared(spot.center);
                spot.height * (-d2 / two_sigma_sq).exp() * self.noise_scale
            })
            .sum()
    }
}

/// Fractal Perlin/Simplex noise sampled in world units.
#[derive(Debug, Clone)]
pub struct FractalNoise {
    perlin: Perlin,
    simplex: Simplex,
    pub settings: FractalSettings,
}

impl FractalNoise {
    pub fn new(seed: u64, settings: FractalSettings) -> Self {
        Self {
            perlin: Perlin::new(derive_noise_seed(seed, streams::FRACTAL_PERLIN)),
            simplex: Simplex::new(derive_noise_seed(seed, streams::FRACTAL_SIMPLEX)),
            settings,
        }
    }

    /// Octave sum normalized to [0, 1].
    fn fractal(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.settings.frequency;
        let mut max_value = 0.0;

        for _ in 0..self.settings.octaves {
            // Mix Perlin and Simplex for variety
            let perlin_sample = self.perlin.get([x * frequency, y * frequency]);
            let simplex_sample = self.simplex.get([x * frequency + 1000.0, y * frequency + 1000.0]);

            value += (perlin_sample * 0.7 + simplex_sample * 0.3) * amplitude;
            max_value += amplitude;

            amplitude *= self.settings.persistence;
            frequency *= self.settings.lacunarity;
        }

        ((value / max_value + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

impl HeightSource for FractalNoise {
    fn height_at(&self, point: &SamplePoint) -> f32 {
        self.fractal(point.world.x as f64, point.world.y as f64) as f32 * self.settings.height_scale
    }
}

/// Concrete features for one build.
#[derive(Debug, Clone)]
pub enum FeatureSet {
    PeakRidges(PeakRidges),
    GaussianSpots(GaussianSpots),
    Fractal(FractalNoise),
}

impl FeatureSet {
    pub fn validate(&self) -> TerrainResult<()> {
        match self {
            FeatureSet::PeakRidges(p) => p.validate(),
            FeatureSet::GaussianSpots(g) => g.validate(),
            FeatureSet::Fractal(f) => f.settings.validate(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeatureSet::PeakRidges(_) => "peak+ridges",
            FeatureSet::GaussianSpots(_) => "gaussian spots",
            FeatureSet::Fractal(_) => "fractal noise",
        }
    }
}

impl HeightSource for FeatureSet {
    fn height_at(&self, point: &SamplePoint) -> f32 {
        match self {
            FeatureSet::PeakRidges(p) => p.height_at(point),
            FeatureSet::GaussianSpots(g) => g.height_at(point),
            FeatureSet::Fractal(f) => f.height_at(point),
        }
    }
}

/// Peak and ridge generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakRidgeSettings {
    pub peak_height: f32,
    pub min_ridges: u32,
    pub max_ridges: u32,
    pub min_ridge_distance: f32,
    pub max_ridge_distance: f32,
    /// Random offset applied to each evenly spaced ridge angle, in degrees.
    pub angle_jitter_degrees: f32,
    pub threshold_distance: f32,
    pub threshold_space: ThresholdSpace,
}

impl Default for PeakRidgeSettings {
    fn default() -> Self {
        Self {
            peak_height: 100.0,
            min_ridges: 3,
            max_ridges: 5,
            min_ridge_distance: 50.0,
            max_ridge_distance: 150.0,
            angle_jitter_degrees: 15.0,
            threshold_distance: 10.0,
            threshold_space: ThresholdSpace::Grid,
        }
    }
}

impl PeakRidgeSettings {
    pub fn validate(&self) -> TerrainResult<()> {
        ensure_finite("peak height", self.peak_height)?;
        ensure_finite("min ridge distance", self.min_ridge_distance)?;
        ensure_finite("max ridge distance", self.max_ridge_distance)?;
        ensure_finite("angle jitter", self.angle_jitter_degrees)?;
        ensure_finite("threshold distance", self.threshold_distance)?;
        if self.min_ridges < 1 {
            return Err(TerrainError::invalid_config("ridge count must be at least 1"));
        }
        if self.min_ridges > self.max_ridges {
            return Err(TerrainError::invalid_config(format!(
                "ridge count range {}..={} is empty",
                self.min_ridges, self.max_ridges
            )));
        }
        if self.min_ridge_distance < 0.0 || self.min_ridge_distance > self.max_ridge_distance {
            return Err(TerrainError::invalid_config(format!(
                "ridge distance range {}..={} is invalid",
                self.min_ridge_distance, self.max_ridge_distance
            )));
        }
        if self.angle_jitter_degrees < 0.0 {
            return Err(TerrainError::invalid_config("angle jitter must not be negative"));
        }
        if self.threshold_distance <= 0.0 {
            return Err(TerrainError::invalid_config("threshold distance must be positive"));
        }
        Ok(())
    }

    /// Peak uniformly inside the terrain, evenly spaced jittered ridges.
    pub fn generate<R: Rng>(&self, spec: &GridSpec, rng: &mut R) -> PeakRidges {
        let size = spec.size as f32;
        let peak = Vec2::new(rng.gen::<f32>() * size, rng.gen::<f32>() * size);

        let count = rng.gen_range(self.min_ridges..=self.max_ridges);
        let angle_step = 360.0 / count as f32;
        let jitter = self.angle_jitter_degrees;

        let ridges = (0..count)
            .map(|i| {
                let angle = i as f32 * angle_step + rng.gen_range(-jitter..=jitter);
                let rad = angle * PI / 180.0;
                let distance = rng.gen_range(self.min_ridge_distance..=self.max_ridge_distance);
                Vec2::new(rad.cos(), rad.sin()) * distance
            })
            .collect();

        PeakRidges {
            peak,
            peak_height: self.peak_height,
            ridges,
            threshold_distance: self.threshold_distance,
            space: self.threshold_space,
        }
    }
}

/// Gaussian spot generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianSettings {
    pub num_spots: u32,
    /// Spread multiplier; sigma is `0.1 * gaussian_scale` in UV units.
    pub gaussian_scale: f32,
    /// Height multiplier applied to every spot.
    pub noise_scale: f32,
}

impl Default for GaussianSettings {
    fn default() -> Self {
        Self {
            num_spots: 10,
            gaussian_scale: 1.0,
            noise_scale: 20.0,
        }
    }
}

impl GaussianSettings {
    pub fn validate(&self) -> TerrainResult<()> {
        ensure_finite("gaussian scale", self.gaussian_scale)?;
        ensure_finite("noise scale", self.noise_scale)?;
        if self.num_spots < 1 {
            return Err(TerrainError::invalid_config("num_spots must be at least 1"));
        }
        if self.gaussian_scale <= 0.0 {
            return Err(TerrainError::invalid_config("gaussian scale must be positive"));
        }
        ensure_usable_sigma(0.1 * self.gaussian_scale)
    }

    pub fn generate<R: Rng>(&self, rng: &mut R) -> GaussianSpots {
        let spots = (0..self.num_spots)
            .map(|_| Spot {
                center: Vec2::new(rng.gen::<f32>(), rng.gen::<f32>()),
                height: rng.gen_range(0.1..=1.0),
            })
            .collect();
        GaussianSpots::new(spots, self.gaussian_scale, self.noise_scale)
    }
}

/// Fractal noise parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalSettings {
    /// Maximum height of the noise field.
    pub height_scale: f32,
    /// Base frequency in cycles per world unit (lower = smoother).
    pub frequency: f64,
    pub octaves: u32,
    /// Frequency multiplier per octave.
    pub lacunarity: f64,
    /// Amplitude multiplier per octave.
    pub persistence: f64,
}

impl Default for FractalSettings {
    fn default() -> Self {
        Self {
            height_scale: 20.0,
            frequency: 0.0005,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
        }
    }
}

impl FractalSettings {
    pub fn validate(&self) -> TerrainResult<()> {
        ensure_finite("height scale", self.height_scale)?;
        if self.octaves < 1 {
            return Err(TerrainError::invalid_config("octaves must be at least 1"));
        }
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(TerrainError::invalid_config("frequency must be positive"));
        }
        if !(self.lacunarity.is_finite() && self.persistence.is_finite()) {
            return Err(TerrainError::invalid_config("lacunarity and persistence must be finite"));
        }
        Ok(())
    }
}

/// Which feature scheme to generate, with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureSettings {
    PeakRidges(PeakRidgeSettings),
    GaussianSpots(GaussianSettings),
    Fractal(FractalSettings),
}

impl Default for FeatureSettings {
    fn default() -> Self {
        FeatureSettings::GaussianSpots(GaussianSettings::default())
    }
}

impl FeatureSettings {
    pub fn validate(&self) -> TerrainResult<()> {
        match self {
            FeatureSettings::PeakRidges(s) => s.validate(),
            FeatureSettings::GaussianSpots(s) => s.validate(),
            FeatureSettings::Fractal(s) => s.validate(),
        }
    }

    /// Generate concrete features. `seed` feeds noise generators that do not
    /// draw from `rng`.
    pub fn generate<R: Rng>(
        &self,
        spec: &GridSpec,
        seed: u64,
        rng: &mut R,
    ) -> TerrainResult<FeatureSet> {
        self.validate()?;
        let features = match self {
            FeatureSettings::PeakRidges(s) => FeatureSet::PeakRidges(s.generate(spec, rng)),
            FeatureSettings::GaussianSpots(s) => FeatureSet::GaussianSpots(s.generate(rng)),
            FeatureSettings::Fractal(s) => FeatureSet::Fractal(FractalNoise::new(seed, s.clone())),
        };
        Ok(features)
    }
}
