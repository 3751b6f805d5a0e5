//! Thermal erosion: talus-limited relaxation between axis-aligned neighbors.
//!
//! Whenever a vertex stands more than `talus_angle` above a neighbor, half of
//! the excess moves downhill. Material is only ever moved, never created, so
//! the sum of heights is conserved and no height leaves the starting range.

use serde::{Deserialize, Serialize};
use terrain_core::{ensure_finite, TerrainError, TerrainResult};

use crate::grid::GridDims;

/// Update order for one erosion iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelaxationScheme {
    /// Sequential scan in vertex index order; each transfer is applied
    /// immediately and later vertices see the updated heights.
    #[default]
    GaussSeidel,
    /// Every transfer in an iteration is computed from the heights at the start
    /// of that iteration and applied afterwards. Each edge moves a quarter of
    /// the Gauss-Seidel amount so up to four simultaneous outflows cannot
    /// overshoot.
    Jacobi,
}

/// Thermal erosion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErosionSettings {
    pub iterations: u32,
    /// Height difference between neighbors below which nothing moves.
    pub talus_angle: f32,
    pub scheme: RelaxationScheme,
}

impl Default for ErosionSettings {
    fn default() -> Self {
        Self {
            iterations: 100,
            talus_angle: 0.1,
            scheme: RelaxationScheme::GaussSeidel,
        }
    }
}

impl ErosionSettings {
    pub fn validate(&self) -> TerrainResult<()> {
        ensure_finite("talus angle", self.talus_angle)?;
        if self.talus_angle < 0.0 {
            return Err(TerrainError::invalid_config("talus angle must not be negative"));
        }
        Ok(())
    }
}

/// Accumulated material moved through each vertex. Both ends of every
/// transfer are credited, so entries are never negative.
#[derive(Debug, Clone, PartialEq)]
pub struct ErosionTrace {
    pub amounts: Vec<f32>,
}

impl ErosionTrace {
    pub fn new(len: usize) -> Self {
        Self {
            amounts: vec![0.0; len],
        }
    }

    /// `(min, max)` of the trace, for colorizing.
    pub fn range(&self) -> (f32, f32) {
        self.amounts
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &a| (lo.min(a), hi.max(a)))
    }

    pub fn total(&self) -> f64 {
        self.amounts.iter().map(|&a| a as f64).sum()
    }

    #[inline]
    fn credit(&mut self, a: usize, b: usize, amount: f32) {
        self.amounts[a] += amount;
        self.amounts[b] += amount;
    }
}

/// Share of the excess slope moved across one edge.
const TRANSFER_RATE: f32 = 0.5;
/// Extra damping for the Jacobi scheme (one share per possible neighbor).
const JACOBI_SHARE: f32 = 0.25;

/// Erode `heights` in place over the lattice `dims` and return the trace.
pub fn erode(
    heights: &mut [f32],
    dims: GridDims,
    settings: &ErosionSettings,
) -> TerrainResult<ErosionTrace> {
    settings.validate()?;
    if heights.len() != dims.len() {
        return Err(TerrainError::invalid_config(format!(
            "heightfield has {} entries but the grid has {}",
            heights.len(),
            dims.len()
        )));
    }

    let mut trace = ErosionTrace::new(heights.len());
    match settings.scheme {
        RelaxationScheme::GaussSeidel => {
            for _ in 0..settings.iterations {
                gauss_seidel_step(heights, dims, settings.talus_angle, &mut trace);
            }
        }
        RelaxationScheme::Jacobi => {
            let mut snapshot = heights.to_vec();
            let mut deltas = vec![0.0f32; heights.len()];
            for _ in 0..settings.iterations {
                snapshot.copy_from_slice(heights);
                deltas.fill(0.0);
                jacobi_step(&snapshot, &mut deltas, dims, settings.talus_angle, &mut trace);
                for (h, d) in heights.iter_mut().zip(&deltas) {
                    *h += d;
                }
            }
        }
    }

    log::debug!(
        "Eroded {} vertices for {} iterations ({:?}), moved {:.3}",
        heights.len(),
        settings.iterations,
        settings.scheme,
        trace.total() * 0.5
    );
    Ok(trace)
}

fn gauss_seidel_step(heights: &mut [f32], dims: GridDims, talus: f32, trace: &mut ErosionTrace) {
    for x in 0..dims.columns {
        for y in 0..dims.rows {
            let v = dims.index(x, y);
            for n in dims.neighbors(x, y).into_iter().flatten() {
                let slope = heights[v] - heights[n];
                if slope > talus {
                    let amount = (slope - talus) * TRANSFER_RATE;
                    heights[v] -= amount;
                    heights[n] += amount;
                    trace.credit(v, n, amount);
                }
            }
        }
    }
}

fn jacobi_step(
    snapshot: &[f32],
    deltas: &mut [f32],
    dims: GridDims,
    talus: f32,
    trace: &mut ErosionTrace,
) {
    for x in 0..dims.columns {
        for y in 0..dims.rows {
            let v = dims.index(x, y);
            for n in dims.neighbors(x, y).into_iter().flatten() {
                let slope = snapshot[v] - snapshot[n];
                if slope > talus {
                    let amount = (slope - talus) * TRANSFER_RATE * JACOBI_SHARE;
                    deltas[v] -= amount;
                    deltas[n] += amount;
                    trace.credit(v, n, amount);
                }
            }
        }
    }
}
