//! Seed derivation.
//!
//! Every random stream in a build is derived from the single build seed, so the
//! same seed always reproduces the same features and the same heights.

/// Derive a deterministic sub-seed from a build seed and a stream offset.
/// Same (seed, offset) always gives the same result.
#[inline]
pub fn derive_seed(seed: u64, offset: u64) -> u64 {
    (seed.wrapping_add(offset))
        .wrapping_mul(0x9e3779b97f4a7c15_u64)
        .wrapping_add(offset.wrapping_mul(0x6c078965_u64))
}

/// 32-bit variant for noise generators that take a `u32` seed.
#[inline]
pub fn derive_noise_seed(seed: u64, offset: u64) -> u32 {
    (derive_seed(seed, offset) >> 32) as u32
}

/// Stream offsets used by the pipeline.
pub mod streams {
    pub const FEATURES: u64 = 0;
    pub const FRACTAL_PERLIN: u64 = 1;
    pub const FRACTAL_SIMPLEX: u64 = 2;
}
