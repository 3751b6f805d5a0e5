//! Top-down PNG previews of per-vertex colors.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use image::{Rgb, RgbImage};
use terrain_core::{GridSpec, Rgb8};

/// One pixel per vertex, +X to the right and +Y up.
pub fn color_preview(spec: &GridSpec, colors: &[Rgb8]) -> Result<RgbImage> {
    let side = spec.side();
    ensure!(
        colors.len() == side * side,
        "expected {} colors for a {}x{} grid, got {}",
        side * side,
        spec.size,
        spec.size,
        colors.len()
    );

    let side_px = side as u32;
    Ok(RgbImage::from_fn(side_px, side_px, |px, py| {
        let x = px as usize;
        let y = side - 1 - py as usize;
        Rgb(colors[x * side + y].to_bytes())
    }))
}

/// Write a color preview PNG to `path`.
pub fn write_color_preview(path: &Path, spec: &GridSpec, colors: &[Rgb8]) -> Result<()> {
    let image = color_preview(spec, colors)?;
    image
        .save(path)
        .with_context(|| format!("Failed to write preview {:?}", path))?;
    log::info!("Wrote preview {:?}", path);
    Ok(())
}
