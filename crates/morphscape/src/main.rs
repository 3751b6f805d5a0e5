//! Morphscape - procedural terrain mesh generator.
//!
//! Builds one terrain from a RON config and stores it as an OBJ asset with
//! optional PNG previews of the height and erosion colors.

mod config;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use mesh_asset::{write_color_preview, AssetSink, ObjAssetSink, StaticMesh};
use procgen::TerrainBuildContext;

use crate::config::{default_config_path, AppConfig};

const USAGE: &str = "usage: morphscape [CONFIG] [--seed N] [--init]";

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config: Option<PathBuf>,
    seed: Option<u64>,
    /// Write the default config to `morphscape.ron` (or CONFIG) and exit.
    init: bool,
}

impl CliArgs {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--seed" => {
                    let value = args.next().context("--seed needs a value")?;
                    let seed = value
                        .parse()
                        .with_context(|| format!("invalid seed {:?}", value))?;
                    parsed.seed = Some(seed);
                }
                "--init" => parsed.init = true,
                "-h" | "--help" => bail!("{USAGE}"),
                flag if flag.starts_with('-') => bail!("unknown option {flag}\n{USAGE}"),
                path => {
                    if parsed.config.is_some() {
                        bail!("only one config path may be given\n{USAGE}");
                    }
                    parsed.config = Some(PathBuf::from(path));
                }
            }
        }
        Ok(parsed)
    }
}

fn run(config: &AppConfig) -> Result<()> {
    let ctx = TerrainBuildContext::build(&config.terrain).context("Terrain build failed")?;
    let mesh = StaticMesh::from_build(config.asset_name.as_str(), &ctx)
        .context("Could not materialize terrain mesh")?;

    let mut sink = ObjAssetSink::new(&config.output_dir);
    let handle = sink.store(&mesh)?;

    // Settings snapshot next to the mesh so the asset can be regenerated.
    let settings_path = config.output_dir.join(format!("{}.ron", config.asset_name));
    config.save(&settings_path)?;

    if config.write_previews {
        let spec = ctx.spec();
        let height_path = config.output_dir.join(format!("{}_height.png", config.asset_name));
        write_color_preview(&height_path, &spec, ctx.colors())?;

        if let Some(colors) = &ctx.erosion_colors {
            let erosion_path = config.output_dir.join(format!("{}_erosion.png", config.asset_name));
            write_color_preview(&erosion_path, &spec, colors)?;
        }
    }

    log::info!(
        "Generated '{}' ({} triangles, bounds {} .. {})",
        handle.name,
        mesh.triangle_count(),
        mesh.bounds.min,
        mesh.bounds.max
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse(std::env::args().skip(1))?;

    if args.init {
        let path = args.config.unwrap_or_else(default_config_path);
        if path.exists() {
            bail!("{:?} already exists", path);
        }
        AppConfig::default().save(&path)?;
        log::info!("Wrote default config to {:?}", path);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load_default(),
    };
    if let Some(seed) = args.seed {
        config.terrain.seed = seed;
    }

    log::info!(
        "Starting Morphscape: {}x{} grid, seed {}",
        config.terrain.grid.size,
        config.terrain.grid.size,
        config.terrain.seed
    );
    run(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use procgen::{ErosionSettings, FeatureSettings, GaussianSettings};
    use terrain_core::GridSpec;

    fn args(list: &[&str]) -> Result<CliArgs> {
        CliArgs::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_config_seed_and_init() {
        let parsed = args(&["hills.ron", "--seed", "42"]).unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("hills.ron")));
        assert_eq!(parsed.seed, Some(42));
        assert!(!parsed.init);
        assert!(args(&["--init"]).unwrap().init);
        assert_eq!(args(&[]).unwrap(), CliArgs::default());
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(args(&["--seed"]).is_err());
        assert!(args(&["--seed", "minus-one"]).is_err());
        assert!(args(&["--verbose"]).is_err());
        assert!(args(&["a.ron", "b.ron"]).is_err());
    }

    #[test]
    fn run_writes_mesh_previews_and_settings() {
        let dir = std::env::temp_dir().join(format!("morphscape-run-{}", std::process::id()));
        let mut config = AppConfig {
            output_dir: dir.clone(),
            asset_name: "smoke".to_string(),
            ..AppConfig::default()
        };
        config.terrain.grid = GridSpec::new(8, 10.0);
        config.terrain.features = FeatureSettings::GaussianSpots(GaussianSettings::default());
        config.terrain.erosion = Some(ErosionSettings {
            iterations: 5,
            ..Default::default()
        });

        run(&config).unwrap();
        for file in ["smoke.obj", "smoke.ron", "smoke_height.png", "smoke_erosion.png"] {
            assert!(dir.join(file).exists(), "missing {file}");
        }
        let saved = AppConfig::load_from(&dir.join("smoke.ron")).unwrap();
        assert_eq!(saved, config);
        std::fs::remove_dir_all(&dir).ok();
    }
}
