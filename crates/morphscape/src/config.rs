//! Host configuration. Loaded from a RON file at startup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use procgen::TerrainSettings;
use serde::{Deserialize, Serialize};

/// File looked up in the current directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "morphscape.ron";

/// Settings for one generator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory the mesh, previews and settings snapshot are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Asset name; becomes the file stem of every output.
    #[serde(default = "default_asset_name")]
    pub asset_name: String,
    /// Write PNG previews of the height (and erosion) colors.
    #[serde(default = "default_true")]
    pub write_previews: bool,
    #[serde(default)]
    pub terrain: TerrainSettings,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}
fn default_asset_name() -> String {
    "terrain".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            asset_name: default_asset_name(),
            write_previews: default_true(),
            terrain: TerrainSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load from an explicit path. Missing or invalid files are errors.
    pub fn load_from(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config {:?}", path))?;
        Self::parse(&data).with_context(|| format!("Invalid config at {:?}", path))
    }

    /// Load `morphscape.ron` from the current directory. If the file is
    /// missing or invalid, returns the default config.
    pub fn load_default() -> Self {
        let path = default_config_path();
        if let Ok(data) = std::fs::read_to_string(&path) {
            match Self::parse(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {:#}, using defaults", path, e),
            }
        } else {
            log::info!("No config at {:?}, using defaults", path);
        }
        Self::default()
    }

    pub fn parse(data: &str) -> Result<Self> {
        Ok(ron::from_str(data)?)
    }

    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Save to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron()?)
            .with_context(|| format!("Could not write config to {:?}", path))
    }
}

pub fn default_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(DEFAULT_CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use procgen::{ErosionSettings, FeatureSettings, PeakRidgeSettings, RelaxationScheme};

    #[test]
    fn empty_config_uses_defaults() {
        let config = AppConfig::parse("()").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config = AppConfig::parse(
            r#"(
                asset_name: "ridge_test",
                terrain: (
                    grid: (size: 32),
                    seed: 7,
                    features: PeakRidges((peak_height: 50.0, threshold_space: Uv)),
                    erosion: Some((iterations: 20, scheme: Jacobi)),
                ),
            )"#,
        )
        .unwrap();

        assert_eq!(config.asset_name, "ridge_test");
        assert_eq!(config.output_dir, PathBuf::from("generated"));
        assert!(config.write_previews);
        assert_eq!(config.terrain.grid.size, 32);
        assert_eq!(config.terrain.grid.spacing, 100.0);
        assert_eq!(config.terrain.seed, 7);
        match &config.terrain.features {
            FeatureSettings::PeakRidges(p) => {
                assert_eq!(p.peak_height, 50.0);
                assert_eq!(p.max_ridges, PeakRidgeSettings::default().max_ridges);
            }
            other => panic!("unexpected features {other:?}"),
        }
        assert_eq!(
            config.terrain.erosion,
            Some(ErosionSettings {
                iterations: 20,
                talus_angle: 0.1,
                scheme: RelaxationScheme::Jacobi,
            })
        );
    }

    #[test]
    fn erosion_can_be_disabled() {
        let config = AppConfig::parse("(terrain: (erosion: None))").unwrap();
        assert!(config.terrain.erosion.is_none());
    }

    #[test]
    fn pretty_output_parses_back() {
        let config = AppConfig::default();
        let text = config.to_ron().unwrap();
        assert_eq!(AppConfig::parse(&text).unwrap(), config);
    }

    #[test]
    fn invalid_config_is_an_error() {
        assert!(AppConfig::parse("(terrain: (grid: (size: \"big\")))").is_err());
    }
}
