//! Settings loading.
//!
//! Sources are layered, later ones overriding earlier ones:
//! `<config_dir>/hobart/hobart.toml`, `./hobart.toml`, then `HOBART__*`
//! environment variables (e.g. `HOBART__PIPELINE__CUTOFF`). An explicit
//! `--config` path replaces both files and must exist.

use config::{Config, ConfigError, Environment, File};
use hobart_analytics::PipelineSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "hobart.toml";

/// Everything read from configuration sources.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) pipeline: PipelineSettings,
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hobart").join(CONFIG_FILE))
}

impl Settings {
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).required(true));
            }
            None => {
                if let Some(user) = user_config_path() {
                    builder = builder.add_source(File::from(user).required(false));
                }
                builder = builder.add_source(File::with_name(CONFIG_FILE).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("HOBART")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[pipeline]
cutoff = "2024-01-01 00:00:00"

[pipeline.windows]
short = 5

[pipeline.thresholds]
outlier_sigma = 2.5
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(
            settings.pipeline.cutoff.as_deref(),
            Some("2024-01-01 00:00:00")
        );
        assert_eq!(settings.pipeline.windows.short, 5);
        assert_eq!(settings.pipeline.windows.long, 30);
        assert_eq!(settings.pipeline.thresholds.outlier_sigma, 2.5);
        assert_eq!(settings.pipeline.thresholds.anomaly_sigma, 3.0);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
