//! Run configuration.
//!
//! Values come from, in increasing precedence: built-in defaults, a TOML
//! file, environment variables (optionally loaded from `.env`), and finally
//! command line flags applied by the binary.
//!
//! ```toml
//! [input]
//! path = "data/curah_hujan.csv"
//! delimiter = ";"
//!
//! [filter]
//! min_year = 2020
//! max_year = 2024
//!
//! [classification]
//! medium_min_mm = 1500.0
//! high_above_mm = 2500.0
//!
//! [output]
//! dir = "output"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::classification::ClassificationBands;
use crate::ingest::LoadOptions;
use crate::model::RainfallError;

/// Config file used when none is named.
pub const DEFAULT_CONFIG_PATH: &str = "rainfall.toml";

/// Names the config file when no `--config` flag is given.
pub const ENV_CONFIG: &str = "RAINFALL_CONFIG";
/// Overrides `[input] path`.
pub const ENV_INPUT: &str = "RAINFALL_INPUT";
/// Overrides `[output] dir`.
pub const ENV_OUTPUT_DIR: &str = "RAINFALL_OUTPUT_DIR";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RainfallConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub classification: ClassificationBands,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    pub path: Option<PathBuf>,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: None,
            delimiter: default_delimiter(),
        }
    }
}

fn default_delimiter() -> String {
    ",".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    #[serde(default = "default_min_year")]
    pub min_year: i32,
    #[serde(default = "default_max_year")]
    pub max_year: i32,
    /// Compute station shares and peaks over every record instead of the
    /// filtered years.
    #[serde(default = "default_true")]
    pub whole_period_shares: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_year: default_min_year(),
            max_year: default_max_year(),
            whole_period_shares: true,
        }
    }
}

fn default_min_year() -> i32 {
    2020
}
fn default_max_year() -> i32 {
    2024
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Write `report.json` alongside the CSV tables.
    #[serde(default = "default_true")]
    pub json_report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            json_report: true,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl RainfallConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, RainfallError> {
        toml::from_str(text).map_err(|e| RainfallError::Config {
            reason: e.to_string(),
        })
    }

    /// Reads and parses the TOML file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, RainfallError> {
        let text = std::fs::read_to_string(path).map_err(|e| RainfallError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&text)
    }

    /// Resolves the configuration for a run.
    ///
    /// An explicitly named file (argument or `RAINFALL_CONFIG`) must exist.
    /// The default `rainfall.toml` is optional; defaults apply without it.
    /// Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self, RainfallError> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from));

        let mut config = match named {
            Some(path) => {
                debug!(path = %path.display(), "loading configuration");
                Self::from_file(&path)?
            }
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                debug!(path = DEFAULT_CONFIG_PATH, "loading configuration");
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => {
                debug!("no configuration file, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies path overrides looked up through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(input) = lookup(ENV_INPUT).filter(|v| !v.is_empty()) {
            self.input.path = Some(PathBuf::from(input));
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.is_empty()) {
            self.output.dir = PathBuf::from(dir);
        }
    }

    /// Checks the values that the pipeline depends on.
    pub fn validate(&self) -> Result<(), RainfallError> {
        if self.input.path.is_none() {
            return Err(RainfallError::Config {
                reason: format!("no input file configured (set [input] path or {})", ENV_INPUT),
            });
        }
        if self.filter.min_year > self.filter.max_year {
            return Err(RainfallError::Config {
                reason: format!(
                    "min_year {} is after max_year {}",
                    self.filter.min_year, self.filter.max_year
                ),
            });
        }
        self.classification.validate()?;
        self.delimiter_byte()?;
        Ok(())
    }

    /// The configured delimiter as a single byte.
    pub fn delimiter_byte(&self) -> Result<u8, RainfallError> {
        match self.input.delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(RainfallError::Config {
                reason: format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    self.input.delimiter
                ),
            }),
        }
    }

    /// Loader options derived from the `[input]` table.
    pub fn load_options(&self) -> Result<LoadOptions, RainfallError> {
        Ok(LoadOptions {
            delimiter: self.delimiter_byte()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RainfallConfig::default();
        assert_eq!(config.filter.min_year, 2020);
        assert_eq!(config.filter.max_year, 2024);
        assert!(config.filter.whole_period_shares);
        assert_eq!(config.classification, ClassificationBands::default());
        assert_eq!(config.output.dir, PathBuf::from("output"));
        assert_eq!(config.delimiter_byte().unwrap(), b',');
    }

    #[test]
    fn test_parse_full_document() {
        let config = RainfallConfig::from_toml_str(
            r#"
            [input]
            path = "data/rain.csv"
            delimiter = ";"

            [filter]
            min_year = 2015
            max_year = 2024
            whole_period_shares = false

            [classification]
            medium_min_mm = 1000.0
            high_above_mm = 2000.0

            [output]
            dir = "out"
            json_report = false
            "#,
        )
        .unwrap();

        assert_eq!(config.input.path, Some(PathBuf::from("data/rain.csv")));
        assert_eq!(config.delimiter_byte().unwrap(), b';');
        assert_eq!(config.filter.min_year, 2015);
        assert!(!config.filter.whole_period_shares);
        assert_eq!(config.classification.medium_min_mm, 1000.0);
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert!(!config.output.json_report);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = RainfallConfig::from_toml_str("[filter]\nmin_year = 2018\n").unwrap();
        assert_eq!(config.filter.min_year, 2018);
        assert_eq!(config.filter.max_year, 2024);
        assert_eq!(config.classification.high_above_mm, 2500.0);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = RainfallConfig::from_toml_str("[filter]\nfirst_year = 2018\n").unwrap_err();
        assert!(matches!(err, RainfallError::Config { .. }));
    }

    #[test]
    fn test_validate_rejects_reversed_years() {
        let mut config = RainfallConfig::default();
        config.input.path = Some(PathBuf::from("rain.csv"));
        config.filter.min_year = 2025;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("after max_year"));
    }

    #[test]
    fn test_validate_requires_input() {
        let err = RainfallConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("no input file"));
    }

    #[test]
    fn test_bad_delimiter() {
        let mut config = RainfallConfig::default();
        config.input.delimiter = "::".to_string();
        assert!(config.delimiter_byte().is_err());
        config.input.delimiter = "\t".to_string();
        assert_eq!(config.delimiter_byte().unwrap(), b'\t');
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RainfallConfig::default();
        config.apply_env_overrides(|key| match key {
            ENV_INPUT => Some("/data/rain.csv".to_string()),
            ENV_OUTPUT_DIR => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.input.path, Some(PathBuf::from("/data/rain.csv")));
        // Empty values are ignored.
        assert_eq!(config.output.dir, PathBuf::from("output"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = RainfallConfig::load(Some(Path::new("/nonexistent/rainfall.toml"))).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
