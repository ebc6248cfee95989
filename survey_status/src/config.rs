//! Run configuration from `survey.toml`.
//!
//! Every section is optional; a missing file or section falls back to the
//! DELVE defaults.

use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::ExposureQuery;
use crate::models::{QualityPolicy, QualityThresholds, Semester};
use crate::services::error::StatusError;
use crate::services::obstime::TimingSettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path} at `{key}`: {message}")]
    Parse {
        path: PathBuf,
        key: String,
        message: String,
    },

    #[error("Invalid quality table: {0}")]
    Policy(#[from] StatusError),
}

/// File locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Cached exposure table.
    pub exposures: PathBuf,
    /// Planned-field catalog.
    pub targets: PathBuf,
    pub output_dir: PathBuf,
    /// Field-status files are named `{fields_prefix}-{YYYYMMDD}.csv.gz`.
    pub fields_prefix: String,
    /// Allocated observing windows (`utc_start`, `utc_end`).
    pub windows: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            exposures: PathBuf::from("decam-exposures-20200318.csv.gz"),
            targets: PathBuf::from("delve-target-fields.csv.gz"),
            output_dir: PathBuf::from("."),
            fields_prefix: "delve-fields".to_string(),
            windows: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub paths: PathSettings,
    pub query: ExposureQuery,
    /// Replaces the built-in quality table when non-empty.
    pub quality: Vec<QualityThresholds>,
    pub semesters: Vec<Semester>,
    pub timing: TimingSettings,
    pub bands: Vec<String>,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            paths: PathSettings::default(),
            query: ExposureQuery::default(),
            quality: Vec::new(),
            semesters: default_semesters(),
            timing: TimingSettings::default(),
            bands: vec!["g".to_string(), "r".to_string(), "i".to_string()],
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

pub fn default_semesters() -> Vec<Semester> {
    vec![
        Semester::new("2019A", date(2019, 2, 1), date(2019, 8, 1)),
        Semester::new("2019B", date(2019, 8, 1), date(2020, 2, 1)),
        Semester::new("2020A", date(2020, 2, 1), date(2020, 3, 18)),
    ]
}

impl SurveyConfig {
    pub fn from_str_at(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let deserializer = toml::Deserializer::new(content);
        serde_path_to_error::deserialize(deserializer).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            key: e.path().to_string(),
            message: e.inner().to_string(),
        })
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_str_at(&content, path)?;
        config.policy()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Searches for `survey.toml` in:
    /// 1. Current directory
    /// 2. `survey_status/` directory
    /// 3. Parent directory
    ///
    /// Falls back to the defaults when none exists.
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("survey.toml"),
            PathBuf::from("survey_status/survey.toml"),
            PathBuf::from("../survey.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        info!("No survey.toml found, using built-in defaults");
        Ok(Self::default())
    }

    /// Explicit path if given, otherwise the default search.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Self::from_default_location(),
        }
    }

    pub fn policy(&self) -> Result<QualityPolicy, ConfigError> {
        if self.quality.is_empty() {
            Ok(QualityPolicy::delve())
        } else {
            Ok(QualityPolicy::new(self.quality.clone())?)
        }
    }

    pub fn timing(&self) -> TimingSettings {
        self.timing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = SurveyConfig::from_str_at("", Path::new("survey.toml")).unwrap();
        assert_eq!(config, SurveyConfig::default());
        assert_eq!(config.policy().unwrap(), QualityPolicy::delve());
        assert_eq!(config.semesters.len(), 3);
        assert_eq!(config.timing().overhead_seconds, 30.0);
    }

    #[test]
    fn test_partial_sections() {
        let content = r#"
bands = ["g", "i"]

[paths]
exposures = "cache/exposures.csv.gz"
windows = "windows.csv"

[timing]
low_efficiency_fraction = 0.1

[[quality]]
program = "wide"
filter = "g"
teff_min = 0.4
fwhm_max = 1.3
done_priority = -1
"#;
        let config = SurveyConfig::from_str_at(content, Path::new("survey.toml")).unwrap();
        assert_eq!(config.bands, vec!["g", "i"]);
        assert_eq!(config.paths.exposures, PathBuf::from("cache/exposures.csv.gz"));
        assert_eq!(config.paths.fields_prefix, "delve-fields");
        assert_eq!(config.timing.low_efficiency_fraction, 0.1);
        assert_eq!(config.timing.overhead_seconds, 30.0);

        let policy = config.policy().unwrap();
        assert_eq!(policy.len(), 1);
        let row = policy.lookup("wide", "g").unwrap();
        assert_eq!(row.done_priority, Some(-1));
        assert_eq!(row.extra_priority, None);
    }

    #[test]
    fn test_parse_error_names_key() {
        let content = "[timing]\noverhead_seconds = \"thirty\"\n";
        let err = SurveyConfig::from_str_at(content, Path::new("survey.toml")).unwrap_err();
        match err {
            ConfigError::Parse { key, .. } => assert_eq!(key, "timing.overhead_seconds"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_policy_rows_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[[quality]]
program = "wide"
filter = "g"
teff_min = 0.3
fwhm_max = 1.5

[[quality]]
program = "wide"
filter = "g"
teff_min = 0.2
fwhm_max = 2.0
"#
        )
        .unwrap();
        let err = SurveyConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Policy(StatusError::DuplicatePolicy { .. })));
    }

    #[test]
    fn test_semesters_override() {
        let content = r#"
[[semesters]]
name = "2019A"
start = "2019-02-01"
end = "2019-08-01"
"#;
        let config = SurveyConfig::from_str_at(content, Path::new("survey.toml")).unwrap();
        assert_eq!(config.semesters.len(), 1);
        assert_eq!(config.semesters[0].end, date(2019, 8, 1));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("survey.toml");
        let config = SurveyConfig::from_file(&path).unwrap();
        assert_eq!(config.policy().unwrap(), QualityPolicy::delve());
        assert_eq!(config.semesters, default_semesters());
        assert_eq!(config.query, ExposureQuery::default());
    }
}
