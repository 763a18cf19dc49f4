//! Runtime configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! {
//!   "storage_dir": "/var/lib/colorlens",
//!   "transform": { "saturation_factor": 1.3 },
//!   "summary": { "k": 6, "clustering": { "seed": 7 } }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{LensError, Result};
use crate::processor::{TransformSettings, MIN_ENCODED_BYTES};
use crate::quantizer::MAX_CLUSTERS;
use crate::summary::SummarySettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LensConfig {
    /// Root for `uploads/` and `results/` (default: "storage")
    pub storage_dir: PathBuf,
    /// History database file; `None` keeps history in memory
    pub database: Option<PathBuf>,
    /// Smallest acceptable encoded result in bytes (default: 100)
    pub min_encoded_bytes: usize,
    pub transform: TransformSettings,
    pub summary: SummarySettings,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("storage"),
            database: None,
            min_encoded_bytes: MIN_ENCODED_BYTES,
            transform: TransformSettings::default(),
            summary: SummarySettings::default(),
        }
    }
}

impl LensConfig {
    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LensConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let factor = self.transform.saturation_factor;
        if !(factor.is_finite() && factor > 0.0) {
            return Err(LensError::InvalidParameter(format!(
                "transform.saturation_factor must be positive, got {}",
                factor
            )));
        }
        if self.summary.k == 0 || self.summary.k > MAX_CLUSTERS {
            return Err(LensError::InvalidParameter(format!(
                "summary.k must be between 1 and {}, got {}",
                MAX_CLUSTERS, self.summary.k
            )));
        }
        self.summary.clustering.validate()
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.storage_dir.join("uploads")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.storage_dir.join("results")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhance::SaturationMode;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LensConfig::default();
        assert_eq!(config.transform.saturation_factor, 1.2);
        assert_eq!(config.transform.saturation_mode, SaturationMode::Luma);
        assert_eq!(config.transform.hue_rules.red_target, 280.0);
        assert_eq!(config.transform.hue_rules.green_target, 190.0);
        assert_eq!(config.summary.k, 5);
        assert_eq!(config.summary.clustering.sample_width, 120);
        assert_eq!(config.summary.clustering.n_init, 10);
        assert_eq!(config.min_encoded_bytes, 100);
        assert!(config.database.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "storage_dir": "/tmp/lens",
            "transform": { "saturation_factor": 1.5, "saturation_mode": "hsv" },
            "summary": { "k": 7, "clustering": { "seed": 42 } }
        }"#;
        let config: LensConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/lens"));
        assert_eq!(config.transform.saturation_factor, 1.5);
        assert_eq!(config.transform.saturation_mode, SaturationMode::Hsv);
        assert_eq!(config.transform.hue_rules.red_below, 20.0);
        assert_eq!(config.summary.k, 7);
        assert_eq!(config.summary.clustering.seed, 42);
        assert_eq!(config.summary.clustering.n_init, 10);
        assert_eq!(config.results_dir(), PathBuf::from("/tmp/lens/results"));
    }

    #[test]
    fn test_validation() {
        let mut config = LensConfig::default();
        config.summary.k = 0;
        assert!(config.validate().is_err());

        let mut config = LensConfig::default();
        config.transform.saturation_factor = -1.0;
        assert!(config.validate().is_err());

        let mut config = LensConfig::default();
        config.summary.clustering.sample_height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "min_encoded_bytes": 64 }}"#).unwrap();
        let config = LensConfig::load(file.path()).unwrap();
        assert_eq!(config.min_encoded_bytes, 64);
        assert_eq!(config.summary.k, 5);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "summary": {{ "k": 300 }} }}"#).unwrap();
        assert!(matches!(
            LensConfig::load(file.path()),
            Err(LensError::InvalidParameter(_))
        ));
    }
}
