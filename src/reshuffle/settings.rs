// Reshuffle Settings - Parameters of one reshuffle session

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::generators::session_rng;

use super::{ReshuffleError, ReshuffleResult};

/// Settings for bar/phrase reshuffling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReshuffleSettings {
    /// Number of shuffled versions to write per input
    pub num_versions: usize,

    /// Ticks per bar; derived from the first time signature when `None`
    pub ticks_per_bar: Option<u64>,

    /// Bars per reordered unit
    pub phrase_length: u32,

    /// Keep the first and last unit in place
    pub preserve_endpoints: bool,

    /// Seed for the session's random generator; drawn at random when `None`
    pub seed: Option<u64>,

    /// Draws allowed per version before giving up on finding an unused order
    pub max_attempts: usize,
}

impl Default for ReshuffleSettings {
    fn default() -> Self {
        ReshuffleSettings {
            num_versions: 5,
            ticks_per_bar: None,
            phrase_length: 1,
            preserve_endpoints: false,
            seed: None,
            max_attempts: 100,
        }
    }
}

impl ReshuffleSettings {
    /// Load settings from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> ReshuffleResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ReshuffleError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            ReshuffleError::Configuration(format!("Invalid settings in {}: {}", path.display(), e))
        })
    }

    /// Check values that make every input fail
    pub fn validate(&self) -> ReshuffleResult<()> {
        if self.phrase_length == 0 {
            return Err(ReshuffleError::Configuration(
                "Phrase length must be positive".to_string(),
            ));
        }
        if self.ticks_per_bar == Some(0) {
            return Err(ReshuffleError::Configuration(
                "Ticks per bar must be positive".to_string(),
            ));
        }
        if self.num_versions == 0 {
            return Err(ReshuffleError::Configuration(
                "Number of versions must be positive".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(ReshuffleError::Configuration(
                "Attempt bound must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Random generator for one session together with the seed it was built from
    pub fn session_rng(&self) -> (Pcg32, u64) {
        session_rng(self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = ReshuffleSettings::default();
        assert_eq!(settings.num_versions, 5);
        assert_eq!(settings.phrase_length, 1);
        assert_eq!(settings.max_attempts, 100);
        assert!(!settings.preserve_endpoints);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let zero_phrase = ReshuffleSettings {
            phrase_length: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_phrase.validate(),
            Err(ReshuffleError::Configuration(_))
        ));

        let zero_bar = ReshuffleSettings {
            ticks_per_bar: Some(0),
            ..Default::default()
        };
        assert!(zero_bar.validate().is_err());
    }

    #[test]
    fn test_from_json_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, r#"{"num_versions": 3, "preserve_endpoints": true}"#).unwrap();

        let settings = ReshuffleSettings::from_json_file(&path).unwrap();
        assert_eq!(settings.num_versions, 3);
        assert!(settings.preserve_endpoints);
        assert_eq!(settings.phrase_length, 1);
    }

    #[test]
    fn test_seeded_session_is_reproducible() {
        let settings = ReshuffleSettings {
            seed: Some(1234),
            ..Default::default()
        };
        let (mut a, seed_a) = settings.session_rng();
        let (mut b, seed_b) = settings.session_rng();
        assert_eq!(seed_a, 1234);
        assert_eq!(seed_a, seed_b);
        assert_eq!(a.gen::<u64>(), b.gen::<u64>());
    }
}
