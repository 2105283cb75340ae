// Scoring Oracle - Source of negative log-likelihoods for stimulus files

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{BenchmarkError, BenchmarkResult};

/// Something that assigns a negative log-likelihood to a stimulus file
pub trait NllOracle {
    fn nll(&mut self, path: &Path) -> BenchmarkResult<f64>;
}

/// Any closure over a path is an oracle; the file must exist
impl<F> NllOracle for F
where
    F: FnMut(&Path) -> f64,
{
    fn nll(&mut self, path: &Path) -> BenchmarkResult<f64> {
        if !path.exists() {
            return Err(BenchmarkError::MissingStimulus(path.to_path_buf()));
        }
        Ok(self(path))
    }
}

/// NLL values computed elsewhere, keyed by path relative to a suite directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecomputedNll {
    /// Suite directory the keys are relative to
    #[serde(skip)]
    root: PathBuf,

    values: HashMap<String, f64>,
}

impl PrecomputedNll {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PrecomputedNll {
            root: root.into(),
            values: HashMap::new(),
        }
    }

    /// Load a JSON object of `{"relative/path.mid": nll}`
    pub fn from_json_file(path: &Path, root: impl Into<PathBuf>) -> BenchmarkResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let values: HashMap<String, f64> = serde_json::from_str(&contents)
            .map_err(|e| BenchmarkError::InvalidData(format!("{}: {}", path.display(), e)))?;
        log::info!("Loaded {} precomputed NLL values from {}", values.len(), path.display());

        Ok(PrecomputedNll {
            root: root.into(),
            values,
        })
    }

    pub fn insert(&mut self, relative: impl Into<String>, nll: f64) {
        self.values.insert(relative.into(), nll);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn key(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl NllOracle for PrecomputedNll {
    fn nll(&mut self, path: &Path) -> BenchmarkResult<f64> {
        self.values
            .get(&self.key(path))
            .copied()
            .ok_or_else(|| BenchmarkError::MissingStimulus(path.to_path_buf()))
    }
}
