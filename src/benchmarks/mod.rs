// Benchmark scorers
// Each scorer walks a stimulus suite, asks an oracle for NLLs and reduces them to one score

pub mod cadence;
pub mod chord;
pub mod interval_recognition;
pub mod melody;
pub mod oracle;
pub mod ratings;
pub mod scale_filling;
pub mod stats;
pub mod surprise;
pub mod table;
pub mod transposition;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::generators::StimulusId;

pub use cadence::run_cadence_prediction;
pub use chord::run_chord_alignment;
pub use interval_recognition::run_interval_recognition;
pub use melody::run_melody_continuation;
pub use oracle::{NllOracle, PrecomputedNll};
pub use scale_filling::run_scale_filling;
pub use surprise::{run_surprise, SurprisePiece};
pub use table::{BenchmarkReport, DetailRow, DetailTable};
pub use transposition::run_transposition_invariance;

#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("Stimulus not found: {0}")]
    MissingStimulus(PathBuf),

    #[error("Invalid benchmark data: {0}")]
    InvalidData(String),

    #[error("Ratings table error: {0}")]
    Ratings(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BenchmarkResult<T> = Result<T, BenchmarkError>;

/// Available benchmarks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Benchmark {
    Cadence,
    ScaleFilling,
    IntervalRecognition,
    Transposition,
    MelodyContinuation,
    ChordAlignment,
    Glass,
    Mussorgsky,
}

impl Benchmark {
    pub const ALL: [Benchmark; 8] = [
        Benchmark::Cadence,
        Benchmark::ScaleFilling,
        Benchmark::IntervalRecognition,
        Benchmark::Transposition,
        Benchmark::MelodyContinuation,
        Benchmark::ChordAlignment,
        Benchmark::Glass,
        Benchmark::Mussorgsky,
    ];

    /// Convert from string representation
    pub fn from_string(s: &str) -> Option<Self> {
        Benchmark::ALL
            .into_iter()
            .find(|benchmark| benchmark.as_str() == s.to_lowercase().replace('_', "-"))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Benchmark::Cadence => "cadence",
            Benchmark::ScaleFilling => "scale-filling",
            Benchmark::IntervalRecognition => "interval-recognition",
            Benchmark::Transposition => "transposition",
            Benchmark::MelodyContinuation => "melody-continuation",
            Benchmark::ChordAlignment => "chord-alignment",
            Benchmark::Glass => "glass",
            Benchmark::Mussorgsky => "mussorgsky",
        }
    }
}

/// Location of a stimulus inside a suite directory
pub fn stimulus_path(suite: &Path, subdir: &str, stimulus: &StimulusId) -> PathBuf {
    suite.join(subdir).join(stimulus.file_name())
}

/// NLL of one suite stimulus
pub(crate) fn score_stimulus<O: NllOracle + ?Sized>(
    oracle: &mut O,
    suite: &Path,
    subdir: &str,
    stimulus: &StimulusId,
) -> BenchmarkResult<f64> {
    let path = stimulus_path(suite, subdir, stimulus);
    let nll = oracle.nll(&path)?;
    log::debug!("{}: {}", path.display(), nll);
    Ok(nll)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_names() {
        for benchmark in Benchmark::ALL {
            assert_eq!(Benchmark::from_string(benchmark.as_str()), Some(benchmark));
        }
        assert_eq!(Benchmark::from_string("Scale_Filling"), Some(Benchmark::ScaleFilling));
        assert_eq!(Benchmark::from_string("tempo"), None);
    }
}
