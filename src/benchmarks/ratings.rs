// Human Data Tables - CSV readers for ratings, surprise events and surprisal series
// Only the named columns are read; any other column (such as an unnamed index) is ignored

use serde::Deserialize;
use std::path::Path;

use super::{BenchmarkError, BenchmarkResult};

/// Mean human rating of one melody continuation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MelodyRating {
    /// Context interval label, e.g. `M2_a`
    #[serde(rename = "stim_identity")]
    pub identity: String,

    #[serde(rename = "mean_rating")]
    pub rating: f64,
}

/// Mean human rating of one chord
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChordRating {
    /// Chord name, also the stimulus file stem
    #[serde(rename = "full_chord_names")]
    pub chord: String,

    #[serde(rename = "mean_ratings")]
    pub rating: f64,
}

/// A human-annotated surprise event
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SurpriseEvent {
    /// Seconds from the start of the piece
    #[serde(rename = "Onset", deserialize_with = "csv::invalid_option", default)]
    pub onset: Option<f64>,

    #[serde(rename = "Rank", deserialize_with = "csv::invalid_option", default)]
    pub rank: Option<f64>,
}

/// One sample of model surprisal over time
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SurprisalSample {
    pub time: f64,
    pub surprisal: f64,
}

fn read_records<T>(path: &Path) -> BenchmarkResult<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    if !path.exists() {
        return Err(BenchmarkError::MissingStimulus(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let records = reader.deserialize().collect::<Result<Vec<T>, csv::Error>>()?;
    log::debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

pub fn read_melody_ratings(path: &Path) -> BenchmarkResult<Vec<MelodyRating>> {
    read_records(path)
}

pub fn read_chord_ratings(path: &Path) -> BenchmarkResult<Vec<ChordRating>> {
    read_records(path)
}

pub fn read_surprise_events(path: &Path) -> BenchmarkResult<Vec<SurpriseEvent>> {
    read_records(path)
}

/// Read a `time,surprisal` CSV into two parallel vectors
pub fn read_surprisal_series(path: &Path) -> BenchmarkResult<(Vec<f64>, Vec<f64>)> {
    let samples: Vec<SurprisalSample> = read_records(path)?;
    Ok(samples.into_iter().map(|s| (s.time, s.surprisal)).unzip())
}
