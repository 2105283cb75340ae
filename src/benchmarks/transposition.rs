// Transposition Invariance - Stability of the interval NLL profile across pitch height

use std::ops::RangeInclusive;
use std::path::Path;

use crate::generators::{StimulusId, INTERVAL_RANGE};

use super::stats::{mean, pearson};
use super::{score_stimulus, BenchmarkReport, BenchmarkResult, DetailTable, NllOracle};

/// Two octaves either side of middle C
pub const START_NOTES: RangeInclusive<u8> = 36..=84;

const SUBDIR: &str = "transposition";

/// Mean Pearson correlation between the NLL profiles of adjacent start notes
pub fn run_transposition_invariance<O: NllOracle + ?Sized>(
    oracle: &mut O,
    suite: &Path,
) -> BenchmarkResult<BenchmarkReport> {
    let mut profiles = Vec::new();
    for start_note in START_NOTES {
        let profile = INTERVAL_RANGE
            .map(|semitones| {
                let id = StimulusId::Interval {
                    start_note,
                    semitones,
                    context: None,
                };
                score_stimulus(oracle, suite, SUBDIR, &id)
            })
            .collect::<BenchmarkResult<Vec<f64>>>()?;
        profiles.push((start_note, profile));
    }

    let mut table = DetailTable::new(["Correlation"]);
    for pair in profiles.windows(2) {
        let (low, low_profile) = &pair[0];
        let (high, high_profile) = &pair[1];
        table.push_row(format!("{}-{}", low, high), vec![pearson(low_profile, high_profile)]);
    }

    let score = mean(&table.column("Correlation").unwrap_or_default());
    log::info!("Transposition invariance: {:.4}", score);
    Ok(BenchmarkReport::new("transposition", table, score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::PrecomputedNll;

    fn oracle(profile: impl Fn(u8, i8) -> f64) -> PrecomputedNll {
        let mut oracle = PrecomputedNll::new("suite");
        for start_note in START_NOTES {
            for semitones in INTERVAL_RANGE {
                let id = StimulusId::Interval {
                    start_note,
                    semitones,
                    context: None,
                };
                oracle.insert(format!("transposition/{}", id.file_name()), profile(start_note, semitones));
            }
        }
        oracle
    }

    #[test]
    fn test_shifted_profiles_are_invariant() {
        let mut oracle = oracle(|note, semitones| note as f64 * 0.1 + (semitones as f64).abs());
        let report = run_transposition_invariance(&mut oracle, Path::new("suite")).unwrap();

        assert_eq!(report.table.rows.len(), 48);
        assert_eq!(report.table.rows[0].label, "36-37");
        assert!((report.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_alternating_profiles_anticorrelate() {
        let mut oracle = oracle(|note, semitones| {
            let sign = if note % 2 == 0 { 1.0 } else { -1.0 };
            sign * semitones as f64
        });
        let report = run_transposition_invariance(&mut oracle, Path::new("suite")).unwrap();
        assert!((report.score + 1.0).abs() < 1e-9);
    }
}
