// Cadence Prediction - Does the tonic major resolution get the lowest NLL?

use std::ops::RangeInclusive;
use std::path::Path;

use crate::generators::cadence::{degree_quality, roman_numeral, DEFAULT_PROGRESSION};
use crate::generators::{StimulusId, TriadQuality};

use super::stats::{mean, percentile_ranks};
use super::{score_stimulus, BenchmarkReport, BenchmarkResult, DetailTable, NllOracle};

pub const TONICS: RangeInclusive<u8> = 60..=71;

const SUBDIR: &str = "cadence";

/// All 36 resolutions after the default backbone, root-major order
pub fn resolutions(tonic: u8) -> Vec<StimulusId> {
    let numerals: Vec<String> = DEFAULT_PROGRESSION
        .iter()
        .map(|&degree| roman_numeral(degree, degree_quality(degree)))
        .collect();

    (0..12u8)
        .flat_map(|half_steps| {
            let numerals = numerals.clone();
            TriadQuality::ALL.into_iter().map(move |quality| StimulusId::Cadence {
                tonic,
                numerals: numerals.clone(),
                half_steps,
                quality,
            })
        })
        .collect()
}

/// Percentile of the tonic resolution among all resolutions, averaged over tonics
///
/// Lower NLL ranks higher; ties share the average rank.
pub fn run_cadence_prediction<O: NllOracle + ?Sized>(
    oracle: &mut O,
    suite: &Path,
) -> BenchmarkResult<BenchmarkReport> {
    let mut table = DetailTable::new(["Percentile of tonic", "Tonic NLL"]);

    for tonic in TONICS {
        let candidates = resolutions(tonic);
        let nlls = candidates
            .iter()
            .map(|id| score_stimulus(oracle, suite, SUBDIR, id))
            .collect::<BenchmarkResult<Vec<f64>>>()?;

        let negated: Vec<f64> = nlls.iter().map(|nll| -nll).collect();
        // Tonic major is the first candidate
        let percentile = percentile_ranks(&negated)[0];
        table.push_row(tonic.to_string(), vec![percentile, nlls[0]]);
    }

    let score = mean(&table.column("Percentile of tonic").unwrap_or_default());
    log::info!("Cadence prediction: {:.4}", score);
    Ok(BenchmarkReport::new("cadence", table, score))
}
