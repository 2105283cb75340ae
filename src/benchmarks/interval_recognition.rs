// Interval Recognition - Is the target interval the most likely of all 25 endings?

use std::path::Path;

use crate::generators::{interval_name, IntervalSpelling, StimulusId, INTERVAL_RANGE};

use super::stats::{average_ranks, mean};
use super::{score_stimulus, BenchmarkReport, BenchmarkResult, DetailTable, NllOracle};

pub const DEFAULT_PERMUTATIONS: usize = 5;

/// Percentile of the correct ending per target and permutation folder
///
/// NLLs are taken relative to the folder minimum; a correct ending with the
/// lowest NLL scores 1.0 and one with the highest scores 0.0.
pub fn run_interval_recognition<O: NllOracle + ?Sized>(
    oracle: &mut O,
    suite: &Path,
    num_permutations: usize,
) -> BenchmarkResult<BenchmarkReport> {
    let candidates: Vec<i8> = INTERVAL_RANGE.collect();
    let n = candidates.len() as f64;

    let columns: Vec<String> = (1..=num_permutations)
        .map(|perm| format!("Permutation {}", perm))
        .collect();
    let mut table = DetailTable::new(columns);
    let mut all = Vec::new();

    for target in INTERVAL_RANGE {
        let mut row = Vec::with_capacity(num_permutations);
        for perm in 1..=num_permutations {
            let subdir = format!("interval/perm{}", perm);
            let nlls = candidates
                .iter()
                .map(|&candidate| {
                    score_stimulus(oracle, suite, &subdir, &StimulusId::IntervalRecognition { target, candidate })
                })
                .collect::<BenchmarkResult<Vec<f64>>>()?;

            let floor = nlls.iter().cloned().fold(f64::INFINITY, f64::min);
            let relative: Vec<f64> = nlls.iter().map(|nll| nll - floor).collect();

            let position = (target - INTERVAL_RANGE.start()) as usize;
            let rank = average_ranks(&relative)[position];
            row.push((n - rank) / (n - 1.0));
        }

        all.extend(row.iter().copied());
        let label = interval_name(target, IntervalSpelling::Signed).unwrap_or_else(|| target.to_string());
        table.push_row(label, row);
    }

    let score = mean(&all);
    log::info!("Interval recognition over {} permutation(s): {:.4}", num_permutations, score);
    Ok(BenchmarkReport::new("interval-recognition", table, score))
}
