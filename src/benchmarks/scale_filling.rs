// Scale Filling - Is the in-key completion preferred over its alternatives?
// Each variant's NLL is normalised by its context-free control

use std::ops::RangeInclusive;
use std::path::Path;

use crate::generators::scale_filling::{all_variants, correct_variant};
use crate::generators::{ScaleMode, StimulusId};

use super::stats::{mean, ordinal_ranks};
use super::{score_stimulus, BenchmarkReport, BenchmarkResult, DetailTable, NllOracle};

pub const ROOTS: RangeInclusive<u8> = 48..=72;

const SUBDIR: &str = "scale_filling";

fn scale_id(root: u8, mode: ScaleMode, variant: [u8; 4], control: bool) -> StimulusId {
    StimulusId::ScaleFilling {
        root,
        mode,
        variant,
        correct: variant == correct_variant(mode),
        control,
    }
}

/// Percentile of the correct variant by control-normalised NLL, averaged over roots
pub fn run_scale_filling<O: NllOracle + ?Sized>(
    oracle: &mut O,
    suite: &Path,
    mode: ScaleMode,
) -> BenchmarkResult<BenchmarkReport> {
    let correct = correct_variant(mode);
    // Foils first, correct variant last
    let mut variants: Vec<[u8; 4]> = all_variants().into_iter().filter(|v| *v != correct).collect();
    variants.push(correct);
    let n = variants.len();

    let mut table = DetailTable::new(["Correct Scale Rank", "Average Percentile"]);
    for root in ROOTS {
        let mut normalised = Vec::with_capacity(n);
        for &variant in &variants {
            let full = score_stimulus(oracle, suite, SUBDIR, &scale_id(root, mode, variant, false))?;
            let control = score_stimulus(oracle, suite, SUBDIR, &scale_id(root, mode, variant, true))?;
            normalised.push(full - control);
        }

        let rank = ordinal_ranks(&normalised)[n - 1];
        let percentile = (n - rank + 1) as f64 / n as f64;
        table.push_row(root.to_string(), vec![rank as f64, percentile]);
    }

    let score = mean(&table.column("Average Percentile").unwrap_or_default());
    log::info!("Scale filling ({}): {:.4}", mode.as_str(), score);
    Ok(BenchmarkReport::new("scale-filling", table, score))
}
