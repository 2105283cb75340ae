// Melody Continuation - Agreement between model NLL and human continuation ratings
// Higher ratings should go with lower NLL, so NLL is correlated with the negated rating

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::generators::{ContextEnding, StimulusId};

use super::ratings::read_melody_ratings;
use super::stats::{mean, spearman, z_scores};
use super::{score_stimulus, BenchmarkError, BenchmarkReport, BenchmarkResult, DetailTable, NllOracle};

/// Context melodies: interval and direction (ascending/descending)
pub const CONTEXT_INTERVALS: [&str; 8] = ["M2_a", "M2_d", "M6_a", "M6_d", "m3_a", "m3_d", "m7_a", "m7_d"];

pub const CONTINUATIONS: usize = 25;

const SUBDIR: &str = "melody_continuation";

/// Default location of the ratings table inside a suite
pub fn default_ratings_path(suite: &Path) -> PathBuf {
    suite
        .join(SUBDIR)
        .join("Lokyan_t_01_human_processed_ratings.csv")
}

fn continuation_id(context: &str, ending: ContextEnding, index: usize) -> StimulusId {
    StimulusId::MelodyContinuation {
        prefix: context.to_string(),
        ending,
        index,
        note: ending.key() - 12 + (index - 1) as u8,
    }
}

/// Ratings grouped by context label, in table order
fn group_ratings(ratings_path: &Path) -> BenchmarkResult<HashMap<String, Vec<f64>>> {
    let mut grouped: HashMap<String, Vec<f64>> = HashMap::new();
    for rating in read_melody_ratings(ratings_path)? {
        grouped.entry(rating.identity).or_default().push(rating.rating);
    }
    Ok(grouped)
}

/// Spearman correlation per context for each ending and for their z-scored average
pub fn run_melody_continuation<O: NllOracle + ?Sized>(
    oracle: &mut O,
    suite: &Path,
    ratings_path: &Path,
) -> BenchmarkResult<BenchmarkReport> {
    let ratings = group_ratings(ratings_path)?;

    let mut table = DetailTable::new(["C4", "F#4", "average"]);
    for context in CONTEXT_INTERVALS {
        let human = ratings
            .get(context)
            .filter(|values| values.len() == CONTINUATIONS)
            .ok_or_else(|| {
                BenchmarkError::InvalidData(format!(
                    "Expected {} ratings for context {}",
                    CONTINUATIONS, context
                ))
            })?;
        let negated: Vec<f64> = human.iter().map(|rating| -rating).collect();

        let mut per_ending = Vec::with_capacity(ContextEnding::ALL.len());
        for ending in ContextEnding::ALL {
            let nlls = (1..=CONTINUATIONS)
                .map(|index| score_stimulus(oracle, suite, SUBDIR, &continuation_id(context, ending, index)))
                .collect::<BenchmarkResult<Vec<f64>>>()?;
            per_ending.push(nlls);
        }

        let normalised: Vec<Vec<f64>> = per_ending.iter().map(|nlls| z_scores(nlls)).collect();
        let averaged: Vec<f64> = (0..CONTINUATIONS)
            .map(|i| normalised.iter().map(|column| column[i]).sum::<f64>() / normalised.len() as f64)
            .collect();

        let mut row: Vec<f64> = per_ending.iter().map(|nlls| spearman(nlls, &negated)).collect();
        row.push(spearman(&averaged, &negated));
        table.push_row(context, row);
    }

    let score = mean(&table.column("average").unwrap_or_default());
    log::info!("Melody continuation: {:.4}", score);
    Ok(BenchmarkReport::new("melody-continuation", table, score))
}
