// Chord Alignment - Correlation of model NLL with human harmony ratings

use std::path::{Path, PathBuf};

use super::ratings::read_chord_ratings;
use super::stats::pearson;
use super::{BenchmarkReport, BenchmarkResult, DetailTable, NllOracle};

const SUBDIR: &str = "chord_alignment";

pub fn default_ratings_path(suite: &Path) -> PathBuf {
    suite
        .join(SUBDIR)
        .join("Lokyan_t_03_human_processed_ratings.csv")
}

/// Pearson correlation between human mean rating and model NLL per chord
pub fn run_chord_alignment<O: NllOracle + ?Sized>(
    oracle: &mut O,
    suite: &Path,
    ratings_path: &Path,
) -> BenchmarkResult<BenchmarkReport> {
    let ratings = read_chord_ratings(ratings_path)?;

    let mut table = DetailTable::new(["model_mean_NLL", "human_ratings"]);
    for rating in &ratings {
        let path = suite.join(SUBDIR).join(format!("{}.mid", rating.chord));
        let nll = oracle.nll(&path)?;
        table.push_row(rating.chord.clone(), vec![nll, rating.rating]);
    }

    let model = table.column("model_mean_NLL").unwrap_or_default();
    let human = table.column("human_ratings").unwrap_or_default();
    let score = pearson(&human, &model);
    log::info!("Chord alignment over {} chords: {:.4}", ratings.len(), score);
    Ok(BenchmarkReport::new("chord-alignment", table, score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::PrecomputedNll;
    use tempfile::TempDir;

    #[test]
    fn test_chord_correlation() {
        let temp_dir = TempDir::new().unwrap();
        let ratings = temp_dir.path().join("ratings.csv");
        std::fs::write(
            &ratings,
            ",full_chord_names,mean_ratings\n0,Cmaj,6.0\n1,Cmin,4.0\n2,Cdim,2.0\n",
        )
        .unwrap();

        let mut oracle = PrecomputedNll::new("suite");
        oracle.insert("chord_alignment/Cmaj.mid", 1.0);
        oracle.insert("chord_alignment/Cmin.mid", 2.0);
        oracle.insert("chord_alignment/Cdim.mid", 3.0);

        let report = run_chord_alignment(&mut oracle, Path::new("suite"), &ratings).unwrap();
        assert_eq!(report.table.get("Cmin", "model_mean_NLL"), Some(2.0));
        assert!((report.score + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_ratings_path() {
        let path = default_ratings_path(Path::new("suite"));
        assert!(path.ends_with("chord_alignment/Lokyan_t_03_human_processed_ratings.csv"));
    }
}
