// Surprise Events - Model surprisal at human-annotated moments of a piece
// Events come in three equal groups: high, low and un-surprising

use std::path::{Path, PathBuf};

use super::ratings::read_surprise_events;
use super::stats::{nearest_index, spearman};
use super::{BenchmarkError, BenchmarkReport, BenchmarkResult, DetailTable};

const GROUPS: [&str; 3] = ["HS", "LS", "US"];

/// Pieces with annotated surprise events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurprisePiece {
    /// Philip Glass, The Hours
    Glass,

    /// Mussorgsky, Night on Bald Mountain
    Mussorgsky,
}

impl SurprisePiece {
    /// Events per group
    pub fn group_size(&self) -> usize {
        match self {
            SurprisePiece::Glass => 17,
            SurprisePiece::Mussorgsky => 28,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SurprisePiece::Glass => "glass",
            SurprisePiece::Mussorgsky => "mussorgsky",
        }
    }

    /// Default location of the events table inside a suite
    pub fn events_path(&self, suite: &Path) -> PathBuf {
        let file = match self {
            SurprisePiece::Glass => "GlassEvents.txt",
            SurprisePiece::Mussorgsky => "MussorgskyEvents.txt",
        };
        suite.join(self.as_str()).join(file)
    }
}

/// Spearman correlation of human surprise rank with model surprisal at each event onset
///
/// `times` and `surprisals` are parallel; each event takes the surprisal of
/// the nearest time. Missing onsets or ranks count as 0.
pub fn run_surprise(
    piece: SurprisePiece,
    times: &[f64],
    surprisals: &[f64],
    events_path: &Path,
) -> BenchmarkResult<BenchmarkReport> {
    if times.len() != surprisals.len() || times.is_empty() {
        return Err(BenchmarkError::InvalidData(format!(
            "Surprisal series needs equal, non-empty times and values ({} vs {})",
            times.len(),
            surprisals.len()
        )));
    }

    let events = read_surprise_events(events_path)?;
    let group_size = piece.group_size();
    if events.len() != group_size * GROUPS.len() {
        return Err(BenchmarkError::InvalidData(format!(
            "{} has {} events, expected {}",
            events_path.display(),
            events.len(),
            group_size * GROUPS.len()
        )));
    }

    let mut table = DetailTable::new(["Onset", "Rank", "Model surprisal"]);
    let mut ranks = Vec::with_capacity(events.len());
    let mut model = Vec::with_capacity(events.len());
    for (i, event) in events.iter().enumerate() {
        let onset = event.onset.unwrap_or(0.0);
        let rank = event.rank.unwrap_or(0.0);
        let surprisal = nearest_index(times, onset)
            .map(|index| surprisals[index])
            .unwrap_or(f64::NAN);

        let group = GROUPS[i / group_size];
        table.push_row(format!("{} {}", group, i % group_size + 1), vec![onset, rank, surprisal]);
        ranks.push(rank);
        model.push(surprisal);
    }

    let score = spearman(&ranks, &model);
    log::info!("{} surprise: {:.4}", piece.as_str(), score);
    Ok(BenchmarkReport::new(piece.as_str(), table, score))
}
