// Commands - Entry points behind the CLI
// Each command takes a plain input struct and returns a serialisable summary

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::benchmarks::{
    self, chord, melody, ratings, Benchmark, BenchmarkReport, PrecomputedNll, SurprisePiece,
};
use crate::generators::cadence::DEFAULT_PROGRESSION;
use crate::generators::{
    CadenceGenerator, ContextEnding, GeneratedStimulus, IntervalLikelihoodGenerator,
    IntervalRecognitionGenerator, MelodyContinuationGenerator, NoteAlterationGenerator, ScaleMode,
    ScaleFillingGenerator, StimulusWriter, TrackTranspositionGenerator, session_rng,
};
use crate::reshuffle::{BarShufflingGenerator, CapacityWarning, ReshuffleSettings};
use crate::state::storage;

#[derive(Debug, Serialize)]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl<E: std::fmt::Display> From<E> for CommandError {
    fn from(error: E) -> Self {
        CommandError {
            message: error.to_string(),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Writer for an output directory, created if missing
fn open_writer(output_dir: &Path, manifest: bool) -> CommandResult<StimulusWriter> {
    let dir = storage::ensure_dir(output_dir)?;
    let writer = StimulusWriter::new(dir)?;
    Ok(if manifest { writer.with_manifest() } else { writer })
}

/// Files written by a generating command
#[derive(Debug, Serialize)]
pub struct GenerationSummary {
    pub seed: Option<u64>,
    pub outputs: Vec<GeneratedStimulus>,
}

// ==================== RESHUFFLE ====================

#[derive(Debug, Deserialize)]
pub struct ShuffleInput {
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub settings: ReshuffleSettings,
    pub manifest: bool,
}

#[derive(Debug, Serialize)]
pub struct ShuffledFile {
    pub input: PathBuf,
    pub outputs: Vec<PathBuf>,
    pub capped: Option<CapacityWarning>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShuffleSummary {
    pub seed: u64,
    pub files: Vec<ShuffledFile>,
}

impl ShuffleSummary {
    pub fn failed(&self) -> usize {
        self.files.iter().filter(|file| file.error.is_some()).count()
    }
}

pub fn shuffle(input: ShuffleInput) -> CommandResult<ShuffleSummary> {
    input.settings.validate()?;
    let writer = open_writer(&input.output_dir, input.manifest)?;
    let mut generator = BarShufflingGenerator::new(writer);

    let batch = generator.generate_batch(&input.inputs, &input.settings);
    let files = batch
        .results
        .into_iter()
        .map(|(path, result)| match result {
            Ok(report) => ShuffledFile {
                input: path,
                outputs: report.outputs.into_iter().map(|o| o.path).collect(),
                capped: report.capped,
                error: None,
            },
            Err(e) => ShuffledFile {
                input: path,
                outputs: Vec::new(),
                capped: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    Ok(ShuffleSummary {
        seed: batch.seed,
        files,
    })
}

// ==================== SUITE GENERATION ====================

/// Which stimulus set to generate
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuiteKind {
    /// Every resolution for tonics 60-71
    Cadence,

    /// Every variant for roots 48-72
    ScaleFilling { mode: ScaleMode },

    /// Every target interval in `perm1..permN`
    IntervalRecognition {
        num_examples: usize,
        num_permutations: usize,
    },

    /// Context-free interval sets for start notes 36-84
    Transposition,

    /// 25 continuations of one context melody
    MelodyContinuation {
        context: PathBuf,
        ending: ContextEnding,
        prefix: Option<String>,
    },
}

impl SuiteKind {
    /// Directory inside the suite the set is written to
    pub fn subdirectory(&self) -> &'static str {
        match self {
            SuiteKind::Cadence => "cadence",
            SuiteKind::ScaleFilling { .. } => "scale_filling",
            SuiteKind::IntervalRecognition { .. } => "interval",
            SuiteKind::Transposition => "transposition",
            SuiteKind::MelodyContinuation { .. } => "melody_continuation",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateInput {
    pub suite: SuiteKind,
    pub output_dir: PathBuf,
    pub seed: Option<u64>,
    pub manifest: bool,
}

pub fn generate_suite(input: GenerateInput) -> CommandResult<GenerationSummary> {
    let root = open_writer(&input.output_dir, input.manifest)?;
    let mut writer = root.subdirectory(input.suite.subdirectory())?;
    let (mut rng, seed) = session_rng(input.seed);
    writer.set_seed(Some(seed));

    let outputs = match &input.suite {
        SuiteKind::Cadence => {
            let generator = CadenceGenerator::new(writer);
            let mut outputs = Vec::new();
            for tonic in benchmarks::cadence::TONICS {
                outputs.extend(generator.generate_all_resolutions(tonic, &DEFAULT_PROGRESSION)?);
            }
            outputs
        }
        SuiteKind::ScaleFilling { mode } => {
            let generator = ScaleFillingGenerator::new(writer);
            let mut outputs = Vec::new();
            for root in benchmarks::scale_filling::ROOTS {
                outputs.extend(generator.generate_all_scale_variations(root, *mode)?);
            }
            outputs
        }
        SuiteKind::IntervalRecognition {
            num_examples,
            num_permutations,
        } => IntervalRecognitionGenerator::new(writer).generate_suite(
            *num_examples,
            *num_permutations,
            &mut rng,
        )?,
        SuiteKind::Transposition => IntervalLikelihoodGenerator::new(writer)
            .generate_transposition_suite(benchmarks::transposition::START_NOTES, &mut rng)?,
        SuiteKind::MelodyContinuation {
            context,
            ending,
            prefix,
        } => MelodyContinuationGenerator::new(writer).generate_continuations(
            context,
            *ending,
            prefix.as_deref(),
            crate::generators::melody_continuation::DEFAULT_CONTINUATION_TICKS,
        )?,
    };

    log::info!(
        "Generated {} {} stimuli in {}",
        outputs.len(),
        input.suite.subdirectory(),
        input.output_dir.display()
    );
    Ok(GenerationSummary {
        seed: Some(seed),
        outputs,
    })
}

// ==================== FILE TRANSFORMS ====================

#[derive(Debug, Deserialize)]
pub struct TransposeTracksInput {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub tracks: Vec<usize>,
    pub semitones: u8,
    pub manifest: bool,
}

pub fn transpose_tracks(input: TransposeTracksInput) -> CommandResult<GenerationSummary> {
    let writer = open_writer(&input.output_dir, input.manifest)?;
    let outputs = TrackTranspositionGenerator::new(writer).generate_transposed_versions(
        &input.input,
        &input.tracks,
        input.semitones,
    )?;
    Ok(GenerationSummary { seed: None, outputs })
}

#[derive(Debug, Deserialize)]
pub struct AlterNotesInput {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub num_versions: usize,
    pub notes_to_alter: usize,
    pub interval: i32,
    pub seed: Option<u64>,
    pub manifest: bool,
}

pub fn alter_notes(input: AlterNotesInput) -> CommandResult<GenerationSummary> {
    let mut writer = open_writer(&input.output_dir, input.manifest)?;
    let (mut rng, seed) = session_rng(input.seed);
    writer.set_seed(Some(seed));

    let outputs = NoteAlterationGenerator::new(writer).generate_altered_versions(
        &input.input,
        input.num_versions,
        input.notes_to_alter,
        input.interval,
        &mut rng,
    )?;
    Ok(GenerationSummary {
        seed: Some(seed),
        outputs,
    })
}

// ==================== SCORING ====================

#[derive(Debug, Deserialize)]
pub struct ScoreInput {
    pub benchmark: String,
    pub suite: PathBuf,
    /// JSON map of suite-relative stimulus path to NLL
    pub nll: Option<PathBuf>,
    /// Human ratings or events table; the suite default when absent
    pub ratings: Option<PathBuf>,
    /// `time,surprisal` CSV for the surprise benchmarks
    pub surprisal: Option<PathBuf>,
    pub permutations: usize,
    pub mode: ScaleMode,
}

fn required<'a>(path: &'a Option<PathBuf>, what: &str, benchmark: Benchmark) -> CommandResult<&'a Path> {
    path.as_deref().ok_or_else(|| CommandError {
        message: format!("{} requires {}", benchmark.as_str(), what),
    })
}

fn precomputed(input: &ScoreInput, benchmark: Benchmark) -> CommandResult<PrecomputedNll> {
    let nll = required(&input.nll, "precomputed NLL values", benchmark)?;
    Ok(PrecomputedNll::from_json_file(nll, &input.suite)?)
}

fn surprise(input: &ScoreInput, piece: SurprisePiece, benchmark: Benchmark) -> CommandResult<BenchmarkReport> {
    let series = required(&input.surprisal, "a surprisal series", benchmark)?;
    let (times, surprisals) = ratings::read_surprisal_series(series)?;
    let events = input
        .ratings
        .clone()
        .unwrap_or_else(|| piece.events_path(&input.suite));
    Ok(benchmarks::run_surprise(piece, &times, &surprisals, &events)?)
}

pub fn score(input: ScoreInput) -> CommandResult<BenchmarkReport> {
    let benchmark = Benchmark::from_string(&input.benchmark).ok_or_else(|| CommandError {
        message: format!("Unknown benchmark: {}", input.benchmark),
    })?;
    let suite = input.suite.as_path();

    let report = match benchmark {
        Benchmark::Cadence => {
            benchmarks::run_cadence_prediction(&mut precomputed(&input, benchmark)?, suite)?
        }
        Benchmark::ScaleFilling => {
            benchmarks::run_scale_filling(&mut precomputed(&input, benchmark)?, suite, input.mode)?
        }
        Benchmark::IntervalRecognition => benchmarks::run_interval_recognition(
            &mut precomputed(&input, benchmark)?,
            suite,
            input.permutations,
        )?,
        Benchmark::Transposition => {
            benchmarks::run_transposition_invariance(&mut precomputed(&input, benchmark)?, suite)?
        }
        Benchmark::MelodyContinuation => {
            let ratings = input
                .ratings
                .clone()
                .unwrap_or_else(|| melody::default_ratings_path(suite));
            benchmarks::run_melody_continuation(&mut precomputed(&input, benchmark)?, suite, &ratings)?
        }
        Benchmark::ChordAlignment => {
            let ratings = input
                .ratings
                .clone()
                .unwrap_or_else(|| chord::default_ratings_path(suite));
            benchmarks::run_chord_alignment(&mut precomputed(&input, benchmark)?, suite, &ratings)?
        }
        Benchmark::Glass => surprise(&input, SurprisePiece::Glass, benchmark)?,
        Benchmark::Mussorgsky => surprise(&input, SurprisePiece::Mussorgsky, benchmark)?,
    };

    Ok(report)
}
