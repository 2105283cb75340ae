//! Command-line argument definitions for `midibench`.
//!
//! All clap types live here so `lib.rs` only handles dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::benchmarks::interval_recognition::DEFAULT_PERMUTATIONS;
use crate::generators::{ContextEnding, ScaleMode};

/// midibench - MIDI stimulus generation and music-model benchmarks
#[derive(Parser)]
#[command(name = "midibench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Log per-unit and per-file detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Write bar/phrase reshuffled versions of MIDI files
    Shuffle {
        /// Input MIDI files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (created if missing)
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Settings file (JSON); flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Versions to write per input
        #[arg(short = 'n', long)]
        num_versions: Option<usize>,

        /// Ticks per bar (default: from the first time signature)
        #[arg(long)]
        ticks_per_bar: Option<u64>,

        /// Bars per reordered unit
        #[arg(short, long)]
        phrase_length: Option<u32>,

        /// Keep the first and last unit in place
        #[arg(long)]
        preserve_endpoints: bool,

        /// Seed for the session's random generator
        #[arg(long)]
        seed: Option<u64>,

        /// Draws allowed per version before giving up
        #[arg(long)]
        max_attempts: Option<usize>,

        /// Append every written file to manifest.jsonl
        #[arg(long)]
        manifest: bool,
    },

    /// Generate a fixed-pattern stimulus set
    Generate {
        /// Suite root directory (created if missing)
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Seed for randomised sets
        #[arg(long)]
        seed: Option<u64>,

        /// Append every written file to manifest.jsonl
        #[arg(long)]
        manifest: bool,

        #[command(subcommand)]
        suite: SuiteCommand,
    },

    /// Write copies of a file with chosen tracks moved up and down
    TransposeTracks {
        /// Input MIDI file
        input: PathBuf,

        /// Output directory (created if missing)
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Track indices, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        tracks: Vec<usize>,

        /// Semitones to move each track by
        #[arg(short, long, default_value_t = 12)]
        semitones: u8,

        /// Append every written file to manifest.jsonl
        #[arg(long)]
        manifest: bool,
    },

    /// Write copies of a file with randomly chosen notes shifted
    AlterNotes {
        /// Input MIDI file
        input: PathBuf,

        /// Output directory (created if missing)
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Versions to write
        #[arg(short = 'n', long, default_value_t = 5)]
        num_versions: usize,

        /// Notes to shift per version
        #[arg(long, default_value_t = 1)]
        notes: usize,

        /// Shift in semitones
        #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
        interval: i32,

        /// Seed for the note choice
        #[arg(long)]
        seed: Option<u64>,

        /// Append every written file to manifest.jsonl
        #[arg(long)]
        manifest: bool,
    },

    /// Score a benchmark from precomputed model outputs
    Score {
        /// Benchmark name (cadence, scale-filling, interval-recognition,
        /// transposition, melody-continuation, chord-alignment, glass, mussorgsky)
        benchmark: String,

        /// Suite root directory
        #[arg(short, long)]
        suite: PathBuf,

        /// JSON object mapping suite-relative stimulus paths to NLL
        #[arg(long)]
        nll: Option<PathBuf>,

        /// Human ratings or surprise events table (default: the suite's own)
        #[arg(long)]
        ratings: Option<PathBuf>,

        /// CSV of `time,surprisal` for glass and mussorgsky
        #[arg(long)]
        surprisal: Option<PathBuf>,

        /// Permutation folders for interval recognition
        #[arg(long, default_value_t = DEFAULT_PERMUTATIONS)]
        permutations: usize,

        /// Scale mode for scale filling
        #[arg(long, default_value = "major", value_parser = parse_mode)]
        mode: ScaleMode,
    },
}

#[derive(Subcommand)]
pub(crate) enum SuiteCommand {
    /// Every resolution after I-IV-I-V for tonics 60-71
    Cadence,

    /// Every scale variant for roots 48-72
    ScaleFilling {
        #[arg(long, default_value = "major", value_parser = parse_mode)]
        mode: ScaleMode,
    },

    /// Context examples then every candidate ending, per permutation folder
    IntervalRecognition {
        /// Context examples per trial
        #[arg(long, default_value_t = 4)]
        examples: usize,

        #[arg(long, default_value_t = DEFAULT_PERMUTATIONS)]
        permutations: usize,
    },

    /// Context-free intervals for start notes 36-84
    Transposition,

    /// 25 continuations of a context melody
    MelodyContinuation {
        /// Context MIDI file
        context: PathBuf,

        /// Final note of the context (C4 or F#4)
        #[arg(long, value_parser = parse_ending)]
        ending: ContextEnding,

        /// File name prefix (default: context file stem)
        #[arg(long)]
        prefix: Option<String>,
    },
}

fn parse_mode(s: &str) -> Result<ScaleMode, String> {
    ScaleMode::from_string(s).ok_or_else(|| format!("unknown scale mode '{}'", s))
}

fn parse_ending(s: &str) -> Result<ContextEnding, String> {
    ContextEnding::from_string(s).ok_or_else(|| format!("unknown context ending '{}'", s))
}
