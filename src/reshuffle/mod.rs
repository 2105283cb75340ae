// Bar/phrase reshuffling module
// Cuts a timeline into fixed-width units, reorders them and stitches the result back together

pub mod generator;
pub mod permutation;
pub mod relinearize;
pub mod segment;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

use crate::midi::CodecError;
use crate::pipeline::ManifestError;
use crate::state::StorageError;

pub use generator::{BarShufflingGenerator, BatchReport, ReshuffleReport};
pub use permutation::{max_distinct_permutations, sample_order, CapacityWarning, PermutationSampler};
pub use relinearize::relinearize;
pub use segment::{segment, unit_count, unit_index, Segmentation, SegmentedTrack, UnitEvent};
pub use settings::ReshuffleSettings;

#[derive(Debug, Error)]
pub enum ReshuffleError {
    #[error("Input MIDI file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("No unused permutation found after {attempts} attempts")]
    ExhaustedPermutations { attempts: usize },

    #[error("MIDI error: {0}")]
    Codec(#[from] CodecError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

pub type ReshuffleResult<T> = Result<T, ReshuffleError>;
