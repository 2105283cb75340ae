// Stimulus generators
// Template instantiation over small parameter enumerations, plus file transforms

pub mod base;
pub mod cadence;
pub mod interval_likelihood;
pub mod interval_recognition;
pub mod melody_continuation;
pub mod note_alteration;
pub mod scale_filling;
pub mod stimulus;
pub mod track_transposition;
pub mod transform;

use std::path::PathBuf;
use thiserror::Error;

use crate::midi::CodecError;
use crate::pipeline::ManifestError;
use crate::state::StorageError;

pub use base::{file_stem, note_name, session_rng, StimulusWriter, TrackWriter, WriterSettings};
pub use cadence::CadenceGenerator;
pub use interval_likelihood::{ContextSpec, IntervalLikelihoodGenerator};
pub use interval_recognition::IntervalRecognitionGenerator;
pub use melody_continuation::MelodyContinuationGenerator;
pub use note_alteration::NoteAlterationGenerator;
pub use scale_filling::ScaleFillingGenerator;
pub use stimulus::{
    interval_name, ContextEnding, GeneratedStimulus, IntervalSpelling,
    ScaleMode, StimulusId, TriadQuality, INTERVAL_RANGE,
};
pub use track_transposition::TrackTranspositionGenerator;
pub use transform::{time_dilate_timeline, transpose_timeline, transpose_track};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("MIDI error: {0}")]
    Codec(#[from] CodecError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;
