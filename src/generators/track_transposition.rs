// Track Transposition Generator - Moves selected tracks of a file up and down

use std::path::Path;

use crate::midi;

use super::transform::transpose_track;
use super::{file_stem, GeneratedStimulus, GeneratorError, GeneratorResult, StimulusId, StimulusWriter};

/// Generator for per-track transposed copies
pub struct TrackTranspositionGenerator {
    writer: StimulusWriter,
}

impl TrackTranspositionGenerator {
    pub fn new(writer: StimulusWriter) -> Self {
        TrackTranspositionGenerator { writer }
    }

    /// For every listed track write one copy `semitones` up and one down
    ///
    /// All indices are validated before anything is written.
    pub fn generate_transposed_versions(
        &self,
        input: &Path,
        track_indices: &[usize],
        semitones: u8,
    ) -> GeneratorResult<Vec<GeneratedStimulus>> {
        if !input.exists() {
            return Err(GeneratorError::NotFound(input.to_path_buf()));
        }
        let timeline = midi::load(input)?;

        if let Some(bad) = track_indices.iter().find(|i| **i >= timeline.tracks.len()) {
            return Err(GeneratorError::Configuration(format!(
                "Invalid track index {}. File has {} tracks.",
                bad,
                timeline.tracks.len()
            )));
        }

        let stem = file_stem(input);
        let mut outputs = Vec::with_capacity(track_indices.len() * 2);
        for &track in track_indices {
            for offset in [semitones as i32, -(semitones as i32)] {
                let moved = transpose_track(&timeline, track, offset)?;
                let id = StimulusId::TrackTransposition {
                    stem: stem.clone(),
                    track,
                    semitones: offset,
                };
                let path = self.writer.save::<GeneratorError>(&moved, &id)?;
                log::info!("Transposed track {} by {} semitones: {}", track, offset, path.display());
                outputs.push(GeneratedStimulus { id, path });
            }
        }

        Ok(outputs)
    }
}
