// Melody Continuation Generator - A context melody followed by each of 25 candidate notes
// The context must end on C4 or F#4; candidates span an octave either side

use std::path::Path;

use crate::midi::{self, Event, Timeline, TrackTimeline};

use super::{
    file_stem, ContextEnding, GeneratedStimulus, GeneratorError, GeneratorResult, StimulusId,
    StimulusWriter,
};

const CONTINUATION_VELOCITY: u8 = 90;

/// Default length of the continuation note in ticks
pub const DEFAULT_CONTINUATION_TICKS: u64 = 480;

/// Generator for melody continuation stimuli
pub struct MelodyContinuationGenerator {
    writer: StimulusWriter,
}

impl MelodyContinuationGenerator {
    pub fn new(writer: StimulusWriter) -> Self {
        MelodyContinuationGenerator { writer }
    }

    /// Write 25 continuations of the context in `context_path`
    ///
    /// All context tracks are merged into one track; the continuation note
    /// starts where the context ends. `prefix` defaults to the context file stem.
    pub fn generate_continuations(
        &self,
        context_path: &Path,
        ending: ContextEnding,
        prefix: Option<&str>,
        duration: u64,
    ) -> GeneratorResult<Vec<GeneratedStimulus>> {
        if !context_path.exists() {
            return Err(GeneratorError::NotFound(context_path.to_path_buf()));
        }
        let context = midi::load(context_path)?;

        let last = last_sounding_key(&context);
        if last != Some(ending.key()) {
            return Err(GeneratorError::InvalidInput(format!(
                "Context melody does not end on {} (found {:?}, expected {})",
                ending.as_str(),
                last,
                ending.key()
            )));
        }

        let prefix = match prefix {
            Some(prefix) => prefix.to_string(),
            None => file_stem(context_path),
        };
        let merged = merge_tracks(&context);

        let base = ending.key() - 12;
        let mut outputs = Vec::with_capacity(25);
        for (i, note) in (base..=base + 24).enumerate() {
            let mut track = self.writer.track();
            track
                .append_track(&merged)
                .add_note(note, CONTINUATION_VELOCITY, 0, duration);

            let mut timeline = Timeline::new(context.ticks_per_beat);
            timeline.tracks.push(track.finish());

            let id = StimulusId::MelodyContinuation {
                prefix: prefix.clone(),
                ending,
                index: i + 1,
                note,
            };
            let path = self.writer.save::<GeneratorError>(&timeline, &id)?;
            outputs.push(GeneratedStimulus { id, path });
        }

        log::info!(
            "Wrote {} continuations of {} from {}",
            outputs.len(),
            prefix,
            ending.as_str()
        );
        Ok(outputs)
    }
}

/// Key of the last sounding note-on across all tracks, by time
fn last_sounding_key(timeline: &Timeline) -> Option<u8> {
    timeline
        .tracks
        .iter()
        .flat_map(|track| track.events.iter())
        .filter_map(|timed| match timed.event {
            Event::NoteOn(note) => Some((timed.tick, note.key)),
            _ => None,
        })
        .max_by_key(|(tick, _)| *tick)
        .map(|(_, key)| key)
}

/// All tracks of a timeline as one track in absolute time
fn merge_tracks(timeline: &Timeline) -> TrackTimeline {
    let mut merged = TrackTimeline::new();
    for track in &timeline.tracks {
        for timed in &track.events {
            merged.push(timed.tick, timed.event.clone());
        }
        merged.length = merged.length.max(track.length);
    }
    merged.sort_stable();
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_context(dir: &Path, name: &str, last_key: u8) -> std::path::PathBuf {
        let writer = StimulusWriter::new(dir).unwrap();
        let mut track = writer.track();
        track
            .add_note(62, 80, 0, 480)
            .add_note(64, 80, 0, 480)
            .add_note(last_key, 80, 0, 480);
        let path = dir.join(name);
        midi::save(&writer.timeline(track), &path).unwrap();
        path
    }

    #[test]
    fn test_generate_continuations() {
        let temp_dir = TempDir::new().unwrap();
        let out_dir = temp_dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();
        let context = write_context(temp_dir.path(), "M2_a.mid", 60);

        let generator = MelodyContinuationGenerator::new(StimulusWriter::new(&out_dir).unwrap());
        let outputs = generator
            .generate_continuations(&context, ContextEnding::C4, None, DEFAULT_CONTINUATION_TICKS)
            .unwrap();
        assert_eq!(outputs.len(), 25);
        assert!(out_dir.join("M2_a_from_C4_cont_1_C3.mid").exists());
        assert!(out_dir.join("M2_a_from_C4_cont_25_C5.mid").exists());

        // Continuation note follows the context directly
        let timeline = midi::load(&out_dir.join("M2_a_from_C4_cont_13_C4.mid")).unwrap();
        assert_eq!(timeline.note_on_count(), 4);
        assert_eq!(timeline.total_ticks(), 4 * 480);
        assert_eq!(last_sounding_key(&timeline), Some(60));
    }

    #[test]
    fn test_rejects_wrong_ending() {
        let temp_dir = TempDir::new().unwrap();
        let context = write_context(temp_dir.path(), "ctx.mid", 61);
        let generator = MelodyContinuationGenerator::new(StimulusWriter::new(temp_dir.path()).unwrap());

        let result = generator.generate_continuations(&context, ContextEnding::FSharp4, Some("x"), 480);
        assert!(matches!(result, Err(GeneratorError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_context() {
        let temp_dir = TempDir::new().unwrap();
        let generator = MelodyContinuationGenerator::new(StimulusWriter::new(temp_dir.path()).unwrap());

        let result = generator.generate_continuations(&temp_dir.path().join("none.mid"), ContextEnding::C4, None, 480);
        assert!(matches!(result, Err(GeneratorError::NotFound(_))));
    }
}
