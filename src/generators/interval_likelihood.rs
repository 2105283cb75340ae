// Interval Likelihood Generator - Every interval from a start note, optionally after context
// The context-free sets feed the transposition invariance benchmark

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{GeneratedStimulus, GeneratorError, GeneratorResult, StimulusId, StimulusWriter, INTERVAL_RANGE};

/// Start notes for context examples (C3 to C5)
const CONTEXT_NOTE_RANGE: std::ops::RangeInclusive<u8> = 48..=72;

const CONTEXT_VELOCITY: u8 = 80;
const TEST_VELOCITY: u8 = 90;
const NOTE_TICKS: u64 = 480;

/// Example pairs of one interval played before the test interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSpec {
    /// Interval of every context pair in semitones
    pub interval: i8,

    /// Number of context pairs
    pub count: usize,
}

/// Generator for interval likelihood stimuli
pub struct IntervalLikelihoodGenerator {
    writer: StimulusWriter,
}

impl IntervalLikelihoodGenerator {
    pub fn new(writer: StimulusWriter) -> Self {
        IntervalLikelihoodGenerator { writer }
    }

    /// Write one file per interval from -12 to +12 starting at `start_note`
    ///
    /// Intervals whose end note leaves 0-127 are skipped. Context start notes
    /// avoid the test note and its two neighbours on each side.
    pub fn generate_all_intervals<R: Rng>(
        &self,
        start_note: u8,
        context: Option<ContextSpec>,
        rng: &mut R,
    ) -> GeneratorResult<Vec<GeneratedStimulus>> {
        if start_note > 127 {
            return Err(GeneratorError::Configuration(format!(
                "Start note {} is outside 0-127",
                start_note
            )));
        }

        let pairs = match context {
            Some(spec) => context_pairs(start_note, spec, rng),
            None => Vec::new(),
        };
        let context_interval = if pairs.is_empty() {
            None
        } else {
            context.map(|spec| spec.interval)
        };

        let mut outputs = Vec::new();
        for semitones in INTERVAL_RANGE {
            let Some(end_note) = offset_note(start_note, semitones) else {
                continue;
            };

            let mut track = self.writer.track();
            for (i, (ctx_start, ctx_end)) in pairs.iter().enumerate() {
                let delay = if i == 0 { 480 } else { 240 };
                track
                    .add_note(*ctx_start, CONTEXT_VELOCITY, delay, NOTE_TICKS)
                    .add_note(*ctx_end, CONTEXT_VELOCITY, 0, NOTE_TICKS)
                    .rest(240);
            }

            let test_delay = if pairs.is_empty() { 480 } else { 960 };
            track
                .add_note(start_note, TEST_VELOCITY, test_delay, NOTE_TICKS)
                .add_note(end_note, TEST_VELOCITY, 0, NOTE_TICKS);

            let id = StimulusId::Interval {
                start_note,
                semitones,
                context: context_interval,
            };
            let path = self.writer.save::<GeneratorError>(&self.writer.timeline(track), &id)?;
            outputs.push(GeneratedStimulus { id, path });
        }

        log::info!("Wrote {} interval files from note {}", outputs.len(), start_note);
        Ok(outputs)
    }

    /// Context-free interval sets for every start note in `notes`
    pub fn generate_transposition_suite<R: Rng>(
        &self,
        notes: std::ops::RangeInclusive<u8>,
        rng: &mut R,
    ) -> GeneratorResult<Vec<GeneratedStimulus>> {
        let mut outputs = Vec::new();
        for note in notes {
            outputs.extend(self.generate_all_intervals(note, None, rng)?);
        }
        Ok(outputs)
    }
}

/// `note + semitones` when it stays a valid MIDI key
pub(crate) fn offset_note(note: u8, semitones: i8) -> Option<u8> {
    let end = note as i16 + semitones as i16;
    (0..=127).contains(&end).then_some(end as u8)
}

fn context_pairs<R: Rng>(start_note: u8, spec: ContextSpec, rng: &mut R) -> Vec<(u8, u8)> {
    let excluded = start_note.saturating_sub(2)..=start_note.saturating_add(2);
    let mut available: Vec<u8> = CONTEXT_NOTE_RANGE
        .filter(|note| !excluded.contains(note))
        .collect();
    if available.len() < spec.count {
        log::warn!(
            "Only {} context notes available for {} examples, writing without context",
            available.len(),
            spec.count
        );
        return Vec::new();
    }

    available.shuffle(rng);
    available
        .into_iter()
        .take(spec.count)
        .filter_map(|note| offset_note(note, spec.interval).map(|end| (note, end)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{self, Event};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use tempfile::TempDir;

    #[test]
    fn test_offset_note() {
        assert_eq!(offset_note(60, 7), Some(67));
        assert_eq!(offset_note(5, -12), None);
        assert_eq!(offset_note(120, 12), None);
    }

    #[test]
    fn test_generate_without_context() {
        let temp_dir = TempDir::new().unwrap();
        let generator = IntervalLikelihoodGenerator::new(StimulusWriter::new(temp_dir.path()).unwrap());
        let mut rng = Pcg32::seed_from_u64(1);

        let outputs = generator.generate_all_intervals(60, None, &mut rng).unwrap();
        assert_eq!(outputs.len(), 25);
        assert!(temp_dir.path().join("pitch60_neg_octave.mid").exists());
        assert!(temp_dir.path().join("pitch60_p5.mid").exists());

        // Test pair starts after a quarter-note pause
        let timeline = midi::load(&temp_dir.path().join("pitch60_p5.mid")).unwrap();
        let first_on = timeline.tracks[0]
            .events
            .iter()
            .find(|t| matches!(t.event, Event::NoteOn(_)))
            .unwrap();
        assert_eq!(first_on.tick, 480);
        assert_eq!(timeline.note_on_count(), 2);
    }

    #[test]
    fn test_generate_with_context() {
        let temp_dir = TempDir::new().unwrap();
        let generator = IntervalLikelihoodGenerator::new(StimulusWriter::new(temp_dir.path()).unwrap());
        let mut rng = Pcg32::seed_from_u64(7);
        let spec = ContextSpec { interval: 7, count: 3 };

        let outputs = generator.generate_all_intervals(60, Some(spec), &mut rng).unwrap();
        assert_eq!(outputs.len(), 25);
        let path = temp_dir.path().join("pitch60_ctxp5_maj3.mid");
        assert!(path.exists());

        let timeline = midi::load(&path).unwrap();
        assert_eq!(timeline.note_on_count(), 8);

        // Context notes avoid the neighbourhood of the test note
        let ons: Vec<u8> = timeline.tracks[0]
            .events
            .iter()
            .filter_map(|t| match t.event {
                Event::NoteOn(note) => Some(note.key),
                _ => None,
            })
            .collect();
        for pair in ons[..6].chunks(2) {
            assert!(!(58..=62).contains(&pair[0]));
            assert_eq!(pair[1], pair[0] + 7);
        }
    }

    #[test]
    fn test_edge_start_note_skips_out_of_range() {
        let temp_dir = TempDir::new().unwrap();
        let generator = IntervalLikelihoodGenerator::new(StimulusWriter::new(temp_dir.path()).unwrap());
        let mut rng = Pcg32::seed_from_u64(3);

        let outputs = generator.generate_all_intervals(5, None, &mut rng).unwrap();
        assert_eq!(outputs.len(), 18);
    }
}
