// Interval Recognition Generator - Context examples of a target interval, then every candidate ending
// The test start note is always one the context never used

use rand::seq::SliceRandom;
use rand::Rng;

use super::interval_likelihood::offset_note;
use super::{GeneratedStimulus, GeneratorError, GeneratorResult, StimulusId, StimulusWriter, INTERVAL_RANGE};

/// Candidate start notes (C3 to C5)
const NOTE_RANGE: std::ops::RangeInclusive<u8> = 48..=72;

const CONTEXT_VELOCITY: u8 = 80;
const TEST_VELOCITY: u8 = 90;
const NOTE_TICKS: u64 = 480;

/// Generator for interval recognition stimuli
pub struct IntervalRecognitionGenerator {
    writer: StimulusWriter,
}

impl IntervalRecognitionGenerator {
    pub fn new(writer: StimulusWriter) -> Self {
        IntervalRecognitionGenerator { writer }
    }

    /// Write the correct file and every foil for one target interval
    pub fn generate_comprehensive_test<R: Rng>(
        &self,
        target: i8,
        num_examples: usize,
        rng: &mut R,
    ) -> GeneratorResult<Vec<GeneratedStimulus>> {
        self.generate_into(&self.writer, target, num_examples, rng)
    }

    /// Independent trials for one target written to `perm1..permN`
    pub fn generate_permutations<R: Rng>(
        &self,
        target: i8,
        num_examples: usize,
        num_permutations: usize,
        rng: &mut R,
    ) -> GeneratorResult<Vec<GeneratedStimulus>> {
        let mut outputs = Vec::new();
        for perm in 1..=num_permutations {
            let writer = self.writer.subdirectory(&format!("perm{}", perm))?;
            outputs.extend(self.generate_into(&writer, target, num_examples, rng)?);
        }
        Ok(outputs)
    }

    /// Every target interval in every permutation folder
    pub fn generate_suite<R: Rng>(
        &self,
        num_examples: usize,
        num_permutations: usize,
        rng: &mut R,
    ) -> GeneratorResult<Vec<GeneratedStimulus>> {
        let mut outputs = Vec::new();
        for perm in 1..=num_permutations {
            let writer = self.writer.subdirectory(&format!("perm{}", perm))?;
            for target in INTERVAL_RANGE {
                outputs.extend(self.generate_into(&writer, target, num_examples, rng)?);
            }
        }
        Ok(outputs)
    }

    fn generate_into<R: Rng>(
        &self,
        writer: &StimulusWriter,
        target: i8,
        num_examples: usize,
        rng: &mut R,
    ) -> GeneratorResult<Vec<GeneratedStimulus>> {
        if !INTERVAL_RANGE.contains(&target) {
            return Err(GeneratorError::Configuration(format!(
                "Target interval {} is beyond an octave",
                target
            )));
        }

        let mut available: Vec<u8> = NOTE_RANGE.collect();
        available.shuffle(rng);
        let context: Vec<u8> = available.iter().copied().take(num_examples).collect();

        let mut used = context.clone();
        used.extend(context.iter().filter_map(|note| offset_note(*note, target)));

        let fresh: Vec<u8> = available
            .iter()
            .copied()
            .filter(|note| !used.contains(note))
            .collect();
        let test_note = *fresh.choose(rng).ok_or_else(|| {
            GeneratorError::InvalidInput(format!(
                "No unused start note left for interval {} with {} examples",
                target, num_examples
            ))
        })?;

        let mut outputs = Vec::new();
        for candidate in INTERVAL_RANGE {
            let Some(test_end) = offset_note(test_note, candidate) else {
                continue;
            };

            let mut track = writer.track();
            for (i, start) in context.iter().enumerate() {
                let delay = if i == 0 { 0 } else { 480 };
                track.add_note(*start, CONTEXT_VELOCITY, delay, NOTE_TICKS);
                if let Some(end) = offset_note(*start, target) {
                    track.add_note(end, CONTEXT_VELOCITY, 0, NOTE_TICKS);
                }
            }
            track
                .add_note(test_note, TEST_VELOCITY, 480, NOTE_TICKS)
                .add_note(test_end, TEST_VELOCITY, 0, NOTE_TICKS);

            let id = StimulusId::IntervalRecognition { target, candidate };
            let path = writer.save::<GeneratorError>(&writer.timeline(track), &id)?;
            outputs.push(GeneratedStimulus { id, path });
        }

        log::debug!(
            "Interval {}: test note {} after {} examples in {}",
            target,
            test_note,
            context.len(),
            writer.output_dir().display()
        );
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{self, Event};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use tempfile::TempDir;

    #[test]
    fn test_comprehensive_test_writes_all_candidates() {
        let temp_dir = TempDir::new().unwrap();
        let generator = IntervalRecognitionGenerator::new(StimulusWriter::new(temp_dir.path()).unwrap());
        let mut rng = Pcg32::seed_from_u64(11);

        let outputs = generator.generate_comprehensive_test(5, 4, &mut rng).unwrap();
        assert_eq!(outputs.len(), 25);
        assert!(temp_dir.path().join("p4_correct.mid").exists());
        assert!(temp_dir.path().join("p4_test_-octave.mid").exists());
        assert!(!temp_dir.path().join("p4_test_p4.mid").exists());

        // Four context pairs then the test pair
        let timeline = midi::load(&temp_dir.path().join("p4_correct.mid")).unwrap();
        let keys: Vec<u8> = timeline.tracks[0]
            .events
            .iter()
            .filter_map(|t| match t.event {
                Event::NoteOn(note) => Some(note.key),
                _ => None,
            })
            .collect();
        assert_eq!(keys.len(), 10);
        assert_eq!(keys[9], keys[8] + 5);
        assert!(!keys[..8].contains(&keys[8]));
    }

    #[test]
    fn test_permutation_folders() {
        let temp_dir = TempDir::new().unwrap();
        let generator = IntervalRecognitionGenerator::new(StimulusWriter::new(temp_dir.path()).unwrap());
        let mut rng = Pcg32::seed_from_u64(2);

        let outputs = generator.generate_permutations(-3, 4, 2, &mut rng).unwrap();
        assert_eq!(outputs.len(), 50);
        assert!(temp_dir.path().join("perm1").join("-min3_correct.mid").exists());
        assert!(temp_dir.path().join("perm2").join("-min3_test_unison.mid").exists());
    }

    #[test]
    fn test_too_many_examples() {
        let temp_dir = TempDir::new().unwrap();
        let generator = IntervalRecognitionGenerator::new(StimulusWriter::new(temp_dir.path()).unwrap());
        let mut rng = Pcg32::seed_from_u64(5);

        let result = generator.generate_comprehensive_test(0, 25, &mut rng);
        assert!(matches!(result, Err(GeneratorError::InvalidInput(_))));
    }
}
