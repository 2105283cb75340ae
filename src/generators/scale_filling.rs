// Scale Filling Generator - Root triad then an eight-note scale run with alternative degrees
// Anchors (1, 3, 5, 8) stay fixed; positions 2, 4, 6 and 7 take every alternative

use super::{
    GeneratedStimulus, GeneratorError, GeneratorResult, ScaleMode, StimulusId, StimulusWriter,
};

const MAJOR_SCALE: [u8; 8] = [0, 2, 4, 5, 7, 9, 11, 12];
const MINOR_SCALE: [u8; 8] = [0, 2, 3, 5, 7, 8, 10, 12];

/// Scale positions that take alternatives, in variant order
const VARIABLE_POSITIONS: [usize; 4] = [1, 3, 5, 6];

/// Semitones above the root tried at each variable position
const ALTERNATIVES: [&[u8]; 4] = [&[1, 2, 3], &[5, 6], &[8, 9], &[10, 11]];

const TRIAD_VELOCITY: u8 = 80;
const TRIAD_TICKS: u64 = 480;
const REST_TICKS: u64 = 960;
const SCALE_VELOCITY: u8 = 70;
const SCALE_NOTE_TICKS: u64 = 240;

/// Semitones above the root of the eight scale tones (octave included)
pub fn scale_intervals(mode: ScaleMode) -> [u8; 8] {
    match mode {
        ScaleMode::Major => MAJOR_SCALE,
        ScaleMode::Minor => MINOR_SCALE,
    }
}

/// Every combination of alternatives, in lexicographic order
pub fn all_variants() -> Vec<[u8; 4]> {
    let mut variants = Vec::with_capacity(24);
    for &a in ALTERNATIVES[0] {
        for &b in ALTERNATIVES[1] {
            for &c in ALTERNATIVES[2] {
                for &d in ALTERNATIVES[3] {
                    variants.push([a, b, c, d]);
                }
            }
        }
    }
    variants
}

/// The variant that reproduces the mode's own scale
pub fn correct_variant(mode: ScaleMode) -> [u8; 4] {
    let scale = scale_intervals(mode);
    VARIABLE_POSITIONS.map(|position| scale[position])
}

/// Scale intervals with the variable positions replaced
pub fn variant_scale(mode: ScaleMode, variant: [u8; 4]) -> [u8; 8] {
    let mut scale = scale_intervals(mode);
    for (position, value) in VARIABLE_POSITIONS.iter().zip(variant) {
        scale[*position] = value;
    }
    scale
}

/// Generator for scale filling stimuli
pub struct ScaleFillingGenerator {
    writer: StimulusWriter,
}

impl ScaleFillingGenerator {
    pub fn new(writer: StimulusWriter) -> Self {
        ScaleFillingGenerator { writer }
    }

    /// Write every variant for one root, each with its control file
    ///
    /// Exactly one variant matches the mode's own scale and is marked correct.
    pub fn generate_all_scale_variations(
        &self,
        root: u8,
        mode: ScaleMode,
    ) -> GeneratorResult<Vec<GeneratedStimulus>> {
        if root > 115 {
            return Err(GeneratorError::Configuration(format!(
                "Root {} leaves no room for an octave scale",
                root
            )));
        }

        let base = scale_intervals(mode);
        let triad = [root, root + base[2], root + base[4]];

        let mut outputs = Vec::new();
        for variant in all_variants() {
            let scale = variant_scale(mode, variant);
            let correct = variant == correct_variant(mode);

            for control in [false, true] {
                let mut track = self.writer.track();
                let mut first_delay = 0;
                if !control {
                    track.add_chord(&triad, TRIAD_VELOCITY, 0, TRIAD_TICKS);
                    first_delay = REST_TICKS;
                }
                for (i, interval) in scale.iter().enumerate() {
                    let delay = if i == 0 { first_delay } else { 0 };
                    track.add_note(root + interval, SCALE_VELOCITY, delay, SCALE_NOTE_TICKS);
                }

                let id = StimulusId::ScaleFilling {
                    root,
                    mode,
                    variant,
                    correct,
                    control,
                };
                let path = self.writer.save::<GeneratorError>(&self.writer.timeline(track), &id)?;
                outputs.push(GeneratedStimulus { id, path });
            }
        }

        log::info!(
            "Wrote {} scale filling files for root {} ({})",
            outputs.len(),
            root,
            mode.as_str()
        );
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi;
    use tempfile::TempDir;

    #[test]
    fn test_variants() {
        let variants = all_variants();
        assert_eq!(variants.len(), 24);
        assert_eq!(variants[0], [1, 5, 8, 10]);

        for mode in [ScaleMode::Major, ScaleMode::Minor] {
            let correct = variants
                .iter()
                .filter(|v| variant_scale(mode, **v) == scale_intervals(mode))
                .count();
            assert_eq!(correct, 1);
        }
        assert_eq!(correct_variant(ScaleMode::Major), [2, 5, 9, 11]);
        assert_eq!(correct_variant(ScaleMode::Minor), [2, 5, 8, 10]);
    }

    #[test]
    fn test_generate_major_variations() {
        let temp_dir = TempDir::new().unwrap();
        let generator = ScaleFillingGenerator::new(StimulusWriter::new(temp_dir.path()).unwrap());

        let outputs = generator.generate_all_scale_variations(60, ScaleMode::Major).unwrap();
        assert_eq!(outputs.len(), 48);

        let correct = temp_dir.path().join("60_major_scale_p1-2_p3-5_p5-9_p7-11_correct.mid");
        let control = temp_dir
            .path()
            .join("60_major_scale_p1-2_p3-5_p5-9_p7-11_correct_control.mid");
        assert!(correct.exists());
        assert!(control.exists());

        // Triad plus eight scale tones; control has only the scale
        assert_eq!(midi::load(&correct).unwrap().note_on_count(), 11);
        let control_timeline = midi::load(&control).unwrap();
        assert_eq!(control_timeline.note_on_count(), 8);
        assert_eq!(control_timeline.total_ticks(), 8 * 240);

        let full = midi::load(&correct).unwrap();
        assert_eq!(full.total_ticks(), 480 + 960 + 8 * 240);
    }
}
