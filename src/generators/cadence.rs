// Cadence Generator - Backbone progression followed by every possible resolution triad
// Chords are voice-led: each triad takes the inversion closest to the chord before it

use crate::midi::{MetaEvent, TimeSignature};

use super::{
    GeneratedStimulus, GeneratorError, GeneratorResult, StimulusId, StimulusWriter, TrackWriter,
    TriadQuality,
};

/// Major scale degrees in semitones above the tonic
const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

const ROMAN: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// Default backbone: I-IV-I-V
pub const DEFAULT_PROGRESSION: [u8; 4] = [1, 4, 1, 5];

/// Cadences play at 100 BPM
const CADENCE_TEMPO_US: u32 = 600_000;

const CHORD_VELOCITY: u8 = 80;

/// Triad quality of a scale degree in a major key
pub fn degree_quality(degree: u8) -> TriadQuality {
    match degree {
        2 | 3 | 6 => TriadQuality::Minor,
        7 => TriadQuality::Diminished,
        _ => TriadQuality::Major,
    }
}

/// Roman numeral for a scale degree, cased by chord quality
pub fn roman_numeral(degree: u8, quality: TriadQuality) -> String {
    let Some(numeral) = (degree as usize).checked_sub(1).and_then(|i| ROMAN.get(i)) else {
        return degree.to_string();
    };
    match quality {
        TriadQuality::Major => numeral.to_string(),
        TriadQuality::Minor => numeral.to_lowercase(),
        TriadQuality::Diminished => format!("{}°", numeral.to_lowercase()),
    }
}

/// Root-position triad on `root`
pub fn triad(root: u8, quality: TriadQuality) -> Vec<u8> {
    quality
        .intervals()
        .iter()
        .map(|interval| root.saturating_add(*interval).min(127))
        .collect()
}

/// Voicing of a triad (pitch classes of `root` + `quality`) nearest to `previous`
///
/// Tries every inversion in close position at every octave around the previous
/// chord and keeps the one with the smallest summed movement of sorted voices.
pub fn voice_lead(root_class: u8, quality: TriadQuality, previous: &[u8]) -> Vec<u8> {
    let classes: Vec<u8> = quality
        .intervals()
        .iter()
        .map(|interval| (root_class + interval) % 12)
        .collect();
    let anchor = previous.iter().copied().min().unwrap_or(60) as i32;

    let mut best: Option<(i32, Vec<u8>)> = None;
    for inversion in 0..classes.len() {
        let order: Vec<u8> = (0..classes.len())
            .map(|i| classes[(inversion + i) % classes.len()])
            .collect();
        for octave_shift in -2..=1 {
            let base_octave = (anchor / 12 + octave_shift) * 12;
            let mut voicing = Vec::with_capacity(order.len());
            let mut last = base_octave + order[0] as i32;
            voicing.push(last);
            for class in &order[1..] {
                let mut note = (last / 12) * 12 + *class as i32;
                while note <= last {
                    note += 12;
                }
                voicing.push(note);
                last = note;
            }
            if voicing.iter().any(|note| !(0..=127).contains(note)) {
                continue;
            }

            let cost: i32 = voicing
                .iter()
                .zip(previous.iter())
                .map(|(a, b)| (a - *b as i32).abs())
                .sum();
            if best.as_ref().map_or(true, |(best_cost, _)| cost < *best_cost) {
                best = Some((cost, voicing.iter().map(|n| *n as u8).collect()));
            }
        }
    }

    best.map(|(_, voicing)| voicing)
        .unwrap_or_else(|| triad(root_class + 60, quality))
}

/// Generator for cadence stimuli
pub struct CadenceGenerator {
    writer: StimulusWriter,
}

impl CadenceGenerator {
    pub fn new(writer: StimulusWriter) -> Self {
        CadenceGenerator { writer }
    }

    /// Write one file per resolution (12 roots x 3 qualities) after the backbone
    ///
    /// `tonic` is a MIDI note (60-71 in the standard suite); `progression`
    /// holds major-key scale degrees 1-7.
    pub fn generate_all_resolutions(
        &self,
        tonic: u8,
        progression: &[u8],
    ) -> GeneratorResult<Vec<GeneratedStimulus>> {
        if progression.is_empty() {
            return Err(GeneratorError::Configuration(
                "Backbone progression is empty".to_string(),
            ));
        }
        if let Some(bad) = progression.iter().find(|d| !(1..=7).contains(*d)) {
            return Err(GeneratorError::Configuration(format!(
                "Scale degree {} is outside 1-7",
                bad
            )));
        }
        if tonic > 115 {
            return Err(GeneratorError::Configuration(format!(
                "Tonic {} leaves no room for a triad",
                tonic
            )));
        }

        let mut numerals = Vec::with_capacity(progression.len());
        let mut backbone: Vec<Vec<u8>> = Vec::with_capacity(progression.len());
        let mut previous = triad(tonic, TriadQuality::Major);
        for &degree in progression {
            let quality = degree_quality(degree);
            numerals.push(roman_numeral(degree, quality));

            let root_class = (tonic + MAJOR_SCALE[(degree - 1) as usize]) % 12;
            let chord = voice_lead(root_class, quality, &previous);
            previous = chord.clone();
            backbone.push(chord);
        }

        let bar = self.writer.settings().ticks_per_beat as u64;
        let one_four = TimeSignature {
            numerator: 1,
            ..TimeSignature::four_four()
        };

        let mut outputs = Vec::with_capacity(36);
        for half_steps in 0..12u8 {
            for quality in TriadQuality::ALL {
                let resolution = voice_lead((tonic + half_steps) % 12, quality, &previous);

                // One quarter note per bar at 100 BPM
                let mut track = TrackWriter::with_tempo(CADENCE_TEMPO_US);
                track.meta(MetaEvent::TimeSignature(one_four));
                for chord in backbone.iter().chain(std::iter::once(&resolution)) {
                    track.add_chord(chord, CHORD_VELOCITY, 0, bar);
                }
                let timeline = self.writer.timeline(track);

                let id = StimulusId::Cadence {
                    tonic,
                    numerals: numerals.clone(),
                    half_steps,
                    quality,
                };
                let path = self.writer.save::<GeneratorError>(&timeline, &id)?;
                outputs.push(GeneratedStimulus { id, path });
            }
        }

        log::info!(
            "Wrote {} cadence resolutions for tonic {} ({})",
            outputs.len(),
            tonic,
            numerals.join("-")
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
    fn test_roman_numerals() {
        assert_eq!(roman_numeral(1, degree_quality(1)), "I");
        assert_eq!(roman_numeral(2, degree_quality(2)), "ii");
        assert_eq!(roman_numeral(5, degree_quality(5)), "V");
        assert_eq!(roman_numeral(7, degree_quality(7)), "vii°");
        assert_eq!(roman_numeral(9, TriadQuality::Major), "9");
    }

    #[test]
    fn test_voice_lead_keeps_common_tones() {
        // C major (C E G) to F major: closest voicing is C F A
        let c_major = triad(60, TriadQuality::Major);
        let f_major = voice_lead(5, TriadQuality::Major, &c_major);
        assert_eq!(f_major, vec![60, 65, 69]);

        // Same chord stays put
        assert_eq!(voice_lead(0, TriadQuality::Major, &c_major), c_major);
    }

    #[test]
    fn test_generate_all_resolutions() {
        let temp_dir = TempDir::new().unwrap();
        let writer = StimulusWriter::new(temp_dir.path()).unwrap();
        let generator = CadenceGenerator::new(writer);

        let outputs = generator
            .generate_all_resolutions(60, &DEFAULT_PROGRESSION)
            .unwrap();
        assert_eq!(outputs.len(), 36);
        assert!(temp_dir
            .path()
            .join("60_from_I-IV-I-V_to_0_maj.mid")
            .exists());
        assert!(temp_dir.path().join("60_from_I-IV-I-V_to_11_dim.mid").exists());

        // Four backbone chords plus the resolution, three notes each
        let timeline = midi::load(&outputs[0].path).unwrap();
        assert_eq!(timeline.note_on_count(), 15);
        assert_eq!(timeline.total_ticks(), 5 * 480);
    }

    #[test]
    fn test_rejects_bad_degree() {
        let temp_dir = TempDir::new().unwrap();
        let generator = CadenceGenerator::new(StimulusWriter::new(temp_dir.path()).unwrap());

        let result = generator.generate_all_resolutions(60, &[1, 8]);
        assert!(matches!(result, Err(GeneratorError::Configuration(_))));
    }
}
