// Stimulus Identifiers - Structured parameter tuples for every generated file
// File names are derived here and nowhere else; they are never parsed back

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::base::note_name;

/// Interval sizes from an octave below to an octave above
pub const INTERVAL_RANGE: std::ops::RangeInclusive<i8> = -12..=12;

const INTERVAL_NAMES: [&str; 13] = [
    "unison", "min2", "maj2", "min3", "maj3", "p4", "tritone", "p5", "min6", "maj6", "min7",
    "maj7", "octave",
];

/// How a descending interval is spelled in a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalSpelling {
    /// `neg_p5` (interval likelihood / transposition sets)
    Prefixed,

    /// `-p5` (interval recognition sets)
    Signed,
}

/// Name of an interval in semitones, or `None` beyond an octave
pub fn interval_name(semitones: i8, spelling: IntervalSpelling) -> Option<String> {
    let base = INTERVAL_NAMES.get(semitones.unsigned_abs() as usize)?;
    if semitones >= 0 {
        return Some(base.to_string());
    }
    Some(match spelling {
        IntervalSpelling::Prefixed => format!("neg_{}", base),
        IntervalSpelling::Signed => format!("-{}", base),
    })
}

/// Quality of a triad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriadQuality {
    Major,
    Minor,
    Diminished,
}

impl TriadQuality {
    pub const ALL: [TriadQuality; 3] = [
        TriadQuality::Major,
        TriadQuality::Minor,
        TriadQuality::Diminished,
    ];

    /// Semitone offsets of root, third and fifth
    pub fn intervals(&self) -> [u8; 3] {
        match self {
            TriadQuality::Major => [0, 4, 7],
            TriadQuality::Minor => [0, 3, 7],
            TriadQuality::Diminished => [0, 3, 6],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TriadQuality::Major => "maj",
            TriadQuality::Minor => "min",
            TriadQuality::Diminished => "dim",
        }
    }
}

/// Mode of a scale run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    Major,
    Minor,
}

impl ScaleMode {
    /// Convert from string representation
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "major" => Some(ScaleMode::Major),
            "minor" => Some(ScaleMode::Minor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleMode::Major => "major",
            ScaleMode::Minor => "minor",
        }
    }
}

/// Final note of a melody continuation context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextEnding {
    C4,
    FSharp4,
}

impl ContextEnding {
    pub const ALL: [ContextEnding; 2] = [ContextEnding::C4, ContextEnding::FSharp4];

    /// Convert from string representation
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "C4" => Some(ContextEnding::C4),
            "F#4" => Some(ContextEnding::FSharp4),
            _ => None,
        }
    }

    /// MIDI key the context must end on
    pub fn key(&self) -> u8 {
        match self {
            ContextEnding::C4 => 60,
            ContextEnding::FSharp4 => 66,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextEnding::C4 => "C4",
            ContextEnding::FSharp4 => "F#4",
        }
    }
}

/// Everything needed to name, locate and describe one generated stimulus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StimulusId {
    /// Bar/phrase reshuffled copy of an input file
    Shuffled {
        stem: String,
        phrase_length: u32,
        /// 1-based version number
        version: usize,
    },

    /// Backbone progression followed by one resolution triad
    Cadence {
        tonic: u8,
        numerals: Vec<String>,
        /// Resolution root above the tonic (0-11)
        half_steps: u8,
        quality: TriadQuality,
    },

    /// Two-note interval from a start note, optionally after context pairs
    Interval {
        start_note: u8,
        semitones: i8,
        context: Option<i8>,
    },

    /// One candidate ending of an interval recognition trial
    IntervalRecognition { target: i8, candidate: i8 },

    /// Triad then scale run with four alternative degrees
    ScaleFilling {
        root: u8,
        mode: ScaleMode,
        /// Semitones above the root at positions 1, 3, 5 and 6
        variant: [u8; 4],
        correct: bool,
        /// Scale run without the triad context
        control: bool,
    },

    /// Context melody plus a single continuation note
    MelodyContinuation {
        prefix: String,
        ending: ContextEnding,
        /// 1-based position in the 25-note range
        index: usize,
        note: u8,
    },

    /// One track of an input file moved up or down
    TrackTransposition {
        stem: String,
        track: usize,
        semitones: i32,
    },

    /// Copy of an input file with some notes shifted
    NoteAlteration {
        stem: String,
        notes: usize,
        interval: i32,
        version: usize,
    },
}

impl StimulusId {
    /// File name (with `.mid` extension) for this stimulus
    pub fn file_name(&self) -> String {
        match self {
            StimulusId::Shuffled {
                stem,
                phrase_length,
                version,
            } => format!("{}_shuffled_p{}_v{}.mid", stem, phrase_length, version),
            StimulusId::Cadence {
                tonic,
                numerals,
                half_steps,
                quality,
            } => format!(
                "{}_from_{}_to_{}_{}.mid",
                tonic,
                numerals.join("-"),
                half_steps,
                quality.as_str()
            ),
            StimulusId::Interval {
                start_note,
                semitones,
                context,
            } => {
                let name = prefixed_name(*semitones);
                match context {
                    Some(ctx) => format!("pitch{}_ctx{}_{}.mid", start_note, prefixed_name(*ctx), name),
                    None => format!("pitch{}_{}.mid", start_note, name),
                }
            }
            StimulusId::IntervalRecognition { target, candidate } => {
                let target_name = signed_name(*target);
                if target == candidate {
                    format!("{}_correct.mid", target_name)
                } else {
                    format!("{}_test_{}.mid", target_name, signed_name(*candidate))
                }
            }
            StimulusId::ScaleFilling {
                root,
                mode,
                variant,
                correct,
                control,
            } => format!(
                "{}_{}_scale_p1-{}_p3-{}_p5-{}_p7-{}{}{}.mid",
                root,
                mode.as_str(),
                variant[0],
                variant[1],
                variant[2],
                variant[3],
                if *correct { "_correct" } else { "" },
                if *control { "_control" } else { "" },
            ),
            StimulusId::MelodyContinuation {
                prefix,
                ending,
                index,
                note,
            } => format!(
                "{}_from_{}_cont_{}_{}.mid",
                prefix,
                ending.as_str(),
                index,
                note_name(*note)
            ),
            StimulusId::TrackTransposition {
                stem,
                track,
                semitones,
            } => {
                let direction = if *semitones >= 0 { "up" } else { "down" };
                format!("{}_track{}_{}{}.mid", stem, track, direction, semitones.unsigned_abs())
            }
            StimulusId::NoteAlteration {
                stem,
                notes,
                interval,
                version,
            } => format!("{}_altered_{}notes_{:+}st_v{}.mid", stem, notes, interval, version),
        }
    }
}

/// A stimulus that has been written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedStimulus {
    pub id: StimulusId,
    pub path: PathBuf,
}

// Names are only missing beyond an octave, which no generator produces
fn prefixed_name(semitones: i8) -> String {
    interval_name(semitones, IntervalSpelling::Prefixed).unwrap_or_else(|| format!("int{}", semitones))
}

fn signed_name(semitones: i8) -> String {
    interval_name(semitones, IntervalSpelling::Signed).unwrap_or_else(|| format!("int{}", semitones))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_names() {
        assert_eq!(interval_name(0, IntervalSpelling::Prefixed).as_deref(), Some("unison"));
        assert_eq!(interval_name(-7, IntervalSpelling::Prefixed).as_deref(), Some("neg_p5"));
        assert_eq!(interval_name(-7, IntervalSpelling::Signed).as_deref(), Some("-p5"));
        assert_eq!(interval_name(12, IntervalSpelling::Signed).as_deref(), Some("octave"));
        assert_eq!(interval_name(13, IntervalSpelling::Signed), None);
    }

    #[test]
    fn test_file_names() {
        let shuffled = StimulusId::Shuffled {
            stem: "bach".to_string(),
            phrase_length: 2,
            version: 3,
        };
        assert_eq!(shuffled.file_name(), "bach_shuffled_p2_v3.mid");

        let cadence = StimulusId::Cadence {
            tonic: 60,
            numerals: vec!["I".into(), "IV".into(), "I".into(), "V".into()],
            half_steps: 0,
            quality: TriadQuality::Major,
        };
        assert_eq!(cadence.file_name(), "60_from_I-IV-I-V_to_0_maj.mid");

        let interval = StimulusId::Interval {
            start_note: 60,
            semitones: -5,
            context: Some(7),
        };
        assert_eq!(interval.file_name(), "pitch60_ctxp5_neg_p4.mid");

        let correct = StimulusId::IntervalRecognition { target: 5, candidate: 5 };
        assert_eq!(correct.file_name(), "p4_correct.mid");
        let foil = StimulusId::IntervalRecognition { target: 5, candidate: -3 };
        assert_eq!(foil.file_name(), "p4_test_-min3.mid");

        let scale = StimulusId::ScaleFilling {
            root: 60,
            mode: ScaleMode::Major,
            variant: [2, 5, 9, 11],
            correct: true,
            control: true,
        };
        assert_eq!(scale.file_name(), "60_major_scale_p1-2_p3-5_p5-9_p7-11_correct_control.mid");

        let melody = StimulusId::MelodyContinuation {
            prefix: "M2_a".to_string(),
            ending: ContextEnding::FSharp4,
            index: 1,
            note: 54,
        };
        assert_eq!(melody.file_name(), "M2_a_from_F#4_cont_1_F#3.mid");

        let down = StimulusId::TrackTransposition {
            stem: "song".to_string(),
            track: 1,
            semitones: -2,
        };
        assert_eq!(down.file_name(), "song_track1_down2.mid");

        let altered = StimulusId::NoteAlteration {
            stem: "song".to_string(),
            notes: 2,
            interval: 1,
            version: 4,
        };
        assert_eq!(altered.file_name(), "song_altered_2notes_+1st_v4.mid");
    }

    #[test]
    fn test_stimulus_id_serializes_with_kind_tag() {
        let id = StimulusId::IntervalRecognition { target: 7, candidate: 0 };
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json["kind"], "interval_recognition");

        let back: StimulusId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }
}
