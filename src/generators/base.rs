// Stimulus Writer - Shared note placement and file output for all generators
// Builds single-track timelines sequentially and saves them under structured names

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::midi::{self, CodecError, Event, MetaEvent, Timeline, TrackTimeline};
use crate::pipeline::{ManifestEntry, ManifestError, ManifestWriter};
use crate::state::storage;

use super::{GeneratorError, GeneratorResult, StimulusId};

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Human-readable note name with octave, sharps only (60 = "C4")
pub fn note_name(midi_note: u8) -> String {
    let octave = (midi_note / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[(midi_note % 12) as usize], octave)
}

/// Resolution and tempo of generated files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterSettings {
    /// Ticks per quarter note
    pub ticks_per_beat: u16,

    /// Microseconds per quarter note (500000 = 120 BPM)
    pub tempo_us_per_quarter: u32,
}

impl Default for WriterSettings {
    fn default() -> Self {
        WriterSettings {
            ticks_per_beat: 480,
            tempo_us_per_quarter: 500_000,
        }
    }
}

/// Sequential note placement on one track
///
/// Every call starts after the previous note or rest has finished.
#[derive(Debug, Clone, Default)]
pub struct TrackWriter {
    track: TrackTimeline,
    cursor: u64,
}

impl TrackWriter {
    /// Empty track with no tempo event
    pub fn new() -> Self {
        TrackWriter::default()
    }

    /// Track opening with a tempo event at tick 0
    pub fn with_tempo(tempo_us_per_quarter: u32) -> Self {
        let mut writer = TrackWriter::new();
        writer
            .track
            .push(0, Event::Meta(MetaEvent::Tempo(tempo_us_per_quarter)));
        writer
    }

    /// Current write position in ticks
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Advance the write position without sounding anything
    pub fn rest(&mut self, ticks: u64) -> &mut Self {
        self.cursor += ticks;
        self.track.length = self.track.length.max(self.cursor);
        self
    }

    /// Place a meta event at the cursor
    pub fn meta(&mut self, meta: MetaEvent) -> &mut Self {
        self.track.push(self.cursor, Event::Meta(meta));
        self
    }

    /// Add a note `delay` ticks after the cursor, lasting `duration` ticks
    pub fn add_note(&mut self, key: u8, velocity: u8, delay: u64, duration: u64) -> &mut Self {
        self.add_chord(&[key], velocity, delay, duration)
    }

    /// Add notes that start and stop together
    pub fn add_chord(&mut self, keys: &[u8], velocity: u8, delay: u64, duration: u64) -> &mut Self {
        let start = self.cursor + delay;
        let end = start + duration;
        for &key in keys {
            self.track.push(start, Event::note_on(0, key, velocity));
        }
        for &key in keys {
            self.track.push(end, Event::note_off(0, key));
        }
        self.cursor = if keys.is_empty() { start } else { end };
        self.track.length = self.track.length.max(self.cursor);
        self
    }

    /// Copy every event of `other` starting at the cursor, then move past it
    pub fn append_track(&mut self, other: &TrackTimeline) -> &mut Self {
        let offset = self.cursor;
        for timed in &other.events {
            self.track.push(offset + timed.tick, timed.event.clone());
        }
        self.cursor = offset + other.length.max(other.last_tick());
        self.track.length = self.track.length.max(self.cursor);
        self
    }

    pub fn finish(mut self) -> TrackTimeline {
        self.track.sort_stable();
        self.track
    }
}

/// File name without extension, used to name derived stimuli
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stimulus".to_string())
}

/// Random generator for one session together with the seed it was built from
///
/// A seed is drawn at random when none is given, so every session can be replayed.
pub fn session_rng(seed: Option<u64>) -> (Pcg32, u64) {
    let seed = seed.unwrap_or_else(rand::random);
    (Pcg32::seed_from_u64(seed), seed)
}

/// Output side shared by every generator
///
/// Owns the output directory, file resolution and an optional manifest.
#[derive(Debug, Clone)]
pub struct StimulusWriter {
    output_dir: PathBuf,
    settings: WriterSettings,
    manifest: Option<ManifestWriter>,
    session_id: Uuid,
    seed: Option<u64>,
}

impl StimulusWriter {
    /// Writer for an existing output directory
    pub fn new(output_dir: impl Into<PathBuf>) -> GeneratorResult<Self> {
        let output_dir = output_dir.into();
        if storage::require_dir(&output_dir).is_err() {
            return Err(GeneratorError::NotFound(output_dir));
        }

        Ok(StimulusWriter {
            output_dir,
            settings: WriterSettings::default(),
            manifest: None,
            session_id: Uuid::new_v4(),
            seed: None,
        })
    }

    pub fn with_settings(mut self, settings: WriterSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Record every written file in `manifest.jsonl` inside the output directory
    pub fn with_manifest(mut self) -> Self {
        self.manifest = Some(ManifestWriter::in_dir(&self.output_dir));
        self
    }

    /// Seed recorded alongside manifest entries
    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }

    /// Writer for a child directory, created if missing, sharing this session
    pub fn subdirectory(&self, name: &str) -> GeneratorResult<Self> {
        let dir = storage::ensure_dir(&self.output_dir.join(name))?;
        Ok(StimulusWriter {
            output_dir: dir,
            ..self.clone()
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn settings(&self) -> &WriterSettings {
        &self.settings
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// New track starting with the configured tempo
    pub fn track(&self) -> TrackWriter {
        TrackWriter::with_tempo(self.settings.tempo_us_per_quarter)
    }

    /// Single-track timeline at the configured resolution
    pub fn timeline(&self, track: TrackWriter) -> Timeline {
        let mut timeline = Timeline::new(self.settings.ticks_per_beat);
        timeline.tracks.push(track.finish());
        timeline
    }

    /// Encode and atomically write a timeline under the stimulus's file name
    pub fn save<E>(&self, timeline: &Timeline, stimulus: &StimulusId) -> Result<PathBuf, E>
    where
        E: From<CodecError> + From<ManifestError>,
    {
        let path = self.output_dir.join(stimulus.file_name());
        let sha256 = midi::save(timeline, &path)?;

        if let Some(manifest) = &self.manifest {
            let entry = ManifestEntry::new(self.session_id, path.clone(), sha256, stimulus.clone())
                .with_seed(self.seed);
            manifest.write(&entry)?;
        }

        Ok(path)
    }
}
