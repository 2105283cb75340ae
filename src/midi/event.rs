// Note Events - Tagged event model for timed multi-track streams
// Note-on/note-off pairs keyed by (channel, key), everything else is a meta event

use serde::{Deserialize, Serialize};

/// Musical time signature as stored in a MIDI time-signature meta message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Beats per bar (top number)
    pub numerator: u8,

    /// Power of two of the beat unit (2 = quarter note, 3 = eighth note)
    pub denominator_pow: u8,

    /// MIDI clocks per metronome click
    pub clocks_per_click: u8,

    /// Notated 32nd notes per quarter note
    pub thirty_seconds_per_quarter: u8,
}

impl TimeSignature {
    /// Common time (4/4)
    pub fn four_four() -> Self {
        TimeSignature {
            numerator: 4,
            denominator_pow: 2,
            clocks_per_click: 24,
            thirty_seconds_per_quarter: 8,
        }
    }

    /// Ticks in one bar for a given resolution (ticks per quarter note)
    ///
    /// Returns `None` when the denominator is so fine that a bar is not a
    /// whole number of ticks.
    pub fn ticks_per_bar(&self, ticks_per_beat: u16) -> Option<u64> {
        let denominator = 1u64.checked_shl(self.denominator_pow as u32)?;
        let whole_bar = ticks_per_beat as u64 * 4 * self.numerator as u64;
        if denominator == 0 || whole_bar % denominator != 0 {
            return None;
        }
        Some(whole_bar / denominator)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature::four_four()
    }
}

/// A sounding note message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI channel (0-15)
    pub channel: u8,

    /// MIDI key number (0-127)
    pub key: u8,

    /// Velocity (0-127)
    pub velocity: u8,
}

impl NoteEvent {
    pub fn new(channel: u8, key: u8, velocity: u8) -> Self {
        NoteEvent {
            channel: channel & 0x0F,
            key: key.min(127),
            velocity: velocity.min(127),
        }
    }

    /// Key used to pair note-ons with note-offs
    pub fn note_key(&self) -> (u8, u8) {
        (self.channel, self.key)
    }
}

/// Which text meta message a byte string came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Text,
    Copyright,
    TrackName,
    InstrumentName,
    Lyric,
    Marker,
    CuePoint,
    ProgramName,
    DeviceName,
}

/// Non-sounding channel messages kept alongside meta events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelControl {
    Controller { controller: u8, value: u8 },
    ProgramChange { program: u8 },
    PitchBend { bend: u16 },
    Aftertouch { key: u8, pressure: u8 },
    ChannelAftertouch { pressure: u8 },
}

/// Control information that carries no pitch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaEvent {
    /// Microseconds per quarter note
    Tempo(u32),

    TimeSignature(TimeSignature),

    /// Sharps (positive) or flats (negative), and whether the key is minor
    KeySignature { accidentals: i8, minor: bool },

    Text { kind: TextKind, bytes: Vec<u8> },

    /// Channel message that does not start or stop a note
    Channel { channel: u8, control: ChannelControl },

    SysEx(Vec<u8>),

    /// Terminal marker; never stored inside a track's event list
    EndOfTrack,
}

/// A single occurrence on a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    NoteOn(NoteEvent),
    NoteOff(NoteEvent),
    Meta(MetaEvent),
}

impl Event {
    /// Build a note-on, folding velocity 0 into a note-off
    pub fn note_on(channel: u8, key: u8, velocity: u8) -> Self {
        let note = NoteEvent::new(channel, key, velocity);
        if note.velocity == 0 {
            Event::NoteOff(note)
        } else {
            Event::NoteOn(note)
        }
    }

    pub fn note_off(channel: u8, key: u8) -> Self {
        Event::NoteOff(NoteEvent::new(channel, key, 0))
    }

    pub fn is_note(&self) -> bool {
        matches!(self, Event::NoteOn(_) | Event::NoteOff(_))
    }

    pub fn is_end_of_track(&self) -> bool {
        matches!(self, Event::Meta(MetaEvent::EndOfTrack))
    }

    /// The note payload of a note-on or note-off
    pub fn note(&self) -> Option<&NoteEvent> {
        match self {
            Event::NoteOn(note) | Event::NoteOff(note) => Some(note),
            Event::Meta(_) => None,
        }
    }

    /// Same note with a different key; meta events are returned unchanged
    pub fn with_key(&self, key: u8) -> Event {
        match self {
            Event::NoteOn(note) => Event::NoteOn(NoteEvent { key: key.min(127), ..*note }),
            Event::NoteOff(note) => Event::NoteOff(NoteEvent { key: key.min(127), ..*note }),
            Event::Meta(_) => self.clone(),
        }
    }
}
