// MIDI Codec - Standard MIDI File encode/decode using midly crate
// Converts between on-disk SMF bytes and the absolute-time Timeline model

use midly::{
    num::{u14, u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, PitchBend, Smf, Timing, Track, TrackEvent,
    TrackEventKind,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::state::storage::{self, StorageError};

use super::event::{ChannelControl, Event, MetaEvent, NoteEvent, TextKind, TimeSignature};
use super::timeline::{Timeline, TrackTimeline};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("MIDI file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse MIDI: {0}")]
    Parse(#[from] midly::Error),

    #[error("Failed to write MIDI: {0}")]
    Write(String),

    #[error("Unsupported timing: only metrical (ticks per beat) files are handled")]
    UnsupportedTiming,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Load a MIDI file from disk into a Timeline
pub fn load(path: &Path) -> CodecResult<Timeline> {
    if !path.exists() {
        return Err(CodecError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

/// Encode a Timeline and write it atomically, returning the file's SHA256 hash
pub fn save(timeline: &Timeline, path: &Path) -> CodecResult<String> {
    let bytes = encode(timeline)?;
    let hash = storage::write_atomic(path, &bytes)?;
    log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(hash)
}

/// Decode SMF bytes into a Timeline
pub fn decode(bytes: &[u8]) -> CodecResult<Timeline> {
    let smf = Smf::parse(bytes)?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(ticks) => ticks.as_int(),
        Timing::Timecode(_, _) => return Err(CodecError::UnsupportedTiming),
    };

    let mut timeline = Timeline::new(ticks_per_beat);
    for track in &smf.tracks {
        // Events we do not model still advance time, so carry their delta forward
        let mut carried = 0u32;
        let mut entries = Vec::with_capacity(track.len());
        for track_event in track {
            let delta = carried + track_event.delta.as_int();
            match decode_kind(&track_event.kind) {
                Some(event) => {
                    entries.push((delta, event));
                    carried = 0;
                }
                None => carried = delta,
            }
        }
        let mut decoded = TrackTimeline::from_deltas(entries);
        decoded.length += carried as u64;
        timeline.tracks.push(decoded);
    }

    Ok(timeline)
}

/// Encode a Timeline into SMF bytes
///
/// Track events must be sorted by tick; deltas are re-derived here.
pub fn encode(timeline: &Timeline) -> CodecResult<Vec<u8>> {
    let format = if timeline.tracks.len() <= 1 {
        Format::SingleTrack
    } else {
        Format::Parallel
    };
    let header = Header::new(format, Timing::Metrical(u15::from(timeline.ticks_per_beat)));

    let deltas: Vec<Vec<(u32, Event)>> = timeline.tracks.iter().map(|t| t.to_deltas()).collect();

    let mut tracks = Vec::with_capacity(deltas.len());
    for entries in &deltas {
        let mut track = Track::new();
        for (delta, event) in entries {
            track.push(TrackEvent {
                delta: u28::from(*delta),
                kind: encode_event(event),
            });
        }
        tracks.push(track);
    }

    let smf = Smf { header, tracks };

    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| CodecError::Write(e.to_string()))?;

    Ok(bytes)
}

fn decode_kind(kind: &TrackEventKind) -> Option<Event> {
    match kind {
        TrackEventKind::Midi { channel, message } => {
            let channel = channel.as_int();
            let event = match *message {
                MidiMessage::NoteOn { key, vel } => {
                    Event::note_on(channel, key.as_int(), vel.as_int())
                }
                MidiMessage::NoteOff { key, vel } => {
                    Event::NoteOff(NoteEvent::new(channel, key.as_int(), vel.as_int()))
                }
                MidiMessage::Aftertouch { key, vel } => control(
                    channel,
                    ChannelControl::Aftertouch {
                        key: key.as_int(),
                        pressure: vel.as_int(),
                    },
                ),
                MidiMessage::Controller { controller, value } => control(
                    channel,
                    ChannelControl::Controller {
                        controller: controller.as_int(),
                        value: value.as_int(),
                    },
                ),
                MidiMessage::ProgramChange { program } => control(
                    channel,
                    ChannelControl::ProgramChange {
                        program: program.as_int(),
                    },
                ),
                MidiMessage::ChannelAftertouch { vel } => control(
                    channel,
                    ChannelControl::ChannelAftertouch {
                        pressure: vel.as_int(),
                    },
                ),
                MidiMessage::PitchBend { bend } => control(
                    channel,
                    ChannelControl::PitchBend {
                        bend: bend.0.as_int(),
                    },
                ),
            };
            Some(event)
        }
        TrackEventKind::SysEx(bytes) => Some(Event::Meta(MetaEvent::SysEx(bytes.to_vec()))),
        TrackEventKind::Escape(_) => {
            log::debug!("Dropping escape sequence");
            None
        }
        TrackEventKind::Meta(meta) => decode_meta(meta).map(Event::Meta),
    }
}

fn decode_meta(meta: &MetaMessage) -> Option<MetaEvent> {
    let text = |kind: TextKind, bytes: &[u8]| MetaEvent::Text {
        kind,
        bytes: bytes.to_vec(),
    };

    let decoded = match *meta {
        MetaMessage::Tempo(tempo) => MetaEvent::Tempo(tempo.as_int()),
        MetaMessage::TimeSignature(numerator, denominator_pow, clocks_per_click, notated) => {
            MetaEvent::TimeSignature(TimeSignature {
                numerator,
                denominator_pow,
                clocks_per_click,
                thirty_seconds_per_quarter: notated,
            })
        }
        MetaMessage::KeySignature(accidentals, minor) => {
            MetaEvent::KeySignature { accidentals, minor }
        }
        MetaMessage::EndOfTrack => MetaEvent::EndOfTrack,
        MetaMessage::Text(bytes) => text(TextKind::Text, bytes),
        MetaMessage::Copyright(bytes) => text(TextKind::Copyright, bytes),
        MetaMessage::TrackName(bytes) => text(TextKind::TrackName, bytes),
        MetaMessage::InstrumentName(bytes) => text(TextKind::InstrumentName, bytes),
        MetaMessage::Lyric(bytes) => text(TextKind::Lyric, bytes),
        MetaMessage::Marker(bytes) => text(TextKind::Marker, bytes),
        MetaMessage::CuePoint(bytes) => text(TextKind::CuePoint, bytes),
        MetaMessage::ProgramName(bytes) => text(TextKind::ProgramName, bytes),
        MetaMessage::DeviceName(bytes) => text(TextKind::DeviceName, bytes),
        ref other => {
            log::debug!("Dropping unsupported meta message: {:?}", other);
            return None;
        }
    };

    Some(decoded)
}

fn control(channel: u8, control: ChannelControl) -> Event {
    Event::Meta(MetaEvent::Channel { channel, control })
}

fn encode_event(event: &Event) -> TrackEventKind<'_> {
    match event {
        Event::NoteOn(note) => TrackEventKind::Midi {
            channel: u4::from(note.channel),
            message: MidiMessage::NoteOn {
                key: u7::from(note.key),
                vel: u7::from(note.velocity),
            },
        },
        Event::NoteOff(note) => TrackEventKind::Midi {
            channel: u4::from(note.channel),
            message: MidiMessage::NoteOff {
                key: u7::from(note.key),
                vel: u7::from(note.velocity),
            },
        },
        Event::Meta(meta) => encode_meta(meta),
    }
}

fn encode_meta(meta: &MetaEvent) -> TrackEventKind<'_> {
    let message = match meta {
        MetaEvent::Tempo(tempo) => MetaMessage::Tempo(u24::from(*tempo)),
        MetaEvent::TimeSignature(signature) => MetaMessage::TimeSignature(
            signature.numerator,
            signature.denominator_pow,
            signature.clocks_per_click,
            signature.thirty_seconds_per_quarter,
        ),
        MetaEvent::KeySignature { accidentals, minor } => {
            MetaMessage::KeySignature(*accidentals, *minor)
        }
        MetaEvent::EndOfTrack => MetaMessage::EndOfTrack,
        MetaEvent::Text { kind, bytes } => match kind {
            TextKind::Text => MetaMessage::Text(bytes),
            TextKind::Copyright => MetaMessage::Copyright(bytes),
            TextKind::TrackName => MetaMessage::TrackName(bytes),
            TextKind::InstrumentName => MetaMessage::InstrumentName(bytes),
            TextKind::Lyric => MetaMessage::Lyric(bytes),
            TextKind::Marker => MetaMessage::Marker(bytes),
            TextKind::CuePoint => MetaMessage::CuePoint(bytes),
            TextKind::ProgramName => MetaMessage::ProgramName(bytes),
            TextKind::DeviceName => MetaMessage::DeviceName(bytes),
        },
        MetaEvent::SysEx(bytes) => return TrackEventKind::SysEx(bytes),
        MetaEvent::Channel { channel, control } => {
            return TrackEventKind::Midi {
                channel: u4::from(*channel),
                message: encode_control(control),
            }
        }
    };

    TrackEventKind::Meta(message)
}

fn encode_control(control: &ChannelControl) -> MidiMessage {
    match *control {
        ChannelControl::Controller { controller, value } => MidiMessage::Controller {
            controller: u7::from(controller),
            value: u7::from(value),
        },
        ChannelControl::ProgramChange { program } => MidiMessage::ProgramChange {
            program: u7::from(program),
        },
        ChannelControl::PitchBend { bend } => MidiMessage::PitchBend {
            bend: PitchBend(u14::from(bend)),
        },
        ChannelControl::Aftertouch { key, pressure } => MidiMessage::Aftertouch {
            key: u7::from(key),
            vel: u7::from(pressure),
        },
        ChannelControl::ChannelAftertouch { pressure } => MidiMessage::ChannelAftertouch {
            vel: u7::from(pressure),
        },
    }
}
