// MIDI Module - Event model, absolute-time timelines and SMF codec

pub mod codec;
pub mod event;
pub mod timeline;

pub use codec::{decode, encode, load, save, CodecError, CodecResult};
pub use event::{ChannelControl, Event, MetaEvent, NoteEvent, TextKind, TimeSignature};
pub use timeline::{TimedEvent, Timeline, TrackTimeline};
