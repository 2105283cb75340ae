// Event Timeline - Absolute-time view of a multi-track note stream
// Reconstructs absolute ticks from deltas, re-derives deltas on the way out

use serde::{Deserialize, Serialize};

use super::event::{Event, MetaEvent, TimeSignature};

/// An event placed at an absolute tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Absolute time in ticks from the start of the track
    pub tick: u64,

    pub event: Event,
}

impl TimedEvent {
    pub fn new(tick: u64, event: Event) -> Self {
        TimedEvent { tick, event }
    }
}

/// One track as an ordered list of absolute-time events
///
/// The end-of-track marker is not stored; its position is kept in `length`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTimeline {
    /// Events in storage order, absolute tick non-decreasing
    pub events: Vec<TimedEvent>,

    /// Absolute tick of the end-of-track marker
    pub length: u64,
}

impl TrackTimeline {
    /// Create a new empty track
    pub fn new() -> Self {
        TrackTimeline::default()
    }

    /// Build a track by accumulating `(delta, event)` pairs in storage order
    ///
    /// The end-of-track marker sets `length` and is dropped from the list.
    pub fn from_deltas<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u32, Event)>,
    {
        let mut events = Vec::new();
        let mut absolute_time = 0u64;
        for (delta, event) in entries {
            absolute_time += delta as u64;
            if event.is_end_of_track() {
                continue;
            }
            events.push(TimedEvent::new(absolute_time, event));
        }

        TrackTimeline {
            events,
            length: absolute_time,
        }
    }

    /// Re-derive delta times from absolute ticks
    ///
    /// Events must already be sorted by tick. An end-of-track marker is
    /// appended at `max(length, last tick)` unless the list already ends
    /// with one.
    pub fn to_deltas(&self) -> Vec<(u32, Event)> {
        let mut out = Vec::with_capacity(self.events.len() + 1);
        let mut previous = 0u64;
        for timed in &self.events {
            let delta = timed.tick.saturating_sub(previous);
            out.push((delta as u32, timed.event.clone()));
            previous = previous.max(timed.tick);
        }

        let ends_with_marker = self
            .events
            .last()
            .map(|timed| timed.event.is_end_of_track())
            .unwrap_or(false);
        if !ends_with_marker {
            let end = self.length.max(previous);
            out.push(((end - previous) as u32, Event::Meta(MetaEvent::EndOfTrack)));
        }

        out
    }

    /// Absolute tick of the last stored event (0 for an empty track)
    pub fn last_tick(&self) -> u64 {
        self.events.last().map(|timed| timed.tick).unwrap_or(0)
    }

    /// Append an event at an absolute tick, extending `length` if needed
    pub fn push(&mut self, tick: u64, event: Event) {
        self.length = self.length.max(tick);
        self.events.push(TimedEvent::new(tick, event));
    }

    /// Sort events by tick, keeping storage order for ties
    pub fn sort_stable(&mut self) {
        self.events.sort_by_key(|timed| timed.tick);
    }
}

/// A complete multi-track stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    /// Ticks per quarter note
    pub ticks_per_beat: u16,

    pub tracks: Vec<TrackTimeline>,
}

impl Timeline {
    /// Create an empty timeline with the given resolution
    pub fn new(ticks_per_beat: u16) -> Self {
        Timeline {
            ticks_per_beat,
            tracks: Vec::new(),
        }
    }

    /// Length of the longest track in ticks
    pub fn total_ticks(&self) -> u64 {
        self.tracks
            .iter()
            .map(|track| track.length.max(track.last_tick()))
            .max()
            .unwrap_or(0)
    }

    /// First time signature found in any track, ordered by tick
    pub fn first_time_signature(&self) -> Option<TimeSignature> {
        self.tracks
            .iter()
            .flat_map(|track| track.events.iter())
            .filter_map(|timed| match &timed.event {
                Event::Meta(MetaEvent::TimeSignature(signature)) => Some((timed.tick, *signature)),
                _ => None,
            })
            .min_by_key(|(tick, _)| *tick)
            .map(|(_, signature)| signature)
    }

    /// Estimate ticks per bar from the first time signature (4/4 if absent)
    pub fn estimate_ticks_per_bar(&self) -> Option<u64> {
        self.first_time_signature()
            .unwrap_or_default()
            .ticks_per_bar(self.ticks_per_beat)
    }

    /// Number of note-on events across all tracks
    pub fn note_on_count(&self) -> usize {
        self.tracks
            .iter()
            .flat_map(|track| track.events.iter())
            .filter(|timed| matches!(timed.event, Event::NoteOn(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_deltas_accumulates() {
        let track = TrackTimeline::from_deltas(vec![
            (0, Event::Meta(MetaEvent::Tempo(500_000))),
            (10, Event::note_on(0, 60, 80)),
            (90, Event::note_off(0, 60)),
            (20, Event::Meta(MetaEvent::EndOfTrack)),
        ]);

        let ticks: Vec<u64> = track.events.iter().map(|timed| timed.tick).collect();
        assert_eq!(ticks, vec![0, 10, 100]);
        assert_eq!(track.length, 120);
        assert!(!track.events.iter().any(|timed| timed.event.is_end_of_track()));
    }

    #[test]
    fn test_to_deltas_round_trip() {
        let entries = vec![
            (0, Event::Meta(MetaEvent::Tempo(500_000))),
            (10, Event::note_on(0, 60, 80)),
            (90, Event::note_off(0, 60)),
            (20, Event::Meta(MetaEvent::EndOfTrack)),
        ];
        let track = TrackTimeline::from_deltas(entries.clone());
        assert_eq!(track.to_deltas(), entries);
    }

    #[test]
    fn test_to_deltas_places_end_marker_after_last_event() {
        let mut track = TrackTimeline::new();
        track.events.push(TimedEvent::new(50, Event::note_on(0, 60, 80)));
        track.length = 10;

        let deltas = track.to_deltas();
        assert_eq!(deltas.last(), Some(&(0, Event::Meta(MetaEvent::EndOfTrack))));
    }

    #[test]
    fn test_estimate_ticks_per_bar() {
        let mut timeline = Timeline::new(480);
        assert_eq!(timeline.estimate_ticks_per_bar(), Some(1920));

        let mut track = TrackTimeline::new();
        let three_four = TimeSignature {
            numerator: 3,
            ..TimeSignature::four_four()
        };
        track.push(0, Event::Meta(MetaEvent::TimeSignature(three_four)));
        timeline.tracks.push(track);
        assert_eq!(timeline.estimate_ticks_per_bar(), Some(1440));
    }
}
