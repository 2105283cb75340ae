// Bar/Phrase Segmenter - Cuts each track into equal-width units
// Notes that cross a unit boundary are split so every unit is self-contained

use std::collections::BTreeMap;

use crate::midi::{Event, NoteEvent, TimedEvent, Timeline, TrackTimeline};

use super::{ReshuffleError, ReshuffleResult};

/// A note event positioned relative to the start of its unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitEvent {
    /// Ticks since the unit start, in `0..=W`
    pub offset: u64,

    pub event: Event,
}

impl UnitEvent {
    pub fn new(offset: u64, event: Event) -> Self {
        UnitEvent { offset, event }
    }
}

/// One track after segmentation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentedTrack {
    /// Note events per unit, sorted by offset (discovery order for ties)
    pub units: Vec<Vec<UnitEvent>>,

    /// Non-note events at their original absolute ticks
    pub meta: Vec<TimedEvent>,

    /// Original end-of-track position
    pub length: u64,

    /// Note-ons synthesized to carry notes across boundaries
    pub splits: usize,
}

/// Every track of a file cut into the same `unit_count` units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    pub ticks_per_beat: u16,

    /// Unit width `W` in ticks
    pub unit_width: u64,

    /// Number of units `U`
    pub unit_count: usize,

    pub tracks: Vec<SegmentedTrack>,
}

impl Segmentation {
    /// Total synthesized note-ons across all tracks
    pub fn splits(&self) -> usize {
        self.tracks.iter().map(|track| track.splits).sum()
    }

    /// Length of the output of any re-linearization (`U * W`)
    pub fn output_length(&self) -> u64 {
        self.unit_count as u64 * self.unit_width
    }
}

/// `ceil(total_ticks / width)`
pub fn unit_count(total_ticks: u64, width: u64) -> usize {
    if width == 0 {
        return 0;
    }
    total_ticks.div_ceil(width) as usize
}

/// Unit holding `tick`; ticks at or past the final boundary belong to the last unit
pub fn unit_index(tick: u64, width: u64, count: usize) -> usize {
    let index = (tick / width) as usize;
    index.min(count.saturating_sub(1))
}

/// Cut every track of `timeline` into units of `width` ticks
pub fn segment(timeline: &Timeline, width: u64) -> ReshuffleResult<Segmentation> {
    if width == 0 {
        return Err(ReshuffleError::Configuration(
            "Unit width must be a positive number of ticks".to_string(),
        ));
    }

    let total = timeline.total_ticks();
    let count = unit_count(total, width);
    if count < 2 {
        return Err(ReshuffleError::InsufficientData(format!(
            "{} ticks at width {} give {} unit(s), need at least 2",
            total, width, count
        )));
    }

    let tracks = timeline
        .tracks
        .iter()
        .enumerate()
        .map(|(index, track)| {
            let segmented = segment_track(track, width, count);
            log::debug!(
                "Track {}: {} meta events, {} boundary splits",
                index,
                segmented.meta.len(),
                segmented.splits
            );
            segmented
        })
        .collect();

    Ok(Segmentation {
        ticks_per_beat: timeline.ticks_per_beat,
        unit_width: width,
        unit_count: count,
        tracks,
    })
}

/// A sounding note waiting for its note-off
#[derive(Debug, Clone, Copy)]
struct OpenNote {
    unit: usize,
    note: NoteEvent,
}

/// Per-track segmentation state: append-only unit buckets plus the open-note table
struct TrackSegmenter {
    width: u64,
    count: usize,
    units: Vec<Vec<UnitEvent>>,
    open: BTreeMap<(u8, u8), OpenNote>,
    splits: usize,
}

impl TrackSegmenter {
    fn new(width: u64, count: usize) -> Self {
        TrackSegmenter {
            width,
            count,
            units: vec![Vec::new(); count],
            open: BTreeMap::new(),
            splits: 0,
        }
    }

    fn locate(&self, tick: u64) -> (usize, u64) {
        let unit = unit_index(tick, self.width, self.count);
        (unit, tick - unit as u64 * self.width)
    }

    fn note_on(&mut self, tick: u64, note: NoteEvent) {
        let (unit, offset) = self.locate(tick);
        if let Some(previous) = self.open.insert(note.note_key(), OpenNote { unit, note }) {
            log::debug!(
                "Key {} on channel {} retriggered at tick {}; closing the note open since unit {}",
                note.key,
                note.channel,
                tick,
                previous.unit
            );
            let off = NoteEvent {
                velocity: 0,
                ..previous.note
            };
            self.close(previous, unit, offset, off);
        }
        self.units[unit].push(UnitEvent::new(offset, Event::NoteOn(note)));
    }

    fn note_off(&mut self, tick: u64, note: NoteEvent) {
        let (unit, offset) = self.locate(tick);
        match self.open.remove(&note.note_key()) {
            Some(open) => self.close(open, unit, offset, note),
            None => {
                log::debug!(
                    "Unmatched note-off for key {} on channel {} at tick {}",
                    note.key,
                    note.channel,
                    tick
                );
                self.units[unit].push(UnitEvent::new(offset, Event::NoteOff(note)));
            }
        }
    }

    /// Place the note-off of `open`, splitting the note at every boundary it crosses
    fn close(&mut self, open: OpenNote, unit: usize, offset: u64, off: NoteEvent) {
        let start = open.unit;
        let (mut end, mut offset) = (unit.max(start), offset);
        // A note-off on a boundary closes the previous unit
        if end > start && offset == 0 {
            end -= 1;
            offset = self.width;
        }

        if end > start {
            let off_event = Event::NoteOff(NoteEvent { velocity: 0, ..open.note });
            let on_event = Event::NoteOn(open.note);

            self.units[start].push(UnitEvent::new(self.width, off_event.clone()));
            for middle in start + 1..end {
                self.units[middle].push(UnitEvent::new(0, on_event.clone()));
                self.units[middle].push(UnitEvent::new(self.width, off_event.clone()));
            }
            self.units[end].push(UnitEvent::new(0, on_event));
            self.splits += end - start;
        }
        self.units[end].push(UnitEvent::new(offset, Event::NoteOff(off)));
    }

    fn finish(mut self, length: u64) -> (Vec<Vec<UnitEvent>>, usize) {
        let still_open = std::mem::take(&mut self.open);
        for (_, open) in still_open {
            log::debug!(
                "Closing key {} on channel {} at end of track ({} ticks)",
                open.note.key,
                open.note.channel,
                length
            );
            let (unit, offset) = self.locate(length);
            let off = NoteEvent {
                velocity: 0,
                ..open.note
            };
            self.close(open, unit, offset, off);
        }

        for unit in self.units.iter_mut() {
            unit.sort_by_key(|event| event.offset);
        }
        (self.units, self.splits)
    }
}

fn segment_track(track: &TrackTimeline, width: u64, count: usize) -> SegmentedTrack {
    let mut segmenter = TrackSegmenter::new(width, count);
    let mut meta = Vec::new();

    for timed in &track.events {
        match &timed.event {
            Event::NoteOn(note) => segmenter.note_on(timed.tick, *note),
            Event::NoteOff(note) => segmenter.note_off(timed.tick, *note),
            Event::Meta(_) => meta.push(timed.clone()),
        }
    }

    let length = track.length.max(track.last_tick());
    let (units, splits) = segmenter.finish(length);

    SegmentedTrack {
        units,
        meta,
        length,
        splits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::MetaEvent;
    use pretty_assertions::assert_eq;

    fn single_track(events: Vec<(u64, Event)>, length: u64) -> Timeline {
        let mut track = TrackTimeline::new();
        for (tick, event) in events {
            track.push(tick, event);
        }
        track.length = length;
        let mut timeline = Timeline::new(480);
        timeline.tracks.push(track);
        timeline
    }

    #[test]
    fn test_unit_helpers() {
        assert_eq!(unit_count(300, 150), 2);
        assert_eq!(unit_count(301, 150), 3);
        assert_eq!(unit_count(0, 150), 0);
        assert_eq!(unit_index(149, 150, 2), 0);
        assert_eq!(unit_index(150, 150, 2), 1);
        assert_eq!(unit_index(300, 150, 2), 1);
    }

    #[test]
    fn test_note_across_one_boundary() {
        let timeline = single_track(
            vec![(100, Event::note_on(0, 60, 80)), (300, Event::note_off(0, 60))],
            300,
        );
        let segmentation = segment(&timeline, 150).unwrap();
        let track = &segmentation.tracks[0];

        assert_eq!(segmentation.unit_count, 2);
        assert_eq!(track.splits, 1);
        assert_eq!(
            track.units[0],
            vec![
                UnitEvent::new(100, Event::note_on(0, 60, 80)),
                UnitEvent::new(150, Event::note_off(0, 60)),
            ]
        );
        assert_eq!(
            track.units[1],
            vec![
                UnitEvent::new(0, Event::note_on(0, 60, 80)),
                UnitEvent::new(150, Event::note_off(0, 60)),
            ]
        );
    }

    #[test]
    fn test_long_note_fills_intermediate_units() {
        let timeline = single_track(
            vec![(50, Event::note_on(0, 48, 70)), (420, Event::note_off(0, 48))],
            500,
        );
        let segmentation = segment(&timeline, 100).unwrap();
        let track = &segmentation.tracks[0];

        assert_eq!(segmentation.unit_count, 5);
        assert_eq!(track.splits, 4);
        for middle in 1..4 {
            assert_eq!(
                track.units[middle],
                vec![
                    UnitEvent::new(0, Event::note_on(0, 48, 70)),
                    UnitEvent::new(100, Event::note_off(0, 48)),
                ]
            );
        }
        assert_eq!(
            track.units[4],
            vec![
                UnitEvent::new(0, Event::note_on(0, 48, 70)),
                UnitEvent::new(20, Event::note_off(0, 48)),
            ]
        );
    }

    #[test]
    fn test_note_off_on_boundary_stays_in_previous_unit() {
        let timeline = single_track(
            vec![
                (0, Event::note_on(0, 60, 80)),
                (100, Event::note_off(0, 60)),
                (100, Event::note_on(0, 62, 80)),
                (200, Event::note_off(0, 62)),
            ],
            200,
        );
        let segmentation = segment(&timeline, 100).unwrap();
        let track = &segmentation.tracks[0];

        assert_eq!(track.splits, 0);
        assert_eq!(track.units[0].len(), 2);
        assert_eq!(track.units[0][1], UnitEvent::new(100, Event::note_off(0, 60)));
        assert_eq!(track.units[1][0], UnitEvent::new(0, Event::note_on(0, 62, 80)));
    }

    #[test]
    fn test_open_note_closed_at_track_end() {
        let timeline = single_track(vec![(10, Event::note_on(0, 60, 80))], 250);
        let segmentation = segment(&timeline, 100).unwrap();
        let track = &segmentation.tracks[0];

        assert_eq!(segmentation.unit_count, 3);
        assert_eq!(track.splits, 2);
        assert_eq!(track.units[2].last(), Some(&UnitEvent::new(50, Event::note_off(0, 60))));
    }

    #[test]
    fn test_unmatched_note_off_passes_through() {
        let timeline = single_track(vec![(120, Event::note_off(0, 64))], 200);
        let segmentation = segment(&timeline, 100).unwrap();
        assert_eq!(
            segmentation.tracks[0].units[1],
            vec![UnitEvent::new(20, Event::note_off(0, 64))]
        );
    }

    #[test]
    fn test_retriggered_key_closes_previous_note() {
        let timeline = single_track(
            vec![
                (50, Event::note_on(0, 60, 80)),
                (150, Event::note_on(0, 60, 80)),
                (180, Event::note_off(0, 60)),
            ],
            200,
        );
        let segmentation = segment(&timeline, 100).unwrap();
        let track = &segmentation.tracks[0];

        assert_eq!(track.splits, 1);
        assert_eq!(
            track.units[0],
            vec![
                UnitEvent::new(50, Event::note_on(0, 60, 80)),
                UnitEvent::new(100, Event::note_off(0, 60)),
            ]
        );
        assert_eq!(
            track.units[1],
            vec![
                UnitEvent::new(0, Event::note_on(0, 60, 80)),
                UnitEvent::new(50, Event::note_off(0, 60)),
                UnitEvent::new(50, Event::note_on(0, 60, 80)),
                UnitEvent::new(80, Event::note_off(0, 60)),
            ]
        );

        // Every note-on is paired once the units are swapped
        let swapped = crate::reshuffle::relinearize(&segmentation, &[1, 0]).unwrap();
        let mut sounding = 0i32;
        for timed in &swapped.tracks[0].events {
            match timed.event {
                Event::NoteOn(_) => sounding += 1,
                Event::NoteOff(_) => sounding -= 1,
                Event::Meta(_) => {}
            }
            assert!((0..=1).contains(&sounding), "overlap at tick {}", timed.tick);
        }
        assert_eq!(sounding, 0);
        assert_eq!(swapped.note_on_count(), 3);
    }

    #[test]
    fn test_meta_events_kept_at_absolute_ticks() {
        let timeline = single_track(
            vec![
                (0, Event::Meta(MetaEvent::Tempo(500_000))),
                (0, Event::note_on(0, 60, 80)),
                (150, Event::Meta(MetaEvent::Tempo(400_000))),
                (180, Event::note_off(0, 60)),
            ],
            200,
        );
        let segmentation = segment(&timeline, 100).unwrap();
        let ticks: Vec<u64> = segmentation.tracks[0].meta.iter().map(|m| m.tick).collect();
        assert_eq!(ticks, vec![0, 150]);
    }

    #[test]
    fn test_unit_count_from_longest_track() {
        let mut timeline = single_track(vec![(0, Event::note_on(0, 60, 80))], 100);
        let mut long = TrackTimeline::new();
        long.push(390, Event::note_off(0, 40));
        timeline.tracks.push(long);

        let segmentation = segment(&timeline, 100).unwrap();
        assert_eq!(segmentation.unit_count, 4);
        assert!(segmentation.tracks.iter().all(|t| t.units.len() == 4));
    }

    #[test]
    fn test_width_and_unit_count_errors() {
        let timeline = single_track(vec![(0, Event::note_on(0, 60, 80))], 100);
        assert!(matches!(
            segment(&timeline, 0),
            Err(ReshuffleError::Configuration(_))
        ));
        assert!(matches!(
            segment(&timeline, 100),
            Err(ReshuffleError::InsufficientData(_))
        ));
    }
}
