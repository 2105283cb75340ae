// Timeline Transforms - Pitch and time manipulations applied to whole files

use crate::midi::{Timeline, TrackTimeline};

use super::{GeneratorError, GeneratorResult};

/// Move a key by `semitones`, clamping to 0-127
pub fn clamp_key(key: u8, semitones: i32) -> u8 {
    (key as i32 + semitones).clamp(0, 127) as u8
}

/// Move a key by `semitones`, folding by octaves back into 0-127
pub fn fold_key(key: u8, semitones: i32) -> u8 {
    let mut moved = key as i32 + semitones;
    while moved < 0 {
        moved += 12;
    }
    while moved > 127 {
        moved -= 12;
    }
    moved as u8
}

/// Transpose every note of one track, clamping at the MIDI range
pub fn transpose_track(timeline: &Timeline, track_index: usize, semitones: i32) -> GeneratorResult<Timeline> {
    if track_index >= timeline.tracks.len() {
        return Err(GeneratorError::Configuration(format!(
            "Track index {} out of range, file has {} tracks",
            track_index,
            timeline.tracks.len()
        )));
    }

    let mut out = timeline.clone();
    for timed in out.tracks[track_index].events.iter_mut() {
        if let Some(note) = timed.event.note() {
            timed.event = timed.event.with_key(clamp_key(note.key, semitones));
        }
    }
    Ok(out)
}

/// Transpose every note of every track, keeping pitch class when out of range
pub fn transpose_timeline(timeline: &Timeline, semitones: i32) -> Timeline {
    let mut out = timeline.clone();
    for track in out.tracks.iter_mut() {
        for timed in track.events.iter_mut() {
            if let Some(note) = timed.event.note() {
                timed.event = timed.event.with_key(fold_key(note.key, semitones));
            }
        }
    }
    out
}

/// Scale every delta time by `factor`, truncating to whole ticks
pub fn time_dilate_timeline(timeline: &Timeline, factor: f64) -> GeneratorResult<Timeline> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(GeneratorError::Configuration(format!(
            "Dilation factor must be positive, got {}",
            factor
        )));
    }

    let mut out = Timeline::new(timeline.ticks_per_beat);
    for track in &timeline.tracks {
        let scaled = track
            .to_deltas()
            .into_iter()
            .map(|(delta, event)| ((delta as f64 * factor) as u32, event));
        out.tracks.push(TrackTimeline::from_deltas(scaled));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::TrackWriter;
    use crate::midi::Event;

    fn two_track_timeline() -> Timeline {
        let mut timeline = Timeline::new(480);
        for key in [60, 120] {
            let mut track = TrackWriter::with_tempo(500_000);
            track.add_note(key, 80, 0, 480).add_note(key + 2, 80, 240, 480);
            timeline.tracks.push(track.finish());
        }
        timeline
    }

    fn keys(track: &TrackTimeline) -> Vec<u8> {
        track
            .events
            .iter()
            .filter_map(|t| t.event.note().map(|n| n.key))
            .collect()
    }

    #[test]
    fn test_key_helpers() {
        assert_eq!(clamp_key(120, 12), 127);
        assert_eq!(clamp_key(3, -5), 0);
        assert_eq!(fold_key(120, 12), 120);
        assert_eq!(fold_key(3, -5), 10);
        assert_eq!(fold_key(60, 7), 67);
    }

    #[test]
    fn test_transpose_track_only_touches_one_track() {
        let timeline = two_track_timeline();
        let moved = transpose_track(&timeline, 1, 7).unwrap();

        assert_eq!(moved.tracks[0], timeline.tracks[0]);
        assert_eq!(keys(&moved.tracks[1]), vec![127, 127, 127, 127]);
    }

    #[test]
    fn test_transpose_track_bad_index() {
        let result = transpose_track(&two_track_timeline(), 2, 1);
        assert!(matches!(result, Err(GeneratorError::Configuration(_))));
    }

    #[test]
    fn test_transpose_timeline_folds_octaves() {
        let moved = transpose_timeline(&two_track_timeline(), 10);
        assert_eq!(keys(&moved.tracks[0]), vec![70, 70, 72, 72]);
        assert_eq!(keys(&moved.tracks[1]), vec![118, 118, 120, 120]);
    }

    #[test]
    fn test_time_dilate() {
        let timeline = two_track_timeline();
        let slow = time_dilate_timeline(&timeline, 2.0).unwrap();

        let ticks: Vec<u64> = slow.tracks[0].events.iter().map(|t| t.tick).collect();
        assert_eq!(ticks, vec![0, 0, 960, 1440, 2400]);
        assert_eq!(slow.tracks[0].length, 2400);
        assert!(matches!(slow.tracks[0].events[1].event, Event::NoteOn(_)));

        assert!(time_dilate_timeline(&timeline, 0.0).is_err());
    }
}
