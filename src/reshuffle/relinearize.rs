// Timeline Re-linearizer - Lays segmented units out in a new order
// Units go to slot * W; meta events stay at their original absolute ticks

use crate::midi::{TimedEvent, Timeline, TrackTimeline};

use super::{ReshuffleError, ReshuffleResult, Segmentation};

/// Build a timeline with unit `order[s]` placed at slot `s`
pub fn relinearize(segmentation: &Segmentation, order: &[usize]) -> ReshuffleResult<Timeline> {
    validate_order(order, segmentation.unit_count)?;

    let width = segmentation.unit_width;
    let mut timeline = Timeline::new(segmentation.ticks_per_beat);

    for segmented in &segmentation.tracks {
        let mut track = TrackTimeline::new();
        // Meta first so it sorts ahead of notes at equal ticks
        track.events.extend(segmented.meta.iter().cloned());

        for (slot, &unit) in order.iter().enumerate() {
            let base = slot as u64 * width;
            track.events.extend(
                segmented.units[unit]
                    .iter()
                    .map(|unit_event| TimedEvent::new(base + unit_event.offset, unit_event.event.clone())),
            );
        }

        track.sort_stable();
        track.length = segmentation.output_length().max(track.last_tick());
        timeline.tracks.push(track);
    }

    Ok(timeline)
}

fn validate_order(order: &[usize], unit_count: usize) -> ReshuffleResult<()> {
    let mut seen = vec![false; unit_count];
    for &unit in order {
        if unit >= unit_count || seen[unit] {
            return Err(ReshuffleError::Configuration(format!(
                "Order {:?} is not a permutation of {} units",
                order, unit_count
            )));
        }
        seen[unit] = true;
    }
    if order.len() != unit_count {
        return Err(ReshuffleError::Configuration(format!(
            "Order has {} slots, expected {}",
            order.len(),
            unit_count
        )));
    }
    Ok(())
}
