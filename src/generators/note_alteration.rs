// Note Alteration Generator - Copies of a file with randomly chosen notes shifted
// Each altered note-on carries its matching note-off with it

use rand::seq::index;
use rand::Rng;
use std::path::Path;

use crate::midi::{self, Event, Timeline};

use super::transform::clamp_key;
use super::{file_stem, GeneratedStimulus, GeneratorError, GeneratorResult, StimulusId, StimulusWriter};

/// Generator for randomly altered copies
pub struct NoteAlterationGenerator {
    writer: StimulusWriter,
}

impl NoteAlterationGenerator {
    pub fn new(writer: StimulusWriter) -> Self {
        NoteAlterationGenerator { writer }
    }

    /// Write `num_versions` copies, each with `notes_to_alter` notes moved by `interval`
    pub fn generate_altered_versions<R: Rng>(
        &self,
        input: &Path,
        num_versions: usize,
        notes_to_alter: usize,
        interval: i32,
        rng: &mut R,
    ) -> GeneratorResult<Vec<GeneratedStimulus>> {
        if !input.exists() {
            return Err(GeneratorError::NotFound(input.to_path_buf()));
        }
        let timeline = midi::load(input)?;
        let stem = file_stem(input);

        let mut outputs = Vec::with_capacity(num_versions);
        for version in 1..=num_versions {
            let altered = alter_notes(&timeline, notes_to_alter, interval, rng)?;
            let id = StimulusId::NoteAlteration {
                stem: stem.clone(),
                notes: notes_to_alter,
                interval,
                version,
            };
            let path = self.writer.save::<GeneratorError>(&altered, &id)?;
            log::info!("Saved altered version {}/{}: {}", version, num_versions, path.display());
            outputs.push(GeneratedStimulus { id, path });
        }

        Ok(outputs)
    }
}

/// Shift `count` distinct random note-ons (and their note-offs) by `interval`
pub fn alter_notes<R: Rng>(
    timeline: &Timeline,
    count: usize,
    interval: i32,
    rng: &mut R,
) -> GeneratorResult<Timeline> {
    let positions: Vec<(usize, usize)> = timeline
        .tracks
        .iter()
        .enumerate()
        .flat_map(|(t, track)| {
            track
                .events
                .iter()
                .enumerate()
                .filter(|(_, timed)| matches!(timed.event, Event::NoteOn(_)))
                .map(move |(e, _)| (t, e))
        })
        .collect();

    if positions.len() < count {
        return Err(GeneratorError::InvalidInput(format!(
            "Not enough notes in the file to alter {} notes ({} available)",
            count,
            positions.len()
        )));
    }

    let mut out = timeline.clone();
    for choice in index::sample(rng, positions.len(), count) {
        let (t, e) = positions[choice];
        let track = &mut out.tracks[t];
        let Event::NoteOn(note) = track.events[e].event else {
            continue;
        };
        let new_key = clamp_key(note.key, interval);
        track.events[e].event = track.events[e].event.with_key(new_key);

        // First matching note-off after the note-on
        let matching = track.events[e + 1..].iter().position(|timed| match timed.event {
            Event::NoteOff(off) => off.note_key() == note.note_key(),
            _ => false,
        });
        if let Some(offset) = matching {
            let off = &mut track.events[e + 1 + offset];
            off.event = off.event.with_key(new_key);
        }
        log::debug!("Altered note at track {}, tick {}: {} -> {}", t, track.events[e].tick, note.key, new_key);
    }

    Ok(out)
}
