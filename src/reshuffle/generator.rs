// Bar Shuffling Generator - Writes reordered versions of MIDI files
// Segmentations are cached per file content and unit width for the life of the generator

use rand::Rng;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::generators::{file_stem, GeneratedStimulus, StimulusId, StimulusWriter};
use crate::midi;
use crate::state::storage;

use super::{
    relinearize, segment, CapacityWarning, PermutationSampler, ReshuffleError, ReshuffleResult,
    ReshuffleSettings, Segmentation,
};

/// Outcome of reshuffling one input file
#[derive(Debug, Clone, Serialize)]
pub struct ReshuffleReport {
    pub input: PathBuf,

    /// Written files in version order
    pub outputs: Vec<GeneratedStimulus>,

    /// Unit order used for each output
    pub orders: Vec<Vec<usize>>,

    pub unit_width: u64,
    pub unit_count: usize,

    /// Note-ons synthesized at unit boundaries
    pub splits: usize,

    /// Set when fewer versions than requested could be written
    pub capped: Option<CapacityWarning>,
}

/// Outcome of a batch: one result per input, in input order
#[derive(Debug)]
pub struct BatchReport {
    pub seed: u64,
    pub results: Vec<(PathBuf, ReshuffleResult<ReshuffleReport>)>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, result)| result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Reshuffle orchestrator
pub struct BarShufflingGenerator {
    writer: StimulusWriter,
    /// Keyed by (content sha256, unit width)
    cache: HashMap<(String, u64), Segmentation>,
}

impl BarShufflingGenerator {
    pub fn new(writer: StimulusWriter) -> Self {
        BarShufflingGenerator {
            writer,
            cache: HashMap::new(),
        }
    }

    pub fn writer(&self) -> &StimulusWriter {
        &self.writer
    }

    /// Number of cached segmentations
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Write `settings.num_versions` distinct reorderings of `input`
    ///
    /// A request larger than the number of distinct orders is capped and
    /// reported in `ReshuffleReport::capped`.
    pub fn generate_shuffled_versions<R: Rng>(
        &mut self,
        input: &Path,
        settings: &ReshuffleSettings,
        rng: &mut R,
    ) -> ReshuffleResult<ReshuffleReport> {
        settings.validate()?;
        if !input.exists() {
            return Err(ReshuffleError::NotFound(input.to_path_buf()));
        }

        let bytes = storage::read_file(input)?;
        let timeline = midi::decode(&bytes)?;
        let ticks_per_bar = match settings.ticks_per_bar {
            Some(ticks) => ticks,
            None => timeline.estimate_ticks_per_bar().ok_or_else(|| {
                ReshuffleError::Configuration(format!(
                    "Cannot derive ticks per bar for {}",
                    input.display()
                ))
            })?,
        };
        let width = ticks_per_bar.saturating_mul(settings.phrase_length as u64);

        let segmentation: &Segmentation = match self.cache.entry((storage::calculate_sha256(&bytes), width)) {
            Entry::Occupied(cached) => {
                log::debug!("Reusing segmentation of {} at width {}", input.display(), width);
                cached.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(segment(&timeline, width)?),
        };

        log::info!(
            "Segmented {}: {} units of {} ticks, {} boundary splits",
            input.display(),
            segmentation.unit_count,
            width,
            segmentation.splits()
        );

        let mut sampler = PermutationSampler::new(
            segmentation.unit_count,
            settings.preserve_endpoints,
            settings.max_attempts,
        )?;
        let (count, capped) = sampler.cap_request(settings.num_versions);
        if let Some(warning) = &capped {
            log::warn!("{}: {}, writing {}", input.display(), warning, count);
        }

        let stem = file_stem(input);
        let mut outputs = Vec::with_capacity(count);
        let mut orders = Vec::with_capacity(count);
        for version in 1..=count {
            let order = sampler.sample(rng)?;
            let shuffled = relinearize(segmentation, &order)?;
            let id = StimulusId::Shuffled {
                stem: stem.clone(),
                phrase_length: settings.phrase_length,
                version,
            };
            let path = self.writer.save::<ReshuffleError>(&shuffled, &id)?;
            log::info!("Saved version {}/{} with order {:?}: {}", version, count, order, path.display());

            outputs.push(GeneratedStimulus { id, path });
            orders.push(order);
        }

        Ok(ReshuffleReport {
            input: input.to_path_buf(),
            outputs,
            orders,
            unit_width: width,
            unit_count: segmentation.unit_count,
            splits: segmentation.splits(),
            capped,
        })
    }

    /// Reshuffle every input with one session generator
    ///
    /// A failing input is reported in its slot; files already written for
    /// other inputs are left untouched.
    pub fn generate_batch(&mut self, inputs: &[PathBuf], settings: &ReshuffleSettings) -> BatchReport {
        let (mut rng, seed) = settings.session_rng();
        self.writer.set_seed(Some(seed));
        log::info!("Reshuffling {} file(s) with seed {}", inputs.len(), seed);

        let results = inputs
            .iter()
            .map(|input| {
                let result = self.generate_shuffled_versions(input, settings, &mut rng);
                if let Err(e) = &result {
                    log::error!("Failed to reshuffle {}: {}", input.display(), e);
                }
                (input.clone(), result)
            })
            .collect();

        BatchReport { seed, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::TrackWriter;
    use crate::midi::Timeline;
    use crate::pipeline::{read_manifest, MANIFEST_FILE};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::collections::HashSet;
    use tempfile::TempDir;

    /// One note per bar of 4/4 at 480 ticks per beat
    fn write_bars(dir: &Path, name: &str, bars: usize) -> PathBuf {
        let mut track = TrackWriter::with_tempo(500_000);
        for bar in 0..bars {
            track.add_note(60 + bar as u8, 80, 0, 1920);
        }
        let mut timeline = Timeline::new(480);
        timeline.tracks.push(track.finish());

        let path = dir.join(name);
        midi::save(&timeline, &path).unwrap();
        path
    }

    fn setup(bars: usize) -> (TempDir, PathBuf, BarShufflingGenerator) {
        let temp_dir = TempDir::new().unwrap();
        let input = write_bars(temp_dir.path(), "tune.mid", bars);
        let out_dir = temp_dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();
        let generator = BarShufflingGenerator::new(StimulusWriter::new(&out_dir).unwrap());
        (temp_dir, input, generator)
    }

    #[test]
    fn test_versions_are_written_and_distinct() {
        let (temp_dir, input, mut generator) = setup(5);
        let settings = ReshuffleSettings {
            num_versions: 4,
            ..Default::default()
        };
        let mut rng = Pcg32::seed_from_u64(5);

        let report = generator.generate_shuffled_versions(&input, &settings, &mut rng).unwrap();
        assert_eq!(report.unit_count, 5);
        assert_eq!(report.unit_width, 1920);
        assert_eq!(report.outputs.len(), 4);
        assert!(report.capped.is_none());

        let unique: HashSet<&Vec<usize>> = report.orders.iter().collect();
        assert_eq!(unique.len(), 4);

        let last = temp_dir.path().join("out").join("tune_shuffled_p1_v4.mid");
        let reloaded = midi::load(&last).unwrap();
        assert_eq!(reloaded.total_ticks(), 5 * 1920);
        assert_eq!(reloaded.note_on_count(), 5);
    }

    #[test]
    fn test_capacity_cap() {
        let (_temp_dir, input, mut generator) = setup(4);
        let settings = ReshuffleSettings {
            num_versions: 5,
            preserve_endpoints: true,
            ..Default::default()
        };
        let mut rng = Pcg32::seed_from_u64(8);

        let report = generator.generate_shuffled_versions(&input, &settings, &mut rng).unwrap();
        assert_eq!(report.outputs.len(), 2);
        assert_eq!(
            report.capped,
            Some(CapacityWarning {
                requested: 5,
                available: 2
            })
        );
        for order in &report.orders {
            assert_eq!(order[0], 0);
            assert_eq!(order[3], 3);
        }
    }

    #[test]
    fn test_phrase_length_widens_units() {
        let (temp_dir, input, mut generator) = setup(6);
        let settings = ReshuffleSettings {
            num_versions: 1,
            phrase_length: 2,
            ..Default::default()
        };
        let mut rng = Pcg32::seed_from_u64(2);

        let report = generator.generate_shuffled_versions(&input, &settings, &mut rng).unwrap();
        assert_eq!(report.unit_width, 3840);
        assert_eq!(report.unit_count, 3);
        assert!(temp_dir.path().join("out").join("tune_shuffled_p2_v1.mid").exists());
    }

    #[test]
    fn test_segmentation_cached_per_content_and_width() {
        let (_temp_dir, input, mut generator) = setup(3);
        let settings = ReshuffleSettings {
            num_versions: 1,
            ..Default::default()
        };
        let mut rng = Pcg32::seed_from_u64(1);

        generator.generate_shuffled_versions(&input, &settings, &mut rng).unwrap();
        generator.generate_shuffled_versions(&input, &settings, &mut rng).unwrap();
        assert_eq!(generator.cached(), 1);

        let wider = ReshuffleSettings {
            ticks_per_bar: Some(960),
            ..settings
        };
        generator.generate_shuffled_versions(&input, &wider, &mut rng).unwrap();
        assert_eq!(generator.cached(), 2);
    }

    #[test]
    fn test_errors() {
        let (temp_dir, _input, mut generator) = setup(3);
        let mut rng = Pcg32::seed_from_u64(1);

        let missing = temp_dir.path().join("missing.mid");
        assert!(matches!(
            generator.generate_shuffled_versions(&missing, &ReshuffleSettings::default(), &mut rng),
            Err(ReshuffleError::NotFound(_))
        ));

        let short = write_bars(temp_dir.path(), "short.mid", 1);
        assert!(matches!(
            generator.generate_shuffled_versions(&short, &ReshuffleSettings::default(), &mut rng),
            Err(ReshuffleError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_batch_isolates_failures_and_records_seed() {
        let temp_dir = TempDir::new().unwrap();
        let good = write_bars(temp_dir.path(), "good.mid", 3);
        let missing = temp_dir.path().join("missing.mid");
        let out_dir = temp_dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();
        let mut generator =
            BarShufflingGenerator::new(StimulusWriter::new(&out_dir).unwrap().with_manifest());

        let settings = ReshuffleSettings {
            num_versions: 2,
            seed: Some(77),
            ..Default::default()
        };
        let report = generator.generate_batch(&[missing, good], &settings);

        assert_eq!(report.seed, 77);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);

        let entries = read_manifest(&out_dir.join(MANIFEST_FILE)).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|entry| entry.seed == Some(77)));
    }

    #[test]
    fn test_same_seed_same_orders() {
        let settings = ReshuffleSettings {
            num_versions: 3,
            seed: Some(2024),
            ..Default::default()
        };

        let orders: Vec<Vec<Vec<usize>>> = (0..2)
            .map(|_| {
                let (_temp_dir, input, mut generator) = setup(6);
                let report = generator.generate_batch(&[input], &settings);
                let (_, result) = report.results.into_iter().next().unwrap();
                result.unwrap().orders
            })
            .collect();
        assert_eq!(orders[0], orders[1]);
    }
}
