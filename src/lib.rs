// midibench - MIDI stimulus generation and music-model benchmarks
// Module declarations and CLI dispatch

use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;

pub mod benchmarks;
mod cli_args;
pub mod commands;
pub mod generators;
pub mod midi;
pub mod pipeline;
pub mod reshuffle;
pub mod state;

use cli_args::{Cli, Commands, SuiteCommand};
use commands::{
    AlterNotesInput, CommandError, CommandResult, GenerateInput, GenerationSummary, ScoreInput,
    ShuffleInput, SuiteKind, TransposeTracksInput,
};
use reshuffle::ReshuffleSettings;

/// Parse arguments, install the logger and run one command
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).init();

    match dispatch(cli.command) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e.message());
            eprintln!("error: {}", e.message());
            ExitCode::FAILURE
        }
    }
}

fn dispatch(command: Commands) -> CommandResult<ExitCode> {
    match command {
        Commands::Shuffle {
            inputs,
            output_dir,
            config,
            num_versions,
            ticks_per_bar,
            phrase_length,
            preserve_endpoints,
            seed,
            max_attempts,
            manifest,
        } => {
            let mut settings = match &config {
                Some(path) => ReshuffleSettings::from_json_file(path)?,
                None => ReshuffleSettings::default(),
            };
            if let Some(n) = num_versions {
                settings.num_versions = n;
            }
            if ticks_per_bar.is_some() {
                settings.ticks_per_bar = ticks_per_bar;
            }
            if let Some(length) = phrase_length {
                settings.phrase_length = length;
            }
            if preserve_endpoints {
                settings.preserve_endpoints = true;
            }
            if seed.is_some() {
                settings.seed = seed;
            }
            if let Some(attempts) = max_attempts {
                settings.max_attempts = attempts;
            }

            let summary = commands::shuffle(ShuffleInput {
                inputs,
                output_dir,
                settings,
                manifest,
            })?;
            for file in &summary.files {
                match &file.error {
                    Some(error) => println!("FAILED {}: {}", file.input.display(), error),
                    None => {
                        for output in &file.outputs {
                            println!("{} -> {}", file.input.display(), output.display());
                        }
                        if let Some(capped) = &file.capped {
                            println!("capped {}: {}", file.input.display(), capped);
                        }
                    }
                }
            }
            println!("seed {}", summary.seed);

            Ok(if summary.failed() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Generate {
            output_dir,
            seed,
            manifest,
            suite,
        } => {
            let suite = match suite {
                SuiteCommand::Cadence => SuiteKind::Cadence,
                SuiteCommand::ScaleFilling { mode } => SuiteKind::ScaleFilling { mode },
                SuiteCommand::IntervalRecognition {
                    examples,
                    permutations,
                } => SuiteKind::IntervalRecognition {
                    num_examples: examples,
                    num_permutations: permutations,
                },
                SuiteCommand::Transposition => SuiteKind::Transposition,
                SuiteCommand::MelodyContinuation {
                    context,
                    ending,
                    prefix,
                } => SuiteKind::MelodyContinuation {
                    context,
                    ending,
                    prefix,
                },
            };
            let summary = commands::generate_suite(GenerateInput {
                suite,
                output_dir,
                seed,
                manifest,
            })?;
            print_generated(&summary);
            Ok(ExitCode::SUCCESS)
        }
        Commands::TransposeTracks {
            input,
            output_dir,
            tracks,
            semitones,
            manifest,
        } => {
            let summary = commands::transpose_tracks(TransposeTracksInput {
                input,
                output_dir,
                tracks,
                semitones,
                manifest,
            })?;
            print_generated(&summary);
            Ok(ExitCode::SUCCESS)
        }
        Commands::AlterNotes {
            input,
            output_dir,
            num_versions,
            notes,
            interval,
            seed,
            manifest,
        } => {
            let summary = commands::alter_notes(AlterNotesInput {
                input,
                output_dir,
                num_versions,
                notes_to_alter: notes,
                interval,
                seed,
                manifest,
            })?;
            print_generated(&summary);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Score {
            benchmark,
            suite,
            nll,
            ratings,
            surprisal,
            permutations,
            mode,
        } => {
            let report = commands::score(ScoreInput {
                benchmark,
                suite,
                nll,
                ratings,
                surprisal,
                permutations,
                mode,
            })?;
            print_json(&report)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_generated(summary: &GenerationSummary) {
    for output in &summary.outputs {
        println!("{}", output.path.display());
    }
    if let Some(seed) = summary.seed {
        println!("seed {}", seed);
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
