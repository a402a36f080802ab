// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Command line entry point.
//!
//! Positional arguments are the output file and the data folder in
//! either order; an argument naming an existing directory is taken as
//! the data folder. Every settings key can also be supplied through
//! `SQLSEED_*` environment variables.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use sqlseed::{EntityImporter, GeneratorError, ImporterSettings, Result, config};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sqlseed", version, about = "Generate a SQL seed script from an entity model")]
struct Cli {
    /// Output file and data folder, in either order. An existing
    /// directory is taken as the data folder.
    #[arg(value_name = "PATH", num_args = 0..=2)]
    paths: Vec<PathBuf>,

    /// SQL dialect of the generated script.
    #[arg(long, value_name = "NAME")]
    dialect: Option<String>,

    /// Destination of the generated script.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Base folder for provider input data.
    #[arg(long, value_name = "DIR")]
    data_folder: Option<PathBuf>,

    /// Prefer currval and sub-select references over literal ids.
    #[arg(long)]
    relative_ids: bool
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = ImporterSettings::default();
    settings.overlay_env()?;
    apply_positional_paths(&mut settings, &cli.paths)?;

    if let Some(dialect) = cli.dialect {
        settings.apply(config::DIALECT_KEY, &dialect)?;
    }
    if let Some(output) = cli.output {
        settings.output_file = output;
    }
    if let Some(data_folder) = cli.data_folder {
        settings.data_folder = data_folder;
    }
    if cli.relative_ids {
        settings.generator.write_relative_ids = true;
    }

    let mut importer = EntityImporter::new(settings)?;
    importer.import_data()?;
    Ok(())
}

/// `[output-file] [data-folder]` in either order: whichever argument is
/// an existing directory becomes the data folder.
fn apply_positional_paths(settings: &mut ImporterSettings, paths: &[PathBuf]) -> Result<()> {
    match paths {
        [] => Ok(()),
        [first] => {
            if first.is_dir() {
                settings.data_folder = first.clone();
            } else {
                settings.output_file = first.clone();
            }
            Ok(())
        }
        [first, second] => {
            if first.is_dir() {
                settings.data_folder = first.clone();
                settings.output_file = second.clone();
            } else {
                settings.output_file = first.clone();
                settings.data_folder = second.clone();
            }
            Ok(())
        }
        _ => Err(GeneratorError::Config("at most two positional paths are accepted".to_owned()))
    }
}
