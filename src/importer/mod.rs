// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! The importer front end.
//!
//! [`EntityImporter`] binds everything together: it instantiates the
//! registered data providers, drives their build and write phases, adds
//! the prologue, prefix and postfix parts, and routes the output to a
//! file, an arbitrary writer or a live statement executor. A failed run
//! leaves output that ends with the abort marker, so downstream tooling
//! can detect incomplete scripts.

mod provider;

use std::{
    error::Error,
    fs,
    io::{BufWriter, Write},
    mem,
    path::PathBuf,
    rc::Rc
};

use tracing::info;

pub use provider::{DataProvider, ProviderPool, ProviderRegistration, ProviderResources,
    instantiate_providers};

use crate::{
    config::{ImporterSettings, POSTFIX_KEY, PREFIX_KEY},
    context::GeneratorContext,
    error::{GeneratorError, Result},
    generator::EntitySqlGenerator,
    statements::{ConnectedStatementsWriter, FileStatementsWriter, StatementExecutor}
};

/// Marker written into the output when generation was aborted.
///
/// Usable by other tooling that performs further modifications on the
/// generated files.
pub const GENERATION_ABORTED_MESSAGE: &str = "!!! GENERATION ABORTED !!!";

/// Builds one coherent SQL script from all registered data providers.
pub struct EntityImporter {
    settings:      ImporterSettings,
    context:       Rc<GeneratorContext>,
    registrations: Vec<ProviderRegistration>
}

impl EntityImporter {
    /// Create an importer; the dialect comes from the settings.
    pub fn new(settings: ImporterSettings) -> Result<Self> {
        let context = Rc::new(GeneratorContext::new(settings.generator.clone())?);
        Ok(Self::with_context(settings, context))
    }

    /// Create an importer around an existing context.
    pub fn with_context(settings: ImporterSettings, context: Rc<GeneratorContext>) -> Self {
        Self {
            settings,
            context,
            registrations: Vec::new()
        }
    }

    /// The importer settings.
    pub fn settings(&self) -> &ImporterSettings {
        &self.settings
    }

    /// The shared generation context.
    pub fn context(&self) -> &Rc<GeneratorContext> {
        &self.context
    }

    /// Register a data provider.
    pub fn register(&mut self, registration: ProviderRegistration) {
        self.registrations.push(registration);
    }

    /// Import into the configured output file.
    pub fn import_data(&mut self) -> Result<PathBuf> {
        let target = self.settings.output_file.clone();
        if let Some(directory) = target.parent()
            && !directory.as_os_str().is_empty()
        {
            fs::create_dir_all(directory)?;
        }
        let file = fs::File::create(&target)?;
        self.import_to_write(BufWriter::new(file))?;
        info!(file = %target.display(), "SQL script generated");
        Ok(target)
    }

    /// Import into any byte sink as a UTF-8 SQL script.
    pub fn import_to_write<W: Write>(&mut self, sink: W) -> Result<()> {
        let writer = FileStatementsWriter::new(sink, self.context.dialect());
        let mut generator = EntitySqlGenerator::new(self.context.clone(), Box::new(writer));
        self.import(&mut generator, true)
    }

    /// Import by streaming statements to a live executor.
    ///
    /// Comments and the prefix/postfix parts are not sent; the executor
    /// holds the sole transaction and commit is driven by the caller.
    pub fn import_to_executor<E: StatementExecutor>(&mut self, executor: &mut E) -> Result<()> {
        let writer = ConnectedStatementsWriter::new(executor);
        let mut generator = EntitySqlGenerator::new(self.context.clone(), Box::new(writer));
        self.import(&mut generator, false)
    }

    /// Run both provider phases and write the script.
    ///
    /// Any error surfaces here, emits the abort marker and is returned;
    /// nothing is retried.
    pub fn import(
        &mut self,
        generator: &mut EntitySqlGenerator<'_>,
        file_mode: bool
    ) -> Result<()> {
        let result = self.import_inner(generator, file_mode);
        if let Err(error) = &result {
            // Best effort: the sink may be the reason we are aborting.
            let _ = generator.write_section_separator();
            let _ = generator.write_comment(&format!(
                "\n{GENERATION_ABORTED_MESSAGE}\n{}",
                render_error_chain(error)
            ));
            let _ = generator.flush();
            return result;
        }
        generator.flush()?;
        result
    }

    fn import_inner(
        &mut self,
        generator: &mut EntitySqlGenerator<'_>,
        file_mode: bool
    ) -> Result<()> {
        let registrations = mem::take(&mut self.registrations);
        let resources = ProviderResources {
            data_folder: &self.settings.data_folder,
            settings:    &self.settings
        };
        let mut providers = instantiate_providers(registrations, &resources)?;

        for provider in providers.iter_mut() {
            provider.build_entities()?;
        }

        let dialect = self.context.dialect().name();
        info!(dialect, "using dialect for SQL generation");
        generator.write_comment(&format!("Generated by sqlseed for {dialect}"))?;

        self.write_property_part(generator, PREFIX_KEY, file_mode)?;

        for provider in providers.iter_mut() {
            generator.write_section_separator()?;
            generator.write_comment(&format!("Data from {}", provider.name()))?;
            provider.write_entities(generator)?;
            info!(provider = provider.name(), "generated SQL");
        }

        generator.write_alignment_statements()?;
        self.context.check_residual_pending_states()?;

        self.write_property_part(generator, POSTFIX_KEY, file_mode)?;
        Ok(())
    }

    /// Inline a prefix or postfix part: either a list of `.sql` files
    /// (each preceded by a comment naming it) or a literal fragment.
    fn write_property_part(
        &self,
        generator: &mut EntitySqlGenerator<'_>,
        key: &str,
        file_mode: bool
    ) -> Result<()> {
        if !file_mode {
            return Ok(());
        }
        let value = match key {
            PREFIX_KEY => self.settings.prefix.as_deref(),
            _ => self.settings.postfix.as_deref()
        };
        let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(());
        };

        generator.write_section_separator()?;
        if value.ends_with(".sql") {
            for file_name in value
                .split(['\n', ',', ';', ':'])
                .map(str::trim)
                .filter(|name| !name.is_empty())
            {
                let mut path = PathBuf::from(file_name);
                if path.is_relative() {
                    path = self.settings.data_folder.join(path);
                }
                if path.is_file() {
                    let contents = fs::read_to_string(&path).map_err(GeneratorError::Io)?;
                    generator.write_comment(file_name)?;
                    generator.write_raw(&contents)?;
                    generator.write_raw("\n")?;
                } else {
                    generator.write_comment(&format!("Ignored missing file: {file_name}"))?;
                }
            }
        } else {
            generator.write_comment(key)?;
            generator.write_raw(value)?;
            generator.write_raw("\n")?;
        }
        Ok(())
    }
}

/// Render an error and its source chain, one cause per line.
fn render_error_chain(error: &GeneratorError) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str("\ncaused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
