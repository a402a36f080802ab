// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Importer and generator settings.
//!
//! Settings come from an ordered key/value map, usually assembled from
//! the command line, and every key can also be supplied through the
//! process environment as `SQLSEED_<KEY>` with dashes mapped to
//! underscores.

use std::{collections::BTreeMap, env, path::PathBuf};

use crate::{
    context::properties::UniquePropertyQuality,
    error::{GeneratorError, Result}
};

/// Settings key for the folder containing provider input data.
pub const DATA_FOLDER_KEY: &str = "data-folder";
/// Settings key for the generated SQL file.
pub const OUTPUT_FILE_KEY: &str = "output-file";
/// Settings key for the output character set; only UTF-8 is accepted.
pub const OUTPUT_ENCODING_KEY: &str = "output-encoding";
/// Settings key for SQL written before the generated content.
pub const PREFIX_KEY: &str = "prefix";
/// Settings key for SQL written after the generated content.
pub const POSTFIX_KEY: &str = "postfix";
/// Settings key for the SQL dialect.
pub const DIALECT_KEY: &str = "dialect";
/// Settings key for the largest unique constraint considered as an
/// alternate key; zero disables alternates.
pub const MAX_UNIQUE_PROPERTIES_KEY: &str = "max-unique-properties";
/// Settings key for the worst acceptable unique-key quality.
pub const UNIQUE_PROPERTY_QUALITY_KEY: &str = "unique-property-quality";
/// Settings key preferring `currval` and sub-select references over
/// literal ids.
pub const WRITE_RELATIVE_IDS_KEY: &str = "write-relative-ids";
/// Settings key enabling the `currval` shortcut for the latest sequence
/// value.
pub const PREFER_SEQUENCE_CURRENT_VALUE_KEY: &str = "prefer-sequence-current-value";

/// Flags consumed by the generator core.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// Name of the SQL dialect.
    pub dialect: String,
    /// Largest unique constraint considered as an alternate key.
    pub max_unique_properties: usize,
    /// Worst acceptable quality for unique-key alternates.
    pub unique_property_quality: UniquePropertyQuality,
    /// Prefer `currval` and sub-select references over literal ids.
    pub write_relative_ids: bool,
    /// Use `currval` for a reference to the latest sequence value.
    pub prefer_sequence_current_value: bool
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            dialect: "h2".to_owned(),
            max_unique_properties: 1,
            unique_property_quality: UniquePropertyQuality::OnlyRequiredPrimitives,
            write_relative_ids: false,
            prefer_sequence_current_value: true
        }
    }
}

/// Settings of the importer front end.
#[derive(Debug, Clone)]
pub struct ImporterSettings {
    /// Base folder handed to data providers.
    pub data_folder: PathBuf,
    /// Destination of the generated script.
    pub output_file: PathBuf,
    /// SQL fragment or `.sql` file list inlined before the content.
    pub prefix:      Option<String>,
    /// SQL fragment or `.sql` file list inlined after the content.
    pub postfix:     Option<String>,
    /// Flags of the generator core.
    pub generator:   GeneratorSettings
}

impl Default for ImporterSettings {
    fn default() -> Self {
        Self {
            data_folder: PathBuf::from("."),
            output_file: PathBuf::from("data.sql"),
            prefix:      None,
            postfix:     None,
            generator:   GeneratorSettings::default()
        }
    }
}

impl ImporterSettings {
    /// Build settings from a key/value map, then overlay the process
    /// environment.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self> {
        let mut settings = Self::default();
        for (key, value) in map {
            settings.apply(key, value)?;
        }
        settings.overlay_env()?;
        Ok(settings)
    }

    /// Apply one configuration key.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            DATA_FOLDER_KEY => self.data_folder = PathBuf::from(value),
            OUTPUT_FILE_KEY => self.output_file = PathBuf::from(value),
            OUTPUT_ENCODING_KEY => {
                if !value.eq_ignore_ascii_case("utf-8") && !value.eq_ignore_ascii_case("utf8") {
                    return Err(GeneratorError::Config(format!(
                        "unsupported output encoding '{value}', only UTF-8 is available"
                    )));
                }
            }
            PREFIX_KEY => self.prefix = Some(value.to_owned()),
            POSTFIX_KEY => self.postfix = Some(value.to_owned()),
            DIALECT_KEY => self.generator.dialect = value.to_owned(),
            MAX_UNIQUE_PROPERTIES_KEY => {
                self.generator.max_unique_properties = value.parse().map_err(|_| {
                    GeneratorError::Config(format!("'{value}' is not a valid property count"))
                })?;
            }
            UNIQUE_PROPERTY_QUALITY_KEY => {
                self.generator.unique_property_quality = UniquePropertyQuality::from_name(value)
                    .ok_or_else(|| {
                        GeneratorError::Config(format!("unknown unique-key quality '{value}'"))
                    })?;
            }
            WRITE_RELATIVE_IDS_KEY => {
                self.generator.write_relative_ids = parse_flag(key, value)?;
            }
            PREFER_SEQUENCE_CURRENT_VALUE_KEY => {
                self.generator.prefer_sequence_current_value = parse_flag(key, value)?;
            }
            other => {
                return Err(GeneratorError::Config(format!("unknown settings key '{other}'")));
            }
        }
        Ok(())
    }

    /// Overlay `SQLSEED_*` environment variables over the current
    /// values.
    pub fn overlay_env(&mut self) -> Result<()> {
        for key in [
            DATA_FOLDER_KEY,
            OUTPUT_FILE_KEY,
            OUTPUT_ENCODING_KEY,
            PREFIX_KEY,
            POSTFIX_KEY,
            DIALECT_KEY,
            MAX_UNIQUE_PROPERTIES_KEY,
            UNIQUE_PROPERTY_QUALITY_KEY,
            WRITE_RELATIVE_IDS_KEY,
            PREFER_SEQUENCE_CURRENT_VALUE_KEY
        ] {
            if let Ok(value) = env::var(env_key(key)) {
                self.apply(key, &value)?;
            }
        }
        Ok(())
    }
}

/// Environment variable name of a settings key.
pub fn env_key(key: &str) -> String {
    format!("SQLSEED_{}", key.replace('-', "_").to_uppercase())
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(GeneratorError::Config(format!("'{other}' is not a boolean for '{key}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = ImporterSettings::default();
        assert_eq!(settings.output_file, PathBuf::from("data.sql"));
        assert_eq!(settings.generator.dialect, "h2");
        assert_eq!(settings.generator.max_unique_properties, 1);
        assert!(!settings.generator.write_relative_ids);
        assert!(settings.generator.prefer_sequence_current_value);
    }

    #[test]
    fn apply_known_keys() {
        let mut settings = ImporterSettings::default();
        settings.apply(DIALECT_KEY, "postgres").unwrap();
        settings.apply(WRITE_RELATIVE_IDS_KEY, "true").unwrap();
        settings.apply(MAX_UNIQUE_PROPERTIES_KEY, "3").unwrap();
        settings.apply(UNIQUE_PROPERTY_QUALITY_KEY, "allows-nulls").unwrap();
        assert_eq!(settings.generator.dialect, "postgres");
        assert!(settings.generator.write_relative_ids);
        assert_eq!(settings.generator.max_unique_properties, 3);
        assert_eq!(
            settings.generator.unique_property_quality,
            UniquePropertyQuality::AllowsNulls
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut settings = ImporterSettings::default();
        assert!(settings.apply("no-such-key", "1").is_err());
    }

    #[test]
    fn non_utf8_encoding_is_rejected() {
        let mut settings = ImporterSettings::default();
        assert!(settings.apply(OUTPUT_ENCODING_KEY, "latin1").is_err());
        assert!(settings.apply(OUTPUT_ENCODING_KEY, "UTF-8").is_ok());
    }

    #[test]
    fn env_key_shape() {
        assert_eq!(env_key("write-relative-ids"), "SQLSEED_WRITE_RELATIVE_IDS");
    }
}
