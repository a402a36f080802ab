// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Error types of the generator core.
//!
//! The core recovers nothing internally. Every failure surfaces to the
//! importer front end, which is the only component allowed to write the
//! abort marker into the output.

use std::io;

use thiserror::Error;

/// Errors raised while building the metamodel or emitting SQL.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// The declarative entity model is inconsistent: missing identifier,
    /// unresolvable inheritance, an unsupported joined-id shape, or a data
    /// provider whose dependencies can never be satisfied.
    #[error("invalid entity model: {0}")]
    Model(String),

    /// A pending update could not be resolved because the referenced
    /// entity was never written.
    #[error("{count} pending update(s) left for '{entity}' that was never written")]
    UnresolvedReference {
        /// Entity name of the referenced descriptor.
        entity: String,
        /// Number of deferred actions still queued.
        count:  usize
    },

    /// The entity model requires a feature the selected dialect does not
    /// support.
    #[error("dialect does not support this model: {0}")]
    Dialect(String),

    /// A configuration key carries an unusable value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The statements writer or its sink failed.
    #[error("output failed: {0}")]
    Io(#[from] io::Error)
}

impl GeneratorError {
    /// Shortcut for a [`GeneratorError::Model`] with a formatted message.
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GeneratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_message() {
        let err = GeneratorError::model("no id found for Person");
        assert_eq!(err.to_string(), "invalid entity model: no id found for Person");
    }

    #[test]
    fn io_error_converts() {
        let err: GeneratorError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(err, GeneratorError::Io(_)));
    }
}
