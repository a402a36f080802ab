// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

//! # sqlseed
//!
//! Deterministic SQL seed scripts from a declarative entity model.
//!
//! sqlseed reads an application's entity model, described with
//! `#[derive(Entity)]`, asks a set of user-written [data
//! providers](DataProvider) to build an object graph, and emits one SQL
//! script (or streams statements to a live connection) that populates a
//! compatible schema with that graph. Cross-references stay valid
//! regardless of discovery order: rows an entity requires are written
//! first, everything else becomes a deferred UPDATE that fires once the
//! referenced row exists.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sqlseed::{Entity, EntityImporter, ImporterSettings, ProviderRegistration, Ref, new_entity};
//!
//! #[derive(Entity)]
//! pub struct Country {
//!     #[id]
//!     #[generated]
//!     pub id: Option<i64>,
//!
//!     #[column(unique, nullable = false, length = 2)]
//!     pub code: String,
//! }
//!
//! struct Countries {
//!     built: Vec<Ref<Country>>,
//! }
//!
//! impl sqlseed::DataProvider for Countries {
//!     fn name(&self) -> &str {
//!         "Countries"
//!     }
//!
//!     fn build_entities(&mut self) -> sqlseed::Result<()> {
//!         self.built.push(new_entity(Country { id: None, code: "DE".into() }));
//!         Ok(())
//!     }
//!
//!     fn write_entities(
//!         &mut self,
//!         generator: &mut sqlseed::EntitySqlGenerator<'_>,
//!     ) -> sqlseed::Result<()> {
//!         generator.write_all(&self.built)
//!     }
//!
//!     fn as_any(&self) -> &dyn std::any::Any {
//!         self
//!     }
//! }
//!
//! let mut importer = EntityImporter::new(ImporterSettings::default())?;
//! importer.register(ProviderRegistration::new("Countries", |_, _| {
//!     Ok(Countries { built: Vec::new() })
//! }));
//! importer.import_data()?;
//! # Ok::<(), sqlseed::GeneratorError>(())
//! ```
//!
//! ## Entity Attributes
//!
//! | Attribute | Level | Description |
//! |-----------|-------|-------------|
//! | `#[entity(name = .., table = ..)]` | struct | Entity and table name, both defaulting to the struct name |
//! | `#[entity(inheritance = "single_table" \| "joined" \| "table_per_class")]` | struct | Inheritance strategy of a hierarchy root |
//! | `#[entity(extends = Parent)]` | struct | Superclass; the struct needs a `#[parent]` field of that type |
//! | `#[entity(mapped_superclass)]` | struct | Contributes attributes to subclasses, no own table |
//! | `#[entity(discriminator = "..")]` | struct | Discriminator literal of this class |
//! | `#[generator(name = .., strategy = .., ..)]` | struct | Declares a sequence or table generator |
//! | `#[unique(columns = "a, b")]` | struct | Multi-column unique constraint |
//! | `#[id]`, `#[generated(..)]` | field | Identifier and its generation strategy |
//! | `#[column(..)]` | field | Column name, nullability, uniqueness, length |
//! | `#[version]` | field | Optimistic lock column |
//! | `#[embedded]`, `#[embedded_id]` | field | Embedded value, embedded composite id |
//! | `#[many_to_one]`, `#[one_to_one]`, `#[join_column(..)]` | field | Singular associations |
//! | `#[one_to_many(..)]`, `#[many_to_many(..)]`, `#[element_collection(..)]` | field | Collections |
//! | `#[map_key(..)]` | field | Map attribute key column |
//! | `#[attribute_override(..)]`, `#[association_override(..)]` | field | Overrides at an embedding site |
//! | `#[transient]` | field | Not persistent |
//!
//! ## Determinism
//!
//! Two runs over equal inputs produce byte-identical scripts: providers
//! run in an order fixed by their declared priority and dependencies,
//! properties iterate in declared order, and discriminators and
//! generator values are derived from stable functions only.

pub mod config;
pub mod context;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod generator;
pub mod importer;
pub mod model;
pub mod statements;
pub mod value;

pub use config::{GeneratorSettings, ImporterSettings};
pub use context::GeneratorContext;
pub use dialect::{GeneratorDialect, H2Dialect, PostgresDialect};
pub use entity::{EmbeddedValue, EntityHandle, Ref, SqlEntity, new_entity};
pub use error::{GeneratorError, Result};
pub use generator::EntitySqlGenerator;
pub use importer::{
    DataProvider, EntityImporter, GENERATION_ABORTED_MESSAGE, ProviderPool, ProviderRegistration,
    ProviderResources
};
pub use statements::{StatementExecutor, StatementsWriter};
pub use value::Value;

// The derive macros; generated code refers back to this crate by path.
pub use sqlseed_derive::{Embeddable, Entity};
