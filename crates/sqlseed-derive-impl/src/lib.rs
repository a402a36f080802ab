// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

#![warn(missing_docs, rustdoc::broken_intra_doc_links, rust_2018_idioms)]
#![deny(unsafe_code)]

//! # sqlseed-derive-impl
//!
//! Implementation of the `Entity` and `Embeddable` derive macros. Use
//! `sqlseed` (or `sqlseed-derive`) instead of depending on this crate
//! directly.
//!
//! The derives emit the declarative `EntityModel` / `EmbeddableModel`
//! mirror of the annotations plus the runtime accessor implementations;
//! nothing else. Table and column resolution, inheritance and all SQL
//! generation happen at runtime inside `sqlseed`.
//!
//! # Attribute Quick Reference
//!
//! ```rust,ignore
//! #[derive(Entity)]
//! #[entity(name = "Person", table = "person")]   // both optional
//! #[generator(name = "person_seq", allocation_size = 50)]
//! #[unique(columns = "first_name, last_name")]
//! pub struct Person {
//!     #[id]
//!     #[generated(strategy = "sequence", generator = "person_seq")]
//!     pub id: Option<i64>,
//!
//!     #[column(nullable = false, length = 40)]
//!     pub first_name: String,
//!
//!     #[column(nullable = false, length = 40)]
//!     pub last_name: String,
//!
//!     #[version]
//!     pub version: i64,
//!
//!     #[embedded]
//!     #[attribute_override(name = "city", column = "home_city")]
//!     pub address: Option<Address>,
//!
//!     #[many_to_one]
//!     #[join_column(nullable = false)]
//!     pub country: Ref<Country>,
//!
//!     #[one_to_many(mapped_by = "person")]
//!     pub items: Vec<Ref<Item>>,
//! }
//!
//! #[derive(Clone, Embeddable)]
//! pub struct Address {
//!     pub street: Option<String>,
//!     pub city: Option<String>,
//! }
//! ```

mod embeddable;
mod entity;

use proc_macro::TokenStream;

/// Derive macro describing a persistent entity.
///
/// Emits the static entity model mirroring the annotations and the
/// runtime accessors the generator reads attributes through.
///
/// # Entity Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `#[entity(name = ..)]` | Entity name; defaults to the struct name |
/// | `#[entity(table = ..)]` | Table name; defaults to the entity name |
/// | `#[entity(inheritance = ..)]` | `single_table`, `joined` or `table_per_class` |
/// | `#[entity(extends = Parent)]` | Superclass; requires a `#[parent]` field |
/// | `#[entity(mapped_superclass)]` | No own table, attributes inherit |
/// | `#[entity(discriminator = ..)]` | Discriminator literal of this class |
/// | `#[entity(discriminator_column = .., discriminator_type = .., discriminator_length = ..)]` | Discriminator column on the root |
/// | `#[entity(primary_key_join_column = ..)]` | Id column of a joined subclass |
/// | `#[generator(name = .., ..)]` | Declares a sequence or table generator |
/// | `#[unique(columns = "a, b")]` | Multi-column unique constraint |
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `#[id]` | The identifier |
/// | `#[generated(strategy = .., generator = ..)]` | Generated identifier values |
/// | `#[embedded_id]` | Composite identifier in an embeddable |
/// | `#[column(name = .., nullable = .., unique, length = ..)]` | Column settings |
/// | `#[version]` | Optimistic lock column |
/// | `#[embedded]` | Embedded value object |
/// | `#[many_to_one]` / `#[one_to_one]` | Singular association on a `Ref<T>` field |
/// | `#[join_column(name = .., nullable = .., unique, references = ..)]` | FK column settings |
/// | `#[one_to_many(..)]` / `#[many_to_many(..)]` / `#[element_collection(..)]` | Collections |
/// | `#[map_key(column = ..)]` | Key column of a `BTreeMap` attribute |
/// | `#[attribute_override(..)]` / `#[association_override(..)]` | Overrides at an embedding site |
/// | `#[parent]` | The embedded superclass part |
/// | `#[transient]` | Not persistent |
#[proc_macro_derive(
    Entity,
    attributes(
        entity, generator, unique, id, generated, embedded_id, column, version, embedded,
        many_to_one, one_to_one, one_to_many, many_to_many, element_collection, map_key,
        join_column, attribute_override, association_override, parent, transient
    )
)]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive(input)
}

/// Derive macro describing an embeddable value object.
///
/// The embedding entity reads attributes through the generated
/// `EmbeddedValue` implementation; the type must also be `Clone`.
///
/// Supported members: basic columns (`#[column]`), singular
/// associations (`Ref<T>` with `#[join_column]`), nested `#[embedded]`
/// values and `#[transient]` fields.
#[proc_macro_derive(
    Embeddable,
    attributes(column, join_column, many_to_one, one_to_one, embedded, transient)
)]
pub fn derive_embeddable(input: TokenStream) -> TokenStream {
    embeddable::derive(input)
}
