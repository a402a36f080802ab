// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

#![warn(missing_docs)]

//! # sqlseed-derive
//!
//! The `Entity` and `Embeddable` derive macros of sqlseed. Most users
//! depend on `sqlseed` directly, which re-exports both.
//!
//! ```rust,ignore
//! use sqlseed_derive::Entity;
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
//! ```

pub use sqlseed_derive_impl::{Embeddable, Entity};
