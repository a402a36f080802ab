// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! darling helper structs for field and class level attributes.

use darling::FromMeta;

/// `#[column(name = .., nullable = .., unique, length = ..)]`
#[derive(Debug, Default, FromMeta)]
pub struct ColumnAttr {
    /// Column name; defaults to the field name.
    #[darling(default)]
    pub name:     Option<String>,
    /// Whether NULL is allowed; defaults to `true`.
    #[darling(default)]
    pub nullable: Option<bool>,
    /// Whether the column alone identifies a row.
    #[darling(default)]
    pub unique:   bool,
    /// Maximum string length; defaults to 255.
    #[darling(default)]
    pub length:   Option<u32>
}

/// `#[join_column(name = .., nullable = .., unique, references = ..)]`
#[derive(Debug, Default, FromMeta)]
pub struct JoinColumnAttr {
    /// Column name; defaults to `<field>_id`.
    #[darling(default)]
    pub name:       Option<String>,
    /// Whether NULL is allowed; defaults to `true`.
    #[darling(default)]
    pub nullable:   Option<bool>,
    /// Whether the column alone identifies a row.
    #[darling(default)]
    pub unique:     bool,
    /// Attribute inside the target's composite id this maps to.
    #[darling(default)]
    pub references: Option<String>
}

/// `#[generated(strategy = .., generator = ..)]`, also usable bare.
#[derive(Debug, Default, FromMeta)]
pub struct GeneratedAttr {
    /// `auto`, `sequence`, `table` or `identity`; defaults to `auto`.
    #[darling(default)]
    pub strategy:  Option<String>,
    /// Name of a declared `#[generator(..)]` to use.
    #[darling(default)]
    pub generator: Option<String>
}

/// `#[generator(name = .., strategy = .., ..)]` on the struct.
#[derive(Debug, FromMeta)]
pub struct GeneratorAttr {
    /// Generator name.
    pub name:            String,
    /// `sequence` or `table`; defaults to `sequence`.
    #[darling(default)]
    pub strategy:        Option<String>,
    /// Backing sequence name; defaults to the generator name.
    #[darling(default)]
    pub sequence:        Option<String>,
    /// Backing generator table name.
    #[darling(default)]
    pub table:           Option<String>,
    /// First value handed out; defaults to 1.
    #[darling(default)]
    pub initial_value:   Option<i64>,
    /// Values reserved per round trip; defaults to 1.
    #[darling(default)]
    pub allocation_size: Option<i64>
}

/// `#[unique(columns = "a, b")]` on the struct.
#[derive(Debug, FromMeta)]
pub struct UniqueAttr {
    /// Comma separated column names.
    pub columns: String
}

impl UniqueAttr {
    /// The declared column names, trimmed.
    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// `#[one_to_many(..)]`, `#[many_to_many(..)]` and
/// `#[element_collection(..)]` share this shape.
#[derive(Debug, Default, FromMeta)]
pub struct CollectionAttr {
    /// Owning reference on the element side; inverse collections emit
    /// foreign-side updates instead of join table rows.
    #[darling(default)]
    pub mapped_by:           Option<String>,
    /// Join table name; defaults to `<Entity>_<field>`.
    #[darling(default)]
    pub join_table:          Option<String>,
    /// FK column to the owner; defaults to `<entity>_id`.
    #[darling(default)]
    pub join_column:         Option<String>,
    /// FK column to the element; defaults to `<field>_id`.
    #[darling(default)]
    pub inverse_join_column: Option<String>,
    /// Value column for scalar elements; defaults to the field name.
    #[darling(default)]
    pub value_column:        Option<String>,
    /// Position column preserving declared order.
    #[darling(default)]
    pub order_column:        Option<String>
}

/// `#[one_to_one(mapped_by = ..)]`
#[derive(Debug, Default, FromMeta)]
pub struct OneToOneAttr {
    /// Owning reference on the other side; the inverse side is not
    /// persistent.
    #[darling(default)]
    pub mapped_by: Option<String>
}

/// `#[map_key(column = ..)]`
#[derive(Debug, Default, FromMeta)]
pub struct MapKeyAttr {
    /// Key column name; defaults to `<field>_key`.
    #[darling(default)]
    pub column: Option<String>
}

/// `#[attribute_override(name = .., column = .., ..)]` at an embedding
/// site.
#[derive(Debug, FromMeta)]
pub struct AttributeOverrideAttr {
    /// Overridden attribute of the embeddable.
    pub name:     String,
    /// Replacement column name.
    #[darling(default)]
    pub column:   Option<String>,
    /// Whether NULL is allowed; defaults to `true`.
    #[darling(default)]
    pub nullable: Option<bool>,
    /// Whether the column alone identifies a row.
    #[darling(default)]
    pub unique:   bool,
    /// Maximum string length; defaults to 255.
    #[darling(default)]
    pub length:   Option<u32>
}

/// `#[association_override(name = .., join_column = .., ..)]` at an
/// embedding site.
#[derive(Debug, FromMeta)]
pub struct AssociationOverrideAttr {
    /// Overridden association of the embeddable.
    pub name:        String,
    /// Replacement join column name.
    #[darling(default)]
    pub join_column: Option<String>,
    /// Whether NULL is allowed; defaults to `true`.
    #[darling(default)]
    pub nullable:    Option<bool>,
    /// Whether the column alone identifies a row.
    #[darling(default)]
    pub unique:      bool
}
