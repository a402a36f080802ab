// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Entity-level attribute parsing.
//!
//! `#[entity(..)]` is parsed with darling; the repeatable class-level
//! attributes (`#[generator]`, `#[unique]`, the override attributes)
//! are collected manually, like the field markers.

pub mod attrs;
pub mod field;

use darling::{Error, FromDeriveInput, FromMeta};
use syn::{Attribute, DeriveInput, Ident};

use self::{
    attrs::{AssociationOverrideAttr, AttributeOverrideAttr, GeneratorAttr, UniqueAttr},
    field::{FieldDef, FieldKind}
};

/// `#[entity(..)]` as seen by darling.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(entity), supports(struct_named))]
struct EntityAttrs {
    ident: Ident,

    /// Entity name; defaults to the struct name.
    #[darling(default)]
    name: Option<String>,

    /// Table name; defaults to the entity name.
    #[darling(default)]
    table: Option<String>,

    /// `single_table`, `joined` or `table_per_class`.
    #[darling(default)]
    inheritance: Option<String>,

    /// The superclass entity type.
    #[darling(default)]
    extends: Option<syn::Path>,

    /// Mapped superclass: contributes attributes, no own table.
    #[darling(default)]
    mapped_superclass: bool,

    /// Discriminator literal of this class.
    #[darling(default)]
    discriminator: Option<String>,

    /// Discriminator column name, declared on the hierarchy root.
    #[darling(default)]
    discriminator_column: Option<String>,

    /// `string`, `char` or `integer`.
    #[darling(default)]
    discriminator_type: Option<String>,

    /// Maximum length of string discriminators.
    #[darling(default)]
    discriminator_length: Option<u32>,

    /// Id column of a joined subclass table.
    #[darling(default)]
    primary_key_join_column: Option<String>
}

/// Complete parsed entity definition, input of the code generators.
#[derive(Debug)]
pub struct EntityDef {
    /// Struct identifier.
    pub ident: Ident,
    /// Entity name.
    pub name: String,
    /// Declared table name.
    pub table: Option<String>,
    /// Whether this is a mapped superclass.
    pub mapped_superclass: bool,
    /// Superclass entity type.
    pub extends: Option<syn::Path>,
    /// Validated inheritance strategy.
    pub inheritance: Option<String>,
    /// Discriminator literal.
    pub discriminator: Option<String>,
    /// Discriminator column name.
    pub discriminator_column: Option<String>,
    /// Validated discriminator type.
    pub discriminator_type: Option<String>,
    /// Discriminator length.
    pub discriminator_length: Option<u32>,
    /// Id column of a joined subclass table.
    pub primary_key_join_column: Option<String>,
    /// Declared generators.
    pub generators: Vec<GeneratorAttr>,
    /// Declared unique constraints.
    pub uniques: Vec<UniqueAttr>,
    /// Class-level attribute overrides for inherited attributes.
    pub attribute_overrides: Vec<AttributeOverrideAttr>,
    /// Class-level association overrides for inherited associations.
    pub association_overrides: Vec<AssociationOverrideAttr>,
    /// All parsed fields.
    pub fields: Vec<FieldDef>
}

impl EntityDef {
    /// Parse the full entity definition from syn's `DeriveInput`.
    pub fn from_derive_input(input: &DeriveInput) -> Result<Self, Error> {
        let attrs = EntityAttrs::from_derive_input(input)?;

        let mut errors = Vec::new();

        if let Some(strategy) = &attrs.inheritance
            && !matches!(strategy.as_str(), "single_table" | "joined" | "table_per_class")
        {
            errors.push(Error::custom(format!(
                "unknown inheritance strategy '{strategy}', expected single_table, joined or \
                 table_per_class"
            )));
        }
        if let Some(kind) = &attrs.discriminator_type
            && !matches!(kind.as_str(), "string" | "char" | "integer")
        {
            errors.push(Error::custom(format!(
                "unknown discriminator type '{kind}', expected string, char or integer"
            )));
        }

        let mut fields = Vec::new();
        if let syn::Data::Struct(data) = &input.data {
            for field in &data.fields {
                match FieldDef::from_field(field) {
                    Ok(field) => fields.push(field),
                    Err(error) => errors.push(error)
                }
            }
        }

        let generators = parse_repeated::<GeneratorAttr>(&input.attrs, "generator", &mut errors);
        let uniques = parse_repeated::<UniqueAttr>(&input.attrs, "unique", &mut errors);
        let attribute_overrides =
            parse_repeated::<AttributeOverrideAttr>(&input.attrs, "attribute_override", &mut errors);
        let association_overrides = parse_repeated::<AssociationOverrideAttr>(
            &input.attrs,
            "association_override",
            &mut errors
        );

        let def = Self {
            ident: attrs.ident,
            name: attrs.name.unwrap_or_else(|| input.ident.to_string()),
            table: attrs.table,
            mapped_superclass: attrs.mapped_superclass,
            extends: attrs.extends,
            inheritance: attrs.inheritance,
            discriminator: attrs.discriminator,
            discriminator_column: attrs.discriminator_column,
            discriminator_type: attrs.discriminator_type,
            discriminator_length: attrs.discriminator_length,
            primary_key_join_column: attrs.primary_key_join_column,
            generators,
            uniques,
            attribute_overrides,
            association_overrides,
            fields
        };

        def.validate(&mut errors);

        if errors.is_empty() {
            Ok(def)
        } else {
            Err(Error::multiple(errors))
        }
    }

    fn validate(&self, errors: &mut Vec<Error>) {
        let parent_fields =
            self.fields.iter().filter(|field| matches!(field.kind, FieldKind::Parent)).count();
        if self.extends.is_some() && parent_fields == 0 {
            errors.push(
                Error::custom("#[entity(extends = ..)] needs a #[parent] field of that type")
                    .with_span(&self.ident)
            );
        }
        if self.extends.is_none() && parent_fields > 0 {
            errors.push(
                Error::custom("a #[parent] field needs #[entity(extends = ..)]")
                    .with_span(&self.ident)
            );
        }
        if parent_fields > 1 {
            errors.push(Error::custom("at most one #[parent] field").with_span(&self.ident));
        }

        let id_fields = self
            .fields
            .iter()
            .filter(|field| matches!(field.kind, FieldKind::Id { .. } | FieldKind::EmbeddedId { .. }))
            .count();
        if id_fields > 1 {
            errors.push(Error::custom("at most one #[id] field").with_span(&self.ident));
        }
        if id_fields == 0 && self.extends.is_none() && !self.mapped_superclass {
            errors.push(Error::custom("no #[id] attribute found").with_span(&self.ident));
        }

        if self.mapped_superclass
            && (self.inheritance.is_some() || self.discriminator.is_some() || self.table.is_some())
        {
            errors.push(
                Error::custom(
                    "a mapped superclass has no table, inheritance strategy or discriminator"
                )
                .with_span(&self.ident)
            );
        }
    }

    /// The `#[parent]` field, if any.
    pub fn parent_field(&self) -> Option<&FieldDef> {
        self.fields.iter().find(|field| matches!(field.kind, FieldKind::Parent))
    }

    /// The field carrying a generated id, if any.
    pub fn generated_id_field(&self) -> Option<&FieldDef> {
        self.fields.iter().find(|field| {
            matches!(
                field.kind,
                FieldKind::Id {
                    generated: Some(_),
                    ..
                }
            )
        })
    }

    /// Persistent fields, skipping `#[parent]` and transients.
    pub fn persistent_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields
            .iter()
            .filter(|field| !matches!(field.kind, FieldKind::Parent | FieldKind::Transient))
    }
}

/// Collect every `#[<name>(..)]` attribute of the struct.
fn parse_repeated<T: FromMeta>(
    attributes: &[Attribute],
    name: &str,
    errors: &mut Vec<Error>
) -> Vec<T> {
    let mut parsed = Vec::new();
    for attribute in attributes {
        if attribute.path().is_ident(name) {
            match T::from_meta(&attribute.meta) {
                Ok(value) => parsed.push(value),
                Err(error) => errors.push(error)
            }
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;

    #[test]
    fn parses_a_basic_entity() {
        let input: DeriveInput = parse_quote! {
            #[entity(table = "person")]
            #[unique(columns = "first_name, last_name")]
            pub struct Person {
                #[id]
                #[generated]
                pub id: Option<i64>,

                #[column(nullable = false, length = 40)]
                pub first_name: String,

                pub last_name: Option<String>,
            }
        };
        let def = EntityDef::from_derive_input(&input).unwrap();
        assert_eq!(def.name, "Person");
        assert_eq!(def.table.as_deref(), Some("person"));
        assert_eq!(def.fields.len(), 3);
        assert!(matches!(
            def.fields[0].kind,
            FieldKind::Id {
                generated: Some(_),
                ..
            }
        ));
        assert!(def.fields[0].optional);
        assert!(!def.fields[1].optional);
        assert_eq!(def.uniques.len(), 1);
        assert_eq!(def.uniques[0].column_names(), vec!["first_name", "last_name"]);
    }

    #[test]
    fn entity_name_defaults_to_the_struct_name() {
        let input: DeriveInput = parse_quote! {
            pub struct Country {
                #[id]
                pub code: String,
            }
        };
        let def = EntityDef::from_derive_input(&input).unwrap();
        assert_eq!(def.name, "Country");
        assert!(def.table.is_none());
    }

    #[test]
    fn missing_id_is_rejected() {
        let input: DeriveInput = parse_quote! {
            pub struct Person {
                pub name: String,
            }
        };
        let error = EntityDef::from_derive_input(&input).unwrap_err();
        assert!(error.to_string().contains("no #[id] attribute"));
    }

    #[test]
    fn extends_needs_a_parent_field() {
        let input: DeriveInput = parse_quote! {
            #[entity(extends = Animal)]
            pub struct Dog {
                pub bark_volume: Option<i32>,
            }
        };
        let error = EntityDef::from_derive_input(&input).unwrap_err();
        assert!(error.to_string().contains("#[parent]"));
    }

    #[test]
    fn generated_id_must_be_i64() {
        let input: DeriveInput = parse_quote! {
            pub struct Person {
                #[id]
                #[generated]
                pub id: Option<String>,
            }
        };
        let error = EntityDef::from_derive_input(&input).unwrap_err();
        assert!(error.to_string().contains("i64"));
    }

    #[test]
    fn unknown_inheritance_strategy_is_rejected() {
        let input: DeriveInput = parse_quote! {
            #[entity(inheritance = "concrete")]
            pub struct Animal {
                #[id]
                pub id: i64,
            }
        };
        let error = EntityDef::from_derive_input(&input).unwrap_err();
        assert!(error.to_string().contains("inheritance strategy"));
    }

    #[test]
    fn byte_vectors_stay_basic_columns() {
        let input: DeriveInput = parse_quote! {
            pub struct Document {
                #[id]
                pub id: i64,
                pub payload: Vec<u8>,
                pub lines: Vec<String>,
            }
        };
        let def = EntityDef::from_derive_input(&input).unwrap();
        assert!(matches!(def.fields[1].kind, FieldKind::Basic { .. }));
        assert!(matches!(def.fields[2].kind, FieldKind::Collection { .. }));
    }

    #[test]
    fn inverse_one_to_one_is_not_persistent() {
        let input: DeriveInput = parse_quote! {
            pub struct Person {
                #[id]
                pub id: i64,
                #[one_to_one(mapped_by = "person")]
                pub passport: Option<Ref<Passport>>,
            }
        };
        let def = EntityDef::from_derive_input(&input).unwrap();
        assert!(matches!(def.fields[1].kind, FieldKind::Transient));
        assert_eq!(def.persistent_fields().count(), 1);
    }
}
