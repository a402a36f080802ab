// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Emission of the `&'static EntityModel` mirror.
//!
//! Everything ends up inside a `static` in the generated
//! `entity_model` method, so every builder here must produce
//! `const`-evaluable expressions only.

use darling::Error;
use proc_macro2::TokenStream;
use quote::quote;
use syn::Type;

use super::parse::{
    EntityDef,
    attrs::{
        AssociationOverrideAttr, AttributeOverrideAttr, ColumnAttr, GeneratorAttr, JoinColumnAttr
    },
    field::{ElementType, FieldDef, FieldKind}
};

pub(crate) fn opt_str(value: Option<&str>) -> TokenStream {
    match value {
        Some(value) => quote!(::core::option::Option::Some(#value)),
        None => quote!(::core::option::Option::None)
    }
}

fn column_model(column: &ColumnAttr) -> TokenStream {
    let name = opt_str(column.name.as_deref());
    let nullable = column.nullable.unwrap_or(true);
    let unique = column.unique;
    let length = column.length.unwrap_or(255);
    quote!(::sqlseed::model::ColumnModel {
        name: #name,
        nullable: #nullable,
        unique: #unique,
        length: #length
    })
}

fn opt_column_model(column: Option<&ColumnAttr>) -> TokenStream {
    match column {
        Some(column) => {
            let model = column_model(column);
            quote!(::core::option::Option::Some(#model))
        }
        None => quote!(::core::option::Option::None)
    }
}

fn join_column_model(join_column: &JoinColumnAttr) -> TokenStream {
    let name = opt_str(join_column.name.as_deref());
    let nullable = join_column.nullable.unwrap_or(true);
    let unique = join_column.unique;
    quote!(::sqlseed::model::JoinColumnModel {
        name: #name,
        nullable: #nullable,
        unique: #unique
    })
}

fn opt_join_column_model(join_column: Option<&JoinColumnAttr>) -> TokenStream {
    match join_column {
        Some(join_column) => {
            let model = join_column_model(join_column);
            quote!(::core::option::Option::Some(#model))
        }
        None => quote!(::core::option::Option::None)
    }
}

fn strategy_tokens(strategy: Option<&str>, default: &str) -> Result<TokenStream, Error> {
    let variant = match strategy.unwrap_or(default) {
        "auto" => quote!(Auto),
        "sequence" => quote!(Sequence),
        "table" => quote!(Table),
        "identity" => quote!(Identity),
        other => {
            return Err(Error::custom(format!(
                "unknown generation strategy '{other}', expected auto, sequence, table or identity"
            )));
        }
    };
    Ok(quote!(::sqlseed::model::GenerationStrategy::#variant))
}

fn attribute_override_model(entry: &AttributeOverrideAttr) -> TokenStream {
    let name = &entry.name;
    let column = column_model(&ColumnAttr {
        name:     entry.column.clone(),
        nullable: entry.nullable,
        unique:   entry.unique,
        length:   entry.length
    });
    quote!(::sqlseed::model::AttributeOverrideModel {
        name: #name,
        column: #column
    })
}

fn association_override_model(entry: &AssociationOverrideAttr) -> TokenStream {
    let name = &entry.name;
    let join_column = join_column_model(&JoinColumnAttr {
        name:       entry.join_column.clone(),
        nullable:   entry.nullable,
        unique:     entry.unique,
        references: None
    });
    quote!(::sqlseed::model::AssociationOverrideModel {
        name: #name,
        join_column: #join_column
    })
}

fn embedded_model(
    target: &Type,
    attribute_overrides: &[AttributeOverrideAttr],
    association_overrides: &[AssociationOverrideAttr]
) -> TokenStream {
    let attribute_overrides = attribute_overrides.iter().map(attribute_override_model);
    let association_overrides = association_overrides.iter().map(association_override_model);
    quote!(::sqlseed::model::EmbeddedModel {
        embeddable: <#target as ::sqlseed::EmbeddedValue>::embeddable_model,
        attribute_overrides: &[#(#attribute_overrides),*],
        association_overrides: &[#(#association_overrides),*]
    })
}

/// One `AttributeModel` entry for a persistent field.
pub(crate) fn attribute_model(field: &FieldDef) -> Result<TokenStream, Error> {
    let name = field.name();
    let required = !field.optional;

    let kind = match &field.kind {
        FieldKind::Basic { column } => {
            let column = opt_column_model(column.as_ref());
            quote!(::sqlseed::model::AttributeKind::Basic(#column))
        }
        FieldKind::Version { column } => {
            let column = opt_column_model(column.as_ref());
            quote!(::sqlseed::model::AttributeKind::Version(#column))
        }
        FieldKind::Id { generated, column } => {
            let column = opt_column_model(column.as_ref());
            let generated = match generated {
                Some(generated) => {
                    let strategy = strategy_tokens(generated.strategy.as_deref(), "auto")?;
                    let generator = opt_str(generated.generator.as_deref());
                    quote!(::core::option::Option::Some(::sqlseed::model::GeneratedModel {
                        strategy: #strategy,
                        generator: #generator
                    }))
                }
                None => quote!(::core::option::Option::None)
            };
            let primitive = !field.optional;
            quote!(::sqlseed::model::AttributeKind::Id(::sqlseed::model::IdModel {
                column: #column,
                generated: #generated,
                primitive: #primitive
            }))
        }
        FieldKind::EmbeddedId { target } => {
            let model = embedded_model(target, &[], &[]);
            quote!(::sqlseed::model::AttributeKind::EmbeddedId(#model))
        }
        FieldKind::Embedded {
            target,
            attribute_overrides,
            association_overrides
        } => {
            let model = embedded_model(target, attribute_overrides, association_overrides);
            quote!(::sqlseed::model::AttributeKind::Embedded(#model))
        }
        FieldKind::Reference {
            target,
            join_column,
            one_to_one
        } => {
            let join = opt_join_column_model(join_column.as_ref());
            let id_field =
                opt_str(join_column.as_ref().and_then(|join| join.references.as_deref()));
            quote!(::sqlseed::model::AttributeKind::Reference(::sqlseed::model::ReferenceModel {
                target: <#target as ::sqlseed::SqlEntity>::entity_model,
                join_column: #join,
                one_to_one: #one_to_one,
                id_field: #id_field
            }))
        }
        FieldKind::Collection { element, attr } => {
            let target = match element {
                ElementType::Entity(target) => {
                    quote!(::core::option::Option::Some(
                        <#target as ::sqlseed::SqlEntity>::entity_model
                            as fn() -> &'static ::sqlseed::model::EntityModel
                    ))
                }
                ElementType::Scalar(_) => quote!(::core::option::Option::None)
            };
            let mapped_by = opt_str(attr.mapped_by.as_deref());
            let join_table = opt_str(attr.join_table.as_deref());
            let join_column = opt_str(attr.join_column.as_deref());
            let inverse = opt_str(attr.inverse_join_column.as_deref());
            let value_column = opt_str(attr.value_column.as_deref());
            let order_column = opt_str(attr.order_column.as_deref());
            quote!(::sqlseed::model::AttributeKind::Collection(
                ::sqlseed::model::CollectionModel {
                    target: #target,
                    mapped_by: #mapped_by,
                    join_table: #join_table,
                    join_column: #join_column,
                    inverse_join_column: #inverse,
                    value_column: #value_column,
                    order_column: #order_column
                }
            ))
        }
        FieldKind::Map {
            value,
            attr,
            key_column,
            ..
        } => {
            let target = match value {
                ElementType::Entity(target) => {
                    quote!(::core::option::Option::Some(
                        <#target as ::sqlseed::SqlEntity>::entity_model
                            as fn() -> &'static ::sqlseed::model::EntityModel
                    ))
                }
                ElementType::Scalar(_) => quote!(::core::option::Option::None)
            };
            let join_table = opt_str(attr.join_table.as_deref());
            let join_column = opt_str(attr.join_column.as_deref());
            let key_column = opt_str(key_column.as_deref());
            let inverse = opt_str(attr.inverse_join_column.as_deref());
            let value_column = opt_str(attr.value_column.as_deref());
            quote!(::sqlseed::model::AttributeKind::Map(::sqlseed::model::MapModel {
                target: #target,
                join_table: #join_table,
                join_column: #join_column,
                key_column: #key_column,
                inverse_join_column: #inverse,
                value_column: #value_column
            }))
        }
        FieldKind::Parent | FieldKind::Transient => {
            return Err(Error::custom("non-persistent field has no attribute model"));
        }
    };

    Ok(quote!(::sqlseed::model::AttributeModel {
        name: #name,
        required: #required,
        kind: #kind
    }))
}

fn generator_model(generator: &GeneratorAttr) -> Result<TokenStream, Error> {
    let name = &generator.name;
    let strategy = strategy_tokens(generator.strategy.as_deref(), "sequence")?;
    let sequence = opt_str(generator.sequence.as_deref());
    let table = opt_str(generator.table.as_deref());
    let initial_value = generator.initial_value.unwrap_or(1);
    let allocation_size = generator.allocation_size.unwrap_or(1);
    Ok(quote!(::sqlseed::model::GeneratorModel {
        name: #name,
        strategy: #strategy,
        sequence: #sequence,
        table: #table,
        initial_value: #initial_value,
        allocation_size: #allocation_size
    }))
}

/// The full `EntityModel` initializer.
pub(crate) fn entity_model(def: &EntityDef) -> Result<TokenStream, Error> {
    let name = &def.name;
    let table = opt_str(def.table.as_deref());
    let kind = if def.mapped_superclass {
        quote!(::sqlseed::model::EntityKind::MappedSuperclass)
    } else {
        quote!(::sqlseed::model::EntityKind::Entity)
    };
    let parent = match &def.extends {
        Some(path) => quote!(::core::option::Option::Some(
            <#path as ::sqlseed::SqlEntity>::entity_model
        )),
        None => quote!(::core::option::Option::None)
    };
    let inheritance = match def.inheritance.as_deref() {
        Some("single_table") => {
            quote!(::core::option::Option::Some(::sqlseed::model::InheritanceKind::SingleTable))
        }
        Some("joined") => {
            quote!(::core::option::Option::Some(::sqlseed::model::InheritanceKind::Joined))
        }
        Some("table_per_class") => {
            quote!(::core::option::Option::Some(::sqlseed::model::InheritanceKind::TablePerClass))
        }
        _ => quote!(::core::option::Option::None)
    };
    let discriminator_value = opt_str(def.discriminator.as_deref());
    let discriminator_column = if def.discriminator_column.is_some()
        || def.discriminator_type.is_some()
        || def.discriminator_length.is_some()
    {
        let column_name = def.discriminator_column.as_deref().unwrap_or("dtype");
        let kind = match def.discriminator_type.as_deref().unwrap_or("string") {
            "char" => quote!(::sqlseed::model::DiscriminatorKind::Char),
            "integer" => quote!(::sqlseed::model::DiscriminatorKind::Integer),
            _ => quote!(::sqlseed::model::DiscriminatorKind::String)
        };
        let length = def.discriminator_length.unwrap_or(31);
        quote!(::core::option::Option::Some(::sqlseed::model::DiscriminatorColumnModel {
            name: #column_name,
            kind: #kind,
            length: #length
        }))
    } else {
        quote!(::core::option::Option::None)
    };
    let primary_key_join_column = opt_str(def.primary_key_join_column.as_deref());

    let generators = def
        .generators
        .iter()
        .map(generator_model)
        .collect::<Result<Vec<_>, _>>()?;
    let unique_constraints = def.uniques.iter().map(|unique| {
        let columns = unique.column_names();
        quote!(::sqlseed::model::UniqueConstraintModel { columns: &[#(#columns),*] })
    });
    let attribute_overrides = def.attribute_overrides.iter().map(attribute_override_model);
    let association_overrides = def.association_overrides.iter().map(association_override_model);

    let attributes = def
        .persistent_fields()
        .map(attribute_model)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(quote!(::sqlseed::model::EntityModel {
        name: #name,
        table: #table,
        kind: #kind,
        parent: #parent,
        inheritance: #inheritance,
        discriminator_value: #discriminator_value,
        discriminator_column: #discriminator_column,
        primary_key_join_column: #primary_key_join_column,
        generators: &[#(#generators),*],
        unique_constraints: &[#(#unique_constraints),*],
        attribute_overrides: &[#(#attribute_overrides),*],
        association_overrides: &[#(#association_overrides),*],
        attributes: &[#(#attributes),*]
    }))
}
