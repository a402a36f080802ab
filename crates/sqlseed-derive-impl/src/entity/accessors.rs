// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Emission of the runtime accessor methods.
//!
//! `attribute` maps declared names to [`sqlseed::Value`] constructions;
//! unknown names fall through to the `#[parent]` field when the entity
//! extends another one. The generated-id accessors exist only where a
//! generated id can be reached.

use proc_macro2::TokenStream;
use quote::quote;

use super::parse::{
    EntityDef,
    field::{ElementType, FieldDef, FieldKind}
};

/// The match arm expression reading one field as a `Value`.
pub(crate) fn value_expression(field: &FieldDef) -> TokenStream {
    let ident = &field.ident;
    match &field.kind {
        FieldKind::Basic { .. } | FieldKind::Version { .. } | FieldKind::Id { .. } => {
            if field.optional {
                quote!(::sqlseed::Value::opt(self.#ident.clone()))
            } else {
                quote!(::sqlseed::Value::from(self.#ident.clone()))
            }
        }
        FieldKind::Embedded { .. } | FieldKind::EmbeddedId { .. } => {
            if field.optional {
                quote!(match &self.#ident {
                    ::core::option::Option::Some(value) => {
                        ::sqlseed::Value::embedded(value.clone())
                    }
                    ::core::option::Option::None => ::sqlseed::Value::Null
                })
            } else {
                quote!(::sqlseed::Value::embedded(self.#ident.clone()))
            }
        }
        FieldKind::Reference { .. } => {
            if field.optional {
                quote!(match &self.#ident {
                    ::core::option::Option::Some(value) => ::sqlseed::Value::reference(value),
                    ::core::option::Option::None => ::sqlseed::Value::Null
                })
            } else {
                quote!(::sqlseed::Value::reference(&self.#ident))
            }
        }
        FieldKind::Collection { element, .. } => match element {
            ElementType::Entity(_) => quote!(::sqlseed::Value::list_of(&self.#ident)),
            ElementType::Scalar(_) => quote!(::sqlseed::Value::list(&self.#ident))
        },
        FieldKind::Map { value, .. } => match value {
            ElementType::Entity(_) => quote!(::sqlseed::Value::map_of(&self.#ident)),
            ElementType::Scalar(_) => quote!(::sqlseed::Value::Map(
                self.#ident
                    .iter()
                    .map(|(key, value)| (
                        ::sqlseed::Value::from(key.clone()),
                        ::sqlseed::Value::from(value.clone())
                    ))
                    .collect()
            ))
        },
        FieldKind::Parent | FieldKind::Transient => quote!(::sqlseed::Value::Null)
    }
}

/// The `attribute` method body.
pub(crate) fn attribute_method(def: &EntityDef) -> TokenStream {
    let arms = def.persistent_fields().map(|field| {
        let name = field.name();
        let expression = value_expression(field);
        quote!(#name => #expression,)
    });
    let fallback = match def.parent_field() {
        Some(parent) => {
            let ident = &parent.ident;
            quote!(::sqlseed::SqlEntity::attribute(&self.#ident, name))
        }
        None => quote!(::sqlseed::Value::Null)
    };
    quote! {
        fn attribute(&self, name: &str) -> ::sqlseed::Value {
            match name {
                #(#arms)*
                _ => #fallback
            }
        }
    }
}

/// The generated-id accessors, when the entity or an ancestor can
/// carry one.
pub(crate) fn generated_id_methods(def: &EntityDef) -> TokenStream {
    if let Some(field) = def.generated_id_field() {
        let ident = &field.ident;
        if field.optional {
            quote! {
                fn generated_id(&self) -> ::core::option::Option<i64> {
                    self.#ident
                }

                fn set_generated_id(&mut self, value: i64) {
                    self.#ident = ::core::option::Option::Some(value);
                }
            }
        } else {
            quote! {
                fn generated_id(&self) -> ::core::option::Option<i64> {
                    ::core::option::Option::Some(self.#ident)
                }

                fn set_generated_id(&mut self, value: i64) {
                    self.#ident = value;
                }
            }
        }
    } else if let Some(parent) = def.parent_field() {
        let ident = &parent.ident;
        quote! {
            fn generated_id(&self) -> ::core::option::Option<i64> {
                ::sqlseed::SqlEntity::generated_id(&self.#ident)
            }

            fn set_generated_id(&mut self, value: i64) {
                ::sqlseed::SqlEntity::set_generated_id(&mut self.#ident, value);
            }
        }
    } else {
        TokenStream::new()
    }
}
