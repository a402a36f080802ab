// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! The `Embeddable` derive.
//!
//! Embeddables are value objects flattened into the owning entity's
//! row. They support basic columns, singular associations and nested
//! embeddables; identifiers, versions and collections stay on entities.

use darling::Error;
use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, Ident, parse_macro_input};

use crate::entity::{
    accessors::value_expression,
    model_gen::attribute_model,
    parse::field::{FieldDef, FieldKind}
};

struct EmbeddableDef {
    ident:  Ident,
    fields: Vec<FieldDef>
}

impl EmbeddableDef {
    fn from_derive_input(input: &DeriveInput) -> Result<Self, Error> {
        let syn::Data::Struct(data) = &input.data else {
            return Err(
                Error::custom("Embeddable can only be derived for structs").with_span(&input.ident)
            );
        };
        let syn::Fields::Named(named) = &data.fields else {
            return Err(Error::custom("Embeddable requires named fields").with_span(&input.ident));
        };

        let mut errors = Vec::new();
        let mut fields = Vec::new();
        for field in &named.named {
            match FieldDef::from_field(field) {
                Ok(field) => {
                    match &field.kind {
                        FieldKind::Basic { .. }
                        | FieldKind::Reference { .. }
                        | FieldKind::Embedded { .. }
                        | FieldKind::Transient => fields.push(field),
                        _ => errors.push(
                            Error::custom(
                                "an embeddable supports basic columns, references and nested \
                                 embeddables only"
                            )
                            .with_span(&field.ident)
                        )
                    };
                }
                Err(error) => errors.push(error)
            }
        }

        if errors.is_empty() {
            Ok(Self {
                ident: input.ident.clone(),
                fields
            })
        } else {
            Err(Error::multiple(errors))
        }
    }

    fn persistent_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|field| !matches!(field.kind, FieldKind::Transient))
    }
}

/// Entry point of `#[derive(Embeddable)]`.
pub fn derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match EmbeddableDef::from_derive_input(&input) {
        Ok(def) => match generate(&def) {
            Ok(tokens) => tokens.into(),
            Err(error) => error.write_errors().into()
        },
        Err(error) => error.write_errors().into()
    }
}

fn generate(def: &EmbeddableDef) -> Result<proc_macro2::TokenStream, Error> {
    let ident = &def.ident;
    let name = ident.to_string();

    let attributes = def
        .persistent_fields()
        .map(attribute_model)
        .collect::<Result<Vec<_>, _>>()?;

    let arms = def.persistent_fields().map(|field| {
        let name = field.name();
        let expression = value_expression(field);
        quote!(#name => #expression,)
    });

    Ok(quote! {
        #[automatically_derived]
        impl ::sqlseed::EmbeddedValue for #ident {
            fn embeddable_model() -> &'static ::sqlseed::model::EmbeddableModel {
                static MODEL: ::sqlseed::model::EmbeddableModel =
                    ::sqlseed::model::EmbeddableModel {
                        name: #name,
                        attributes: &[#(#attributes),*]
                    };
                &MODEL
            }

            fn model(&self) -> &'static ::sqlseed::model::EmbeddableModel {
                <Self as ::sqlseed::EmbeddedValue>::embeddable_model()
            }

            fn attribute(&self, name: &str) -> ::sqlseed::Value {
                match name {
                    #(#arms)*
                    _ => ::sqlseed::Value::Null
                }
            }
        }
    })
}
