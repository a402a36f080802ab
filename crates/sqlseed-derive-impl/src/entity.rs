// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! The `Entity` derive: parse, validate, emit.

pub mod accessors;
pub mod model_gen;
pub mod parse;

use darling::Error;
use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

use self::parse::EntityDef;

/// Entry point of `#[derive(Entity)]`.
pub fn derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match EntityDef::from_derive_input(&input) {
        Ok(def) => match generate(&def) {
            Ok(tokens) => tokens.into(),
            Err(error) => error.write_errors().into()
        },
        Err(error) => error.write_errors().into()
    }
}

/// Generate the `SqlEntity` implementation.
fn generate(def: &EntityDef) -> Result<proc_macro2::TokenStream, Error> {
    let ident = &def.ident;
    let model = model_gen::entity_model(def)?;
    let attribute = accessors::attribute_method(def);
    let generated_id = accessors::generated_id_methods(def);

    Ok(quote! {
        #[automatically_derived]
        impl ::sqlseed::SqlEntity for #ident {
            fn entity_model() -> &'static ::sqlseed::model::EntityModel {
                static MODEL: ::sqlseed::model::EntityModel = #model;
                &MODEL
            }

            fn model(&self) -> &'static ::sqlseed::model::EntityModel {
                <Self as ::sqlseed::SqlEntity>::entity_model()
            }

            #attribute
            #generated_id
        }
    })
}
