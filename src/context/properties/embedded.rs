// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Embedded value objects.
//!
//! An embedded property owns the properties of its embeddable type,
//! rebuilt at the embedding site so that column overrides apply. All
//! operations delegate to the sub-properties with the embedded value as
//! receiver while statements keep targeting the owning entity's row.

use std::{collections::BTreeMap, rc::Rc};

use crate::{
    context::GeneratorContext,
    entity::EntityHandle,
    error::{GeneratorError, Result},
    statements::{InsertStatement, StatementsWriter},
    value::Value
};

use super::{Property, Receiver};

/// An embedded value object, possibly the composite identifier.
#[derive(Debug)]
pub struct EmbeddedProperty {
    /// Attribute name.
    pub name:       String,
    /// Whether this embeddable is the entity's identifier.
    pub id:         bool,
    /// Sub-properties by attribute name; iteration is name-sorted.
    pub properties: BTreeMap<String, Rc<Property>>
}

impl EmbeddedProperty {
    /// An embedded id is always required; otherwise any required
    /// sub-property makes the whole value required.
    pub fn is_required(&self) -> bool {
        self.id || self.properties.values().any(|property| property.is_required())
    }

    /// Sub-property by attribute name.
    pub fn property(&self, name: &str) -> Option<Rc<Property>> {
        self.properties.get(name).cloned()
    }

    /// The only sub-property, if there is exactly one.
    pub fn single_property(&self) -> Option<Rc<Property>> {
        if self.properties.len() == 1 {
            self.properties.values().next().cloned()
        } else {
            None
        }
    }

    fn embedded_receiver(&self, receiver: &Receiver) -> Result<Option<Receiver>> {
        match receiver.attribute(&self.name) {
            Value::Null => Ok(None),
            Value::Embedded(handle) => Ok(Some(Receiver::Embedded(handle))),
            other => Err(GeneratorError::model(format!(
                "embedded attribute '{}' holds a {} value",
                self.name,
                other.type_name()
            )))
        }
    }

    pub(crate) fn add_insert_expression(
        &self,
        ctx: &GeneratorContext,
        owner: &EntityHandle,
        receiver: &Receiver,
        statement: &mut InsertStatement
    ) -> Result<()> {
        match self.embedded_receiver(receiver)? {
            Some(embedded) => {
                for property in self.properties.values() {
                    property.add_insert_expression(ctx, owner, &embedded, statement)?;
                }
                Ok(())
            }
            None if self.is_required() => Err(GeneratorError::model(format!(
                "required embedded attribute '{}' is null",
                self.name
            ))),
            None => Ok(())
        }
    }

    pub(crate) fn create_pre_insert_statements(
        &self,
        ctx: &GeneratorContext,
        owner: &EntityHandle,
        receiver: &Receiver,
        writer: &mut dyn StatementsWriter
    ) -> Result<()> {
        if let Some(embedded) = self.embedded_receiver(receiver)? {
            for property in self.properties.values() {
                property.create_pre_insert_statements(ctx, owner, &embedded, writer)?;
            }
        }
        Ok(())
    }

    pub(crate) fn create_post_insert_statements(
        &self,
        ctx: &GeneratorContext,
        owner: &EntityHandle,
        receiver: &Receiver,
        writer: &mut dyn StatementsWriter
    ) -> Result<()> {
        if let Some(embedded) = self.embedded_receiver(receiver)? {
            for property in self.properties.values() {
                property.create_post_insert_statements(ctx, owner, &embedded, writer)?;
            }
        }
        Ok(())
    }

    pub(crate) fn find_referenced_entities(&self, receiver: &Receiver) -> Vec<EntityHandle> {
        let Ok(Some(embedded)) = self.embedded_receiver(receiver) else {
            return Vec::new();
        };
        let mut entities = Vec::new();
        for property in self.properties.values() {
            entities.extend(property.find_referenced_entities(&embedded));
        }
        entities
    }

    pub(crate) fn find_required_references(&self, receiver: &Receiver) -> Vec<EntityHandle> {
        let Ok(Some(embedded)) = self.embedded_receiver(receiver) else {
            return Vec::new();
        };
        let mut entities = Vec::new();
        for property in self.properties.values() {
            entities.extend(property.find_required_references(&embedded));
        }
        entities
    }

    pub(crate) fn predicate(
        &self,
        ctx: &GeneratorContext,
        receiver: &Receiver
    ) -> Result<Option<String>> {
        let Some(embedded) = self.embedded_receiver(receiver)? else {
            return Ok(None);
        };
        let mut parts = Vec::with_capacity(self.properties.len());
        for property in self.properties.values() {
            let Some(part) = property.predicate(ctx, &embedded)? else {
                return Ok(None);
            };
            parts.push(part);
        }
        if parts.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!("({})", parts.join(" AND "))))
    }
}
