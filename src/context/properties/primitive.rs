// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Scalar, version and generated-id properties.

use crate::{
    context::{GeneratorContext, registry::GeneratorColumn},
    entity::EntityHandle,
    error::{GeneratorError, Result},
    statements::{InsertStatement, StatementsWriter},
    value::Value
};

use super::Receiver;

/// A plain scalar column.
#[derive(Debug)]
pub struct PrimitiveProperty {
    /// Attribute name.
    pub name:     String,
    /// Resolved column.
    pub column:   GeneratorColumn,
    /// Whether NULL is forbidden.
    pub required: bool,
    /// Whether the column alone identifies a row.
    pub unique:   bool
}

impl PrimitiveProperty {
    /// Whether NULL is forbidden.
    pub fn is_required(&self) -> bool {
        self.required
    }

    pub(crate) fn add_insert_expression(
        &self,
        ctx: &GeneratorContext,
        receiver: &Receiver,
        statement: &mut InsertStatement
    ) -> Result<()> {
        let value = receiver.attribute(&self.name);
        if value.is_null() {
            if self.required {
                return Err(GeneratorError::model(format!(
                    "required attribute '{}' is null",
                    self.name
                )));
            }
            return Ok(());
        }
        statement.set(self.column, ctx.dialect().format_value(&value)?);
        Ok(())
    }

    pub(crate) fn expression(
        &self,
        ctx: &GeneratorContext,
        receiver: &Receiver
    ) -> Result<Option<String>> {
        let value = receiver.attribute(&self.name);
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(ctx.dialect().format_value(&value)?))
    }

    pub(crate) fn predicate(
        &self,
        ctx: &GeneratorContext,
        receiver: &Receiver
    ) -> Result<Option<String>> {
        let Some(expression) = self.expression(ctx, receiver)? else {
            return Ok(None);
        };
        Ok(Some(format!("{} = {expression}", ctx.column_name(self.column))))
    }
}

/// An optimistic lock column.
///
/// Inserted like a primitive, defaulting to zero; deferred updates bump
/// it by one.
#[derive(Debug)]
pub struct VersionProperty {
    /// Attribute name.
    pub name:   String,
    /// Resolved column.
    pub column: GeneratorColumn
}

impl VersionProperty {
    pub(crate) fn add_insert_expression(
        &self,
        ctx: &GeneratorContext,
        receiver: &Receiver,
        statement: &mut InsertStatement
    ) -> Result<()> {
        let value = match receiver.attribute(&self.name) {
            Value::Null => Value::Int(0),
            value => value
        };
        statement.set(self.column, ctx.dialect().format_value(&value)?);
        Ok(())
    }

    pub(crate) fn expression(
        &self,
        ctx: &GeneratorContext,
        receiver: &Receiver
    ) -> Result<Option<String>> {
        let value = match receiver.attribute(&self.name) {
            Value::Null => Value::Int(0),
            value => value
        };
        Ok(Some(ctx.dialect().format_value(&value)?))
    }

    pub(crate) fn predicate(
        &self,
        ctx: &GeneratorContext,
        receiver: &Receiver
    ) -> Result<Option<String>> {
        let Some(expression) = self.expression(ctx, receiver)? else {
            return Ok(None);
        };
        Ok(Some(format!("{} = {expression}", ctx.column_name(self.column))))
    }
}

/// A generated singular identifier.
///
/// The numeric value comes from the named [`crate::context::generators::IdGenerator`];
/// the entity receives it right after its row was inserted.
#[derive(Debug)]
pub struct GeneratedIdProperty {
    /// Attribute name.
    pub name:      String,
    /// Resolved id column.
    pub column:    GeneratorColumn,
    /// Name of the generator registered in the context.
    pub generator: String,
    /// Whether the backing field is a plain integer, making a first
    /// value of zero ambiguous.
    pub primitive: bool
}

impl GeneratedIdProperty {
    /// Current raw id of the entity, unfiltered.
    pub fn raw_id(&self, entity: &EntityHandle) -> Option<i64> {
        entity.borrow().generated_id()
    }

    pub(crate) fn create_pre_insert_statements(
        &self,
        ctx: &GeneratorContext,
        writer: &mut dyn StatementsWriter
    ) -> Result<()> {
        let generator = ctx.generator(&self.generator)?;
        let statements = generator.borrow_mut().pre_insert_statements();
        for statement in statements {
            writer.write_statement(&statement)?;
        }
        Ok(())
    }

    pub(crate) fn add_insert_expression(
        &self,
        ctx: &GeneratorContext,
        receiver: &Receiver,
        statement: &mut InsertStatement
    ) -> Result<()> {
        let Receiver::Entity(_) = receiver else {
            return Err(GeneratorError::model(format!(
                "generated id '{}' outside an entity",
                self.name
            )));
        };
        let generator = ctx.generator(&self.generator)?;
        let mut generator = generator.borrow_mut();
        let value = generator.next_value();
        if let Some(expression) = generator.insert_expression(ctx.dialect(), value) {
            statement.set(self.column, expression);
        }
        Ok(())
    }

    /// Assign the value just produced to the entity.
    pub(crate) fn post_insert(&self, ctx: &GeneratorContext, entity: &EntityHandle) -> Result<()> {
        let generator = ctx.generator(&self.generator)?;
        let value = generator.borrow().current_value().ok_or_else(|| {
            GeneratorError::model(format!("no value was generated for '{}'", self.name))
        })?;
        entity.borrow_mut().set_generated_id(value);
        Ok(())
    }

    /// Whether a reference to the entity's id is currently the
    /// sequence's `currval`.
    pub(crate) fn is_current_sequence_value(
        &self,
        ctx: &GeneratorContext,
        entity: &EntityHandle
    ) -> Result<bool> {
        let Some(id) = self.raw_id(entity) else {
            return Ok(false);
        };
        let generator = ctx.generator(&self.generator)?;
        let current = generator.borrow().is_current_sequence_value(id);
        Ok(current)
    }

    pub(crate) fn expression(
        &self,
        ctx: &GeneratorContext,
        receiver: &Receiver,
        for_where: bool
    ) -> Result<Option<String>> {
        let _ = for_where;
        let Receiver::Entity(entity) = receiver else {
            return Ok(None);
        };
        let Some(id) = self.raw_id(entity) else {
            return Ok(None);
        };
        let generator = ctx.generator(&self.generator)?;
        let expression = generator.borrow().reference_expression(
            ctx.dialect(),
            id,
            ctx.settings().write_relative_ids
        );
        Ok(Some(expression))
    }

    pub(crate) fn predicate(
        &self,
        ctx: &GeneratorContext,
        receiver: &Receiver
    ) -> Result<Option<String>> {
        let Some(expression) = self.expression(ctx, receiver, true)? else {
            return Ok(None);
        };
        Ok(Some(format!("{} = {expression}", ctx.column_name(self.column))))
    }
}
