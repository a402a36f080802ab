// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Singular associations to other entities.

use crate::{
    context::{GeneratorContext, registry::GeneratorColumn},
    entity::EntityHandle,
    error::{GeneratorError, Result},
    statements::{InsertStatement, StatementsWriter, UpdateStatement},
    value::Value
};

use super::Receiver;

/// A singular association stored as a foreign key column.
///
/// When the referenced entity is already written, the reference is
/// emitted inline. Otherwise the row is inserted without the column and
/// an UPDATE is deferred until the target's row exists.
#[derive(Debug)]
pub struct ReferenceProperty {
    /// Attribute name.
    pub name:     String,
    /// Resolved foreign key column.
    pub column:   GeneratorColumn,
    /// Whether NULL is forbidden.
    pub required: bool,
    /// Whether the column alone identifies a row.
    pub unique:   bool,
    /// Attribute inside the target's composite id this maps to.
    pub id_field: Option<String>
}

impl ReferenceProperty {
    /// Whether NULL is forbidden.
    pub fn is_required(&self) -> bool {
        self.required
    }

    pub(crate) fn add_insert_expression(
        &self,
        ctx: &GeneratorContext,
        owner: &EntityHandle,
        receiver: &Receiver,
        statement: &mut InsertStatement
    ) -> Result<()> {
        match receiver.attribute(&self.name) {
            Value::Null => {
                if self.required {
                    return Err(GeneratorError::model(format!(
                        "required reference '{}' is null",
                        self.name
                    )));
                }
                Ok(())
            }
            Value::Entity(target) => {
                let descriptor = ctx.description_of(&target)?;
                if descriptor.is_new(ctx, &target)? {
                    if self.required {
                        return Err(GeneratorError::model(format!(
                            "unresolvable cycle: required reference '{}' points to an \
                             unwritten {}",
                            self.name,
                            descriptor.entity_name()
                        )));
                    }
                    descriptor.mark_pending_updates(ctx, &target, owner, &self.name, Vec::new())?;
                    Ok(())
                } else {
                    let expression = descriptor.get_entity_reference(
                        ctx,
                        &target,
                        self.id_field.as_deref(),
                        false
                    )?;
                    statement.set(self.column, expression);
                    Ok(())
                }
            }
            other => Err(GeneratorError::model(format!(
                "reference '{}' holds a {} value",
                self.name,
                other.type_name()
            )))
        }
    }

    pub(crate) fn expression(
        &self,
        ctx: &GeneratorContext,
        receiver: &Receiver,
        for_where: bool
    ) -> Result<Option<String>> {
        match receiver.attribute(&self.name) {
            Value::Entity(target) => {
                let descriptor = ctx.description_of(&target)?;
                if descriptor.is_new(ctx, &target)? {
                    return Ok(None);
                }
                Ok(Some(descriptor.get_entity_reference(
                    ctx,
                    &target,
                    self.id_field.as_deref(),
                    for_where
                )?))
            }
            _ => Ok(None)
        }
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

    pub(crate) fn find_referenced_entities(&self, receiver: &Receiver) -> Vec<EntityHandle> {
        match receiver.attribute(&self.name) {
            Value::Entity(target) => vec![target],
            _ => Vec::new()
        }
    }

    /// Deferred update storing the written target's id into the waiting
    /// row.
    pub(crate) fn write_pending(
        &self,
        ctx: &GeneratorContext,
        writer: &mut dyn StatementsWriter,
        entity_to_update: &EntityHandle,
        written: &EntityHandle
    ) -> Result<()> {
        let target_descriptor = ctx.description_of(written)?;
        let expression = target_descriptor.get_entity_reference(
            ctx,
            written,
            self.id_field.as_deref(),
            false
        )?;

        let descriptor = ctx.description_of(entity_to_update)?;
        let predicate = descriptor.table_row_predicate(ctx, entity_to_update, self.column.table())?;
        let mut statement = UpdateStatement::new(self.column.table(), predicate);
        statement.set(self.column, expression);
        if let Some(version) = descriptor.version_column()
            && version.table() == self.column.table()
        {
            let column_name = ctx.column_name(version);
            statement.set_raw(version, format!("{column_name} + 1"));
        }
        writer.write_statement(&ctx.render_update(&statement))?;
        Ok(())
    }
}
