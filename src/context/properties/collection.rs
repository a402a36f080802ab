// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Collection and map properties.
//!
//! Neither occupies a column of the owning row. Collections either fill
//! a join table or, when mapped by the inverse side, update the foreign
//! key on the element's row. Maps fill a join table with an additional
//! key column. Elements that are not yet written become deferred actions
//! on the element's descriptor.

use crate::{
    context::{GeneratorContext, registry::{GeneratorColumn, GeneratorTable}},
    entity::EntityHandle,
    error::{GeneratorError, Result},
    statements::{InsertStatement, StatementsWriter, UpdateStatement},
    value::Value
};

use super::{Property, Receiver};

/// A collection attribute.
#[derive(Debug)]
pub struct CollectionProperty {
    /// Attribute name.
    pub name:           String,
    /// Owning reference on the element side; set for inverse
    /// collections.
    pub mapped_by:      Option<String>,
    /// Join table, absent for inverse collections.
    pub join_table:     Option<GeneratorTable>,
    /// FK column to the owner within the join table.
    pub owner_column:   Option<GeneratorColumn>,
    /// FK column to the element, or the value column for scalars.
    pub element_column: Option<GeneratorColumn>,
    /// Position column preserving declared order.
    pub order_column:   Option<GeneratorColumn>
}

impl CollectionProperty {
    pub(crate) fn create_post_insert_statements(
        &self,
        ctx: &GeneratorContext,
        owner: &EntityHandle,
        receiver: &Receiver,
        writer: &mut dyn StatementsWriter
    ) -> Result<()> {
        let items = match receiver.attribute(&self.name) {
            Value::Null => return Ok(()),
            Value::List(items) => items,
            other => {
                return Err(GeneratorError::model(format!(
                    "collection '{}' holds a {} value",
                    self.name,
                    other.type_name()
                )));
            }
        };

        for (index, item) in items.iter().enumerate() {
            match item {
                Value::Entity(element) => {
                    let descriptor = ctx.description_of(element)?;
                    if descriptor.is_new(ctx, element)? {
                        descriptor.mark_pending_updates(
                            ctx,
                            element,
                            owner,
                            &self.name,
                            vec![Value::Int(index as i64)]
                        )?;
                    } else {
                        self.write_element(ctx, writer, owner, item, index)?;
                    }
                }
                scalar => self.write_element(ctx, writer, owner, scalar, index)?
            }
        }
        Ok(())
    }

    fn write_element(
        &self,
        ctx: &GeneratorContext,
        writer: &mut dyn StatementsWriter,
        owner: &EntityHandle,
        element: &Value,
        index: usize
    ) -> Result<()> {
        if let Some(mapped_by) = &self.mapped_by {
            return self.write_inverse_update(ctx, writer, owner, element, mapped_by);
        }

        let table = self.join_table.ok_or_else(|| {
            GeneratorError::model(format!("collection '{}' has no join table", self.name))
        })?;
        let owner_column = self.owner_column.ok_or_else(|| {
            GeneratorError::model(format!("collection '{}' has no owner column", self.name))
        })?;
        let element_column = self.element_column.ok_or_else(|| {
            GeneratorError::model(format!("collection '{}' has no element column", self.name))
        })?;

        let owner_descriptor = ctx.description_of(owner)?;
        let owner_expression = owner_descriptor.get_entity_reference(ctx, owner, None, false)?;

        let element_expression = match element {
            Value::Entity(target) => {
                let descriptor = ctx.description_of(target)?;
                descriptor.get_entity_reference(ctx, target, None, false)?
            }
            scalar => ctx.dialect().format_value(scalar)?
        };

        let mut statement = InsertStatement::new(table);
        statement.set(owner_column, owner_expression);
        statement.set(element_column, element_expression);
        if let Some(order_column) = self.order_column {
            statement.set(order_column, index.to_string());
        }
        writer.write_statement(&ctx.render_insert(&statement))?;
        Ok(())
    }

    fn write_inverse_update(
        &self,
        ctx: &GeneratorContext,
        writer: &mut dyn StatementsWriter,
        owner: &EntityHandle,
        element: &Value,
        mapped_by: &str
    ) -> Result<()> {
        let Value::Entity(element) = element else {
            return Err(GeneratorError::model(format!(
                "inverse collection '{}' holds a scalar element",
                self.name
            )));
        };
        let element_descriptor = ctx.description_of(element)?;
        let owning = element_descriptor.find_property(ctx, mapped_by)?.ok_or_else(|| {
            GeneratorError::model(format!(
                "collection '{}' is mapped by unknown attribute '{mapped_by}' of {}",
                self.name,
                element_descriptor.entity_name()
            ))
        })?;
        let Property::Reference(owning) = &*owning else {
            return Err(GeneratorError::model(format!(
                "collection '{}' is mapped by non-reference attribute '{mapped_by}'",
                self.name
            )));
        };

        let owner_descriptor = ctx.description_of(owner)?;
        let owner_expression = owner_descriptor.get_entity_reference(ctx, owner, None, false)?;
        let predicate =
            element_descriptor.table_row_predicate(ctx, element, owning.column.table())?;
        let mut statement = UpdateStatement::new(owning.column.table(), predicate);
        statement.set(owning.column, owner_expression);
        writer.write_statement(&ctx.render_update(&statement))?;
        Ok(())
    }

    pub(crate) fn find_referenced_entities(&self, receiver: &Receiver) -> Vec<EntityHandle> {
        match receiver.attribute(&self.name) {
            Value::List(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Entity(handle) => Some(handle),
                    _ => None
                })
                .collect(),
            _ => Vec::new()
        }
    }

    /// Replay a join table row or inverse update for an element that
    /// became writable.
    pub(crate) fn write_pending(
        &self,
        ctx: &GeneratorContext,
        writer: &mut dyn StatementsWriter,
        entity_to_update: &EntityHandle,
        written: &EntityHandle,
        arguments: &[Value]
    ) -> Result<()> {
        let index = match arguments.first() {
            Some(Value::Int(index)) => *index as usize,
            _ => 0
        };
        let element = Value::Entity(written.clone());
        self.write_element(ctx, writer, entity_to_update, &element, index)
    }
}

/// A map attribute filling a join table keyed by scalars.
#[derive(Debug)]
pub struct MapProperty {
    /// Attribute name.
    pub name:         String,
    /// Join table.
    pub join_table:   GeneratorTable,
    /// FK column to the owner.
    pub owner_column: GeneratorColumn,
    /// Key column.
    pub key_column:   GeneratorColumn,
    /// FK column to the value entity, or the value column for scalars.
    pub value_column: GeneratorColumn
}

impl MapProperty {
    pub(crate) fn create_post_insert_statements(
        &self,
        ctx: &GeneratorContext,
        owner: &EntityHandle,
        receiver: &Receiver,
        writer: &mut dyn StatementsWriter
    ) -> Result<()> {
        let entries = match receiver.attribute(&self.name) {
            Value::Null => return Ok(()),
            Value::Map(entries) => entries,
            other => {
                return Err(GeneratorError::model(format!(
                    "map '{}' holds a {} value",
                    self.name,
                    other.type_name()
                )));
            }
        };

        for (key, value) in &entries {
            match value {
                Value::Entity(element) => {
                    let descriptor = ctx.description_of(element)?;
                    if descriptor.is_new(ctx, element)? {
                        descriptor.mark_pending_updates(
                            ctx,
                            element,
                            owner,
                            &self.name,
                            vec![key.clone()]
                        )?;
                    } else {
                        self.write_entry(ctx, writer, owner, key, value)?;
                    }
                }
                scalar => self.write_entry(ctx, writer, owner, key, scalar)?
            }
        }
        Ok(())
    }

    fn write_entry(
        &self,
        ctx: &GeneratorContext,
        writer: &mut dyn StatementsWriter,
        owner: &EntityHandle,
        key: &Value,
        value: &Value
    ) -> Result<()> {
        let owner_descriptor = ctx.description_of(owner)?;
        let owner_expression = owner_descriptor.get_entity_reference(ctx, owner, None, false)?;
        let value_expression = match value {
            Value::Entity(target) => {
                let descriptor = ctx.description_of(target)?;
                descriptor.get_entity_reference(ctx, target, None, false)?
            }
            scalar => ctx.dialect().format_value(scalar)?
        };

        let mut statement = InsertStatement::new(self.join_table);
        statement.set(self.owner_column, owner_expression);
        statement.set(self.key_column, ctx.dialect().format_value(key)?);
        statement.set(self.value_column, value_expression);
        writer.write_statement(&ctx.render_insert(&statement))?;
        Ok(())
    }

    pub(crate) fn find_referenced_entities(&self, receiver: &Receiver) -> Vec<EntityHandle> {
        match receiver.attribute(&self.name) {
            Value::Map(entries) => entries
                .into_iter()
                .filter_map(|(_, value)| match value {
                    Value::Entity(handle) => Some(handle),
                    _ => None
                })
                .collect(),
            _ => Vec::new()
        }
    }

    /// Replay a join table row for a value entity that became writable.
    pub(crate) fn write_pending(
        &self,
        ctx: &GeneratorContext,
        writer: &mut dyn StatementsWriter,
        entity_to_update: &EntityHandle,
        written: &EntityHandle,
        arguments: &[Value]
    ) -> Result<()> {
        let key = arguments.first().cloned().unwrap_or(Value::Null);
        let value = Value::Entity(written.clone());
        self.write_entry(ctx, writer, entity_to_update, &key, &value)
    }
}
