// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Orchestration of a single entity's emission.
//!
//! [`EntitySqlGenerator::write_entity`] turns one entity into SQL: any
//! entities its non-nullable references need come first, then pre-insert
//! statements, the row (or, for JOINED hierarchies, one row per table),
//! the property post-inserts and finally the descriptor's pending-action
//! flush. The whole sequence is atomic; no other entity's statements
//! interleave.

use std::rc::Rc;

use tracing::debug;

use crate::{
    context::{GeneratorContext, descriptor::EntityDescriptor, properties::Receiver},
    entity::{EntityHandle, EntityId, Ref, SqlEntity},
    error::Result,
    statements::{InsertStatement, StatementsWriter}
};

/// Writes entities as SQL statements through a [`StatementsWriter`].
pub struct EntitySqlGenerator<'a> {
    context: Rc<GeneratorContext>,
    writer:  Box<dyn StatementsWriter + 'a>
}

impl<'a> EntitySqlGenerator<'a> {
    /// Create a generator emitting through the given writer.
    pub fn new(context: Rc<GeneratorContext>, writer: Box<dyn StatementsWriter + 'a>) -> Self {
        Self { context, writer }
    }

    /// The shared generation context.
    pub fn context(&self) -> &Rc<GeneratorContext> {
        &self.context
    }

    /// Write one typed entity and everything it transitively needs.
    pub fn write<T: SqlEntity>(&mut self, entity: &Ref<T>) -> Result<()> {
        let handle: EntityHandle = entity.clone();
        self.write_entity(&handle)
    }

    /// Write every entity of an iterator.
    pub fn write_all<'e, T: SqlEntity>(
        &mut self,
        entities: impl IntoIterator<Item = &'e Ref<T>>
    ) -> Result<()> {
        for entity in entities {
            self.write(entity)?;
        }
        Ok(())
    }

    /// Mark a typed entity whose row already exists in the database.
    pub fn mark_existing<T: SqlEntity>(&mut self, entity: &Ref<T>) -> Result<()> {
        let handle: EntityHandle = entity.clone();
        let descriptor = self.context.description_of(&handle)?;
        descriptor.mark_existing_entity(&self.context, &handle)
    }

    /// Write one entity through its erased handle.
    pub fn write_entity(&mut self, entity: &EntityHandle) -> Result<()> {
        let mut in_progress = Vec::new();
        self.write_guarded(entity, &mut in_progress)
    }

    fn write_guarded(
        &mut self,
        entity: &EntityHandle,
        in_progress: &mut Vec<EntityId>
    ) -> Result<()> {
        let ctx = self.context.clone();
        let descriptor = ctx.description_of(entity)?;
        if !descriptor.is_new(&ctx, entity)? {
            return Ok(());
        }
        let identity = EntityId::of(entity);
        if in_progress.contains(&identity) {
            return Ok(());
        }
        in_progress.push(identity);
        debug!(entity = descriptor.entity_name(), "writing entity");

        let levels = self.table_levels(&ctx, &descriptor)?;
        let receiver = Receiver::Entity(entity.clone());

        // Rows this entity requires must exist first.
        for level in &levels {
            for property in level.properties() {
                for required in property.find_required_references(&receiver) {
                    if !in_progress.contains(&EntityId::of(&required)) {
                        self.write_guarded(&required, in_progress)?;
                    }
                }
            }
        }

        // Pre-insert statements: generator allocations and the like.
        let id_property = levels[0].id_property();
        id_property.create_pre_insert_statements(&ctx, entity, &receiver, self.writer.as_mut())?;
        for level in &levels {
            for property in level.properties() {
                property.create_pre_insert_statements(
                    &ctx,
                    entity,
                    &receiver,
                    self.writer.as_mut()
                )?;
            }
        }

        // One row per table, root first.
        for (index, level) in levels.iter().enumerate() {
            let mut statement = InsertStatement::new(level.table());
            if index == 0 {
                if let Some((column, literal)) = descriptor.discriminator() {
                    statement.set(column, literal);
                }
                id_property.add_insert_expression(&ctx, entity, &receiver, &mut statement)?;
            } else if let Some(join_column) = level.primary_key_join_column() {
                let reference = descriptor.get_entity_reference(&ctx, entity, None, false)?;
                statement.set(join_column, reference);
            }
            for property in level.properties() {
                property.add_insert_expression(&ctx, entity, &receiver, &mut statement)?;
            }
            self.writer.write_statement(&ctx.render_insert(&statement))?;
            if index == 0 {
                // References in the remaining rows and post-inserts need
                // the freshly generated id.
                descriptor.assign_generated_id(&ctx, entity)?;
            }
        }

        // Join table rows and foreign-side updates.
        for level in &levels {
            for property in level.properties() {
                property.create_post_insert_statements(
                    &ctx,
                    entity,
                    &receiver,
                    self.writer.as_mut()
                )?;
            }
        }

        // Persist the state and flush deferred actions in FIFO order.
        descriptor.create_post_insert_statements(&ctx, entity, self.writer.as_mut())?;

        in_progress.pop();
        Ok(())
    }

    /// Descriptors of every table a row must be written to, hierarchy
    /// root first. A single entry unless the entity is a JOINED child.
    fn table_levels(
        &self,
        ctx: &GeneratorContext,
        descriptor: &Rc<EntityDescriptor>
    ) -> Result<Vec<Rc<EntityDescriptor>>> {
        let mut levels = vec![descriptor.clone()];
        let mut current = descriptor.clone();
        while let Some(parent) = current.joined_parent_name() {
            current = ctx.description_by_name(parent)?;
            levels.push(current.clone());
        }
        levels.reverse();
        Ok(levels)
    }

    /// Append a comment to the output.
    pub fn write_comment(&mut self, comment: &str) -> Result<()> {
        self.writer.write_comment(comment)
    }

    /// Append a section separator to the output.
    pub fn write_section_separator(&mut self) -> Result<()> {
        self.writer.write_section_separator()
    }

    /// Append raw pre-rendered SQL text.
    pub fn write_raw(&mut self, text: &str) -> Result<()> {
        self.writer.write_raw(text)
    }

    /// Emit the trailing statements aligning sequence and identity
    /// counters.
    pub fn write_alignment_statements(&mut self) -> Result<()> {
        for statement in self.context.alignment_statements() {
            self.writer.write_statement(&statement)?;
        }
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()
    }
}
