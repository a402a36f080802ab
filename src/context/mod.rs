// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Process-wide generation state.
//!
//! One [`GeneratorContext`] serves one pipeline: it caches descriptors,
//! interns tables and columns, owns the id generators and carries the
//! dialect and settings. It is passed by explicit parameter everywhere,
//! so several pipelines can coexist in one process.

pub mod descriptor;
pub mod generators;
pub mod properties;
pub mod registry;

use std::{
    cell::RefCell,
    collections::HashMap,
    rc::Rc
};

use crate::{
    config::GeneratorSettings,
    dialect::{GeneratorDialect, dialect_by_name},
    entity::EntityHandle,
    error::{GeneratorError, Result},
    model::{EntityKind, EntityModel, GeneratedModel, GenerationStrategy, GeneratorModel},
    statements::{InsertStatement, UpdateStatement}
};

use self::{
    descriptor::EntityDescriptor,
    generators::{IdGenerator, IdentityGenerator, SequenceGenerator, TableIdGenerator},
    registry::{GeneratorColumn, GeneratorTable, TableRegistry}
};

/// Default table holding rows of table-backed id generators.
const GENERATOR_TABLE: &str = "id_generators";

/// Shared state of one generation pipeline.
pub struct GeneratorContext {
    dialect:     Box<dyn GeneratorDialect>,
    settings:    GeneratorSettings,
    registry:    RefCell<TableRegistry>,
    descriptors: RefCell<HashMap<&'static str, Rc<EntityDescriptor>>>,
    generators:  RefCell<HashMap<String, Rc<RefCell<IdGenerator>>>>
}

impl GeneratorContext {
    /// Create a context, resolving the dialect from the settings.
    pub fn new(settings: GeneratorSettings) -> Result<Self> {
        let dialect = dialect_by_name(&settings.dialect)?;
        Ok(Self::with_dialect(settings, dialect))
    }

    /// Create a context with an explicit dialect adapter.
    pub fn with_dialect(settings: GeneratorSettings, dialect: Box<dyn GeneratorDialect>) -> Self {
        Self {
            dialect,
            settings,
            registry: RefCell::new(TableRegistry::new()),
            descriptors: RefCell::new(HashMap::new()),
            generators: RefCell::new(HashMap::new())
        }
    }

    /// The dialect adapter.
    pub fn dialect(&self) -> &dyn GeneratorDialect {
        self.dialect.as_ref()
    }

    /// The generator settings.
    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Intern a table by name.
    pub fn resolve_table(&self, name: &str) -> GeneratorTable {
        self.registry.borrow_mut().resolve_table(self.dialect.as_ref(), name)
    }

    /// Intern a column by name within its table.
    pub fn resolve_column(&self, table: GeneratorTable, name: &str) -> GeneratorColumn {
        self.registry.borrow_mut().resolve_column(self.dialect.as_ref(), table, name)
    }

    /// Declared name of a table.
    pub fn table_name(&self, table: GeneratorTable) -> String {
        self.registry.borrow().table_name(table).to_owned()
    }

    /// Declared name of a column.
    pub fn column_name(&self, column: GeneratorColumn) -> String {
        self.registry.borrow().column_name(column).to_owned()
    }

    /// Render an INSERT against the registry.
    pub fn render_insert(&self, statement: &InsertStatement) -> String {
        statement.to_sql(self.dialect.as_ref(), &self.registry.borrow())
    }

    /// Render an UPDATE against the registry.
    pub fn render_update(&self, statement: &UpdateStatement) -> String {
        statement.to_sql(&self.registry.borrow())
    }

    /// Descriptor of a model, created and built on first use.
    ///
    /// Construction is memoized; a model reached again while its build
    /// is still running receives the cached shell, which keeps cyclic
    /// references between entity classes from recursing forever.
    pub fn description(&self, model: &'static EntityModel) -> Result<Rc<EntityDescriptor>> {
        if model.kind == EntityKind::MappedSuperclass {
            return Err(GeneratorError::model(format!(
                "'{}' is a mapped superclass, not an entity",
                model.name
            )));
        }
        if let Some(descriptor) = self.descriptors.borrow().get(model.name) {
            return Ok(descriptor.clone());
        }
        let descriptor = Rc::new(EntityDescriptor::shell(model));
        self.descriptors.borrow_mut().insert(model.name, descriptor.clone());
        descriptor.build(self)?;
        Ok(descriptor)
    }

    /// Descriptor of the entity behind a handle.
    pub fn description_of(&self, entity: &EntityHandle) -> Result<Rc<EntityDescriptor>> {
        let model = entity.borrow().model();
        self.description(model)
    }

    /// Already created descriptor by entity name.
    pub fn description_by_name(&self, name: &str) -> Result<Rc<EntityDescriptor>> {
        self.descriptors
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| GeneratorError::model(format!("unknown entity '{name}'")))
    }

    /// Register the generators declared on a model, once per name.
    pub fn register_generators(&self, model: &'static EntityModel) -> Result<()> {
        for declared in model.generators {
            self.register_generator(declared)?;
        }
        Ok(())
    }

    fn register_generator(&self, declared: &GeneratorModel) -> Result<()> {
        let mut generators = self.generators.borrow_mut();
        if generators.contains_key(declared.name) {
            return Ok(());
        }
        let generator = match declared.strategy {
            GenerationStrategy::Sequence | GenerationStrategy::Auto => {
                self.require_sequences(declared.name)?;
                IdGenerator::Sequence(SequenceGenerator::new(
                    declared.sequence.unwrap_or(declared.name),
                    declared.initial_value,
                    declared.allocation_size
                ))
            }
            GenerationStrategy::Table => IdGenerator::Table(TableIdGenerator::new(
                declared.table.unwrap_or(GENERATOR_TABLE),
                declared.name,
                declared.initial_value,
                declared.allocation_size
            )),
            GenerationStrategy::Identity => {
                return Err(GeneratorError::model(format!(
                    "generator '{}' declares the identity strategy, which needs no generator",
                    declared.name
                )));
            }
        };
        generators.insert(declared.name.to_owned(), Rc::new(RefCell::new(generator)));
        Ok(())
    }

    /// Generator for a generated id attribute, created on first use.
    ///
    /// Returns the key under which the generator is registered.
    pub fn ensure_id_generator(
        &self,
        generated: &GeneratedModel,
        table_name: String,
        column_name: &str
    ) -> Result<String> {
        let strategy = match generated.strategy {
            GenerationStrategy::Auto => {
                if self.dialect.supports_sequences() {
                    GenerationStrategy::Sequence
                } else {
                    GenerationStrategy::Identity
                }
            }
            strategy => strategy
        };

        let key = match (strategy, generated.generator) {
            (GenerationStrategy::Identity, _) => {
                format!("identity::{table_name}::{column_name}")
            }
            (_, Some(name)) => name.to_owned(),
            (GenerationStrategy::Sequence, None) => format!("{table_name}_seq"),
            (GenerationStrategy::Table, None) => format!("{table_name}_gen"),
            (GenerationStrategy::Auto, None) => unreachable!("auto was resolved above")
        };

        let mut generators = self.generators.borrow_mut();
        if generators.contains_key(&key) {
            return Ok(key);
        }
        let generator = match strategy {
            GenerationStrategy::Sequence => {
                self.require_sequences(&key)?;
                IdGenerator::Sequence(SequenceGenerator::new(key.clone(), 1, 1))
            }
            GenerationStrategy::Table => {
                IdGenerator::Table(TableIdGenerator::new(GENERATOR_TABLE, key.clone(), 1, 1))
            }
            GenerationStrategy::Identity => IdGenerator::Identity(IdentityGenerator::new()),
            GenerationStrategy::Auto => unreachable!("auto was resolved above")
        };
        generators.insert(key.clone(), Rc::new(RefCell::new(generator)));
        Ok(key)
    }

    fn require_sequences(&self, name: &str) -> Result<()> {
        if self.dialect.supports_sequences() {
            Ok(())
        } else {
            Err(GeneratorError::Dialect(format!(
                "dialect '{}' has no sequences for generator '{name}'",
                self.dialect.name()
            )))
        }
    }

    /// Registered generator by key.
    pub fn generator(&self, name: &str) -> Result<Rc<RefCell<IdGenerator>>> {
        self.generators
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| GeneratorError::model(format!("unknown id generator '{name}'")))
    }

    /// Trailing statements aligning database-side counters, in key
    /// order.
    pub fn alignment_statements(&self) -> Vec<String> {
        let generators = self.generators.borrow();
        let mut keys: Vec<&String> = generators.keys().collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|key| {
                generators[key]
                    .borrow()
                    .alignment_statement(self.dialect.as_ref(), self.settings.write_relative_ids)
            })
            .collect()
    }

    /// Verify that no entity is still awaited by deferred updates.
    ///
    /// Called at teardown; a residual pending state means a referenced
    /// entity was never written.
    pub fn check_residual_pending_states(&self) -> Result<()> {
        for descriptor in self.descriptors.borrow().values() {
            let count = descriptor.residual_pending_actions();
            if count > 0 {
                return Err(GeneratorError::UnresolvedReference {
                    entity: descriptor.entity_name().to_owned(),
                    count
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeneratedModel;

    fn context() -> GeneratorContext {
        GeneratorContext::new(GeneratorSettings::default()).unwrap()
    }

    #[test]
    fn id_generator_keys_are_stable() {
        let ctx = context();
        let generated = GeneratedModel {
            strategy:  GenerationStrategy::Auto,
            generator: None
        };
        let a = ctx.ensure_id_generator(&generated, "Person".to_owned(), "id").unwrap();
        let b = ctx.ensure_id_generator(&generated, "Person".to_owned(), "id").unwrap();
        assert_eq!(a, "Person_seq");
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_generator_is_a_model_error() {
        let ctx = context();
        assert!(ctx.generator("nope").is_err());
    }

    #[test]
    fn alignment_is_sorted_and_skips_untouched_generators() {
        let ctx = context();
        let generated = GeneratedModel {
            strategy:  GenerationStrategy::Sequence,
            generator: None
        };
        let b = ctx.ensure_id_generator(&generated, "B".to_owned(), "id").unwrap();
        let a = ctx.ensure_id_generator(&generated, "A".to_owned(), "id").unwrap();
        ctx.generator(&b).unwrap().borrow_mut().next_value();
        ctx.generator(&a).unwrap().borrow_mut().next_value();
        let statements = ctx.alignment_statements();
        assert_eq!(
            statements,
            vec!["ALTER SEQUENCE A_seq RESTART WITH 2", "ALTER SEQUENCE B_seq RESTART WITH 2"]
        );
    }
}
