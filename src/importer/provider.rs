// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Data providers and their instantiation order.
//!
//! A provider builds a batch of entities and later writes them through
//! the generator. Providers are registered with a build closure and the
//! set of providers they depend on; instantiation proceeds in rounds so
//! that a provider is only created once all its dependencies exist. The
//! execution list keeps the declared order, with dependencies always
//! placed before their dependents.

use std::{
    any::{Any, TypeId},
    path::Path
};

use crate::{
    config::ImporterSettings,
    error::{GeneratorError, Result},
    generator::EntitySqlGenerator
};

/// A user-supplied component building and writing a batch of entities.
pub trait DataProvider: Any {
    /// Name shown in section comments and logs.
    fn name(&self) -> &str;

    /// Execution priority; smaller orders run first.
    fn order(&self) -> i32 {
        0
    }

    /// First phase: build the entity graph in memory.
    fn build_entities(&mut self) -> Result<()>;

    /// Second phase: emit the built entities through the generator.
    fn write_entities(&mut self, generator: &mut EntitySqlGenerator<'_>) -> Result<()>;

    /// Upcast for dependency lookup.
    fn as_any(&self) -> &dyn Any;
}

/// Resources available to provider build closures.
pub struct ProviderResources<'a> {
    /// Base folder for provider input data.
    pub data_folder: &'a Path,
    /// The importer settings.
    pub settings:    &'a ImporterSettings
}

type BuildFn =
    Box<dyn FnOnce(&ProviderResources<'_>, &ProviderPool) -> Result<Box<dyn DataProvider>>>;

/// Registration of one provider: its name, dependencies and build
/// closure.
pub struct ProviderRegistration {
    name:       String,
    depends_on: Vec<TypeId>,
    build:      BuildFn
}

impl ProviderRegistration {
    /// Register a provider built by the given closure.
    pub fn new<P, F>(name: impl Into<String>, build: F) -> Self
    where
        P: DataProvider,
        F: FnOnce(&ProviderResources<'_>, &ProviderPool) -> Result<P> + 'static
    {
        Self {
            name:       name.into(),
            depends_on: Vec::new(),
            build:      Box::new(|resources, pool| {
                build(resources, pool).map(|provider| Box::new(provider) as Box<dyn DataProvider>)
            })
        }
    }

    /// Declare that construction needs an already built provider.
    #[must_use]
    pub fn depends_on<P: DataProvider>(mut self) -> Self {
        self.depends_on.push(TypeId::of::<P>());
        self
    }
}

/// The instantiated providers in execution order.
#[derive(Default)]
pub struct ProviderPool {
    providers: Vec<Box<dyn DataProvider>>
}

impl ProviderPool {
    /// Look up an already built provider by type.
    pub fn get<P: DataProvider>(&self) -> Option<&P> {
        self.providers.iter().find_map(|provider| provider.as_any().downcast_ref::<P>())
    }

    /// Required variant of [`ProviderPool::get`] for build closures.
    pub fn require<P: DataProvider>(&self) -> Result<&P> {
        self.get::<P>().ok_or_else(|| {
            GeneratorError::model(format!(
                "provider dependency '{}' is not available",
                std::any::type_name::<P>()
            ))
        })
    }

    fn contains(&self, id: TypeId) -> bool {
        self.providers.iter().any(|provider| provider.as_any().type_id() == id)
    }

    fn order_of(&self, id: TypeId) -> Option<i32> {
        self.providers
            .iter()
            .find(|provider| provider.as_any().type_id() == id)
            .map(|provider| provider.order())
    }

    /// Number of providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Iterate in execution order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn DataProvider>> {
        self.providers.iter_mut()
    }

    /// Insert keeping dependents after their dependencies: the provider
    /// goes after the last entry whose order does not exceed the
    /// effective order.
    fn insert(&mut self, provider: Box<dyn DataProvider>, effective_order: i32) {
        let mut index = self.providers.len();
        while index > 0 && self.providers[index - 1].order() > effective_order {
            index -= 1;
        }
        self.providers.insert(index, provider);
    }
}

/// Instantiate all registered providers in rounds.
///
/// Registrations are sorted by name first, so equal configurations
/// produce the same execution list. A round without progress means a
/// dependency can never be satisfied.
pub fn instantiate_providers(
    mut registrations: Vec<ProviderRegistration>,
    resources: &ProviderResources<'_>
) -> Result<ProviderPool> {
    registrations.sort_by(|a, b| a.name.cmp(&b.name));

    let mut pool = ProviderPool::default();
    while !registrations.is_empty() {
        let before = registrations.len();
        let mut unsatisfied = Vec::new();
        for registration in registrations {
            if registration.depends_on.iter().all(|id| pool.contains(*id)) {
                let max_dependency_order = registration
                    .depends_on
                    .iter()
                    .filter_map(|id| pool.order_of(*id))
                    .max();
                let provider = (registration.build)(resources, &pool)?;
                let effective_order = match max_dependency_order {
                    Some(dependency_order) => provider.order().max(dependency_order),
                    None => provider.order()
                };
                pool.insert(provider, effective_order);
            } else {
                unsatisfied.push(registration);
            }
        }
        if unsatisfied.len() == before {
            let names: Vec<&str> =
                unsatisfied.iter().map(|registration| registration.name.as_str()).collect();
            return Err(GeneratorError::model(format!(
                "no matching data provider in dependencies of [{}]",
                names.join(", ")
            )));
        }
        registrations = unsatisfied;
    }
    Ok(pool)
}
