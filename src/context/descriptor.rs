// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Resolved per-entity metadata and write state.
//!
//! An [`EntityDescriptor`] is the materialized form of one
//! [`EntityModel`]: tables and columns resolved through the registry,
//! inheritance walked to the hierarchy root, the discriminator rendered,
//! the id property bound to its generator and every persistent attribute
//! turned into a [`Property`].
//!
//! Descriptors are created as cached shells and filled afterwards, so a
//! model that is reached again while its own build is still running sees
//! the shell instead of recursing forever.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap, HashSet},
    rc::Rc
};

use crate::{
    context::{
        GeneratorContext,
        properties::{
            CollectionProperty, EmbeddedProperty, GeneratedIdProperty, MapProperty,
            PrimitiveProperty, Property, Receiver, ReferenceProperty, UniquePropertyQuality,
            VersionProperty
        },
        registry::{GeneratorColumn, GeneratorTable}
    },
    entity::{EntityHandle, EntityId},
    error::{GeneratorError, Result},
    model::{
        AttributeKind, AttributeModel, ColumnModel, DEFAULT_COLUMN, DEFAULT_DISCRIMINATOR,
        DiscriminatorKind, EmbeddedModel, EntityKind, EntityModel, InheritanceKind,
        JoinColumnModel
    },
    statements::StatementsWriter,
    value::Value
};

/// Write state of one entity, tracked per identity.
pub enum GenerationState {
    /// Referenced but not yet written; holds deferred actions in FIFO
    /// order.
    Pending(Vec<PendingAction>),
    /// The row exists, either written by this run or marked as
    /// pre-existing.
    Persisted
}

/// One deferred action, replayed once the awaited entity is written.
pub struct PendingAction {
    entity_to_update: EntityHandle,
    property:         String,
    arguments:        Vec<Value>
}

impl std::fmt::Debug for PendingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PendingAction('{}', {} argument(s))", self.property, self.arguments.len())
    }
}

impl std::fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EntityDescriptor({})", self.model.name)
    }
}

/// Key of the state map: identity for generated ids, the id value
/// otherwise.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum StateKey {
    Identity(EntityId),
    Literal(String)
}

#[derive(Default)]
struct DescriptorData {
    table: Option<GeneratorTable>,
    inheritance: Option<InheritanceKind>,
    hierarchy_root: Option<&'static str>,
    joined_parent: Option<&'static str>,
    discriminator_column: Option<GeneratorColumn>,
    discriminator: Option<String>,
    primary_key_join_column: Option<GeneratorColumn>,
    id_property: Option<Rc<Property>>,
    properties: Vec<Rc<Property>>,
    property_lookup: BTreeMap<String, Rc<Property>>,
    unique_properties: Vec<Rc<Property>>,
    unique_quality: Option<UniquePropertyQuality>
}

/// Resolved metadata of one entity class.
pub struct EntityDescriptor {
    model:      &'static EntityModel,
    data:       RefCell<DescriptorData>,
    states:     RefCell<HashMap<StateKey, GenerationState>>,
    references: RefCell<HashSet<EntityId>>,
    built:      Cell<bool>
}

impl EntityDescriptor {
    /// Create the unfilled shell; [`EntityDescriptor::build`] fills it.
    pub(crate) fn shell(model: &'static EntityModel) -> Self {
        Self {
            model,
            data: RefCell::new(DescriptorData::default()),
            states: RefCell::new(HashMap::new()),
            references: RefCell::new(HashSet::new()),
            built: Cell::new(false)
        }
    }

    /// The declarative model this descriptor was built from.
    pub fn model(&self) -> &'static EntityModel {
        self.model
    }

    /// Entity name.
    pub fn entity_name(&self) -> &'static str {
        self.model.name
    }

    /// Whether [`EntityDescriptor::build`] completed.
    pub fn is_built(&self) -> bool {
        self.built.get()
    }

    /// Main table of the entity.
    pub fn table(&self) -> GeneratorTable {
        self.data.borrow().table.expect("descriptor not built")
    }

    /// Resolved inheritance strategy, if part of a hierarchy.
    pub fn inheritance_type(&self) -> Option<InheritanceKind> {
        self.data.borrow().inheritance
    }

    /// Entity name of the hierarchy root, self for standalone entities.
    pub fn hierarchy_root_name(&self) -> &'static str {
        self.data.borrow().hierarchy_root.unwrap_or(self.model.name)
    }

    /// Entity name of the next JOINED ancestor, if any.
    pub fn joined_parent_name(&self) -> Option<&'static str> {
        self.data.borrow().joined_parent
    }

    /// Discriminator column and literal of this class, if any.
    pub fn discriminator(&self) -> Option<(GeneratorColumn, String)> {
        let data = self.data.borrow();
        match (data.discriminator_column, &data.discriminator) {
            (Some(column), Some(literal)) => Some((column, literal.clone())),
            _ => None
        }
    }

    /// Id column of a joined subclass table.
    pub fn primary_key_join_column(&self) -> Option<GeneratorColumn> {
        self.data.borrow().primary_key_join_column
    }

    /// The identifier property, own or inherited from the joined
    /// parent.
    pub fn id_property(&self) -> Rc<Property> {
        self.data.borrow().id_property.clone().expect("descriptor not built")
    }

    /// Own persistent properties (excluding the id), in build order.
    pub fn properties(&self) -> Vec<Rc<Property>> {
        self.data.borrow().properties.clone()
    }

    /// The unique-key alternate, best quality first, empty when none
    /// qualifies.
    pub fn unique_properties(&self) -> Vec<Rc<Property>> {
        self.data.borrow().unique_properties.clone()
    }

    /// Quality rank of [`EntityDescriptor::unique_properties`].
    pub fn unique_quality(&self) -> Option<UniquePropertyQuality> {
        self.data.borrow().unique_quality
    }

    /// Column of the version property, if the entity has one.
    pub fn version_column(&self) -> Option<GeneratorColumn> {
        self.data.borrow().properties.iter().find_map(|property| match &**property {
            Property::Version(version) => Some(version.column),
            _ => None
        })
    }

    /// Look up a property by name, searching joined ancestors as well.
    pub fn find_property(
        &self,
        ctx: &GeneratorContext,
        name: &str
    ) -> Result<Option<Rc<Property>>> {
        if let Some(property) = self.data.borrow().property_lookup.get(name) {
            return Ok(Some(property.clone()));
        }
        if let Some(parent) = self.joined_parent_name() {
            return ctx.description_by_name(parent)?.find_property(ctx, name);
        }
        Ok(None)
    }

    // ------------------------------------------------------------------
    // Build phase
    // ------------------------------------------------------------------

    /// Models from the hierarchy root down to this entity, inclusive.
    fn model_chain(&self) -> Vec<&'static EntityModel> {
        let mut chain = Vec::new();
        let mut current = Some(self.model);
        while let Some(model) = current {
            chain.push(model);
            current = model.parent_model();
        }
        chain.reverse();
        chain
    }

    /// Nearest ancestor model that is a real entity, skipping mapped
    /// superclasses.
    fn parent_entity_model(&self) -> Option<&'static EntityModel> {
        let mut current = self.model.parent_model();
        while let Some(model) = current {
            if model.kind == EntityKind::Entity {
                return Some(model);
            }
            current = model.parent_model();
        }
        None
    }

    /// Read the metadata and fill the shell.
    ///
    /// Kept out of the constructor so that cyclic references between
    /// entity classes find the cached shell instead of looping.
    pub(crate) fn build(self: &Rc<Self>, ctx: &GeneratorContext) -> Result<()> {
        let model = self.model;
        if model.kind == EntityKind::MappedSuperclass {
            return Err(GeneratorError::model(format!(
                "'{}' is a mapped superclass and has no descriptor",
                model.name
            )));
        }

        let mut table = ctx.resolve_table(model.table_name());
        let chain = self.model_chain();

        for chained in chain.iter().copied() {
            ctx.register_generators(chained)?;
        }

        // Inheritance resolution.
        let mut inheritance = model.inheritance;
        let mut hierarchy_root = model.name;
        let mut joined_parent = None;
        let mut primary_key_join_column = None;

        if let Some(parent_model) = self.parent_entity_model() {
            let parent = ctx.description(parent_model)?;
            parent.ensure_single_table(ctx)?;
            let parent_inheritance = parent.inheritance_type();

            if inheritance.is_none() {
                inheritance = parent_inheritance;
                hierarchy_root = parent.hierarchy_root_name();
            } else if parent_inheritance != Some(InheritanceKind::TablePerClass) {
                hierarchy_root = parent.hierarchy_root_name();
            }

            if parent_inheritance == Some(InheritanceKind::Joined) {
                joined_parent = Some(parent_model.name);
                let parent_id_column = parent.id_property().column().ok_or_else(|| {
                    GeneratorError::model(format!(
                        "JOINED inheritance of '{}' needs a singular id on '{}'",
                        model.name, parent_model.name
                    ))
                })?;
                let column_name = match model.primary_key_join_column {
                    Some(name) => name.to_owned(),
                    None => ctx.column_name(parent_id_column)
                };
                primary_key_join_column = Some(ctx.resolve_column(table, &column_name));
            } else {
                if parent_inheritance == Some(InheritanceKind::SingleTable) {
                    table = parent.table();
                }
                joined_parent = parent.joined_parent_name();
                primary_key_join_column = parent.primary_key_join_column();
            }
        }

        // A discriminator annotation alone announces a hierarchy.
        if inheritance.is_none()
            && (model.discriminator_column.is_some() || model.discriminator_value.is_some())
        {
            inheritance = Some(InheritanceKind::SingleTable);
        }

        // The discriminator column lives in the root's table, which is
        // only a different one under JOINED inheritance.
        let (root_model, root_table) = if hierarchy_root == model.name {
            (model, table)
        } else {
            let root = ctx.description_by_name(hierarchy_root)?;
            (root.model(), root.table())
        };
        let (discriminator_column, discriminator) =
            self.build_discriminator(ctx, inheritance, root_model, root_table)?;

        // Identifier.
        let id_property = if let Some(parent_name) = joined_parent {
            ctx.description_by_name(parent_name)?.id_property()
        } else {
            self.build_id_property(ctx, &chain, table)?
        };

        // Remaining properties: walk the chain, excluding everything
        // at or above the joined parent.
        let property_models: Vec<&'static EntityModel> = match joined_parent {
            Some(parent_name) => {
                let split = chain
                    .iter()
                    .position(|chained| chained.name == parent_name)
                    .unwrap_or(0);
                chain[split + 1..].to_vec()
            }
            None => chain.clone()
        };

        let mut properties = Vec::new();
        let mut property_lookup = BTreeMap::new();
        let mut unique_properties = Vec::new();
        let mut unique_quality: Option<UniquePropertyQuality> = None;

        for chained in property_models {
            for attribute in chained.attributes {
                if attribute.is_id() {
                    continue;
                }
                let property = Rc::new(self.build_property(ctx, chained, attribute, table)?);
                if let Some(quality) = self.singular_unique_quality(ctx, &property) {
                    if Self::is_better_quality(ctx, unique_quality, quality) {
                        unique_quality = Some(quality);
                        unique_properties = vec![property.clone()];
                    }
                }
                property_lookup.insert(attribute.name.to_owned(), property.clone());
                properties.push(property);
            }
        }

        // Multi-column unique constraints.
        for constraint in model.unique_constraints {
            if constraint.columns.len() > ctx.settings().max_unique_properties {
                continue;
            }
            let mut constraint_quality = UniquePropertyQuality::OnlyRequiredPrimitives;
            let mut members = Vec::new();
            for column_name in constraint.columns {
                let matched = properties.iter().find(|property| {
                    property
                        .column()
                        .is_some_and(|column| ctx.column_name(column) == *column_name)
                });
                if let Some(property) = matched
                    && let Some(quality) = UniquePropertyQuality::of(property)
                {
                    constraint_quality = constraint_quality.max(quality);
                    members.push((*property).clone());
                }
            }
            if members.len() == constraint.columns.len()
                && Self::is_better_quality(ctx, unique_quality, constraint_quality)
            {
                unique_quality = Some(constraint_quality);
                unique_properties = members;
            }
        }

        let mut data = self.data.borrow_mut();
        *data = DescriptorData {
            table: Some(table),
            inheritance,
            hierarchy_root: Some(hierarchy_root),
            joined_parent,
            discriminator_column,
            discriminator,
            primary_key_join_column,
            id_property: Some(id_property),
            properties,
            property_lookup,
            unique_properties,
            unique_quality
        };
        drop(data);
        self.built.set(true);
        Ok(())
    }

    /// Force SINGLE_TABLE once a subclass shows up for a class that
    /// declared no strategy, and give it a discriminator.
    fn ensure_single_table(self: &Rc<Self>, ctx: &GeneratorContext) -> Result<()> {
        if self.inheritance_type().is_some() {
            return Ok(());
        }
        let table = self.table();
        let (column, literal) =
            self.build_discriminator(ctx, Some(InheritanceKind::SingleTable), self.model, table)?;
        let mut data = self.data.borrow_mut();
        data.inheritance = Some(InheritanceKind::SingleTable);
        data.discriminator_column = column;
        data.discriminator = literal;
        Ok(())
    }

    fn build_discriminator(
        &self,
        ctx: &GeneratorContext,
        inheritance: Option<InheritanceKind>,
        root_model: &'static EntityModel,
        table: GeneratorTable
    ) -> Result<(Option<GeneratorColumn>, Option<String>)> {
        let needed = match inheritance {
            Some(InheritanceKind::SingleTable) => true,
            Some(InheritanceKind::Joined) => {
                root_model.discriminator_column.is_some()
                    || ctx.dialect().is_joined_discriminator_needed()
            }
            _ => false
        };
        if !needed {
            return Ok((None, None));
        }

        let column_model = root_model.discriminator_column.unwrap_or(DEFAULT_DISCRIMINATOR);
        let column = ctx.resolve_column(table, column_model.name);
        let literal = self.discriminator_literal(ctx, &column_model.kind, column_model.length)?;
        Ok((Some(column), Some(literal)))
    }

    fn discriminator_literal(
        &self,
        ctx: &GeneratorContext,
        kind: &DiscriminatorKind,
        length: u32
    ) -> Result<String> {
        let declared = self.model.discriminator_value;
        match kind {
            DiscriminatorKind::Integer => match declared {
                Some(value) => value.parse::<i64>().map(|v| v.to_string()).map_err(|_| {
                    GeneratorError::model(format!(
                        "discriminator of '{}' is not an integer: '{value}'",
                        self.model.name
                    ))
                }),
                None => Ok(stable_hash(self.model.name).to_string())
            },
            DiscriminatorKind::String | DiscriminatorKind::Char => {
                let value = declared.unwrap_or(self.model.name);
                if value.is_empty() {
                    return Err(GeneratorError::model(format!(
                        "missing discriminator value for '{}'",
                        self.model.name
                    )));
                }
                let truncated: String = match kind {
                    DiscriminatorKind::Char => value.chars().take(1).collect(),
                    _ => value.chars().take(length as usize).collect()
                };
                Ok(ctx.dialect().format_string(&truncated))
            }
        }
    }

    fn build_id_property(
        &self,
        ctx: &GeneratorContext,
        chain: &[&'static EntityModel],
        table: GeneratorTable
    ) -> Result<Rc<Property>> {
        for chained in chain {
            for attribute in chained.attributes {
                match &attribute.kind {
                    AttributeKind::Id(id) => {
                        let column_name =
                            id.column.and_then(|c| c.name).unwrap_or(attribute.name);
                        let column = ctx.resolve_column(table, column_name);
                        return Ok(Rc::new(match &id.generated {
                            Some(generated) => {
                                let generator = ctx.ensure_id_generator(
                                    generated,
                                    ctx.table_name(table),
                                    column_name
                                )?;
                                Property::GeneratedId(GeneratedIdProperty {
                                    name: attribute.name.to_owned(),
                                    column,
                                    generator,
                                    primitive: id.primitive
                                })
                            }
                            None => Property::Primitive(PrimitiveProperty {
                                name:     attribute.name.to_owned(),
                                column,
                                required: true,
                                unique:   false
                            })
                        }));
                    }
                    AttributeKind::EmbeddedId(embedded) => {
                        return Ok(Rc::new(Property::Embedded(self.build_embedded(
                            ctx,
                            attribute.name,
                            embedded,
                            true,
                            table
                        )?)));
                    }
                    _ => {}
                }
            }
        }
        Err(GeneratorError::model(format!("no id found for '{}'", self.model.name)))
    }

    fn build_property(
        &self,
        ctx: &GeneratorContext,
        owner_model: &'static EntityModel,
        attribute: &AttributeModel,
        table: GeneratorTable
    ) -> Result<Property> {
        // The nearest declaration wins, so the chain is searched from
        // this class up to the root.
        let attribute_override = self
            .model_chain()
            .iter()
            .rev()
            .flat_map(|chained| chained.attribute_overrides.iter())
            .find(|o| o.name == attribute.name)
            .map(|o| o.column);
        let association_override = self
            .model_chain()
            .iter()
            .rev()
            .flat_map(|chained| chained.association_overrides.iter())
            .find(|o| o.name == attribute.name)
            .map(|o| o.join_column);

        match &attribute.kind {
            AttributeKind::Basic(column) => {
                let column_model =
                    attribute_override.or(*column).unwrap_or(DEFAULT_COLUMN);
                Ok(Property::Primitive(self.build_primitive(
                    ctx,
                    attribute,
                    &column_model,
                    table
                )))
            }
            AttributeKind::Version(column) => {
                let column_model =
                    attribute_override.or(*column).unwrap_or(DEFAULT_COLUMN);
                let name = column_model.name.unwrap_or(attribute.name);
                Ok(Property::Version(VersionProperty {
                    name:   attribute.name.to_owned(),
                    column: ctx.resolve_column(table, name)
                }))
            }
            AttributeKind::Embedded(embedded) => Ok(Property::Embedded(self.build_embedded(
                ctx,
                attribute.name,
                embedded,
                false,
                table
            )?)),
            AttributeKind::Reference(reference) => {
                let join_column = association_override
                    .or(reference.join_column)
                    .unwrap_or(JoinColumnModel {
                        name:     None,
                        nullable: true,
                        unique:   false
                    });
                let column_name = match join_column.name {
                    Some(name) => name.to_owned(),
                    None => format!("{}_id", attribute.name)
                };
                Ok(Property::Reference(ReferenceProperty {
                    name:     attribute.name.to_owned(),
                    column:   ctx.resolve_column(table, &column_name),
                    required: attribute.required || !join_column.nullable,
                    unique:   join_column.unique || reference.one_to_one,
                    id_field: reference.id_field.map(str::to_owned)
                }))
            }
            AttributeKind::Collection(collection) => {
                if let Some(mapped_by) = collection.mapped_by {
                    return Ok(Property::Collection(CollectionProperty {
                        name:           attribute.name.to_owned(),
                        mapped_by:      Some(mapped_by.to_owned()),
                        join_table:     None,
                        owner_column:   None,
                        element_column: None,
                        order_column:   None
                    }));
                }
                let join_table_name = match collection.join_table {
                    Some(name) => name.to_owned(),
                    None => format!("{}_{}", owner_model.name, attribute.name)
                };
                let join_table = ctx.resolve_table(&join_table_name);
                let owner_name = match collection.join_column {
                    Some(name) => name.to_owned(),
                    None => format!("{}_id", owner_model.name.to_lowercase())
                };
                let element_name = match (collection.target, collection.inverse_join_column) {
                    (_, Some(name)) => name.to_owned(),
                    (Some(_), None) => format!("{}_id", attribute.name),
                    (None, None) => {
                        collection.value_column.unwrap_or(attribute.name).to_owned()
                    }
                };
                Ok(Property::Collection(CollectionProperty {
                    name:           attribute.name.to_owned(),
                    mapped_by:      None,
                    join_table:     Some(join_table),
                    owner_column:   Some(ctx.resolve_column(join_table, &owner_name)),
                    element_column: Some(ctx.resolve_column(join_table, &element_name)),
                    order_column:   collection
                        .order_column
                        .map(|name| ctx.resolve_column(join_table, name))
                }))
            }
            AttributeKind::Map(map) => {
                let join_table_name = match map.join_table {
                    Some(name) => name.to_owned(),
                    None => format!("{}_{}", owner_model.name, attribute.name)
                };
                let join_table = ctx.resolve_table(&join_table_name);
                let owner_name = match map.join_column {
                    Some(name) => name.to_owned(),
                    None => format!("{}_id", owner_model.name.to_lowercase())
                };
                let key_name = match map.key_column {
                    Some(name) => name.to_owned(),
                    None => format!("{}_key", attribute.name)
                };
                let value_name = match (map.target, map.inverse_join_column) {
                    (_, Some(name)) => name.to_owned(),
                    (Some(_), None) => format!("{}_id", attribute.name),
                    (None, None) => map.value_column.unwrap_or(attribute.name).to_owned()
                };
                Ok(Property::Map(MapProperty {
                    name:         attribute.name.to_owned(),
                    join_table,
                    owner_column: ctx.resolve_column(join_table, &owner_name),
                    key_column:   ctx.resolve_column(join_table, &key_name),
                    value_column: ctx.resolve_column(join_table, &value_name)
                }))
            }
            AttributeKind::Id(_) | AttributeKind::EmbeddedId(_) => Err(GeneratorError::model(
                format!("id attribute '{}' outside the id stage", attribute.name)
            ))
        }
    }

    fn build_primitive(
        &self,
        ctx: &GeneratorContext,
        attribute: &AttributeModel,
        column: &ColumnModel,
        table: GeneratorTable
    ) -> PrimitiveProperty {
        let name = column.name.unwrap_or(attribute.name);
        PrimitiveProperty {
            name:     attribute.name.to_owned(),
            column:   ctx.resolve_column(table, name),
            required: attribute.required || !column.nullable,
            unique:   column.unique
        }
    }

    fn build_embedded(
        &self,
        ctx: &GeneratorContext,
        attribute_name: &str,
        embedded: &EmbeddedModel,
        id: bool,
        table: GeneratorTable
    ) -> Result<EmbeddedProperty> {
        let embeddable = (embedded.embeddable)();
        let mut properties = BTreeMap::new();
        for sub_attribute in embeddable.attributes {
            let attribute_override = embedded
                .attribute_overrides
                .iter()
                .find(|o| o.name == sub_attribute.name)
                .map(|o| o.column);
            let association_override = embedded
                .association_overrides
                .iter()
                .find(|o| o.name == sub_attribute.name)
                .map(|o| o.join_column);

            let property = match &sub_attribute.kind {
                AttributeKind::Basic(column) => {
                    let column_model = attribute_override.or(*column).unwrap_or(DEFAULT_COLUMN);
                    Property::Primitive(self.build_primitive(
                        ctx,
                        sub_attribute,
                        &column_model,
                        table
                    ))
                }
                AttributeKind::Reference(reference) => {
                    let join_column = association_override
                        .or(reference.join_column)
                        .unwrap_or(JoinColumnModel {
                            name:     None,
                            nullable: true,
                            unique:   false
                        });
                    let column_name = match join_column.name {
                        Some(name) => name.to_owned(),
                        None => format!("{}_id", sub_attribute.name)
                    };
                    Property::Reference(ReferenceProperty {
                        name:     sub_attribute.name.to_owned(),
                        column:   ctx.resolve_column(table, &column_name),
                        required: sub_attribute.required || !join_column.nullable,
                        unique:   join_column.unique,
                        id_field: reference.id_field.map(str::to_owned)
                    })
                }
                AttributeKind::Embedded(inner) => Property::Embedded(self.build_embedded(
                    ctx,
                    sub_attribute.name,
                    inner,
                    false,
                    table
                )?),
                _ => {
                    return Err(GeneratorError::model(format!(
                        "embeddable '{}' has unsupported attribute '{}'",
                        embeddable.name, sub_attribute.name
                    )));
                }
            };
            properties.insert(sub_attribute.name.to_owned(), Rc::new(property));
        }
        Ok(EmbeddedProperty {
            name: attribute_name.to_owned(),
            id,
            properties
        })
    }

    fn singular_unique_quality(
        &self,
        ctx: &GeneratorContext,
        property: &Rc<Property>
    ) -> Option<UniquePropertyQuality> {
        if ctx.settings().max_unique_properties == 0 {
            return None;
        }
        let unique = match &**property {
            Property::Primitive(p) => p.unique,
            Property::Reference(r) => r.unique,
            _ => false
        };
        if !unique {
            return None;
        }
        UniquePropertyQuality::of(property)
    }

    fn is_better_quality(
        ctx: &GeneratorContext,
        current: Option<UniquePropertyQuality>,
        found: UniquePropertyQuality
    ) -> bool {
        current.is_none_or(|current| current > found)
            && found <= ctx.settings().unique_property_quality
    }

    // ------------------------------------------------------------------
    // Write state
    // ------------------------------------------------------------------

    fn joined_root(self: &Rc<Self>, ctx: &GeneratorContext) -> Result<Rc<Self>> {
        match self.joined_parent_name() {
            Some(parent) => ctx.description_by_name(parent)?.joined_root(ctx),
            None => Ok(self.clone())
        }
    }

    fn state_key(&self, entity: &EntityHandle) -> Result<StateKey> {
        let id_property = self.id_property();
        if matches!(&*id_property, Property::GeneratedId(_)) {
            return Ok(StateKey::Identity(EntityId::of(entity)));
        }
        let receiver = Receiver::Entity(entity.clone());
        let key = match &*id_property {
            Property::Embedded(embedded) => {
                let mut parts = Vec::with_capacity(embedded.properties.len());
                for (name, _) in &embedded.properties {
                    let Value::Embedded(value) = receiver.attribute(&embedded.name) else {
                        return Err(GeneratorError::model(format!(
                            "missing embedded id for entity of type '{}'",
                            self.model.name
                        )));
                    };
                    let part = value.attribute(name).state_key().ok_or_else(|| {
                        GeneratorError::model(format!(
                            "missing id component '{name}' for entity of type '{}'",
                            self.model.name
                        ))
                    })?;
                    parts.push(format!("{name}={part}"));
                }
                parts.join(";")
            }
            property => {
                let value = receiver.attribute(property.name());
                value.state_key().ok_or_else(|| {
                    GeneratorError::model(format!(
                        "missing id for entity of type '{}'",
                        self.model.name
                    ))
                })?
            }
        };
        Ok(StateKey::Literal(key))
    }

    /// Whether the entity was neither written in this run nor marked as
    /// pre-existing.
    pub fn is_new(self: &Rc<Self>, ctx: &GeneratorContext, entity: &EntityHandle) -> Result<bool> {
        let root = self.joined_root(ctx)?;
        if root.references.borrow().contains(&EntityId::of(entity)) {
            return Ok(false);
        }
        if let Property::GeneratedId(generated) = &*root.id_property() {
            match generated.raw_id(entity) {
                None => return Ok(true),
                Some(value) => {
                    if !generated.primitive || value != 0 {
                        return Ok(false);
                    }
                    // A first generated value of zero is ambiguous; the
                    // state map decides.
                }
            }
        }
        let key = root.state_key(entity)?;
        Ok(!matches!(root.states.borrow().get(&key), Some(GenerationState::Persisted)))
    }

    /// Mark an entity whose row already exists in the target database.
    pub fn mark_existing_entity(
        self: &Rc<Self>,
        ctx: &GeneratorContext,
        entity: &EntityHandle
    ) -> Result<()> {
        let root = self.joined_root(ctx)?;
        if matches!(&*root.id_property(), Property::GeneratedId(_)) {
            root.references.borrow_mut().insert(EntityId::of(entity));
            root.states.borrow_mut().remove(&StateKey::Identity(EntityId::of(entity)));
        } else {
            let key = root.state_key(entity)?;
            root.states.borrow_mut().insert(key, GenerationState::Persisted);
        }
        Ok(())
    }

    /// Queue a deferred action to run once `pending_target` is written.
    pub fn mark_pending_updates(
        self: &Rc<Self>,
        ctx: &GeneratorContext,
        pending_target: &EntityHandle,
        entity_to_update: &EntityHandle,
        property: &str,
        arguments: Vec<Value>
    ) -> Result<()> {
        let root = self.joined_root(ctx)?;
        let key = root.state_key(pending_target)?;
        let mut states = root.states.borrow_mut();
        match states.entry(key).or_insert_with(|| GenerationState::Pending(Vec::new())) {
            GenerationState::Pending(actions) => {
                actions.push(PendingAction {
                    entity_to_update: entity_to_update.clone(),
                    property: property.to_owned(),
                    arguments
                });
                Ok(())
            }
            GenerationState::Persisted => Err(GeneratorError::model(format!(
                "entity of type '{}' is already persisted; pending update is too late",
                root.model.name
            )))
        }
    }

    /// Assign a freshly generated id right after the row INSERT.
    pub fn assign_generated_id(
        self: &Rc<Self>,
        ctx: &GeneratorContext,
        entity: &EntityHandle
    ) -> Result<()> {
        let root = self.joined_root(ctx)?;
        if let Property::GeneratedId(generated) = &*root.id_property() {
            generated.post_insert(ctx, entity)?;
        }
        Ok(())
    }

    /// Mark the entity as written and flush its queued actions in FIFO
    /// order.
    pub fn create_post_insert_statements(
        self: &Rc<Self>,
        ctx: &GeneratorContext,
        entity: &EntityHandle,
        writer: &mut dyn StatementsWriter
    ) -> Result<()> {
        let root = self.joined_root(ctx)?;
        let key = root.state_key(entity)?;

        let keep_persisted_entry = match &*root.id_property() {
            Property::GeneratedId(generated) => {
                // The first generated value may be zero; only then the
                // map entry is needed to tell the entity from new ones.
                generated.primitive && generated.raw_id(entity) == Some(0)
            }
            _ => true
        };

        let old_state = if keep_persisted_entry {
            root.states.borrow_mut().insert(key, GenerationState::Persisted)
        } else {
            root.states.borrow_mut().remove(&key)
        };

        if let Some(GenerationState::Pending(actions)) = old_state {
            for action in actions {
                let descriptor = ctx.description_of(&action.entity_to_update)?;
                let property =
                    descriptor.find_property(ctx, &action.property)?.ok_or_else(|| {
                        GeneratorError::model(format!(
                            "pending update names unknown attribute '{}' of '{}'",
                            action.property,
                            descriptor.entity_name()
                        ))
                    })?;
                property.write_pending(
                    ctx,
                    writer,
                    &action.entity_to_update,
                    entity,
                    &action.arguments
                )?;
            }
        }
        Ok(())
    }

    /// Number of deferred actions still waiting for entities of this
    /// descriptor.
    pub fn residual_pending_actions(&self) -> usize {
        self.states
            .borrow()
            .values()
            .map(|state| match state {
                GenerationState::Pending(actions) => actions.len(),
                GenerationState::Persisted => 0
            })
            .sum()
    }

    // ------------------------------------------------------------------
    // Reference expressions
    // ------------------------------------------------------------------

    /// Expression referencing the id of `entity`, choosing between the
    /// literal id, `currval`, and the unique-key sub-select.
    pub fn get_entity_reference(
        self: &Rc<Self>,
        ctx: &GeneratorContext,
        entity: &EntityHandle,
        id_field: Option<&str>,
        for_where: bool
    ) -> Result<String> {
        if let Some(parent) = self.joined_parent_name() {
            return ctx.description_by_name(parent)?.get_entity_reference(
                ctx,
                entity,
                id_field,
                for_where
            );
        }

        let id_property = self.id_property();
        let receiver = Receiver::Entity(entity.clone());

        if let Property::GeneratedId(generated) = &*id_property {
            if ctx.settings().write_relative_ids {
                return self.generated_id_reference(ctx, entity, generated, for_where);
            }
            return generated.expression(ctx, &receiver, for_where)?.ok_or_else(|| {
                GeneratorError::model(format!(
                    "no id assigned yet for entity of type '{}'",
                    self.model.name
                ))
            });
        }

        let property = match &*id_property {
            Property::Embedded(embedded) => match id_field {
                Some(field) => embedded.property(field).ok_or_else(|| {
                    GeneratorError::model(format!(
                        "id reference '{field}' not found in embedded id of '{}'",
                        self.model.name
                    ))
                })?,
                None => embedded.single_property().ok_or_else(|| {
                    GeneratorError::model(format!(
                        "ambiguous access to composite id of '{}': an id field is required",
                        self.model.name
                    ))
                })?
            },
            _ => id_property.clone()
        };

        property.expression(ctx, &receiver, for_where)?.ok_or_else(|| {
            GeneratorError::model(format!(
                "can't find any id for entity of type '{}'",
                self.model.name
            ))
        })
    }

    /// Relative reference to a generated id: `currval` when it is the
    /// sequence's latest value, the unique-key sub-select when every
    /// component has a predicate, the tracked expression otherwise.
    fn generated_id_reference(
        self: &Rc<Self>,
        ctx: &GeneratorContext,
        entity: &EntityHandle,
        generated: &GeneratedIdProperty,
        for_where: bool
    ) -> Result<String> {
        let receiver = Receiver::Entity(entity.clone());
        let is_reference = self.references.borrow().contains(&EntityId::of(entity));

        if !is_reference
            && ctx.settings().prefer_sequence_current_value
            && generated.is_current_sequence_value(ctx, entity)?
        {
            if let Some(expression) = generated.expression(ctx, &receiver, for_where)? {
                return Ok(expression);
            }
        }

        let unique_properties = self.unique_properties();
        if !unique_properties.is_empty() {
            let mut condition = String::new();
            let mut complete = true;
            for property in &unique_properties {
                match property.predicate(ctx, &receiver)? {
                    Some(predicate) => {
                        if !condition.is_empty() {
                            condition.push_str(" AND ");
                        }
                        condition.push_str(&predicate);
                    }
                    None => {
                        // A unique component without a predicate makes
                        // the sub-select ambiguous; fall back to the id.
                        complete = false;
                        break;
                    }
                }
            }
            if complete {
                if let Some((column, literal)) = self.discriminator() {
                    condition.push_str(" AND ");
                    condition.push_str(&ctx.column_name(column));
                    condition.push_str(" = ");
                    condition.push_str(&literal);
                }
                return Ok(format!(
                    "(SELECT {} FROM {} WHERE {condition})",
                    ctx.column_name(generated.column),
                    ctx.table_name(self.table())
                ));
            }
        }

        generated.expression(ctx, &receiver, for_where)?.ok_or_else(|| {
            GeneratorError::model(format!(
                "entity of type '{}' has neither an id nor a usable unique key",
                self.model.name
            ))
        })
    }

    /// Predicate identifying the row of `entity` within `table`, used
    /// by deferred updates.
    pub fn table_row_predicate(
        self: &Rc<Self>,
        ctx: &GeneratorContext,
        entity: &EntityHandle,
        table: GeneratorTable
    ) -> Result<String> {
        if table == self.table() {
            if let (Some(join_column), Some(_)) =
                (self.primary_key_join_column(), self.joined_parent_name())
            {
                let reference = self.get_entity_reference(ctx, entity, None, true)?;
                return Ok(format!("{} = {reference}", ctx.column_name(join_column)));
            }
            let receiver = Receiver::Entity(entity.clone());
            return self.id_property().predicate(ctx, &receiver)?.ok_or_else(|| {
                GeneratorError::model(format!(
                    "can't identify the row of an entity of type '{}'",
                    self.model.name
                ))
            });
        }
        match self.joined_parent_name() {
            Some(parent) => {
                ctx.description_by_name(parent)?.table_row_predicate(ctx, entity, table)
            }
            None => Err(GeneratorError::model(format!(
                "entity of type '{}' has no row in table '{}'",
                self.model.name,
                ctx.table_name(table)
            )))
        }
    }
}

/// 31-multiply wrapping string hash.
///
/// Bit-stable across runs and platforms, so integer discriminators stay
/// identical between generations.
fn stable_hash(text: &str) -> i32 {
    let mut hash = 0_i32;
    for unit in text.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_hash_matches_known_values() {
        assert_eq!(stable_hash(""), 0);
        assert_eq!(stable_hash("a"), 97);
        assert_eq!(stable_hash("Dog"), 68892);
    }

    #[test]
    fn stable_hash_is_order_sensitive() {
        assert_ne!(stable_hash("ab"), stable_hash("ba"));
    }
}
