// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Polymorphic attribute descriptors.
//!
//! Every persistent attribute of an entity resolves to one [`Property`]
//! variant. A property knows how to contribute to the INSERT of its row,
//! which statements to emit before and after that INSERT, and which other
//! entities it reads from the receiver.

mod collection;
mod embedded;
mod primitive;
mod reference;

use std::collections::BTreeMap;

pub use collection::{CollectionProperty, MapProperty};
pub use embedded::EmbeddedProperty;
pub use primitive::{GeneratedIdProperty, PrimitiveProperty, VersionProperty};
pub use reference::ReferenceProperty;

use crate::{
    context::{GeneratorContext, registry::GeneratorColumn},
    entity::{EmbeddedHandle, EntityHandle},
    error::Result,
    statements::{InsertStatement, StatementsWriter},
    value::Value
};

/// Ranks how well a set of unique properties identifies a row.
///
/// Declared best first; a smaller rank is a better quality. The
/// configured threshold decides which alternates may replace an id in a
/// sub-select.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum UniquePropertyQuality {
    /// Only primitive columns that can never be NULL.
    OnlyRequiredPrimitives,
    /// Only columns that can never be NULL.
    OnlyRequired,
    /// Only primitive columns, possibly NULL.
    OnlyPrimitives,
    /// Any singular column.
    AllowsNulls
}

impl UniquePropertyQuality {
    /// Parse a settings value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "only-required-primitives" => Some(Self::OnlyRequiredPrimitives),
            "only-required" => Some(Self::OnlyRequired),
            "only-primitives" => Some(Self::OnlyPrimitives),
            "allows-nulls" => Some(Self::AllowsNulls),
            _ => None
        }
    }

    /// Quality of a single property, or `None` when the property can
    /// never identify a row.
    pub fn of(property: &Property) -> Option<Self> {
        match property {
            Property::Primitive(p) => {
                if p.is_required() {
                    Some(Self::OnlyRequiredPrimitives)
                } else {
                    Some(Self::OnlyPrimitives)
                }
            }
            Property::Reference(r) => {
                if r.is_required() {
                    Some(Self::OnlyRequired)
                } else {
                    Some(Self::AllowsNulls)
                }
            }
            _ => None
        }
    }
}

/// Where a property reads its values from.
///
/// Entity properties read from the entity itself; the sub-properties of
/// an embedded value read from the embedded value while statements still
/// target the owning entity's row.
#[derive(Clone)]
pub enum Receiver {
    /// A top-level entity.
    Entity(EntityHandle),
    /// An embedded value.
    Embedded(EmbeddedHandle)
}

impl Receiver {
    /// Read one attribute from the receiver.
    pub fn attribute(&self, name: &str) -> Value {
        match self {
            Self::Entity(handle) => handle.borrow().attribute(name),
            Self::Embedded(handle) => handle.attribute(name)
        }
    }
}

/// One persistent attribute of an entity class.
#[derive(Debug)]
pub enum Property {
    /// Scalar column.
    Primitive(PrimitiveProperty),
    /// Optimistic lock column.
    Version(VersionProperty),
    /// Generated singular identifier.
    GeneratedId(GeneratedIdProperty),
    /// Embedded value object, possibly the composite id.
    Embedded(EmbeddedProperty),
    /// Singular association to another entity.
    Reference(ReferenceProperty),
    /// Collection emitting join table rows or foreign-side updates.
    Collection(CollectionProperty),
    /// Map emitting join table rows with a key column.
    Map(MapProperty)
}

impl Property {
    /// Declared attribute name.
    pub fn name(&self) -> &str {
        match self {
            Self::Primitive(p) => &p.name,
            Self::Version(p) => &p.name,
            Self::GeneratedId(p) => &p.name,
            Self::Embedded(p) => &p.name,
            Self::Reference(p) => &p.name,
            Self::Collection(p) => &p.name,
            Self::Map(p) => &p.name
        }
    }

    /// Whether a value must be present when inserting the row.
    pub fn is_required(&self) -> bool {
        match self {
            Self::Primitive(p) => p.is_required(),
            Self::Version(_) => true,
            Self::GeneratedId(_) => false,
            Self::Embedded(p) => p.is_required(),
            Self::Reference(p) => p.is_required(),
            Self::Collection(_) | Self::Map(_) => false
        }
    }

    /// Whether this property occupies columns of the entity's own row.
    pub fn is_table_column(&self) -> bool {
        !matches!(self, Self::Collection(_) | Self::Map(_))
    }

    /// The single column of a singular property, if it has one.
    pub fn column(&self) -> Option<GeneratorColumn> {
        match self {
            Self::Primitive(p) => Some(p.column),
            Self::Version(p) => Some(p.column),
            Self::GeneratedId(p) => Some(p.column),
            Self::Reference(p) => Some(p.column),
            _ => None
        }
    }

    /// Contribute this property's columns to the row INSERT.
    pub fn add_insert_expression(
        &self,
        ctx: &GeneratorContext,
        owner: &EntityHandle,
        receiver: &Receiver,
        statement: &mut InsertStatement
    ) -> Result<()> {
        match self {
            Self::Primitive(p) => p.add_insert_expression(ctx, receiver, statement),
            Self::Version(p) => p.add_insert_expression(ctx, receiver, statement),
            Self::GeneratedId(p) => p.add_insert_expression(ctx, receiver, statement),
            Self::Embedded(p) => p.add_insert_expression(ctx, owner, receiver, statement),
            Self::Reference(p) => p.add_insert_expression(ctx, owner, receiver, statement),
            Self::Collection(_) | Self::Map(_) => Ok(())
        }
    }

    /// Emit statements that must precede the row INSERT.
    pub fn create_pre_insert_statements(
        &self,
        ctx: &GeneratorContext,
        owner: &EntityHandle,
        receiver: &Receiver,
        writer: &mut dyn StatementsWriter
    ) -> Result<()> {
        match self {
            Self::GeneratedId(p) => p.create_pre_insert_statements(ctx, writer),
            Self::Embedded(p) => p.create_pre_insert_statements(ctx, owner, receiver, writer),
            _ => Ok(())
        }
    }

    /// Emit statements that follow the row INSERT, such as join table
    /// rows.
    pub fn create_post_insert_statements(
        &self,
        ctx: &GeneratorContext,
        owner: &EntityHandle,
        receiver: &Receiver,
        writer: &mut dyn StatementsWriter
    ) -> Result<()> {
        match self {
            Self::Embedded(p) => p.create_post_insert_statements(ctx, owner, receiver, writer),
            Self::Collection(p) => p.create_post_insert_statements(ctx, owner, receiver, writer),
            Self::Map(p) => p.create_post_insert_statements(ctx, owner, receiver, writer),
            _ => Ok(())
        }
    }

    /// Entities this property reads from the receiver, used to order
    /// insertion and to register pending states.
    pub fn find_referenced_entities(&self, receiver: &Receiver) -> Vec<EntityHandle> {
        match self {
            Self::Embedded(p) => p.find_referenced_entities(receiver),
            Self::Reference(p) => p.find_referenced_entities(receiver),
            Self::Collection(p) => p.find_referenced_entities(receiver),
            Self::Map(p) => p.find_referenced_entities(receiver),
            _ => Vec::new()
        }
    }

    /// Referenced entities that must exist before the owning row can be
    /// inserted: targets of non-nullable references, including those
    /// inside embedded values.
    pub fn find_required_references(&self, receiver: &Receiver) -> Vec<EntityHandle> {
        match self {
            Self::Reference(p) if p.is_required() => p.find_referenced_entities(receiver),
            Self::Embedded(p) => p.find_required_references(receiver),
            _ => Vec::new()
        }
    }

    /// Column expression of the current value, or `None` when it cannot
    /// be expressed yet.
    pub fn expression(
        &self,
        ctx: &GeneratorContext,
        receiver: &Receiver,
        for_where: bool
    ) -> Result<Option<String>> {
        match self {
            Self::Primitive(p) => p.expression(ctx, receiver),
            Self::Version(p) => p.expression(ctx, receiver),
            Self::GeneratedId(p) => p.expression(ctx, receiver, for_where),
            Self::Reference(p) => p.expression(ctx, receiver, for_where),
            Self::Embedded(_) | Self::Collection(_) | Self::Map(_) => Ok(None)
        }
    }

    /// Predicate identifying rows by this property's current value, or
    /// `None` when the value has no usable predicate.
    pub fn predicate(&self, ctx: &GeneratorContext, receiver: &Receiver) -> Result<Option<String>> {
        match self {
            Self::Primitive(p) => p.predicate(ctx, receiver),
            Self::Version(p) => p.predicate(ctx, receiver),
            Self::GeneratedId(p) => p.predicate(ctx, receiver),
            Self::Embedded(p) => p.predicate(ctx, receiver),
            Self::Reference(p) => p.predicate(ctx, receiver),
            Self::Collection(_) | Self::Map(_) => Ok(None)
        }
    }

    /// Replay a deferred action after the referenced entity was written.
    pub fn write_pending(
        &self,
        ctx: &GeneratorContext,
        writer: &mut dyn StatementsWriter,
        entity_to_update: &EntityHandle,
        written: &EntityHandle,
        arguments: &[Value]
    ) -> Result<()> {
        match self {
            Self::Reference(p) => p.write_pending(ctx, writer, entity_to_update, written),
            Self::Collection(p) => {
                p.write_pending(ctx, writer, entity_to_update, written, arguments)
            }
            Self::Map(p) => p.write_pending(ctx, writer, entity_to_update, written, arguments),
            _ => Ok(())
        }
    }
}

/// Sorted property map used by descriptors for name lookup.
pub type PropertyMap = BTreeMap<String, std::rc::Rc<Property>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_ordering_is_best_first() {
        assert!(UniquePropertyQuality::OnlyRequiredPrimitives < UniquePropertyQuality::OnlyRequired);
        assert!(UniquePropertyQuality::OnlyRequired < UniquePropertyQuality::OnlyPrimitives);
        assert!(UniquePropertyQuality::OnlyPrimitives < UniquePropertyQuality::AllowsNulls);
    }

    #[test]
    fn quality_parses_settings_values() {
        assert_eq!(
            UniquePropertyQuality::from_name("only-required"),
            Some(UniquePropertyQuality::OnlyRequired)
        );
        assert_eq!(UniquePropertyQuality::from_name("anything"), None);
    }
}
