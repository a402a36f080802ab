// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Declarative entity metadata.
//!
//! `#[derive(Entity)]` and `#[derive(Embeddable)]` emit one `&'static`
//! [`EntityModel`] / [`EmbeddableModel`] per annotated struct, mirroring
//! the source annotations verbatim. The generator context turns these
//! models into resolved descriptors; nothing in the core ever inspects a
//! source type directly.
//!
//! Everything here is `const`-constructible so the derive can place the
//! whole model into a single `static`.

/// Whether a model describes a table-backed entity or a mapped
/// superclass that only contributes attributes to its subclasses.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntityKind {
    /// A persistent entity with its own descriptor.
    Entity,
    /// A mapped superclass; never instantiated on its own.
    MappedSuperclass
}

/// Declared inheritance strategy of a hierarchy.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InheritanceKind {
    /// All classes of the hierarchy share the root table.
    SingleTable,
    /// Each subclass has its own table keyed by the root id.
    Joined,
    /// Each concrete class has a standalone table.
    TablePerClass
}

/// Literal type of a discriminator column.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DiscriminatorKind {
    /// String literal, truncated to the declared length.
    String,
    /// Single character literal.
    Char,
    /// Integer literal derived from a stable string hash.
    Integer
}

/// Declared discriminator column of a hierarchy root.
#[derive(Clone, Copy, Debug)]
pub struct DiscriminatorColumnModel {
    /// Column name.
    pub name:   &'static str,
    /// Literal type.
    pub kind:   DiscriminatorKind,
    /// Maximum length for string discriminators.
    pub length: u32
}

/// Default discriminator column when a hierarchy declares none.
pub const DEFAULT_DISCRIMINATOR: DiscriminatorColumnModel = DiscriminatorColumnModel {
    name:   "dtype",
    kind:   DiscriminatorKind::String,
    length: 31
};

/// How identifier values are produced.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GenerationStrategy {
    /// Pick sequences when the dialect has them, identity otherwise.
    Auto,
    /// A named database sequence.
    Sequence,
    /// A generator table holding the next value per key.
    Table,
    /// An auto-increment column filled by the database.
    Identity
}

/// A generator declared on an entity or its identifier.
#[derive(Clone, Copy, Debug)]
pub struct GeneratorModel {
    /// Generator name, referenced from `#[generated(generator = ..)]`.
    pub name:            &'static str,
    /// Producing strategy.
    pub strategy:        GenerationStrategy,
    /// Sequence name; defaults to the generator name.
    pub sequence:        Option<&'static str>,
    /// Generator table name for [`GenerationStrategy::Table`].
    pub table:           Option<&'static str>,
    /// First value handed out.
    pub initial_value:   i64,
    /// Values reserved per database round trip.
    pub allocation_size: i64
}

/// Column metadata attached to a basic attribute.
#[derive(Clone, Copy, Debug)]
pub struct ColumnModel {
    /// Column name; defaults to the attribute name.
    pub name:     Option<&'static str>,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Whether the column alone identifies a row.
    pub unique:   bool,
    /// Maximum string length.
    pub length:   u32
}

/// Column defaults used when no `#[column]` annotation is present.
pub const DEFAULT_COLUMN: ColumnModel = ColumnModel {
    name:     None,
    nullable: true,
    unique:   false,
    length:   255
};

/// Join column metadata attached to a singular association.
#[derive(Clone, Copy, Debug)]
pub struct JoinColumnModel {
    /// Column name; defaults to `<attribute>_id`.
    pub name:     Option<&'static str>,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Whether the column alone identifies a row.
    pub unique:   bool
}

/// A multi-column unique constraint declared on the entity table.
#[derive(Clone, Copy, Debug)]
pub struct UniqueConstraintModel {
    /// Column names making up the constraint.
    pub columns: &'static [&'static str]
}

/// Column override for an attribute of an embedded value or superclass.
#[derive(Clone, Copy, Debug)]
pub struct AttributeOverrideModel {
    /// Overridden attribute name.
    pub name:   &'static str,
    /// Replacement column.
    pub column: ColumnModel
}

/// Join column override for an association of an embedded value or
/// superclass.
#[derive(Clone, Copy, Debug)]
pub struct AssociationOverrideModel {
    /// Overridden attribute name.
    pub name:        &'static str,
    /// Replacement join column.
    pub join_column: JoinColumnModel
}

/// Identifier attribute metadata.
#[derive(Clone, Copy, Debug)]
pub struct IdModel {
    /// Column annotation, if any.
    pub column:    Option<ColumnModel>,
    /// Generation settings; `None` for caller-assigned ids.
    pub generated: Option<GeneratedModel>,
    /// Whether the backing field is a plain integer rather than an
    /// `Option`, so a first generated value of zero is ambiguous.
    pub primitive: bool
}

/// `#[generated(..)]` settings of an identifier.
#[derive(Clone, Copy, Debug)]
pub struct GeneratedModel {
    /// Producing strategy.
    pub strategy:  GenerationStrategy,
    /// Name of a declared [`GeneratorModel`] to use.
    pub generator: Option<&'static str>
}

/// Embedded attribute metadata.
#[derive(Clone, Copy, Debug)]
pub struct EmbeddedModel {
    /// The embeddable type's own model.
    pub embeddable:            fn() -> &'static EmbeddableModel,
    /// Column overrides declared at the embedding site.
    pub attribute_overrides:   &'static [AttributeOverrideModel],
    /// Join column overrides declared at the embedding site.
    pub association_overrides: &'static [AssociationOverrideModel]
}

/// Singular association metadata.
#[derive(Clone, Copy, Debug)]
pub struct ReferenceModel {
    /// The referenced entity's model.
    pub target:      fn() -> &'static EntityModel,
    /// Join column annotation, if any.
    pub join_column: Option<JoinColumnModel>,
    /// Whether this is the owning side of a one-to-one association.
    pub one_to_one:  bool,
    /// Attribute inside the target's composite id that this reference
    /// maps to.
    pub id_field:    Option<&'static str>
}

/// Collection attribute metadata.
#[derive(Clone, Copy, Debug)]
pub struct CollectionModel {
    /// Element entity model; `None` for scalar element collections.
    pub target:              Option<fn() -> &'static EntityModel>,
    /// Owning reference on the element side; the collection then emits
    /// foreign-side updates instead of join table rows.
    pub mapped_by:           Option<&'static str>,
    /// Join table name; defaults to `<Entity>_<attribute>`.
    pub join_table:          Option<&'static str>,
    /// FK column to the owner; defaults to `<entity>_id`.
    pub join_column:         Option<&'static str>,
    /// FK column to the element; defaults to `<attribute>_id`.
    pub inverse_join_column: Option<&'static str>,
    /// Value column for scalar elements; defaults to the attribute name.
    pub value_column:        Option<&'static str>,
    /// Optional position column preserving declared order.
    pub order_column:        Option<&'static str>
}

/// Map attribute metadata.
#[derive(Clone, Copy, Debug)]
pub struct MapModel {
    /// Value entity model; `None` for scalar values.
    pub target:              Option<fn() -> &'static EntityModel>,
    /// Join table name; defaults to `<Entity>_<attribute>`.
    pub join_table:          Option<&'static str>,
    /// FK column to the owner; defaults to `<entity>_id`.
    pub join_column:         Option<&'static str>,
    /// Key column; defaults to `<attribute>_key`.
    pub key_column:          Option<&'static str>,
    /// FK column to the value entity; defaults to `<attribute>_id`.
    pub inverse_join_column: Option<&'static str>,
    /// Value column for scalar values; defaults to the attribute name.
    pub value_column:        Option<&'static str>
}

/// The kind of one declared attribute.
#[derive(Clone, Copy, Debug)]
pub enum AttributeKind {
    /// Scalar column.
    Basic(Option<ColumnModel>),
    /// Optimistic lock column.
    Version(Option<ColumnModel>),
    /// Singular identifier.
    Id(IdModel),
    /// Composite identifier held in an embeddable.
    EmbeddedId(EmbeddedModel),
    /// Embedded value object.
    Embedded(EmbeddedModel),
    /// Singular association to another entity.
    Reference(ReferenceModel),
    /// Collection of entities or scalars.
    Collection(CollectionModel),
    /// Map keyed by scalars.
    Map(MapModel)
}

/// One persistent attribute of an entity or embeddable.
#[derive(Clone, Copy, Debug)]
pub struct AttributeModel {
    /// Attribute name, as used by [`crate::SqlEntity::attribute`].
    pub name:     &'static str,
    /// Whether a value must be present when inserting.
    pub required: bool,
    /// Attribute kind and kind-specific metadata.
    pub kind:     AttributeKind
}

impl AttributeModel {
    /// Whether this attribute holds the identifier.
    pub fn is_id(&self) -> bool {
        matches!(self.kind, AttributeKind::Id(_) | AttributeKind::EmbeddedId(_))
    }
}

/// Declarative metadata of one entity type.
#[derive(Debug)]
pub struct EntityModel {
    /// Entity name; defaults to the struct name.
    pub name: &'static str,
    /// Table name; defaults to the entity name.
    pub table: Option<&'static str>,
    /// Entity or mapped superclass.
    pub kind: EntityKind,
    /// Superclass model, reached through the `#[parent]` field.
    pub parent: Option<fn() -> &'static EntityModel>,
    /// Declared inheritance strategy, set on the hierarchy root.
    pub inheritance: Option<InheritanceKind>,
    /// Declared discriminator literal of this class.
    pub discriminator_value: Option<&'static str>,
    /// Declared discriminator column, set on the hierarchy root.
    pub discriminator_column: Option<DiscriminatorColumnModel>,
    /// Id column of a joined subclass table; defaults to the root's id
    /// column name.
    pub primary_key_join_column: Option<&'static str>,
    /// Generators declared on this class.
    pub generators: &'static [GeneratorModel],
    /// Unique constraints declared on the table.
    pub unique_constraints: &'static [UniqueConstraintModel],
    /// Column overrides for inherited attributes.
    pub attribute_overrides: &'static [AttributeOverrideModel],
    /// Join column overrides for inherited associations.
    pub association_overrides: &'static [AssociationOverrideModel],
    /// Declared attributes in field order.
    pub attributes: &'static [AttributeModel]
}

impl EntityModel {
    /// Table name, falling back to the entity name.
    pub fn table_name(&self) -> &'static str {
        self.table.unwrap_or(self.name)
    }

    /// The declared superclass model, if any.
    pub fn parent_model(&self) -> Option<&'static EntityModel> {
        self.parent.map(|parent| parent())
    }
}

/// Declarative metadata of one embeddable type.
#[derive(Debug)]
pub struct EmbeddableModel {
    /// Embeddable name; defaults to the struct name.
    pub name:       &'static str,
    /// Declared attributes in field order.
    pub attributes: &'static [AttributeModel]
}

#[cfg(test)]
mod tests {
    use super::*;

    static PLAIN: EntityModel = EntityModel {
        name: "Sample",
        table: None,
        kind: EntityKind::Entity,
        parent: None,
        inheritance: None,
        discriminator_value: None,
        discriminator_column: None,
        primary_key_join_column: None,
        generators: &[],
        unique_constraints: &[],
        attribute_overrides: &[],
        association_overrides: &[],
        attributes: &[AttributeModel {
            name:     "id",
            required: false,
            kind:     AttributeKind::Id(IdModel {
                column:    None,
                generated: None,
                primitive: false
            })
        }]
    };

    #[test]
    fn table_defaults_to_entity_name() {
        assert_eq!(PLAIN.table_name(), "Sample");
    }

    #[test]
    fn id_attribute_detection() {
        assert!(PLAIN.attributes[0].is_id());
    }
}
