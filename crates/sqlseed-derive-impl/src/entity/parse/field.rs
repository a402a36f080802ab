// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Field-level parsing: attribute markers plus type classification.
//!
//! The persistent kind of a field follows from its annotations first
//! and its type second: `Ref<T>` fields become references, `Vec` and
//! `BTreeMap` fields become collections and maps, everything else is a
//! basic column. `Vec<u8>` stays a basic binary column.

use darling::{Error, FromMeta};
use syn::{Field, GenericArgument, Ident, Meta, PathArguments, PathSegment, Type};

use super::attrs::{
    AssociationOverrideAttr, AttributeOverrideAttr, CollectionAttr, ColumnAttr, GeneratedAttr,
    JoinColumnAttr, MapKeyAttr, OneToOneAttr
};

/// Element side of a collection or map.
#[derive(Debug)]
pub enum ElementType {
    /// `Ref<T>` elements referencing another entity.
    Entity(Type),
    /// Scalar elements stored in a value column.
    Scalar(Type)
}

/// The persistent kind of one field.
#[derive(Debug)]
pub enum FieldKind {
    /// `#[id]`, singular.
    Id {
        /// `#[generated(..)]` settings, if the id is generated.
        generated: Option<GeneratedAttr>,
        /// `#[column(..)]`, if declared.
        column:    Option<ColumnAttr>
    },
    /// `#[embedded_id]`, a composite id held in an embeddable.
    EmbeddedId {
        /// The embeddable type.
        target: Type
    },
    /// A plain scalar column.
    Basic {
        /// `#[column(..)]`, if declared.
        column: Option<ColumnAttr>
    },
    /// `#[version]`, the optimistic lock column.
    Version {
        /// `#[column(..)]`, if declared.
        column: Option<ColumnAttr>
    },
    /// `#[embedded]`, a value object flattened into the row.
    Embedded {
        /// The embeddable type.
        target:                Type,
        /// `#[attribute_override(..)]` entries at this site.
        attribute_overrides:   Vec<AttributeOverrideAttr>,
        /// `#[association_override(..)]` entries at this site.
        association_overrides: Vec<AssociationOverrideAttr>
    },
    /// A singular association through `Ref<T>`.
    Reference {
        /// The referenced entity type.
        target:      Type,
        /// `#[join_column(..)]`, if declared.
        join_column: Option<JoinColumnAttr>,
        /// Whether this is the owning side of a one-to-one.
        one_to_one:  bool
    },
    /// A `Vec` of entity references or scalars.
    Collection {
        /// Element side.
        element: ElementType,
        /// Collection attribute settings.
        attr:    CollectionAttr
    },
    /// A `BTreeMap` keyed by scalars.
    Map {
        /// Key type.
        key:        Type,
        /// Value side.
        value:      ElementType,
        /// Collection attribute settings.
        attr:       CollectionAttr,
        /// `#[map_key(column = ..)]`, if declared.
        key_column: Option<String>
    },
    /// `#[parent]`, the embedded superclass part.
    Parent,
    /// Not persistent: `#[transient]` or the inverse side of a
    /// one-to-one.
    Transient
}

/// One parsed field of the entity struct.
#[derive(Debug)]
pub struct FieldDef {
    /// Field identifier.
    pub ident:    Ident,
    /// Leaf type with a top-level `Option` stripped.
    pub leaf:     Type,
    /// Whether the declared type was `Option<..>`.
    pub optional: bool,
    /// Persistent kind.
    pub kind:     FieldKind
}

impl FieldDef {
    /// Attribute name used by the runtime contract.
    pub fn name(&self) -> String {
        self.ident.to_string()
    }

    /// Parse one named field.
    pub fn from_field(field: &Field) -> Result<Self, Error> {
        let ident = field.ident.clone().ok_or_else(|| {
            Error::custom("Entity requires named fields").with_span(&field.ty)
        })?;

        let mut is_id = false;
        let mut is_embedded_id = false;
        let mut is_version = false;
        let mut is_embedded = false;
        let mut is_parent = false;
        let mut is_transient = false;
        let mut is_many_to_one = false;
        let mut generated: Option<GeneratedAttr> = None;
        let mut column: Option<ColumnAttr> = None;
        let mut join_column: Option<JoinColumnAttr> = None;
        let mut one_to_one: Option<OneToOneAttr> = None;
        let mut collection: Option<CollectionAttr> = None;
        let mut map_key: Option<MapKeyAttr> = None;
        let mut attribute_overrides = Vec::new();
        let mut association_overrides = Vec::new();

        for attr in &field.attrs {
            let path = attr.path();
            if path.is_ident("id") {
                is_id = true;
            } else if path.is_ident("embedded_id") {
                is_embedded_id = true;
            } else if path.is_ident("version") {
                is_version = true;
            } else if path.is_ident("embedded") {
                is_embedded = true;
            } else if path.is_ident("parent") {
                is_parent = true;
            } else if path.is_ident("transient") {
                is_transient = true;
            } else if path.is_ident("many_to_one") {
                is_many_to_one = true;
            } else if path.is_ident("generated") {
                generated = Some(parse_defaultable(attr)?);
            } else if path.is_ident("column") {
                column = Some(ColumnAttr::from_meta(&attr.meta)?);
            } else if path.is_ident("join_column") {
                join_column = Some(JoinColumnAttr::from_meta(&attr.meta)?);
            } else if path.is_ident("one_to_one") {
                one_to_one = Some(parse_defaultable(attr)?);
            } else if path.is_ident("one_to_many")
                || path.is_ident("many_to_many")
                || path.is_ident("element_collection")
            {
                collection = Some(parse_defaultable(attr)?);
            } else if path.is_ident("map_key") {
                map_key = Some(MapKeyAttr::from_meta(&attr.meta)?);
            } else if path.is_ident("attribute_override") {
                attribute_overrides.push(AttributeOverrideAttr::from_meta(&attr.meta)?);
            } else if path.is_ident("association_override") {
                association_overrides.push(AssociationOverrideAttr::from_meta(&attr.meta)?);
            }
        }

        let (leaf, optional) = strip_option(&field.ty);
        let leaf = leaf.clone();

        if is_parent {
            return Ok(Self {
                ident,
                leaf,
                optional,
                kind: FieldKind::Parent
            });
        }
        if is_transient {
            return Ok(Self {
                ident,
                leaf,
                optional,
                kind: FieldKind::Transient
            });
        }

        let kind = if is_embedded_id {
            FieldKind::EmbeddedId {
                target: leaf.clone()
            }
        } else if is_id {
            if generated.is_some() && !is_i64(&leaf) {
                return Err(Error::custom("a generated id must be i64 or Option<i64>")
                    .with_span(&ident));
            }
            FieldKind::Id { generated, column }
        } else if is_version {
            FieldKind::Version { column }
        } else if is_embedded {
            FieldKind::Embedded {
                target: leaf.clone(),
                attribute_overrides,
                association_overrides
            }
        } else if let Some(target) = ref_target(&leaf) {
            match &one_to_one {
                Some(attr) if attr.mapped_by.is_some() => FieldKind::Transient,
                _ => FieldKind::Reference {
                    target:     target.clone(),
                    join_column,
                    one_to_one: one_to_one.is_some()
                }
            }
        } else if let Some(element) = vec_element(&leaf) {
            FieldKind::Collection {
                element,
                attr: collection.unwrap_or_default()
            }
        } else if let Some((key, value)) = map_entry(&leaf) {
            FieldKind::Map {
                key,
                value,
                attr: collection.unwrap_or_default(),
                key_column: map_key.and_then(|attr| attr.column)
            }
        } else if collection.is_some() {
            return Err(Error::custom("collection attributes need a Vec or BTreeMap field")
                .with_span(&ident));
        } else if is_many_to_one {
            return Err(Error::custom("#[many_to_one] needs a Ref<T> field").with_span(&ident));
        } else {
            FieldKind::Basic { column }
        };

        Ok(Self {
            ident,
            leaf,
            optional,
            kind
        })
    }
}

/// Parse an attribute that may appear bare (`#[generated]`) or with a
/// list (`#[generated(strategy = "table")]`).
fn parse_defaultable<T: FromMeta + Default>(attr: &syn::Attribute) -> Result<T, Error> {
    match &attr.meta {
        Meta::Path(_) => Ok(T::default()),
        meta => T::from_meta(meta).map_err(Into::into)
    }
}

fn last_segment(ty: &Type) -> Option<&PathSegment> {
    match ty {
        Type::Path(path) => path.path.segments.last(),
        _ => None
    }
}

fn generic_types(segment: &PathSegment) -> Vec<&Type> {
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None
            })
            .collect(),
        _ => Vec::new()
    }
}

fn strip_option(ty: &Type) -> (&Type, bool) {
    if let Some(segment) = last_segment(ty)
        && segment.ident == "Option"
        && let [inner] = generic_types(segment)[..]
    {
        return (inner, true);
    }
    (ty, false)
}

fn is_i64(ty: &Type) -> bool {
    last_segment(ty).is_some_and(|segment| segment.ident == "i64")
}

fn is_u8(ty: &Type) -> bool {
    last_segment(ty).is_some_and(|segment| segment.ident == "u8")
}

fn ref_target(ty: &Type) -> Option<&Type> {
    let segment = last_segment(ty)?;
    if segment.ident != "Ref" {
        return None;
    }
    match generic_types(segment)[..] {
        [inner] => Some(inner),
        _ => None
    }
}

/// `Vec<Ref<T>>` and `Vec<scalar>` are collections; `Vec<u8>` stays a
/// binary column.
fn vec_element(ty: &Type) -> Option<ElementType> {
    let segment = last_segment(ty)?;
    if segment.ident != "Vec" {
        return None;
    }
    let [inner] = generic_types(segment)[..] else {
        return None;
    };
    if is_u8(inner) {
        return None;
    }
    Some(match ref_target(inner) {
        Some(target) => ElementType::Entity(target.clone()),
        None => ElementType::Scalar(inner.clone())
    })
}

fn map_entry(ty: &Type) -> Option<(Type, ElementType)> {
    let segment = last_segment(ty)?;
    if segment.ident != "BTreeMap" {
        return None;
    }
    let [key, value] = generic_types(segment)[..] else {
        return None;
    };
    let element = match ref_target(value) {
        Some(target) => ElementType::Entity(target.clone()),
        None => ElementType::Scalar(value.clone())
    };
    Some((key.clone(), element))
}
