// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Runtime values read from entity attributes.
//!
//! A [`Value`] is what an entity hands to the generator when asked for one
//! of its attributes. Scalar variants are turned into SQL literals by the
//! dialect; the structured variants carry handles that the property model
//! resolves into references, embedded sub-maps or join-table rows.

use std::{collections::BTreeMap, rc::Rc};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::entity::{EmbeddedHandle, EmbeddedValue, EntityHandle, Ref, SqlEntity};

/// A single attribute value.
#[derive(Clone)]
pub enum Value {
    /// SQL NULL, also used for absent optional values.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Integer literal, widened to 64 bit.
    Int(i64),
    /// Floating point literal.
    Float(f64),
    /// String literal.
    Str(String),
    /// Date literal without a time component.
    Date(NaiveDate),
    /// Timestamp literal without a zone.
    Timestamp(NaiveDateTime),
    /// UUID literal.
    Uuid(Uuid),
    /// Binary literal.
    Bytes(Vec<u8>),
    /// Reference to another entity.
    Entity(EntityHandle),
    /// An embedded value with its own attribute map.
    Embedded(EmbeddedHandle),
    /// Elements of a collection attribute, in declared order.
    List(Vec<Value>),
    /// Entries of a map attribute, in declared order.
    Map(Vec<(Value, Value)>)
}

impl Value {
    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOLEAN",
            Self::Int(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Str(_) => "STRING",
            Self::Date(_) => "DATE",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::Uuid(_) => "UUID",
            Self::Bytes(_) => "BINARY",
            Self::Entity(_) => "ENTITY",
            Self::Embedded(_) => "EMBEDDED",
            Self::List(_) => "LIST",
            Self::Map(_) => "MAP"
        }
    }

    /// Whether this value is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Wrap an optional scalar, mapping `None` to [`Value::Null`].
    pub fn opt<V: Into<Value>>(value: Option<V>) -> Value {
        value.map_or(Value::Null, Into::into)
    }

    /// Reference another entity through its shared handle.
    pub fn reference<T: SqlEntity>(entity: &Ref<T>) -> Value {
        let handle: EntityHandle = entity.clone();
        Value::Entity(handle)
    }

    /// Wrap an embedded value.
    pub fn embedded<T: EmbeddedValue + 'static>(value: T) -> Value {
        Value::Embedded(Rc::new(value))
    }

    /// Collection of entity references, preserving slice order.
    pub fn list_of<T: SqlEntity>(items: &[Ref<T>]) -> Value {
        Value::List(
            items
                .iter()
                .map(|item| {
                    let handle: EntityHandle = item.clone();
                    Value::Entity(handle)
                })
                .collect()
        )
    }

    /// Collection of scalar elements, preserving slice order.
    pub fn list<V: Clone + Into<Value>>(items: &[V]) -> Value {
        Value::List(items.iter().cloned().map(Into::into).collect())
    }

    /// Map from scalar keys to entity references, in key order.
    pub fn map_of<K, T>(map: &BTreeMap<K, Ref<T>>) -> Value
    where
        K: Clone + Into<Value> + Ord,
        T: SqlEntity
    {
        Value::Map(
            map.iter()
                .map(|(key, item)| {
                    let handle: EntityHandle = item.clone();
                    (key.clone().into(), Value::Entity(handle))
                })
                .collect()
        )
    }

    /// Canonical text form used as a state-map key for assigned ids.
    ///
    /// Scalar variants only; structured values have no stable key.
    pub(crate) fn state_key(&self) -> Option<String> {
        match self {
            Self::Bool(v) => Some(format!("b:{v}")),
            Self::Int(v) => Some(format!("i:{v}")),
            Self::Float(v) => Some(format!("f:{}", v.to_bits())),
            Self::Str(v) => Some(format!("s:{v}")),
            Self::Date(v) => Some(format!("d:{v}")),
            Self::Timestamp(v) => Some(format!("t:{v}")),
            Self::Uuid(v) => Some(format!("u:{v}")),
            Self::Bytes(v) => {
                let mut key = String::with_capacity(2 + v.len() * 2);
                key.push_str("x:");
                for byte in v {
                    key.push_str(&format!("{byte:02x}"));
                }
                Some(key)
            }
            _ => None
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Int(v) => write!(f, "Int({v})"),
            Self::Float(v) => write!(f, "Float({v})"),
            Self::Str(v) => write!(f, "Str({v:?})"),
            Self::Date(v) => write!(f, "Date({v})"),
            Self::Timestamp(v) => write!(f, "Timestamp({v})"),
            Self::Uuid(v) => write!(f, "Uuid({v})"),
            Self::Bytes(v) => write!(f, "Bytes({} bytes)", v.len()),
            Self::Entity(v) => write!(f, "Entity({})", v.borrow().model().name),
            Self::Embedded(v) => write!(f, "Embedded({})", v.model().name),
            Self::List(v) => write!(f, "List({} items)", v.len()),
            Self::Map(v) => write!(f, "Map({} entries)", v.len())
        }
    }
}

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Int(i64::from(value))
            }
        })*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value.naive_utc())
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opt_maps_none_to_null() {
        assert!(Value::opt(None::<i64>).is_null());
        assert!(matches!(Value::opt(Some(7)), Value::Int(7)));
    }

    #[test]
    fn integer_widening() {
        assert!(matches!(Value::from(3_i16), Value::Int(3)));
        assert!(matches!(Value::from(250_u8), Value::Int(250)));
    }

    #[test]
    fn state_keys_distinguish_types() {
        assert_ne!(Value::Int(1).state_key(), Value::Str("1".into()).state_key());
        assert_eq!(Value::Int(1).state_key().unwrap(), "i:1");
    }

    #[test]
    fn structured_values_have_no_state_key() {
        assert!(Value::List(vec![]).state_key().is_none());
        assert!(Value::Null.state_key().is_none());
    }
}
