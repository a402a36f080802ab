// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use sqlseed::{Embeddable, EmbeddedValue, Entity, SqlEntity, Value, model::AttributeKind};

#[derive(Clone, Embeddable)]
pub struct Address {
    #[column(nullable = false, length = 80)]
    pub street: String,

    pub city: Option<String>,
}

#[derive(Entity)]
pub struct Customer {
    #[id]
    #[generated]
    pub id: Option<i64>,

    #[embedded]
    #[attribute_override(name = "city", column = "home_city")]
    pub address: Option<Address>,
}

fn main() {
    let embeddable = <Address as EmbeddedValue>::embeddable_model();
    assert_eq!(embeddable.name, "Address");
    assert_eq!(embeddable.attributes.len(), 2);

    let model = <Customer as SqlEntity>::entity_model();
    let AttributeKind::Embedded(embedded) = &model.attributes[1].kind else {
        panic!("expected an embedded attribute");
    };
    assert_eq!((embedded.embeddable)().name, "Address");
    assert_eq!(embedded.attribute_overrides.len(), 1);
    assert_eq!(embedded.attribute_overrides[0].name, "city");
    assert_eq!(embedded.attribute_overrides[0].column.name, Some("home_city"));

    let customer = Customer {
        id: None,
        address: Some(Address {
            street: "Main Street 1".to_owned(),
            city: None,
        }),
    };
    let Value::Embedded(value) = customer.attribute("address") else {
        panic!("expected an embedded value");
    };
    assert!(matches!(value.attribute("street"), Value::Str(s) if s == "Main Street 1"));
    assert!(value.attribute("city").is_null());
}
