// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use sqlseed::{Entity, Ref, SqlEntity, Value, model::AttributeKind, new_entity};

#[derive(Entity)]
pub struct Country {
    #[id]
    #[generated]
    pub id: Option<i64>,

    #[column(unique, nullable = false, length = 2)]
    pub code: String,
}

#[derive(Entity)]
pub struct Person {
    #[id]
    #[generated]
    pub id: Option<i64>,

    #[column(nullable = false)]
    pub name: String,

    #[many_to_one]
    #[join_column(name = "home_country_id", nullable = false)]
    pub country: Ref<Country>,

    #[one_to_many(mapped_by = "person")]
    pub items: Vec<Ref<Item>>,
}

#[derive(Entity)]
pub struct Item {
    #[id]
    #[generated]
    pub id: Option<i64>,

    #[many_to_one]
    pub person: Option<Ref<Person>>,
}

fn main() {
    let model = <Person as SqlEntity>::entity_model();
    assert!(matches!(model.attributes[2].kind, AttributeKind::Reference(_)));
    assert!(matches!(model.attributes[3].kind, AttributeKind::Collection(_)));

    if let AttributeKind::Reference(reference) = &model.attributes[2].kind {
        assert_eq!((reference.target)().name, "Country");
        assert_eq!(reference.join_column.unwrap().name, Some("home_country_id"));
    }

    let country = new_entity(Country { id: None, code: "DE".to_owned() });
    let person = new_entity(Person {
        id: None,
        name: "alice".to_owned(),
        country: country.clone(),
        items: Vec::new(),
    });

    let value = person.borrow().attribute("country");
    assert!(matches!(value, Value::Entity(_)));
    let items = person.borrow().attribute("items");
    assert!(matches!(items, Value::List(list) if list.is_empty()));
}
