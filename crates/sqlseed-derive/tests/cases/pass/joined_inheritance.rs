// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use sqlseed::{Entity, SqlEntity, Value, model::InheritanceKind};

#[derive(Entity)]
#[entity(inheritance = "joined")]
pub struct Animal {
    #[id]
    #[generated]
    pub id: Option<i64>,

    #[column(nullable = false)]
    pub name: String,
}

#[derive(Entity)]
#[entity(extends = Animal, discriminator = "Dog")]
pub struct Dog {
    #[parent]
    pub base: Animal,

    pub bark_volume: Option<i32>,
}

fn main() {
    let animal = <Animal as SqlEntity>::entity_model();
    assert_eq!(animal.inheritance, Some(InheritanceKind::Joined));

    let dog = <Dog as SqlEntity>::entity_model();
    assert_eq!(dog.parent_model().unwrap().name, "Animal");
    assert_eq!(dog.discriminator_value, Some("Dog"));
    assert_eq!(dog.attributes.len(), 1);

    let mut rex = Dog {
        base: Animal {
            id: None,
            name: "Rex".to_owned(),
        },
        bark_volume: Some(11),
    };
    assert!(matches!(rex.attribute("name"), Value::Str(s) if s == "Rex"));
    assert!(matches!(rex.attribute("bark_volume"), Value::Int(11)));

    rex.set_generated_id(3);
    assert_eq!(rex.base.id, Some(3));
    assert_eq!(rex.generated_id(), Some(3));
}
