// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use sqlseed::{Entity, SqlEntity, Value, model::AttributeKind};

#[derive(Entity)]
#[entity(table = "person")]
pub struct Person {
    #[id]
    #[generated]
    pub id: Option<i64>,

    #[column(nullable = false, length = 40)]
    pub name: String,

    pub active: bool,

    pub birthday: Option<chrono::NaiveDate>,
}

fn main() {
    let model = <Person as SqlEntity>::entity_model();
    assert_eq!(model.name, "Person");
    assert_eq!(model.table_name(), "person");
    assert_eq!(model.attributes.len(), 4);
    assert!(matches!(model.attributes[0].kind, AttributeKind::Id(_)));
    assert!(model.attributes[1].required);
    assert!(!model.attributes[3].required);

    let mut person = Person {
        id: None,
        name: "alice".to_owned(),
        active: true,
        birthday: None,
    };
    assert!(matches!(person.attribute("name"), Value::Str(s) if s == "alice"));
    assert!(matches!(person.attribute("active"), Value::Bool(true)));
    assert!(person.attribute("birthday").is_null());
    assert!(person.attribute("no_such_attribute").is_null());

    assert_eq!(person.generated_id(), None);
    person.set_generated_id(41);
    assert_eq!(person.generated_id(), Some(41));
    assert!(matches!(person.attribute("id"), Value::Int(41)));
}
