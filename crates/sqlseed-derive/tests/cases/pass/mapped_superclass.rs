// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use sqlseed::{Entity, SqlEntity, Value, model::EntityKind};

#[derive(Entity)]
#[entity(mapped_superclass)]
pub struct Auditable {
    #[id]
    #[generated]
    pub id: Option<i64>,

    pub created_by: Option<String>,
}

#[derive(Entity)]
#[entity(extends = Auditable)]
pub struct Invoice {
    #[parent]
    pub base: Auditable,

    #[column(nullable = false)]
    pub number: String,
}

fn main() {
    let auditable = <Auditable as SqlEntity>::entity_model();
    assert_eq!(auditable.kind, EntityKind::MappedSuperclass);

    let invoice = <Invoice as SqlEntity>::entity_model();
    assert_eq!(invoice.kind, EntityKind::Entity);
    assert_eq!(invoice.parent_model().unwrap().name, "Auditable");

    let invoice = Invoice {
        base: Auditable {
            id: None,
            created_by: Some("importer".to_owned()),
        },
        number: "2026-001".to_owned(),
    };
    assert!(matches!(invoice.attribute("created_by"), Value::Str(s) if s == "importer"));
    assert!(matches!(invoice.attribute("number"), Value::Str(s) if s == "2026-001"));
}
