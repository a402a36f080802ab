// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use sqlseed::{Entity, Ref, SqlEntity, Value, model::AttributeKind, new_entity};

#[derive(Entity)]
pub struct Tag {
    #[id]
    #[generated]
    pub id: Option<i64>,

    #[column(unique, nullable = false)]
    pub label: String,
}

#[derive(Entity)]
#[entity(table = "article")]
#[unique(columns = "slug")]
pub struct Article {
    #[id]
    #[generated]
    pub id: Option<i64>,

    #[column(unique, nullable = false)]
    pub slug: String,

    #[many_to_many(join_table = "article_tags", order_column = "position")]
    pub tags: Vec<Ref<Tag>>,

    #[element_collection(value_column = "keyword")]
    pub keywords: Vec<String>,

    #[map_key(column = "locale")]
    pub translations: BTreeMap<String, String>,
}

fn main() {
    let model = <Article as SqlEntity>::entity_model();
    assert_eq!(model.unique_constraints.len(), 1);
    assert_eq!(model.unique_constraints[0].columns.len(), 1);
    assert_eq!(model.unique_constraints[0].columns[0], "slug");

    let AttributeKind::Collection(tags) = &model.attributes[2].kind else {
        panic!("expected a collection attribute");
    };
    assert_eq!(tags.join_table, Some("article_tags"));
    assert_eq!(tags.order_column, Some("position"));
    assert!(tags.target.is_some());

    let AttributeKind::Collection(keywords) = &model.attributes[3].kind else {
        panic!("expected a scalar collection attribute");
    };
    assert!(keywords.target.is_none());
    assert_eq!(keywords.value_column, Some("keyword"));

    let AttributeKind::Map(translations) = &model.attributes[4].kind else {
        panic!("expected a map attribute");
    };
    assert_eq!(translations.key_column, Some("locale"));

    let mut translations = BTreeMap::new();
    translations.insert("de".to_owned(), "Hallo".to_owned());
    let article = Article {
        id: None,
        slug: "hello".to_owned(),
        tags: vec![new_entity(Tag { id: None, label: "news".to_owned() })],
        keywords: vec!["greeting".to_owned()],
        translations,
    };

    assert!(matches!(article.attribute("tags"), Value::List(list) if list.len() == 1));
    assert!(matches!(article.attribute("keywords"), Value::List(list) if list.len() == 1));
    assert!(matches!(article.attribute("translations"), Value::Map(map) if map.len() == 1));
}
