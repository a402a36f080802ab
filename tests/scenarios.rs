// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! End-to-end generation scenarios over a small entity model.

use std::rc::Rc;

use sqlseed::{
    Embeddable, Entity, EntitySqlGenerator, GeneratorContext, GeneratorSettings, Ref,
    statements::FileStatementsWriter, new_entity
};

#[derive(Entity)]
pub struct SimplePerson {
    #[id]
    #[generated(strategy = "identity")]
    pub id: Option<i64>,

    #[column(nullable = false)]
    pub name: String,
}

#[derive(Entity)]
pub struct Wallet {
    #[id]
    #[generated(strategy = "identity")]
    pub id: Option<i64>,

    #[many_to_one]
    pub owner: Option<Ref<SimplePerson>>,
}

#[derive(Entity)]
#[entity(name = "CycleA", table = "cycle_a")]
pub struct CycleA {
    #[id]
    #[generated]
    pub id: Option<i64>,

    #[version]
    pub version: i64,

    #[many_to_one]
    pub b: Option<Ref<CycleB>>,
}

#[derive(Entity)]
#[entity(name = "CycleB", table = "cycle_b")]
pub struct CycleB {
    #[id]
    #[generated]
    pub id: Option<i64>,

    #[many_to_one]
    pub a: Option<Ref<CycleA>>,
}

#[derive(Entity)]
#[entity(inheritance = "joined", discriminator_column = "dtype")]
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
    pub country: Option<Ref<Country>>,
}

/// Run a closure against a buffer-backed generator and return the text.
fn generate(
    settings: GeneratorSettings,
    body: impl FnOnce(&mut EntitySqlGenerator<'_>) -> sqlseed::Result<()>
) -> String {
    let context = Rc::new(GeneratorContext::new(settings).unwrap());
    let mut buffer = Vec::new();
    {
        let writer = FileStatementsWriter::new(&mut buffer, context.dialect());
        let mut generator = EntitySqlGenerator::new(context.clone(), Box::new(writer));
        body(&mut generator).unwrap();
        generator.flush().unwrap();
    }
    String::from_utf8(buffer).unwrap()
}

/// Assert that `needles` appear in the text in the given order.
fn assert_in_order(text: &str, needles: &[&str]) {
    let mut position = 0;
    for needle in needles {
        match text[position..].find(needle) {
            Some(offset) => position += offset + needle.len(),
            None => panic!("missing or out of order: {needle:?}\nin output:\n{text}")
        }
    }
}

fn relative_settings() -> GeneratorSettings {
    GeneratorSettings {
        write_relative_ids: true,
        ..GeneratorSettings::default()
    }
}

// Scenario A: identity ids keep the id column out of the INSERT and
// later references resolve to the same row.
#[test]
fn identity_insert_omits_the_id_column() {
    let output = generate(GeneratorSettings::default(), |generator| {
        let alice = new_entity(SimplePerson {
            id:   None,
            name: "alice".to_owned()
        });
        generator.write(&alice)?;
        assert_eq!(alice.borrow().id, Some(1));

        let wallet = new_entity(Wallet {
            id:    None,
            owner: Some(alice)
        });
        generator.write(&wallet)
    });
    assert_in_order(
        &output,
        &[
            "INSERT INTO SimplePerson (name) VALUES ('alice');",
            "INSERT INTO Wallet (owner_id) VALUES (1);"
        ]
    );
    assert!(!output.contains("UPDATE SimplePerson"));
}

// Scenario A, sequence flavour: the entity's own INSERT advances the
// sequence and the next reference is the sequence's current value.
#[test]
fn sequence_insert_uses_next_value_and_currval() {
    let output = generate(relative_settings(), |generator| {
        let germany = new_entity(Country {
            id:   None,
            code: "DE".to_owned()
        });
        generator.write(&germany)?;

        let alice = new_entity(Person {
            id:      None,
            name:    "alice".to_owned(),
            country: Some(germany)
        });
        generator.write(&alice)
    });
    assert_in_order(
        &output,
        &[
            "INSERT INTO Country (id, code) VALUES (NEXT VALUE FOR Country_seq, 'DE');",
            "INSERT INTO Person (id, name, country_id) VALUES (NEXT VALUE FOR Person_seq, \
             'alice', currval('Country_seq'));"
        ]
    );
}

// Scenario B: a reference cycle inserts the first row with the foreign
// key missing and patches it once the partner exists.
#[test]
fn cycle_resolves_through_a_deferred_update() {
    let output = generate(GeneratorSettings::default(), |generator| {
        let a = new_entity(CycleA {
            id:      None,
            version: 0,
            b:       None
        });
        let b = new_entity(CycleB {
            id: None,
            a:  Some(a.clone())
        });
        a.borrow_mut().b = Some(b.clone());

        generator.write(&a)?;
        generator.write(&b)
    });
    assert_in_order(
        &output,
        &[
            "INSERT INTO cycle_a (id, version) VALUES (NEXT VALUE FOR cycle_a_seq, 0);",
            "INSERT INTO cycle_b (id, a_id) VALUES (NEXT VALUE FOR cycle_b_seq, 1);",
            "UPDATE cycle_a SET b_id = 1, version = version + 1 WHERE id = 1;"
        ]
    );
}

// Scenario C: a JOINED subclass writes the root row first, carrying the
// discriminator, then its own row keyed by the same id.
#[test]
fn joined_inheritance_writes_both_tables() {
    let output = generate(GeneratorSettings::default(), |generator| {
        let rex = new_entity(Dog {
            base:        Animal {
                id:   None,
                name: "Rex".to_owned()
            },
            bark_volume: Some(11)
        });
        generator.write(&rex)?;
        assert_eq!(rex.borrow().base.id, Some(1));
        Ok(())
    });
    assert_in_order(
        &output,
        &[
            "INSERT INTO Animal (dtype, id, name) VALUES ('Dog', NEXT VALUE FOR Animal_seq, \
             'Rex');",
            "INSERT INTO Dog (id, bark_volume) VALUES (1, 11);"
        ]
    );
}

// Scenario D: a pre-existing row marked through the generator is
// referenced by its unique key instead of an id nobody knows.
#[test]
fn existing_entity_is_referenced_by_unique_key() {
    let output = generate(relative_settings(), |generator| {
        let germany = new_entity(Country {
            id:   None,
            code: "DE".to_owned()
        });
        generator.mark_existing(&germany)?;

        let alice = new_entity(Person {
            id:      None,
            name:    "alice".to_owned(),
            country: Some(germany)
        });
        generator.write(&alice)
    });
    assert!(!output.contains("INSERT INTO Country"));
    assert_in_order(
        &output,
        &["(SELECT id FROM Country WHERE code = 'DE')"]
    );
}

// Required references force their target to be written first.
#[test]
fn required_reference_writes_the_target_first() {
    #[derive(Entity)]
    pub struct Purchase {
        #[id]
        #[generated]
        pub id: Option<i64>,

        #[many_to_one]
        #[join_column(nullable = false)]
        pub customer: Option<Ref<Customer>>,
    }

    #[derive(Entity)]
    pub struct Customer {
        #[id]
        #[generated]
        pub id: Option<i64>,

        #[column(nullable = false)]
        pub name: String,
    }

    let output = generate(GeneratorSettings::default(), |generator| {
        let customer = new_entity(Customer {
            id:   None,
            name: "acme".to_owned()
        });
        let order = new_entity(Purchase {
            id:       None,
            customer: Some(customer)
        });
        // The order is written first; the customer row must still
        // precede it.
        generator.write(&order)
    });
    assert_in_order(
        &output,
        &[
            "INSERT INTO Customer (id, name) VALUES (NEXT VALUE FOR Customer_seq, 'acme');",
            "INSERT INTO Purchase (id, customer_id) VALUES (NEXT VALUE FOR Purchase_seq, 1);"
        ]
    );
}

// Invariant: immediately after writing, an entity is no longer new,
// and writing it again emits nothing.
#[test]
fn written_entities_are_not_new_and_not_rewritten() {
    let context = Rc::new(GeneratorContext::new(GeneratorSettings::default()).unwrap());
    let mut buffer = Vec::new();
    {
        let writer = FileStatementsWriter::new(&mut buffer, context.dialect());
        let mut generator = EntitySqlGenerator::new(context.clone(), Box::new(writer));

        let germany = new_entity(Country {
            id:   None,
            code: "DE".to_owned()
        });
        generator.write(&germany).unwrap();

        let handle: sqlseed::EntityHandle = germany.clone();
        let descriptor = context.description_of(&handle).unwrap();
        assert!(!descriptor.is_new(&context, &handle).unwrap());

        generator.write(&germany).unwrap();
        generator.flush().unwrap();
    }
    let output = String::from_utf8(buffer).unwrap();
    assert_eq!(output.matches("INSERT INTO Country").count(), 1);
}

// Invariant: a pending update whose target is never written surfaces
// as an unresolved-reference error at teardown.
#[test]
fn residual_pending_state_is_detected() {
    let context = Rc::new(GeneratorContext::new(GeneratorSettings::default()).unwrap());
    let mut buffer = Vec::new();
    {
        let writer = FileStatementsWriter::new(&mut buffer, context.dialect());
        let mut generator = EntitySqlGenerator::new(context.clone(), Box::new(writer));

        let never_written = new_entity(CycleB {
            id: None,
            a:  None
        });
        let a = new_entity(CycleA {
            id:      None,
            version: 0,
            b:       Some(never_written)
        });
        generator.write(&a).unwrap();
    }

    let error = context.check_residual_pending_states().unwrap_err();
    assert!(matches!(
        error,
        sqlseed::GeneratorError::UnresolvedReference { entity, count: 1 } if entity == "CycleB"
    ));
}

// An embedded composite id contributes its columns to the INSERT and
// keys the write state by value.
#[test]
fn embedded_id_inserts_and_tracks_state() {
    #[derive(Clone, Embeddable)]
    pub struct LocaleKey {
        #[column(nullable = false, length = 2)]
        pub language: String,

        #[column(nullable = false, length = 2)]
        pub region: String,
    }

    #[derive(Entity)]
    pub struct Locale {
        #[embedded_id]
        pub key: LocaleKey,

        pub label: Option<String>,
    }

    let output = generate(GeneratorSettings::default(), |generator| {
        let locale = new_entity(Locale {
            key:   LocaleKey {
                language: "de".to_owned(),
                region:   "DE".to_owned()
            },
            label: None
        });
        generator.write(&locale)?;
        generator.write(&locale)
    });
    assert_in_order(&output, &["INSERT INTO Locale (language, region) VALUES ('de', 'DE');"]);
    assert_eq!(output.matches("INSERT INTO Locale").count(), 1);
}

// Collections fill their join table after the owning row; elements that
// are still unwritten are deferred until their own INSERT.
#[test]
fn collections_fill_join_tables() {
    #[derive(Entity)]
    pub struct Tag {
        #[id]
        #[generated]
        pub id: Option<i64>,

        #[column(unique, nullable = false)]
        pub label: String,
    }

    #[derive(Entity)]
    pub struct Article {
        #[id]
        #[generated]
        pub id: Option<i64>,

        #[many_to_many(join_table = "article_tags", order_column = "position")]
        pub tags: Vec<Ref<Tag>>,

        #[element_collection(value_column = "keyword")]
        pub keywords: Vec<String>,
    }

    let output = generate(GeneratorSettings::default(), |generator| {
        let news = new_entity(Tag {
            id:    None,
            label: "news".to_owned()
        });
        let local = new_entity(Tag {
            id:    None,
            label: "local".to_owned()
        });
        generator.write(&news)?;

        let article = new_entity(Article {
            id:       None,
            tags:     vec![news, local.clone()],
            keywords: vec!["greeting".to_owned()]
        });
        // The second tag is unwritten; its join row must wait.
        generator.write(&article)?;
        generator.write(&local)
    });
    assert_in_order(
        &output,
        &[
            "INSERT INTO Tag (id, label) VALUES (NEXT VALUE FOR Tag_seq, 'news');",
            "INSERT INTO Article (id) VALUES (NEXT VALUE FOR Article_seq);",
            "INSERT INTO article_tags (article_id, tags_id, position) VALUES (1, 1, 0);",
            "INSERT INTO Article_keywords (article_id, keyword) VALUES (1, 'greeting');",
            "INSERT INTO Tag (id, label) VALUES (NEXT VALUE FOR Tag_seq, 'local');",
            "INSERT INTO article_tags (article_id, tags_id, position) VALUES (1, 2, 1);"
        ]
    );
}

// A collection mapped by the inverse side updates the foreign key on
// the element's row instead of filling a join table.
#[test]
fn inverse_collection_updates_the_foreign_side() {
    #[derive(Entity)]
    pub struct Team {
        #[id]
        #[generated]
        pub id: Option<i64>,

        #[one_to_many(mapped_by = "team")]
        pub members: Vec<Ref<Player>>,
    }

    #[derive(Entity)]
    pub struct Player {
        #[id]
        #[generated]
        pub id: Option<i64>,

        #[many_to_one]
        pub team: Option<Ref<Team>>,
    }

    let output = generate(GeneratorSettings::default(), |generator| {
        let player = new_entity(Player {
            id:   None,
            team: None
        });
        let team = new_entity(Team {
            id:      None,
            members: vec![player.clone()]
        });
        generator.write(&team)?;
        generator.write(&player)
    });
    assert_in_order(
        &output,
        &[
            "INSERT INTO Team (id) VALUES (NEXT VALUE FOR Team_seq);",
            "INSERT INTO Player (id) VALUES (NEXT VALUE FOR Player_seq);",
            "UPDATE Player SET team_id = 1 WHERE id = 1;"
        ]
    );
}

// Determinism: equal inputs produce byte-identical output.
#[test]
fn generation_is_deterministic() {
    let run = || {
        generate(GeneratorSettings::default(), |generator| {
            let germany = new_entity(Country {
                id:   None,
                code: "DE".to_owned()
            });
            let france = new_entity(Country {
                id:   None,
                code: "FR".to_owned()
            });
            let alice = new_entity(Person {
                id:      None,
                name:    "alice".to_owned(),
                country: Some(germany.clone())
            });
            generator.write(&germany)?;
            generator.write(&france)?;
            generator.write(&alice)
        })
    };
    assert_eq!(run(), run());
}
