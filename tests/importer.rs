// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Importer front end: provider orchestration, prefix/postfix parts and
//! the abort marker.

use std::{any::Any, cell::RefCell, fs, rc::Rc};

use sqlseed::{
    DataProvider, Entity, EntityImporter, EntitySqlGenerator, GeneratorError, ImporterSettings,
    ProviderRegistration, Ref, Result, GENERATION_ABORTED_MESSAGE, new_entity
};

#[derive(Entity)]
pub struct User {
    #[id]
    #[generated]
    pub id: Option<i64>,

    #[column(nullable = false)]
    pub name: String,
}

#[derive(Entity)]
pub struct Shipment {
    #[id]
    #[generated]
    pub id: Option<i64>,

    #[many_to_one]
    pub recipient: Option<Ref<User>>,
}

type UserStore = Rc<RefCell<Vec<Ref<User>>>>;

struct UsersProvider {
    order: i32,
    users: UserStore
}

impl DataProvider for UsersProvider {
    fn name(&self) -> &str {
        "Users"
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn build_entities(&mut self) -> Result<()> {
        let mut users = self.users.borrow_mut();
        users.push(new_entity(User {
            id:   None,
            name: "alice".to_owned()
        }));
        users.push(new_entity(User {
            id:   None,
            name: "bob".to_owned()
        }));
        Ok(())
    }

    fn write_entities(&mut self, generator: &mut EntitySqlGenerator<'_>) -> Result<()> {
        for user in self.users.borrow().iter() {
            generator.write(user)?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct ShipmentsProvider {
    order:     i32,
    users:     UserStore,
    shipments: Vec<Ref<Shipment>>
}

impl DataProvider for ShipmentsProvider {
    fn name(&self) -> &str {
        "Shipments"
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn build_entities(&mut self) -> Result<()> {
        let recipient = self.users.borrow().first().cloned();
        self.shipments.push(new_entity(Shipment {
            id: None,
            recipient
        }));
        Ok(())
    }

    fn write_entities(&mut self, generator: &mut EntitySqlGenerator<'_>) -> Result<()> {
        for shipment in &self.shipments {
            generator.write(shipment)?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn importer_with_providers(shipments_order: i32) -> EntityImporter {
    let store: UserStore = Rc::new(RefCell::new(Vec::new()));
    let mut importer = EntityImporter::new(ImporterSettings::default()).unwrap();

    let users_store = store.clone();
    importer.register(ProviderRegistration::new("Users", move |_, _| {
        Ok(UsersProvider {
            order: 10,
            users: users_store
        })
    }));

    let shipment_store = store;
    importer.register(
        ProviderRegistration::new("Shipments", move |_, pool| {
            // The users provider must exist; its store is shared.
            pool.require::<UsersProvider>()?;
            Ok(ShipmentsProvider {
                order:     shipments_order,
                users:     shipment_store,
                shipments: Vec::new()
            })
        })
        .depends_on::<UsersProvider>()
    );

    importer
}

fn run_to_string(importer: &mut EntityImporter) -> (Result<()>, String) {
    let mut buffer = Vec::new();
    let result = importer.import_to_write(&mut buffer);
    (result, String::from_utf8(buffer).unwrap())
}

#[test]
fn providers_run_in_declared_order() {
    let mut importer = importer_with_providers(20);
    let (result, output) = run_to_string(&mut importer);
    result.unwrap();

    let users_at = output.find("Data from Users").unwrap();
    let shipments_at = output.find("Data from Shipments").unwrap();
    assert!(users_at < shipments_at);
    assert!(output.find("INSERT INTO User ").unwrap() < output.find("INSERT INTO Shipment ").unwrap());
}

#[test]
fn dependencies_win_over_declared_orders() {
    // Shipments claims order 5, but depends on Users (order 10).
    let mut importer = importer_with_providers(5);
    let (result, output) = run_to_string(&mut importer);
    result.unwrap();

    let users_at = output.find("Data from Users").unwrap();
    let shipments_at = output.find("Data from Shipments").unwrap();
    assert!(users_at < shipments_at);
}

#[test]
fn alignment_statements_trail_the_providers() {
    let mut importer = importer_with_providers(20);
    let (result, output) = run_to_string(&mut importer);
    result.unwrap();

    let alignment_at = output.find("ALTER SEQUENCE User_seq RESTART WITH 3").unwrap();
    let last_insert_at = output.rfind("INSERT INTO").unwrap();
    assert!(alignment_at > last_insert_at);
}

#[test]
fn prologue_names_the_dialect() {
    let mut importer = importer_with_providers(20);
    let (result, output) = run_to_string(&mut importer);
    result.unwrap();
    assert!(output.starts_with("-- Generated by sqlseed for h2"));
}

#[test]
fn aborting_provider_leaves_the_marker() {
    struct Failing;

    impl DataProvider for Failing {
        fn name(&self) -> &str {
            "Failing"
        }

        fn build_entities(&mut self) -> Result<()> {
            Ok(())
        }

        fn write_entities(&mut self, _generator: &mut EntitySqlGenerator<'_>) -> Result<()> {
            Err(GeneratorError::model("boom"))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    let mut importer = EntityImporter::new(ImporterSettings::default()).unwrap();
    importer.register(ProviderRegistration::new("Failing", |_, _| Ok(Failing)));

    let (result, output) = run_to_string(&mut importer);
    assert!(result.is_err());
    let marker_at = output.find(GENERATION_ABORTED_MESSAGE).unwrap();
    assert!(output[marker_at..].contains("invalid entity model: boom"));
    assert!(output.trim_end().lines().last().unwrap().starts_with("--"));
}

#[test]
fn unsatisfiable_dependencies_are_a_model_error() {
    struct Orphan;

    impl DataProvider for Orphan {
        fn name(&self) -> &str {
            "Orphan"
        }

        fn build_entities(&mut self) -> Result<()> {
            Ok(())
        }

        fn write_entities(&mut self, _generator: &mut EntitySqlGenerator<'_>) -> Result<()> {
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    let mut importer = EntityImporter::new(ImporterSettings::default()).unwrap();
    importer.register(
        ProviderRegistration::new("Orphan", |_, _| Ok(Orphan)).depends_on::<UsersProvider>()
    );

    let (result, _) = run_to_string(&mut importer);
    let error = result.unwrap_err();
    assert!(error.to_string().contains("no matching data provider"));
}

#[test]
fn prefix_and_postfix_parts_are_inlined() {
    let folder = tempfile::tempdir().unwrap();
    fs::write(folder.path().join("init.sql"), "CREATE SCHEMA seed;\n").unwrap();

    let mut settings = ImporterSettings::default();
    settings.data_folder = folder.path().to_path_buf();
    settings.prefix = Some("init.sql, missing.sql".to_owned());
    settings.postfix = Some("COMMIT".to_owned());

    let mut importer = EntityImporter::new(settings).unwrap();
    let (result, output) = run_to_string(&mut importer);
    result.unwrap();

    let init_at = output.find("-- init.sql").unwrap();
    assert!(output[init_at..].contains("CREATE SCHEMA seed;"));
    assert!(output.contains("-- Ignored missing file: missing.sql"));
    let postfix_at = output.find("-- postfix").unwrap();
    assert!(output[postfix_at..].contains("COMMIT"));
    assert!(init_at < postfix_at);
}

#[test]
fn import_data_writes_the_configured_file() {
    let folder = tempfile::tempdir().unwrap();
    let mut settings = ImporterSettings::default();
    settings.output_file = folder.path().join("out/seed.sql");

    let mut importer = EntityImporter::new(settings).unwrap();
    let path = importer.import_data().unwrap();
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("-- Generated by sqlseed for h2"));
}

#[test]
fn repeated_runs_are_byte_identical() {
    let run = || {
        let mut importer = importer_with_providers(20);
        let (result, output) = run_to_string(&mut importer);
        result.unwrap();
        output
    };
    assert_eq!(run(), run());
}
