//! Integration test for the process-wide generator registry
//!
//! Kept in its own test binary, and in a single test function, because the
//! registry is shared by every test in the process.

use fixtura::{
    Fixture, FixtureError, IntegerGenerator, clear_registry, create_object_generator, generate,
    generate_default, lookup,
};

#[derive(Debug, Clone, PartialEq, Fixture)]
#[fixture(init(Self::new, String))]
struct Account {
    owner: String,
    balance: i64,
    note: Option<String>,
}

impl Account {
    fn new(owner: String) -> Self {
        Self {
            owner,
            balance: 0,
            note: None,
        }
    }
}

#[test]
fn test_global_registry_lifecycle() {
    clear_registry();

    create_object_generator::<Account>()
        .constructor_arg("bank".to_string())
        .map_value("balance", 100i64)
        .unwrap()
        .register()
        .unwrap();

    create_object_generator::<Account>()
        .name("overdrawn")
        .constructor_arg("bank".to_string())
        .map_generator("balance", IntegerGenerator::new(-500i64, -1).unwrap())
        .unwrap()
        .register()
        .unwrap();

    let account = generate_default::<Account>().unwrap().unwrap();
    assert_eq!(account.balance, 100);
    let overdrawn = generate::<Account>("overdrawn").unwrap().unwrap();
    assert!(overdrawn.balance < 0);

    // A child can inherit from a registered generator by name
    let annotated = create_object_generator::<Account>()
        .name("annotated")
        .constructor_arg("branch".to_string())
        .parent_from_registry::<Account>("default")
        .unwrap()
        .map_value("note", "checked".to_string())
        .unwrap()
        .build()
        .unwrap();
    let account = annotated.generate().unwrap().unwrap();
    assert_eq!(account.owner, "branch");
    assert_eq!(account.balance, 100);
    assert_eq!(account.note.as_deref(), Some("checked"));

    // Same type and name replaces the earlier generator
    create_object_generator::<Account>()
        .constructor_arg("bank".to_string())
        .map_value("balance", 5i64)
        .unwrap()
        .register()
        .unwrap();
    assert_eq!(lookup::<Account>("default").unwrap().generate().unwrap().unwrap().balance, 5);

    clear_registry();
    assert!(matches!(
        generate::<Account>("overdrawn"),
        Err(FixtureError::GeneratorNotFound { .. })
    ));
    assert!(matches!(
        create_object_generator::<Account>().parent_from_registry::<Account>("default"),
        Err(FixtureError::GeneratorNotFound { .. })
    ));
}
