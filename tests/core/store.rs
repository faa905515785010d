use chantier::core::error::ChantierError;
use chantier::core::schemas;
use chantier::core::seed;
use chantier::core::store::{KvSubstrate, MemorySubstrate, SqliteSubstrate, Store};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tempfile::tempdir;

fn snapshot(store: &Store) -> Vec<Option<String>> {
    schemas::MANAGED_KEYS
        .iter()
        .map(|k| store.substrate().get(k).expect("substrate get"))
        .collect()
}

#[test]
fn initialize_seeds_all_three_keys() {
    let store = Store::in_memory();
    store.initialize().expect("initialize");

    let sites: Vec<JsonValue> = store.read(schemas::SITES_KEY);
    let team: Vec<JsonValue> = store.read(schemas::TEAM_KEY);
    let planning: BTreeMap<String, Vec<JsonValue>> = store.read(schemas::PLANNING_KEY);

    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0]["name"], "Rénovation Usine Lyon");
    assert_eq!(team.len(), 2);
    assert_eq!(team[0]["role"], "chef-chantier");
    assert_eq!(
        planning
            .get(&seed::SEED_SITE_LYON.to_string())
            .map(Vec::len),
        Some(3)
    );
}

#[test]
fn initialize_is_idempotent() {
    let once = Store::in_memory();
    once.initialize().expect("initialize");

    let twice = Store::in_memory();
    twice.initialize().expect("initialize");
    twice.initialize().expect("initialize again");

    assert_eq!(snapshot(&once), snapshot(&twice));
}

#[test]
fn initialize_leaves_corrupt_keys_alone() {
    let store = Store::in_memory();
    store
        .substrate()
        .set(schemas::PLANNING_KEY, "<<garbage>>")
        .expect("set");
    store.initialize().expect("initialize");

    assert_eq!(
        store.substrate().get(schemas::PLANNING_KEY).unwrap().as_deref(),
        Some("<<garbage>>")
    );
    let planning: BTreeMap<String, Vec<JsonValue>> = store.read(schemas::PLANNING_KEY);
    assert!(planning.is_empty());
}

#[test]
fn read_degrades_on_type_mismatch() {
    let store = Store::in_memory();
    store
        .write(schemas::SITES_KEY, &serde_json::json!({"not": "an array"}))
        .expect("write");
    let sites: Vec<JsonValue> = store.read(schemas::SITES_KEY);
    assert!(sites.is_empty());
}

#[test]
fn read_for_update_fails_on_type_mismatch() {
    let store = Store::in_memory();
    store
        .write(schemas::SITES_KEY, &serde_json::json!({"not": "an array"}))
        .expect("write");
    let result: Result<Vec<JsonValue>, _> = store.read_for_update(schemas::SITES_KEY);
    assert!(matches!(result, Err(ChantierError::CorruptRecord { .. })));
}

/// Substrate whose reads always fail, as a locked or unreachable database would.
struct UnreadableSubstrate;

impl KvSubstrate for UnreadableSubstrate {
    fn get(&self, _key: &str) -> Result<Option<String>, ChantierError> {
        Err(ChantierError::IoError(std::io::Error::other("disk unavailable")))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), ChantierError> {
        panic!("nothing may be written after a failed read");
    }
}

#[test]
fn substrate_read_failure_surfaces_on_update_path() {
    let store = Store::with_substrate(Box::new(UnreadableSubstrate));

    let sites: Vec<JsonValue> = store.read(schemas::SITES_KEY);
    assert!(sites.is_empty());

    let result: Result<Vec<JsonValue>, _> = store.read_for_update(schemas::SITES_KEY);
    assert!(matches!(result, Err(ChantierError::IoError(_))));

    let created = chantier::plugins::sites::create_site(
        &store,
        chantier::plugins::sites::SiteInput {
            name: "Chantier".to_string(),
            ..Default::default()
        },
    );
    assert!(matches!(created, Err(ChantierError::IoError(_))));
    assert!(chantier::plugins::planning::save_tasks(&store, 1, Vec::new()).is_err());
}

#[test]
fn write_overwrites_previous_value() {
    let store = Store::with_substrate(Box::new(MemorySubstrate::new()));
    store.write("sites", &vec![1, 2, 3]).expect("write");
    store.write("sites", &vec![4]).expect("overwrite");
    let values: Vec<i32> = store.read("sites");
    assert_eq!(values, vec![4]);
}

#[test]
fn sqlite_store_persists_across_handles() {
    let tmp = tempdir().expect("tempdir");
    let db_path = tmp.path().join("nested").join(schemas::RECORDS_DB_NAME);

    {
        let store = Store::open(&db_path).expect("open");
        store.initialize().expect("initialize");
        store
            .write(schemas::TEAM_KEY, &serde_json::json!([]))
            .expect("write");
    }
    assert!(db_path.exists());

    let reopened = Store::open(&db_path).expect("reopen");
    reopened.initialize().expect("initialize");
    let team: Vec<JsonValue> = reopened.read(schemas::TEAM_KEY);
    let sites: Vec<JsonValue> = reopened.read(schemas::SITES_KEY);
    assert!(team.is_empty(), "emptied team must not be reseeded");
    assert_eq!(sites.len(), 2);
}

#[test]
fn sqlite_substrate_get_missing_is_none() {
    let tmp = tempdir().expect("tempdir");
    let substrate = SqliteSubstrate::open(&tmp.path().join("kv.db")).expect("open");
    assert_eq!(substrate.get("nope").expect("get"), None);
    substrate.set("k", "v1").expect("set");
    substrate.set("k", "v2").expect("set");
    assert_eq!(substrate.get("k").expect("get").as_deref(), Some("v2"));
}
