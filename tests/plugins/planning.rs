use chantier::core::error::ChantierError;
use chantier::core::schemas;
use chantier::core::seed::{SEED_SITE_LA_CIOTAT, SEED_SITE_LYON};
use chantier::core::store::Store;
use chantier::plugins::overview;
use chantier::plugins::planning::{
    PlanningTask, TaskInput, TaskPatch, TaskStatus, add_task, delete_planning, get_tasks,
    load_planning, planned_end_date, remove_task, save_tasks, status_counts, transition_task,
    update_task,
};
use chantier::plugins::sites;
use chrono::{NaiveDate, TimeZone, Utc};

fn seeded() -> Store {
    let store = Store::in_memory();
    store.initialize().expect("initialize");
    store
}

fn task(id: i64, date_debut: &str) -> PlanningTask {
    PlanningTask {
        id,
        nom: format!("Tâche {id}"),
        responsable: "Chef d'équipe".to_string(),
        date_debut: date_debut.to_string(),
        heures_homme: 16.0,
        operateurs: 2,
        duree: 3,
        progression: 0,
        statut: TaskStatus::Planifie,
    }
}

#[test]
fn test_seeded_planning_is_readable() {
    let store = seeded();
    let tasks = get_tasks(&store, SEED_SITE_LYON);
    assert_eq!(tasks.len(), 3);
    assert_eq!(tasks[0].nom, "Démarrage & Préparation");
    assert_eq!(tasks[0].statut, TaskStatus::Termine);
    assert_eq!(tasks[1].statut, TaskStatus::EnCours);
    assert_eq!(tasks[2].heures_homme, 85.0);
}

#[test]
fn test_missing_site_has_empty_planning() {
    let store = seeded();
    assert!(get_tasks(&store, SEED_SITE_LA_CIOTAT).is_empty());
    assert!(get_tasks(&store, 123).is_empty());
}

#[test]
fn test_save_then_get_round_trips_with_normalized_dates() {
    let store = seeded();
    let tasks = vec![
        task(1, "2025-10-01"),
        task(2, "2025-10-06T07:30:00Z"),
        task(3, "2025-10-09 08:00:00"),
    ];
    save_tasks(&store, SEED_SITE_LA_CIOTAT, tasks.clone()).expect("save");

    let expected: Vec<PlanningTask> = tasks
        .into_iter()
        .zip(["2025-10-01", "2025-10-06", "2025-10-09"])
        .map(|(mut t, d)| {
            t.date_debut = d.to_string();
            t
        })
        .collect();
    assert_eq!(get_tasks(&store, SEED_SITE_LA_CIOTAT), expected);

    // Other sites are untouched.
    assert_eq!(get_tasks(&store, SEED_SITE_LYON).len(), 3);
}

#[test]
fn test_save_replaces_whole_list() {
    let store = seeded();
    save_tasks(&store, SEED_SITE_LYON, vec![task(9, "2025-10-01")]).expect("save");
    let tasks = get_tasks(&store, SEED_SITE_LYON);
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, 9);
}

#[test]
fn test_save_does_not_reconcile_status() {
    let store = seeded();
    let mut inconsistent = task(1, "2025-10-01");
    inconsistent.statut = TaskStatus::Termine;
    inconsistent.progression = 40;
    save_tasks(&store, SEED_SITE_LA_CIOTAT, vec![inconsistent]).expect("save");

    let stored = &get_tasks(&store, SEED_SITE_LA_CIOTAT)[0];
    assert_eq!(stored.statut, TaskStatus::Termine);
    assert_eq!(stored.progression, 40);
}

#[test]
fn test_task_helpers() {
    let store = seeded();

    let added = add_task(
        &store,
        SEED_SITE_LYON,
        TaskInput {
            nom: "Peinture Zone B".to_string(),
            responsable: "Chef atelier St Maurice".to_string(),
            date_debut: "2025-09-22".to_string(),
            heures_homme: 60.0,
            operateurs: 1,
            duree: 6,
        },
    )
    .expect("add");
    assert_eq!(added.id, 4);
    assert_eq!(added.statut, TaskStatus::Planifie);
    assert_eq!(added.progression, 0);

    let edited = update_task(
        &store,
        SEED_SITE_LYON,
        4,
        TaskPatch {
            progression: Some(30),
            statut: Some(TaskStatus::EnCours),
            ..TaskPatch::default()
        },
    )
    .expect("update")
    .expect("task exists");
    assert_eq!(edited.progression, 30);

    let done = transition_task(&store, SEED_SITE_LYON, 4, TaskStatus::Termine)
        .expect("transition")
        .expect("task exists");
    assert_eq!(done.progression, 100);

    let back = transition_task(&store, SEED_SITE_LYON, 4, TaskStatus::EnCours)
        .expect("transition")
        .expect("task exists");
    assert_eq!(back.progression, 100);

    let reset = transition_task(&store, SEED_SITE_LYON, 4, TaskStatus::Planifie)
        .expect("transition")
        .expect("task exists");
    assert_eq!(reset.progression, 0);

    assert!(remove_task(&store, SEED_SITE_LYON, 4).expect("remove"));
    assert!(!remove_task(&store, SEED_SITE_LYON, 4).expect("remove again"));
    assert!(
        transition_task(&store, SEED_SITE_LYON, 4, TaskStatus::Termine)
            .expect("transition")
            .is_none()
    );
}

#[test]
fn test_status_counts_and_end_date() {
    let store = seeded();
    let tasks = get_tasks(&store, SEED_SITE_LYON);
    let counts = status_counts(&tasks);
    assert_eq!((counts.planifie, counts.en_cours, counts.termine), (1, 1, 1));
    assert_eq!(planned_end_date(&tasks), NaiveDate::from_ymd_opt(2025, 9, 18));
}

#[test]
fn test_delete_planning_and_orphans() {
    let store = seeded();
    sites::remove_site(&store, SEED_SITE_LYON).expect("remove site");
    assert_eq!(
        overview::orphaned_plannings(&store),
        vec![SEED_SITE_LYON.to_string()]
    );

    assert!(delete_planning(&store, SEED_SITE_LYON).expect("delete"));
    assert!(!delete_planning(&store, SEED_SITE_LYON).expect("delete again"));
    assert!(overview::orphaned_plannings(&store).is_empty());
}

#[test]
fn test_site_overview_days_remaining() {
    let store = seeded();
    let before_end = Utc.with_ymd_and_hms(2025, 9, 10, 12, 0, 0).unwrap();
    let o = overview::site_overview(&store, SEED_SITE_LYON, before_end).expect("overview");
    assert_eq!(o.end_date.as_deref(), Some("2025-09-18"));
    assert_eq!(o.days_remaining, Some(8));

    let after_end = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
    let o = overview::site_overview(&store, SEED_SITE_LYON, after_end).expect("overview");
    assert_eq!(o.days_remaining, Some(0));

    let o = overview::site_overview(&store, SEED_SITE_LA_CIOTAT, after_end).expect("overview");
    assert_eq!(o.end_date, None);
    assert_eq!(o.days_remaining, None);
}

fn stored_planning(store: &Store) -> serde_json::Value {
    let raw = store
        .substrate()
        .get(schemas::PLANNING_KEY)
        .expect("get")
        .expect("planning stored");
    serde_json::from_str(&raw).expect("json")
}

#[test]
fn test_save_keeps_other_sites_with_text_progression() {
    let store = Store::in_memory();
    store
        .write(
            schemas::PLANNING_KEY,
            &serde_json::json!({
                "1": [{ "id": 1, "nom": "Sablage", "dateDebut": "2025-08-28", "heuresHomme": 119,
                        "operateurs": 2, "duree": 7, "progression": 50, "statut": "en-cours" }],
                "2": [{ "id": 1, "nom": "Peinture", "dateDebut": "2025-09-08", "heuresHomme": null,
                        "operateurs": "1", "duree": 10, "progression": "50", "statut": "en-cours" }]
            }),
        )
        .expect("write");

    let site2 = get_tasks(&store, 2);
    assert_eq!(site2[0].progression, 50);
    assert_eq!(site2[0].heures_homme, 0.0);
    assert_eq!(site2[0].operateurs, 1);

    save_tasks(&store, 3, Vec::new()).expect("save");
    let planning = stored_planning(&store);
    assert_eq!(planning["1"].as_array().map(Vec::len), Some(1));
    assert_eq!(planning["2"].as_array().map(Vec::len), Some(1));
    assert_eq!(planning["3"], serde_json::json!([]));
    assert_eq!(get_tasks(&store, 1)[0].nom, "Sablage");
}

#[test]
fn test_malformed_site_list_is_isolated() {
    let store = Store::in_memory();
    let bad_list = serde_json::json!([{ "id": 1, "nom": "Illisible", "progression": "beaucoup" }]);
    store
        .write(
            schemas::PLANNING_KEY,
            &serde_json::json!({
                "1": [{ "id": 1, "nom": "Sablage", "dateDebut": "2025-08-28", "duree": 7 }],
                "2": bad_list.clone()
            }),
        )
        .expect("write");

    // Reads skip only the unreadable list.
    assert!(get_tasks(&store, 2).is_empty());
    let planning = load_planning(&store);
    assert!(planning.contains_key("1"));
    assert!(!planning.contains_key("2"));

    // Saving another site writes the unreadable list back untouched.
    save_tasks(&store, 1, vec![task(1, "2025-09-01")]).expect("save");
    assert_eq!(stored_planning(&store)["2"], bad_list);

    // Editing the unreadable list itself is refused.
    let err = add_task(&store, 2, TaskInput::default()).expect_err("add must not overwrite");
    assert!(matches!(err, ChantierError::CorruptRecord { ref key, .. } if key == "planning/2"));
    assert!(remove_task(&store, 2, 1).is_err());
    assert_eq!(stored_planning(&store)["2"], bad_list);
}

#[test]
fn test_unreadable_planning_value_is_never_overwritten() {
    let store = Store::in_memory();
    store
        .substrate()
        .set(schemas::PLANNING_KEY, "[\"not a map\"]")
        .expect("set");

    assert!(get_tasks(&store, 1).is_empty());
    assert!(save_tasks(&store, 1, vec![task(1, "2025-09-01")]).is_err());
    assert!(delete_planning(&store, 1).is_err());
    assert_eq!(
        store.substrate().get(schemas::PLANNING_KEY).expect("get").as_deref(),
        Some("[\"not a map\"]")
    );
}
