use chantier::core::error::ChantierError;
use chantier::core::schemas;
use chantier::core::store::Store;
use chantier::plugins::team::{
    MemberInput, MemberPatch, Role, create_member, get_member, list_members, members_by_role,
    remove_member, update_member,
};

fn seeded() -> Store {
    let store = Store::in_memory();
    store.initialize().expect("initialize");
    store
}

#[test]
fn test_member_lifecycle() {
    let store = seeded();

    let member = create_member(
        &store,
        MemberInput {
            first_name: "Lou".to_string(),
            last_name: "PIEDIGROSSI".to_string(),
            role: Role::Hse,
        },
    )
    .expect("create");
    assert_eq!(member.id, 3);
    assert_eq!(get_member(&store, 3), Some(member.clone()));

    let updated = update_member(
        &store,
        3,
        MemberPatch {
            role: Some(Role::from("chef-equipe")),
            ..MemberPatch::default()
        },
    )
    .expect("update")
    .expect("member should exist");
    assert_eq!(updated.id, 3);
    assert_eq!(updated.role, Role::ChefEquipe);
    assert_eq!(updated.first_name, "Lou");

    assert!(remove_member(&store, 3).expect("remove"));
    assert!(get_member(&store, 3).is_none());
    assert!(!remove_member(&store, 3).expect("remove again"));
    assert_eq!(list_members(&store).len(), 2);
}

#[test]
fn test_update_missing_member_is_noop() {
    let store = seeded();
    let result = update_member(&store, 99, MemberPatch::default()).expect("update");
    assert!(result.is_none());
}

#[test]
fn test_unknown_roles_are_kept_verbatim() {
    let store = seeded();
    let member = create_member(
        &store,
        MemberInput {
            first_name: "A".to_string(),
            last_name: "MOHAMED".to_string(),
            role: Role::from("peintre-sableur"),
        },
    )
    .expect("create");
    assert_eq!(member.role, Role::Other("peintre-sableur".to_string()));

    let reloaded = get_member(&store, member.id).expect("member");
    assert_eq!(reloaded.role.as_str(), "peintre-sableur");
}

#[test]
fn test_members_grouped_by_role() {
    let store = seeded();
    create_member(
        &store,
        MemberInput {
            first_name: "Ertugrul".to_string(),
            last_name: "YASAR".to_string(),
            role: Role::ChefEquipe,
        },
    )
    .expect("create");

    let grouped = members_by_role(&store);
    assert_eq!(grouped.get("chef-equipe").map(Vec::len), Some(2));
    assert_eq!(grouped.get("chef-chantier").map(Vec::len), Some(1));
    assert!(!grouped.contains_key("hse"));
}

#[test]
fn test_member_without_role_survives_create() {
    let store = Store::in_memory();
    store
        .write(
            schemas::TEAM_KEY,
            &serde_json::json!([
                { "id": 1, "firstName": "Ertugrul", "lastName": "YASAR", "role": "chef-chantier" },
                { "id": 2, "firstName": "Mehmet", "lastName": null }
            ]),
        )
        .expect("write");

    let members = list_members(&store);
    assert_eq!(members.len(), 2);
    assert_eq!(members[1].role, Role::default());
    assert_eq!(members[1].last_name, "");

    let created = create_member(
        &store,
        MemberInput {
            first_name: "Lou".to_string(),
            last_name: "PIEDIGROSSI".to_string(),
            role: Role::Hse,
        },
    )
    .expect("create");
    assert_eq!(created.id, 3);
    assert_eq!(list_members(&store).len(), 3);
}

#[test]
fn test_team_mutations_refuse_corrupt_value() {
    let store = Store::in_memory();
    store
        .substrate()
        .set(schemas::TEAM_KEY, "[{\"id\": 1,")
        .expect("set");

    let result = remove_member(&store, 1);
    assert!(matches!(result, Err(ChantierError::CorruptRecord { .. })));
    assert_eq!(
        store.substrate().get(schemas::TEAM_KEY).expect("get").as_deref(),
        Some("[{\"id\": 1,")
    );
}
