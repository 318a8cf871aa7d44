use chrono::Utc;
use taskdeck_model::{
    ClientCompany, ClientCompanyId, Project, ProjectId, Role, TaskGroup, TaskGroupId, Team, TeamId,
    User, UserId,
};
use taskdeck_policy::AccessFacts;
use taskdeck_store::{MemoryStore, StoreError};

fn populated() -> MemoryStore {
    let store = MemoryStore::new();
    let mut tx = store.begin();
    tx.put_user(User::new(UserId(1), "Lead", "lead@example.com").with_role(Role::TeamLeader));
    tx.put_user(User::new(UserId(2), "Dev", "dev@example.com").with_role(Role::Developer));
    tx.put_team(Team::new(TeamId(3), "Core").with_member(UserId(1)).with_member(UserId(2)))
        .unwrap();
    tx.put_company(ClientCompany {
        id: ClientCompanyId(4),
        name: "Acme".into(),
    });
    tx.put_project(Project::new(ProjectId(5), "Apollo", Utc::now()).with_company(ClientCompanyId(4)));
    tx.put_group(TaskGroup::new(TaskGroupId(6), ProjectId(5), "To do", 0)).unwrap();
    tx.insert_grant(ProjectId(5), UserId(1)).unwrap();
    tx.set_favorite(UserId(2), ProjectId(5), true);
    tx.commit();
    store
}

#[test]
fn save_then_load_preserves_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.json");

    let store = populated();
    store.save_json(&path).unwrap();

    let loaded = MemoryStore::load_json(&path).unwrap();
    assert_eq!(loaded.snapshot(), store.snapshot());

    let tables = loaded.read();
    assert_eq!(tables.project_grantees(ProjectId(5)), [UserId(1)].into());
    assert_eq!(tables.user_teams(UserId(2)), [TeamId(3)].into());
    assert!(tables.is_favorite(UserId(2), ProjectId(5)));
}

#[test]
fn ids_continue_after_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.json");
    populated().save_json(&path).unwrap();

    let loaded = MemoryStore::load_json(&path).unwrap();
    let mut tx = loaded.begin();
    assert_eq!(tx.next_id(), 7);
}

#[test]
fn malformed_file_is_a_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(MemoryStore::load_json(&path), Err(StoreError::Json(_))));
}
