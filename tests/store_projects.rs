use rust_gantt_store::{MemorySlot, ProjectId, ProjectUpdate, Store, StoreError, TaskDraft};

fn open() -> Store<MemorySlot> {
    Store::open(MemorySlot::new(), "gantt-storage")
}

#[test]
fn create_project_appends_and_selects() {
    let mut store = open();
    let project = store.create_project("Demo", Some(String::new())).unwrap();

    assert_eq!(store.projects().len(), 1);
    assert_eq!(store.projects()[0].name, "Demo");
    assert_eq!(store.current_project().unwrap().name, "Demo");
    assert_eq!(store.current_project().unwrap().id, project.id);
    assert!(project.tasks.is_empty());
    assert_eq!(project.description, None);
    assert_eq!(project.created_at, project.updated_at);
}

#[test]
fn create_project_rejects_blank_name() {
    let mut store = open();
    store.create_project("Keep", None).unwrap();

    let err = store.create_project("   ", None).unwrap_err();
    assert_eq!(err, StoreError::EmptyProjectName);
    assert_eq!(store.projects().len(), 1);
    assert_eq!(store.current_project().unwrap().name, "Keep");
    assert_eq!(store.error(), Some("project name must not be empty"));
}

#[test]
fn update_project_merges_and_current_reads_the_same_value() {
    let mut store = open();
    let project = store.create_project("Demo", None).unwrap();

    let updated = store
        .update_project(
            &project.id,
            ProjectUpdate {
                name: Some("Renamed".into()),
                description: Some(Some("about".into())),
            },
        )
        .unwrap();

    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.description.as_deref(), Some("about"));
    assert!(updated.updated_at >= project.updated_at);
    assert_eq!(updated.created_at, project.created_at);
    assert_eq!(store.current_project(), Some(&updated));
    assert_eq!(store.project(&project.id), Some(&updated));
}

#[test]
fn update_unknown_project_is_an_error_and_changes_nothing() {
    let mut store = open();
    store.create_project("Demo", None).unwrap();
    let before = store.state().projects.clone();

    let missing = ProjectId::from("missing");
    let err = store.update_project(&missing, ProjectUpdate::rename("x")).unwrap_err();
    assert_eq!(err, StoreError::ProjectNotFound(missing));
    assert_eq!(store.state().projects, before);
    assert!(store.error().unwrap().contains("missing"));
}

#[test]
fn update_project_rejects_blank_rename() {
    let mut store = open();
    let project = store.create_project("Demo", None).unwrap();
    let err = store.update_project(&project.id, ProjectUpdate::rename("")).unwrap_err();
    assert_eq!(err, StoreError::EmptyProjectName);
    assert_eq!(store.current_project().unwrap().name, "Demo");
}

#[test]
fn delete_current_project_clears_selection() {
    let mut store = open();
    let first = store.create_project("First", None).unwrap();
    let second = store.create_project("Second", None).unwrap();

    store.delete_project(&first.id).unwrap();
    assert_eq!(store.current_project().unwrap().id, second.id);

    store.delete_project(&second.id).unwrap();
    assert!(store.current_project().is_none());
    assert!(store.projects().is_empty());
}

#[test]
fn delete_unknown_project_is_an_error() {
    let mut store = open();
    let err = store.delete_project(&ProjectId::from("nope")).unwrap_err();
    assert!(matches!(err, StoreError::ProjectNotFound(_)));
}

#[test]
fn select_project_is_idempotent() {
    let mut store = open();
    let first = store.create_project("First", None).unwrap();
    store.create_project("Second", None).unwrap();

    let a = store.select_project(Some(&first.id)).unwrap();
    let b = store.select_project(Some(&first.id)).unwrap();
    assert_eq!(a, b);
    assert_eq!(store.current_project().unwrap().id, first.id);
}

#[test]
fn select_unknown_project_keeps_previous_selection() {
    let mut store = open();
    let project = store.create_project("Demo", None).unwrap();

    let err = store.select_project(Some(&ProjectId::from("ghost"))).unwrap_err();
    assert!(matches!(err, StoreError::ProjectNotFound(_)));
    assert_eq!(store.current_project().unwrap().id, project.id);
}

#[test]
fn select_none_clears_selection() {
    let mut store = open();
    store.create_project("Demo", None).unwrap();
    assert_eq!(store.select_project(None).unwrap(), None);
    assert!(store.current_project().is_none());

    let err = store.create_task(TaskDraft::new("T1")).unwrap_err();
    assert_eq!(err, StoreError::NoProjectSelected);
}

#[test]
fn clear_error_is_idempotent() {
    let mut store = open();
    store.create_project("", None).unwrap_err();
    assert!(store.error().is_some());

    store.clear_error();
    assert_eq!(store.error(), None);
    let before = store.state().clone();
    store.clear_error();
    assert_eq!(store.state(), &before);
}

#[test]
fn task_mutations_refresh_project_updated_at() {
    let mut store = open();
    let project = store.create_project("Demo", None).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    store.create_task(TaskDraft::new("T1")).unwrap();

    let current = store.current_project().unwrap();
    assert!(current.updated_at > project.updated_at);
    assert_eq!(current.tasks[0].project_id, project.id);
}
