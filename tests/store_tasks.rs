use chrono::{DateTime, Duration, TimeZone, Utc};

use rust_gantt_store::{
    CorrectionKind, DateInput, DependencyType, MemorySlot, Store, StoreError, Task, TaskDependency, TaskDraft,
    TaskId, TaskStatus, TaskUpdate,
};

fn with_project() -> Store<MemorySlot> {
    let mut store = Store::open(MemorySlot::new(), "gantt-storage");
    store.create_project("Demo", Some(String::new())).unwrap();
    store
}

fn assert_ordered(task: &Task) {
    assert!(
        task.end_date > task.start_date,
        "end {} not after start {}",
        task.end_date,
        task.start_date
    );
}

#[test]
fn unparsable_dates_resolve_to_a_valid_range() {
    let mut store = with_project();
    let before = Utc::now();
    let task = store
        .create_task(TaskDraft::new("T1").starting("not-a-date").ending("also-bad"))
        .unwrap();

    assert_ordered(&task);
    assert!(task.start_date >= before);
    assert_eq!(task.end_date, task.start_date + Duration::days(7));
    assert!(store.repairs().for_field("startDate").count() >= 1);
    assert!(store.repairs().for_field("endDate").count() >= 1);
    assert_eq!(store.error(), None);
}

#[test]
fn equal_dates_push_end_one_day() {
    let mut store = with_project();
    let d = Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap();
    let task = store.create_task(TaskDraft::new("T2").starting(d).ending(d)).unwrap();

    assert_eq!(task.start_date, d);
    assert_eq!(task.end_date, d + Duration::days(1));
}

#[test]
fn date_inputs_of_every_shape_are_accepted() {
    let mut store = with_project();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let from_text = store
        .create_task(TaskDraft::new("text").starting("2024-01-01").ending("2024-01-03T12:00:00Z"))
        .unwrap();
    let from_millis = store
        .create_task(
            TaskDraft::new("millis")
                .starting(start.timestamp_millis())
                .ending(DateInput::EpochMillis((start + Duration::days(2)).timestamp_millis())),
        )
        .unwrap();

    assert_eq!(from_text.start_date, start);
    assert_eq!(from_text.end_date, start + Duration::hours(60));
    assert_eq!(from_millis.start_date, start);
    assert_eq!(from_millis.end_date, start + Duration::days(2));
}

#[test]
fn out_of_range_timestamps_fall_back_instead_of_overflowing() {
    let mut store = with_project();
    let before = Utc::now();
    let max = DateInput::EpochMillis(DateTime::<Utc>::MAX_UTC.timestamp_millis());
    let task = store.create_task(TaskDraft::new("T").starting(max.clone())).unwrap();

    assert_ordered(&task);
    assert!(task.start_date >= before);
    assert!(store
        .repairs()
        .for_field("startDate")
        .any(|c| matches!(c.kind, CorrectionKind::Unparsable(_))));

    let updated = store
        .update_task(&task.id, TaskUpdate { end_date: Some(max), ..Default::default() })
        .unwrap();
    assert_eq!(updated.end_date, task.end_date);
}

#[test]
fn start_dates_near_the_end_of_year_9999_are_capped() {
    let mut store = with_project();
    let late = Utc.with_ymd_and_hms(9999, 12, 31, 0, 0, 0).unwrap();
    let task = store.create_task(TaskDraft::new("T").starting(late)).unwrap();

    assert!(task.start_date < late);
    assert_ordered(&task);
    assert_eq!(task.end_date, late);
}

#[test]
fn completion_is_always_within_bounds() {
    let mut store = with_project();
    for (raw, expected) in [(-5.0, 0), (150.0, 100), (f64::NAN, 0), (f64::INFINITY, 0), (55.6, 56)] {
        let task = store.create_task(TaskDraft::new("c").completion(raw)).unwrap();
        assert_eq!(task.completion, expected, "input {raw}");
    }
    let missing = store.create_task(TaskDraft::new("none")).unwrap();
    assert_eq!(missing.completion, 0);
}

#[test]
fn create_task_defaults() {
    let mut store = with_project();
    let task = store.create_task(TaskDraft::default()).unwrap();
    assert_eq!(task.name, "New Task");
    assert_eq!(task.status, TaskStatus::NotStarted);
    assert!(task.dependencies.is_empty());
    assert_eq!(task.created_at, task.updated_at);

    let project = store.current_project().unwrap();
    assert_eq!(project.tasks.len(), 1);
    assert_eq!(project.tasks[0], task);
    assert_eq!(store.projects()[0], *project);
}

#[test]
fn create_task_dedupes_draft_dependencies() {
    let mut store = with_project();
    let t1 = store.create_task(TaskDraft::new("T1")).unwrap();
    let dep = TaskDependency::finish_to_start(t1.id.clone());
    let t2 = store
        .create_task(TaskDraft::new("T2").depends_on(dep.clone()).depends_on(dep.clone()))
        .unwrap();
    assert_eq!(t2.dependencies, vec![dep]);
}

#[test]
fn tasks_keep_insertion_order() {
    let mut store = with_project();
    for name in ["a", "b", "c"] {
        store.create_task(TaskDraft::new(name)).unwrap();
    }
    let names: Vec<&str> = store
        .current_project()
        .unwrap()
        .tasks
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(names, ["a", "b", "c"]);
}

#[test]
fn update_task_drops_unconvertible_dates() {
    let mut store = with_project();
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let task = store
        .create_task(TaskDraft::new("T").starting(start).ending(start + Duration::days(3)))
        .unwrap();

    let updated = store
        .update_task(
            &task.id,
            TaskUpdate {
                start_date: Some(DateInput::from("bogus")),
                end_date: Some(DateInput::from("2024-05-10")),
                completion: Some(300.0),
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.start_date, start);
    assert_eq!(updated.end_date, Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap());
    assert_eq!(updated.completion, 100);
    assert_eq!(updated.status, TaskStatus::InProgress);
    assert!(updated.updated_at >= task.updated_at);
    assert_eq!(store.task(&task.id), Some(&updated));
}

#[test]
fn update_task_keeps_end_after_start() {
    let mut store = with_project();
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let task = store
        .create_task(TaskDraft::new("T").starting(start).ending(start + Duration::days(3)))
        .unwrap();

    let moved = store
        .update_task(
            &task.id,
            TaskUpdate {
                end_date: Some(DateInput::from(start - Duration::days(2))),
                ..Default::default()
            },
        )
        .unwrap();
    assert_ordered(&moved);
    assert_eq!(moved.end_date, start + Duration::days(1));
}

#[test]
fn update_unknown_task_is_an_error() {
    let mut store = with_project();
    let missing = TaskId::from("missing");
    let err = store.update_task(&missing, TaskUpdate::default()).unwrap_err();
    assert_eq!(err, StoreError::TaskNotFound(missing));
    assert!(store.error().is_some());
}

#[test]
fn adding_the_same_dependency_twice_is_a_no_op() {
    let mut store = with_project();
    let t1 = store.create_task(TaskDraft::new("T1")).unwrap();
    let t2 = store.create_task(TaskDraft::new("T2")).unwrap();
    let dep = TaskDependency::new(t1.id.clone(), DependencyType::FinishToStart);

    let first = store.add_dependency(&t2.id, dep.clone()).unwrap();
    let second = store.add_dependency(&t2.id, dep.clone()).unwrap();
    assert_eq!(first, second);
    assert_eq!(store.task(&t2.id).unwrap().dependencies, vec![dep]);

    let ss = TaskDependency::new(t1.id.clone(), DependencyType::StartToStart);
    let third = store.add_dependency(&t2.id, ss).unwrap();
    assert_eq!(third.dependencies.len(), 2);
}

#[test]
fn remove_dependency_drops_every_entry_for_that_task() {
    let mut store = with_project();
    let t1 = store.create_task(TaskDraft::new("T1")).unwrap();
    let t2 = store.create_task(TaskDraft::new("T2")).unwrap();
    let t3 = store.create_task(TaskDraft::new("T3")).unwrap();
    store
        .add_dependency(&t3.id, TaskDependency::new(t1.id.clone(), DependencyType::FinishToStart))
        .unwrap();
    store
        .add_dependency(&t3.id, TaskDependency::new(t1.id.clone(), DependencyType::FinishToFinish))
        .unwrap();
    store
        .add_dependency(&t3.id, TaskDependency::finish_to_start(t2.id.clone()))
        .unwrap();

    let updated = store.remove_dependency(&t3.id, &t1.id).unwrap();
    assert_eq!(updated.dependencies, vec![TaskDependency::finish_to_start(t2.id.clone())]);

    let unchanged = store.remove_dependency(&t3.id, &t1.id).unwrap();
    assert_eq!(unchanged, updated);
}

#[test]
fn dependency_on_unknown_owner_is_an_error() {
    let mut store = with_project();
    let err = store
        .add_dependency(&TaskId::from("ghost"), TaskDependency::finish_to_start(TaskId::from("x")))
        .unwrap_err();
    assert!(matches!(err, StoreError::TaskNotFound(_)));
}

#[test]
fn deleting_a_task_cleans_up_references() {
    let mut store = with_project();
    let t1 = store.create_task(TaskDraft::new("T1")).unwrap();
    let t2 = store.create_task(TaskDraft::new("T2")).unwrap();
    let t3 = store.create_task(TaskDraft::new("T3")).unwrap();
    store
        .add_dependency(&t2.id, TaskDependency::finish_to_start(t1.id.clone()))
        .unwrap();
    store
        .add_dependency(&t3.id, TaskDependency::new(t1.id.clone(), DependencyType::StartToStart))
        .unwrap();
    store
        .add_dependency(&t3.id, TaskDependency::finish_to_start(t2.id.clone()))
        .unwrap();

    let removed = store.delete_task(&t1.id).unwrap();
    assert_eq!(removed.id, t1.id);

    let project = store.current_project().unwrap();
    assert_eq!(project.tasks.len(), 2);
    assert!(project.tasks.iter().all(|t| !t.depends_on(&t1.id)));
    assert!(store.task(&t2.id).unwrap().dependencies.is_empty());
    assert_eq!(
        store.task(&t3.id).unwrap().dependencies,
        vec![TaskDependency::finish_to_start(t2.id.clone())]
    );
}

#[test]
fn deleting_unknown_task_is_an_error() {
    let mut store = with_project();
    store.create_task(TaskDraft::new("T1")).unwrap();
    let err = store.delete_task(&TaskId::from("ghost")).unwrap_err();
    assert!(matches!(err, StoreError::TaskNotFound(_)));
    assert_eq!(store.current_project().unwrap().tasks.len(), 1);
}

#[test]
fn task_operations_are_scoped_to_the_current_project() {
    let mut store = with_project();
    let t1 = store.create_task(TaskDraft::new("T1")).unwrap();
    store.create_project("Other", None).unwrap();

    let err = store.update_task(&t1.id, TaskUpdate::default()).unwrap_err();
    assert!(matches!(err, StoreError::TaskNotFound(_)));
    assert_eq!(store.projects()[0].tasks.len(), 1);
}
