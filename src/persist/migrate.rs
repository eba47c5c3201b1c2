//! Upgrades older persisted shapes to the current envelope.
//!
//! Version 0 covers everything written before the envelope carried a
//! version number:
//! - bare `{projects, currentProject}` objects without the `state` wrapper,
//! - snake_case field names,
//! - fractional `progress` (0.0..=1.0) instead of percent `completion`,
//! - dependencies stored as plain task id strings,
//! - single-project files saved by the desktop editor: `created`/`modified`
//!   stamps, tasks with `start`/`end` calendar dates and fractional
//!   `progress`, and a project-level list of `{from_task, to_task, kind}`
//!   links.

use serde_json::{json, Map, Value};

use crate::error::CodecError;
use crate::model::{DependencyType, ProjectId, TaskStatus};
use crate::repair::{CorrectionKind, RepairLog};

/// Envelope version written by this crate.
pub const CURRENT_VERSION: u64 = 1;

const RENAMED_KEYS: &[(&str, &str)] = &[
    ("start_date", "startDate"),
    ("end_date", "endDate"),
    ("created_at", "createdAt"),
    ("updated_at", "updatedAt"),
    ("project_id", "projectId"),
    ("task_id", "taskId"),
    ("current_project", "currentProject"),
];

/// Bring `root` up to [`CURRENT_VERSION`]. The result always has the shape
/// `{"state": {...}, "version": CURRENT_VERSION}`.
pub fn upgrade(root: Value, log: &mut RepairLog) -> Result<Value, CodecError> {
    let Value::Object(mut root) = root else {
        return Err(CodecError::MissingState);
    };

    let version = root.get("version").and_then(Value::as_u64).unwrap_or(0);
    if version > CURRENT_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: version,
            supported: CURRENT_VERSION,
        });
    }

    let mut state = match root.remove("state") {
        Some(state @ Value::Object(_)) => state,
        Some(_) => return Err(CodecError::MissingState),
        None if root.contains_key("projects") => {
            log.record("state", CorrectionKind::Migrated, "wrapped bare state");
            Value::Object(root)
        }
        None if is_desktop_project(&root) => desktop_project_state(root, log),
        None => return Err(CodecError::MissingState),
    };

    if version < 1 {
        rename_keys(&mut state, log);
        for_each_task(&mut state, |task| migrate_task(task, log));
    }

    Ok(json!({ "state": state, "version": CURRENT_VERSION }))
}

fn is_desktop_project(root: &Map<String, Value>) -> bool {
    root.get("tasks").is_some_and(Value::is_array)
        && ["created", "modified", "dependencies"].iter().any(|k| root.contains_key(*k))
}

fn rename(object: &mut Map<String, Value>, old: &str, new: &str, log: &mut RepairLog) {
    if object.contains_key(new) {
        return;
    }
    if let Some(v) = object.remove(old) {
        log.record(new, CorrectionKind::Migrated, format!("renamed from {old}"));
        object.insert(new.to_string(), v);
    }
}

/// Status the desktop editor showed for a fractional progress.
fn status_for_progress(progress: f64) -> TaskStatus {
    if progress >= 1.0 {
        TaskStatus::Completed
    } else if progress >= 0.5 {
        TaskStatus::InProgress
    } else {
        TaskStatus::NotStarted
    }
}

/// Turn one desktop project file into a state holding that project, selected.
/// Each `{from_task, to_task}` link becomes a dependency of `to_task` on
/// `from_task`.
fn desktop_project_state(mut project: Map<String, Value>, log: &mut RepairLog) -> Value {
    log.record("state", CorrectionKind::Migrated, "wrapped desktop project file");
    if !project.get("id").is_some_and(Value::is_string) {
        let id = ProjectId::new();
        log.record("id", CorrectionKind::Missing, &id);
        project.insert("id".into(), json!(id));
    }
    rename(&mut project, "created", "createdAt", log);
    rename(&mut project, "modified", "updatedAt", log);

    let links = match project.remove("dependencies") {
        Some(Value::Array(links)) => links,
        _ => Vec::new(),
    };
    if let Some(Value::Array(tasks)) = project.get_mut("tasks") {
        for task in tasks.iter_mut().filter_map(Value::as_object_mut) {
            rename(task, "start", "startDate", log);
            rename(task, "end", "endDate", log);
            if !task.contains_key("status") {
                if let Some(progress) = task.get("progress").and_then(Value::as_f64) {
                    task.insert("status".into(), json!(status_for_progress(progress)));
                }
            }
        }

        for link in &links {
            let from = link.get("from_task").and_then(Value::as_str);
            let to = link.get("to_task").and_then(Value::as_str);
            let owner = match to {
                Some(to) => tasks
                    .iter_mut()
                    .filter_map(Value::as_object_mut)
                    .find(|t| t.get("id").and_then(Value::as_str) == Some(to)),
                None => None,
            };
            let (Some(from), Some(owner)) = (from, owner) else {
                log.record("dependencies", CorrectionKind::Unparsable(link.to_string()), "dropped");
                continue;
            };
            let kind = link
                .get("kind")
                .and_then(Value::as_str)
                .and_then(DependencyType::parse_loose)
                .unwrap_or_default();
            log.record("dependencies", CorrectionKind::Migrated, from);
            if let Value::Array(deps) = owner.entry("dependencies").or_insert_with(|| json!([])) {
                deps.push(json!({ "taskId": from, "type": kind }));
            }
        }
    }

    let project = Value::Object(project);
    json!({ "projects": [project.clone()], "currentProject": project })
}

fn rename_keys(value: &mut Value, log: &mut RepairLog) {
    match value {
        Value::Object(map) => {
            for (old, new) in RENAMED_KEYS {
                rename(map, old, new, log);
            }
            for v in map.values_mut() {
                rename_keys(v, log);
            }
        }
        Value::Array(items) => {
            for v in items {
                rename_keys(v, log);
            }
        }
        _ => {}
    }
}

/// Visit every task object under `projects[*].tasks` and
/// `currentProject.tasks`.
pub(crate) fn for_each_task(state: &mut Value, mut f: impl FnMut(&mut Map<String, Value>)) {
    let mut visit_project = |project: &mut Value| {
        if let Some(Value::Array(tasks)) = project.get_mut("tasks") {
            for task in tasks.iter_mut() {
                if let Value::Object(task) = task {
                    f(task);
                }
            }
        }
    };
    if let Some(Value::Array(projects)) = state.get_mut("projects") {
        for project in projects.iter_mut() {
            visit_project(project);
        }
    }
    if let Some(current) = state.get_mut("currentProject") {
        visit_project(current);
    }
}

fn migrate_task(task: &mut Map<String, Value>, log: &mut RepairLog) {
    if let Some(progress) = task.remove("progress") {
        if !task.contains_key("completion") {
            if let Some(p) = progress.as_f64() {
                let percent = if p <= 1.0 { p * 100.0 } else { p };
                log.record("completion", CorrectionKind::Migrated, percent);
                task.insert("completion".into(), json!(percent));
            }
        }
    }

    if let Some(Value::Array(deps)) = task.get_mut("dependencies") {
        for dep in deps.iter_mut() {
            if let Value::String(id) = dep {
                let id = id.clone();
                log.record("dependencies", CorrectionKind::Migrated, &id);
                *dep = json!({ "taskId": id, "type": DependencyType::FinishToStart });
            }
        }
    }
}
