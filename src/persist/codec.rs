//! Encoding and decoding of the persisted envelope.
//!
//! # Invariants
//! - [`encode`] always returns a decodable payload; if serialization fails
//!   the empty envelope is returned instead of a partial write.
//! - [`decode`] repairs field by field. Every `createdAt`, `updatedAt`,
//!   `startDate` and `endDate` anywhere in the tree is turned into a valid
//!   date, and any object carrying both `startDate` and `endDate` ends up
//!   with `endDate > startDate`.
//! - Only structurally unreadable payloads fail to decode; callers fall
//!   back to an empty state in that case.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::migrate::{self, CURRENT_VERSION};
use crate::error::CodecError;
use crate::model::date_input::{self, DateField, DateInput};
use crate::model::task::{dedupe_dependencies, DEFAULT_TASK_NAME};
use crate::model::{DependencyType, Project, ProjectId, TaskId, TaskStatus};
use crate::repair::{CorrectionKind, RepairLog};

/// Name given to persisted projects that lost theirs.
pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

/// The serializable subset of store state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub current_project: Option<Project>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateRef<'a> {
    projects: &'a [Project],
    current_project: Option<&'a Project>,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    state: StateRef<'a>,
    version: u64,
}

/// Payload written when the real state cannot be encoded.
pub fn empty_payload() -> String {
    json!({
        "state": { "projects": [], "currentProject": null },
        "version": CURRENT_VERSION,
    })
    .to_string()
}

/// Encode `projects` and the current project into the persisted form.
pub fn encode(
    projects: &[Project],
    current_project: Option<&Project>,
    now: DateTime<Utc>,
    log: &mut RepairLog,
) -> String {
    let envelope = EnvelopeRef {
        state: StateRef {
            projects,
            current_project,
        },
        version: CURRENT_VERSION,
    };
    let encoded = serde_json::to_value(&envelope).and_then(|mut value| {
        repair_dates(&mut value, now, log);
        serde_json::to_string(&value)
    });
    match encoded {
        Ok(payload) => payload,
        Err(e) => {
            log.record("state", CorrectionKind::Discarded(e.to_string()), "empty state");
            empty_payload()
        }
    }
}

/// Decode a persisted payload, migrating legacy shapes and repairing
/// malformed fields.
pub fn decode(raw: &str, now: DateTime<Utc>, log: &mut RepairLog) -> Result<PersistedState, CodecError> {
    let root: Value = serde_json::from_str(raw)?;
    let mut root = migrate::upgrade(root, log)?;
    let state = root.get_mut("state").ok_or(CodecError::MissingState)?;

    fill_required(state, log);
    repair_dates(state, now, log);
    migrate::for_each_task(state, |task| repair_task_fields(task, log));

    let decoded: PersistedState = serde_json::from_value(state.take())?;
    Ok(decoded.repaired(log))
}

fn format_date(dt: DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn read_date(value: &Value) -> Option<DateTime<Utc>> {
    DateInput::from_json(value).and_then(|input| input.resolve())
}

/// Walk the whole tree and make every known date field a valid RFC 3339
/// string, then fix ordering on objects carrying both task dates.
fn repair_dates(value: &mut Value, now: DateTime<Utc>, log: &mut RepairLog) {
    match value {
        Value::Object(map) => {
            for field in DateField::ALL {
                if let Some(raw) = map.get_mut(field.key()) {
                    let fixed = match read_date(raw) {
                        Some(dt) => dt,
                        None => {
                            let fallback = field.default_value(now);
                            let kind = if raw.is_null() {
                                CorrectionKind::Missing
                            } else {
                                CorrectionKind::Unparsable(raw.to_string())
                            };
                            log.record(field.key(), kind, fallback.to_rfc3339());
                            fallback
                        }
                    };
                    *raw = format_date(fixed);
                }
            }

            let start = map.get(DateField::Start.key()).and_then(read_date);
            let end = map.get(DateField::End.key()).and_then(read_date);
            if let (Some(start), Some(end)) = (start, end) {
                let clamped = date_input::clamp_start(start, log);
                if clamped != start {
                    map.insert(DateField::Start.key().to_string(), format_date(clamped));
                }
                let fixed = date_input::enforce_order(clamped, end, log);
                if fixed != end {
                    map.insert(DateField::End.key().to_string(), format_date(fixed));
                }
            }

            for child in map.values_mut() {
                repair_dates(child, now, log);
            }
        }
        Value::Array(items) => {
            for item in items {
                repair_dates(item, now, log);
            }
        }
        _ => {}
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    value.and_then(Value::as_str).map_or(true, |s| s.trim().is_empty())
}

/// Insert the fields deserialization cannot do without. Missing dates go in
/// as `null` so the date walk applies its per-field defaults.
fn fill_required(state: &mut Value, log: &mut RepairLog) {
    let mut fill_project = |project: &mut Value| {
        let Value::Object(project) = project else {
            return;
        };
        if !project.get("id").is_some_and(Value::is_string) {
            let id = ProjectId::new();
            log.record("id", CorrectionKind::Missing, &id);
            project.insert("id".into(), json!(id));
        }
        if is_blank(project.get("name")) {
            log.record("name", CorrectionKind::Blank, DEFAULT_PROJECT_NAME);
            project.insert("name".into(), json!(DEFAULT_PROJECT_NAME));
        }
        drop_non_text_description(project, log);
        for field in [DateField::CreatedAt, DateField::UpdatedAt] {
            project.entry(field.key()).or_insert(Value::Null);
        }
        let project_id = project["id"].clone();
        match project.get_mut("tasks") {
            Some(Value::Array(tasks)) => {
                tasks.retain(Value::is_object);
                for task in tasks.iter_mut() {
                    if let Value::Object(task) = task {
                        fill_task(task, &project_id, log);
                    }
                }
            }
            Some(_) => {
                log.record("tasks", CorrectionKind::Unparsable("not a list".into()), "[]");
                project.insert("tasks".into(), json!([]));
            }
            None => {}
        }
    };

    if let Some(Value::Array(projects)) = state.get_mut("projects") {
        projects.retain(Value::is_object);
        for project in projects.iter_mut() {
            fill_project(project);
        }
    }
    if let Some(current) = state.get_mut("currentProject") {
        if current.is_object() {
            fill_project(current);
        } else if !current.is_null() {
            *current = Value::Null;
        }
    }
}

fn drop_non_text_description(object: &mut Map<String, Value>, log: &mut RepairLog) {
    if let Some(raw) = object.get("description").filter(|d| !d.is_string() && !d.is_null()) {
        log.record("description", CorrectionKind::Unparsable(raw.to_string()), "none");
        object.remove("description");
    }
}

fn fill_task(task: &mut Map<String, Value>, project_id: &Value, log: &mut RepairLog) {
    if !task.get("id").is_some_and(Value::is_string) {
        let id = TaskId::new();
        log.record("id", CorrectionKind::Missing, &id);
        task.insert("id".into(), json!(id));
    }
    if !task.get("projectId").is_some_and(Value::is_string) {
        task.insert("projectId".into(), project_id.clone());
    }
    if is_blank(task.get("name")) {
        log.record("name", CorrectionKind::Blank, DEFAULT_TASK_NAME);
        task.insert("name".into(), json!(DEFAULT_TASK_NAME));
    }
    drop_non_text_description(task, log);
    for field in DateField::ALL {
        task.entry(field.key()).or_insert(Value::Null);
    }
}

fn repair_task_fields(task: &mut Map<String, Value>, log: &mut RepairLog) {
    if let Some(raw) = task.get_mut("completion") {
        let number = match &*raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let percent = match number {
            Some(n) => crate::model::task::clamp_completion(n, log),
            None => {
                log.record("completion", CorrectionKind::Unparsable(raw.to_string()), 0);
                0
            }
        };
        *raw = json!(percent);
    }

    if let Some(raw) = task.get_mut("status") {
        let canonical = raw
            .as_str()
            .and_then(TaskStatus::parse_loose)
            .unwrap_or_else(|| {
                log.record("status", CorrectionKind::Unparsable(raw.to_string()), "NOT_STARTED");
                TaskStatus::NotStarted
            });
        *raw = json!(canonical);
    }

    if let Some(raw) = task.get_mut("dependencies") {
        if !raw.is_array() {
            log.record("dependencies", CorrectionKind::Unparsable(raw.to_string()), "[]");
            *raw = json!([]);
        }
        let Value::Array(entries) = raw else {
            return;
        };
        let mut kept = Vec::with_capacity(entries.len());
        for entry in entries.drain(..) {
            let task_id = match entry.get("taskId") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => {
                    log.record("dependencies", CorrectionKind::Unparsable(entry.to_string()), "dropped");
                    continue;
                }
            };
            let kind = entry
                .get("type")
                .and_then(Value::as_str)
                .and_then(DependencyType::parse_loose)
                .unwrap_or_default();
            kept.push(json!({ "taskId": task_id, "type": kind }));
        }
        *entries = kept;
    }
}

impl PersistedState {
    /// Enforce the structural invariants serde cannot: unique project ids,
    /// task back-references matching their owner, unique dependencies.
    pub fn repaired(self, log: &mut RepairLog) -> Self {
        let mut projects: Vec<Project> = Vec::with_capacity(self.projects.len());
        for project in self.projects {
            if projects.iter().any(|p| p.id == project.id) {
                log.record("projects", CorrectionKind::Duplicate, &project.id);
                continue;
            }
            projects.push(repair_project(project, log));
        }
        Self {
            projects,
            current_project: self.current_project.map(|p| repair_project(p, log)),
        }
    }
}

fn repair_project(mut project: Project, log: &mut RepairLog) -> Project {
    let mut seen: Vec<TaskId> = Vec::with_capacity(project.tasks.len());
    project.tasks.retain(|task| {
        if seen.contains(&task.id) {
            log.record("tasks", CorrectionKind::Duplicate, &task.id);
            false
        } else {
            seen.push(task.id.clone());
            true
        }
    });
    for task in &mut project.tasks {
        if task.project_id != project.id {
            log.record("projectId", CorrectionKind::Mismatch, &project.id);
            task.project_id = project.id.clone();
        }
        let deps = std::mem::take(&mut task.dependencies);
        task.dependencies = dedupe_dependencies(deps, log);
    }
    project
}
