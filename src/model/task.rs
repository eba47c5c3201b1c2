use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::date_input::{self, DateField, DateInput};
use super::ids::{ProjectId, TaskId};
use crate::repair::{CorrectionKind, RepairLog};

/// Name given to tasks created without one.
pub const DEFAULT_TASK_NAME: &str = "New Task";

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    OnHold,
}

impl TaskStatus {
    /// Human-readable status string.
    pub fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::OnHold => "On Hold",
        }
    }

    /// Map a free-form status string to a status, accepting the canonical
    /// wire names as well as the labels older files and CSV sheets use.
    pub fn parse_loose(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "not started" | "notstarted" | "new" | "todo" | "to do" | "planned" | "released"
            | "firm planned" => Some(Self::NotStarted),
            "in progress" | "inprogress" | "active" | "started" | "doing" => Some(Self::InProgress),
            "completed" | "complete" | "done" | "finished" => Some(Self::Completed),
            "on hold" | "onhold" | "hold" | "paused" | "blocked" => Some(Self::OnHold),
            _ => None,
        }
    }
}

/// Represents the type of dependency between two tasks. Descriptive only,
/// no dates are derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependencyType {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl DependencyType {
    pub fn parse_loose(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace(['-', ' ', '_'], "").as_str() {
            "FINISHTOSTART" | "FS" => Some(Self::FinishToStart),
            "STARTTOSTART" | "SS" => Some(Self::StartToStart),
            "FINISHTOFINISH" | "FF" => Some(Self::FinishToFinish),
            "STARTTOFINISH" | "SF" => Some(Self::StartToFinish),
            _ => None,
        }
    }
}

/// A dependency link from the owning task to `task_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDependency {
    pub task_id: TaskId,
    #[serde(rename = "type")]
    pub kind: DependencyType,
}

impl TaskDependency {
    pub fn new(task_id: TaskId, kind: DependencyType) -> Self {
        Self { task_id, kind }
    }

    pub fn finish_to_start(task_id: TaskId) -> Self {
        Self::new(task_id, DependencyType::FinishToStart)
    }
}

/// A single task in a project schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    /// Always strictly after `start_date`.
    pub end_date: DateTime<Utc>,
    /// Percent complete, 0..=100.
    #[serde(default)]
    pub completion: u8,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub dependencies: Vec<TaskDependency>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for task creation. Every field is optional; missing or malformed
/// values are defaulted rather than rejected.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateInput>,
    pub end_date: Option<DateInput>,
    /// Raw percent; NaN and infinities count as non-numeric.
    pub completion: Option<f64>,
    pub status: Option<TaskStatus>,
    pub dependencies: Vec<TaskDependency>,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn starting(mut self, start: impl Into<DateInput>) -> Self {
        self.start_date = Some(start.into());
        self
    }

    pub fn ending(mut self, end: impl Into<DateInput>) -> Self {
        self.end_date = Some(end.into());
        self
    }

    pub fn completion(mut self, percent: f64) -> Self {
        self.completion = Some(percent);
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn depends_on(mut self, dependency: TaskDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

/// Partial update for an existing task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub start_date: Option<DateInput>,
    pub end_date: Option<DateInput>,
    pub completion: Option<f64>,
    pub status: Option<TaskStatus>,
    /// Replaces the whole dependency set.
    pub dependencies: Option<Vec<TaskDependency>>,
}

/// Clamp a raw completion value into 0..=100.
pub fn clamp_completion(raw: f64, log: &mut RepairLog) -> u8 {
    if !raw.is_finite() {
        log.record("completion", CorrectionKind::Unparsable(raw.to_string()), 0);
        return 0;
    }
    let rounded = raw.round();
    let clamped = rounded.clamp(0.0, 100.0);
    if clamped != rounded {
        log.record("completion", CorrectionKind::Clamped, clamped);
    }
    clamped as u8
}

/// Drop repeated `(task_id, type)` pairs, keeping the first occurrence.
pub fn dedupe_dependencies(deps: Vec<TaskDependency>, log: &mut RepairLog) -> Vec<TaskDependency> {
    let mut out: Vec<TaskDependency> = Vec::with_capacity(deps.len());
    for dep in deps {
        if out.contains(&dep) {
            log.record("dependencies", CorrectionKind::Duplicate, &dep.task_id);
        } else {
            out.push(dep);
        }
    }
    out
}

fn name_or_default(name: Option<String>, log: &mut RepairLog) -> String {
    match name {
        Some(n) if !n.trim().is_empty() => n,
        Some(_) => {
            log.record("name", CorrectionKind::Blank, DEFAULT_TASK_NAME);
            DEFAULT_TASK_NAME.to_string()
        }
        None => {
            log.record("name", CorrectionKind::Missing, DEFAULT_TASK_NAME);
            DEFAULT_TASK_NAME.to_string()
        }
    }
}

impl Task {
    /// Build a new task from a draft, applying the full normalization
    /// policy: start defaults to `now` and is capped at
    /// [`date_input::latest_start`], end defaults to start + 7 days and is
    /// forced past start, completion clamped.
    pub fn from_draft(
        project_id: ProjectId,
        draft: TaskDraft,
        now: DateTime<Utc>,
        log: &mut RepairLog,
    ) -> Self {
        let start = date_input::normalize(DateField::Start, draft.start_date.as_ref(), now, log);
        let start = date_input::clamp_start(start, log);
        let end = date_input::normalize(
            DateField::End,
            draft.end_date.as_ref(),
            start + date_input::default_span(),
            log,
        );
        let end = date_input::enforce_order(start, end, log);

        Self {
            id: TaskId::new(),
            project_id,
            name: name_or_default(draft.name, log),
            description: draft.description,
            start_date: start,
            end_date: end,
            completion: draft.completion.map(|c| clamp_completion(c, log)).unwrap_or(0),
            status: draft.status.unwrap_or_default(),
            dependencies: dedupe_dependencies(draft.dependencies, log),
            created_at: now,
            updated_at: now,
        }
    }

    /// Return a copy with `update` merged in. Unconvertible dates and blank
    /// names are dropped from the update and the prior value is kept.
    pub fn with_update(&self, update: TaskUpdate, now: DateTime<Utc>, log: &mut RepairLog) -> Self {
        let mut next = self.clone();

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                log.record("name", CorrectionKind::Blank, &self.name);
            } else {
                next.name = name;
            }
        }
        if let Some(description) = update.description {
            next.description = description;
        }
        if let Some(raw) = update.start_date {
            next.start_date = date_input::normalize(DateField::Start, Some(&raw), self.start_date, log);
        }
        if let Some(raw) = update.end_date {
            next.end_date = date_input::normalize(DateField::End, Some(&raw), self.end_date, log);
        }
        next.start_date = date_input::clamp_start(next.start_date, log);
        next.end_date = date_input::enforce_order(next.start_date, next.end_date, log);

        if let Some(completion) = update.completion {
            next.completion = clamp_completion(completion, log);
        }
        if let Some(status) = update.status {
            next.status = status;
        }
        if let Some(deps) = update.dependencies {
            next.dependencies = dedupe_dependencies(deps, log);
        }
        next.updated_at = now;
        next
    }

    pub fn has_dependency(&self, dependency: &TaskDependency) -> bool {
        self.dependencies.contains(dependency)
    }

    pub fn depends_on(&self, task_id: &TaskId) -> bool {
        self.dependencies.iter().any(|d| &d.task_id == task_id)
    }

    /// Copy with `dependency` appended, or `None` if it is already present.
    pub fn with_dependency(&self, dependency: TaskDependency, now: DateTime<Utc>) -> Option<Self> {
        if self.has_dependency(&dependency) {
            return None;
        }
        let mut next = self.clone();
        next.dependencies.push(dependency);
        next.updated_at = now;
        Some(next)
    }

    /// Copy with every dependency on `task_id` removed, or `None` if there
    /// was none.
    pub fn without_dependencies_on(&self, task_id: &TaskId, now: DateTime<Utc>) -> Option<Self> {
        if !self.depends_on(task_id) {
            return None;
        }
        let mut next = self.clone();
        next.dependencies.retain(|d| &d.task_id != task_id);
        next.updated_at = now;
        Some(next)
    }

    /// Whole days covered by the task, rounded up.
    pub fn duration_days(&self) -> i64 {
        let span = self.end_date - self.start_date;
        let days = span.num_days();
        if span > chrono::Duration::days(days) {
            days + 1
        } else {
            days
        }
    }
}
