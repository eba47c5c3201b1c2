use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ProjectId, TaskId};
use super::task::Task;

/// A Gantt project: a named, ordered list of tasks with lifecycle
/// timestamps.
///
/// Values are treated as immutable by the store. Every mutation goes
/// through one of the `with_*` helpers, which return a fresh project with
/// `updated_at` refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Insertion order is display order.
    #[serde(default)]
    pub tasks: Vec<Task>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a project. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

impl ProjectUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

impl Project {
    pub fn new(name: impl Into<String>, description: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: ProjectId::new(),
            name: name.into(),
            description,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Copy with the update merged in. Name validation is the caller's job.
    pub fn with_update(&self, update: ProjectUpdate, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        if let Some(name) = update.name {
            next.name = name;
        }
        if let Some(description) = update.description {
            next.description = description;
        }
        next.updated_at = now;
        next
    }

    /// Copy with `task` appended.
    pub fn with_task_added(&self, task: Task, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.tasks.push(task);
        next.updated_at = now;
        next
    }

    /// Copy with the task of the same id replaced in place, keeping order.
    pub fn with_task_replaced(&self, task: Task, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        if let Some(slot) = next.tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        }
        next.updated_at = now;
        next
    }

    /// Copy with task `id` removed and every dependency on it stripped from
    /// the remaining tasks.
    pub fn with_task_removed(&self, id: &TaskId, now: DateTime<Utc>) -> Self {
        let tasks = self
            .tasks
            .iter()
            .filter(|t| &t.id != id)
            .map(|t| t.without_dependencies_on(id, now).unwrap_or_else(|| t.clone()))
            .collect();
        Self {
            tasks,
            updated_at: now,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{TaskDependency, TaskDraft};
    use crate::repair::RepairLog;

    fn project_with(names: &[&str]) -> Project {
        let now = Utc::now();
        let mut log = RepairLog::new();
        let mut project = Project::new("Demo", None, now);
        for name in names {
            let task = Task::from_draft(project.id.clone(), TaskDraft::new(*name), now, &mut log);
            project = project.with_task_added(task, now);
        }
        project
    }

    #[test]
    fn with_update_refreshes_timestamp_and_leaves_original() {
        let project = project_with(&[]);
        let later = project.updated_at + chrono::Duration::seconds(5);
        let renamed = project.with_update(ProjectUpdate::rename("Renamed"), later);

        assert_eq!(renamed.name, "Renamed");
        assert_eq!(renamed.updated_at, later);
        assert_eq!(renamed.id, project.id);
        assert_eq!(project.name, "Demo");
    }

    #[test]
    fn removing_a_task_strips_references() {
        let project = project_with(&["a", "b", "c"]);
        let a = project.tasks[0].id.clone();
        let now = Utc::now();

        let b = project.tasks[1]
            .with_dependency(TaskDependency::finish_to_start(a.clone()), now)
            .unwrap();
        let project = project.with_task_replaced(b, now);
        assert!(project.tasks[1].depends_on(&a));

        let project = project.with_task_removed(&a, now);
        assert_eq!(project.tasks.len(), 2);
        assert!(project.tasks.iter().all(|t| !t.depends_on(&a)));
        assert_eq!(project.tasks[0].name, "b");
    }
}
