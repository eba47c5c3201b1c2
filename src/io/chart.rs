use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Project, Task};

/// One row of the flattened task table handed to a chart renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub id: String,
    pub name: String,
    /// Grouping label; the task's status.
    pub resource: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Whole days, rounded up.
    pub duration_days: i64,
    pub percent_complete: u8,
    pub dependencies: Vec<String>,
}

impl From<&Task> for ChartRow {
    fn from(task: &Task) -> Self {
        let mut dependencies: Vec<String> = Vec::with_capacity(task.dependencies.len());
        for dep in &task.dependencies {
            let id = dep.task_id.to_string();
            if !dependencies.contains(&id) {
                dependencies.push(id);
            }
        }
        Self {
            id: task.id.to_string(),
            name: task.name.clone(),
            resource: task.status.label().to_string(),
            start: task.start_date,
            end: task.end_date,
            duration_days: task.duration_days(),
            percent_complete: task.completion,
            dependencies,
        }
    }
}

/// Project the tasks of `project` into chart rows, in display order.
pub fn chart_rows(project: &Project) -> Vec<ChartRow> {
    project.tasks.iter().map(ChartRow::from).collect()
}

/// Date span covering every task, padded the way the chart viewport is:
/// one week before the first start and thirty days after the last end.
pub fn visible_range(project: &Project) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = project.tasks.iter().map(|t| t.start_date).min()?;
    let end = project.tasks.iter().map(|t| t.end_date).max()?;
    Some((start - chrono::Duration::days(7), end + chrono::Duration::days(30)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DependencyType, TaskDependency, TaskDraft, TaskStatus};
    use crate::repair::RepairLog;
    use chrono::TimeZone;

    #[test]
    fn rows_flatten_tasks() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut log = RepairLog::new();
        let project = Project::new("Demo", None, now);
        let t1 = Task::from_draft(
            project.id.clone(),
            TaskDraft::new("Design").starting("2024-01-02").ending("2024-01-05").completion(30.0),
            now,
            &mut log,
        );
        let t2 = Task::from_draft(
            project.id.clone(),
            TaskDraft::new("Build")
                .starting("2024-01-05")
                .ending("2024-01-12")
                .status(TaskStatus::InProgress)
                .depends_on(TaskDependency::finish_to_start(t1.id.clone()))
                .depends_on(TaskDependency::new(t1.id.clone(), DependencyType::StartToStart)),
            now,
            &mut log,
        );
        let project = project.with_task_added(t1.clone(), now).with_task_added(t2, now);

        let rows = chart_rows(&project);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].duration_days, 3);
        assert_eq!(rows[0].percent_complete, 30);
        assert_eq!(rows[0].resource, "Not Started");
        assert_eq!(rows[1].resource, "In Progress");
        assert_eq!(rows[1].dependencies, vec![t1.id.to_string()]);

        let (from, to) = visible_range(&project).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2023, 12, 26, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2024, 2, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn empty_project_has_no_range() {
        let project = Project::new("Empty", None, Utc::now());
        assert!(chart_rows(&project).is_empty());
        assert!(visible_range(&project).is_none());
    }
}
