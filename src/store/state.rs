use crate::model::{Project, ProjectId, Task, TaskId};

/// Snapshot of everything the store owns. Readers only ever see a fully
/// applied state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    /// Unique by id, in creation order.
    pub projects: Vec<Project>,
    /// Id of the selected project. Always resolves to an entry of
    /// `projects` when set.
    pub current_project: Option<ProjectId>,
    /// True while an operation is running.
    pub loading: bool,
    /// Message of the last failed operation.
    pub error: Option<String>,
}

impl StoreState {
    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| &p.id == id)
    }

    /// The selected project, resolved to the live entry.
    pub fn current(&self) -> Option<&Project> {
        self.current_project.as_ref().and_then(|id| self.project(id))
    }

    /// Task `id` within the selected project.
    pub fn current_task(&self, id: &TaskId) -> Option<&Task> {
        self.current().and_then(|p| p.task(id))
    }

    pub(crate) fn position(&self, id: &ProjectId) -> Option<usize> {
        self.projects.iter().position(|p| &p.id == id)
    }

    /// Copy of `projects` with the entry of the same id swapped for
    /// `project`.
    pub(crate) fn projects_with(&self, project: Project) -> Vec<Project> {
        self.projects
            .iter()
            .map(|p| if p.id == project.id { project.clone() } else { p.clone() })
            .collect()
    }
}
