//! The project/task store.
//!
//! # Responsibility
//! - Sole owner of project and task state.
//! - Enforce model invariants on every write.
//! - Persist the serializable subset after each mutation and restore it,
//!   repaired, on [`Store::init`].
//!
//! # Invariants
//! - Every operation either fully applies or leaves state untouched and
//!   records its error message in `error`.
//! - `loading` is false between operations.
//! - Mutations build fresh `Project` values and replace the stored entry
//!   whole. The current project is held by id, so it always reads the same
//!   value as its entry in `projects`.
//! - Operations called before `init` fail with
//!   [`StoreError::NotInitialized`].

mod state;

use chrono::{DateTime, Utc};

use crate::error::{StoreError, StoreResult};
use crate::model::{Project, ProjectId, ProjectUpdate, Task, TaskDependency, TaskDraft, TaskId, TaskUpdate};
use crate::persist::{codec, StorageSlot};
use crate::repair::{CorrectionKind, RepairLog};

pub use state::StoreState;

/// Callback invoked with the new state after each successful mutation.
pub type Listener = Box<dyn FnMut(&StoreState)>;

/// Project/task store bound to one durable slot.
pub struct Store<S: StorageSlot> {
    state: StoreState,
    slot: S,
    key: String,
    repairs: RepairLog,
    listeners: Vec<Listener>,
    initialized: bool,
    dirty: bool,
    last_persist_error: Option<String>,
}

impl<S: StorageSlot> Store<S> {
    /// Creates an empty, uninitialized store writing to `key` in `slot`.
    pub fn new(slot: S, key: impl Into<String>) -> Self {
        Self {
            state: StoreState::default(),
            slot,
            key: key.into(),
            repairs: RepairLog::new(),
            listeners: Vec::new(),
            initialized: false,
            dirty: false,
            last_persist_error: None,
        }
    }

    /// Creates a store and loads it immediately.
    pub fn open(slot: S, key: impl Into<String>) -> Self {
        let mut store = Self::new(slot, key);
        store.init();
        store
    }

    /// Loads persisted state from the slot. Unreadable payloads fall back to
    /// an empty state; nothing here fails. Calling `init` again is a no-op.
    pub fn init(&mut self) -> &StoreState {
        if self.initialized {
            return &self.state;
        }

        let now = Utc::now();
        let loaded = match self.slot.read(&self.key) {
            Ok(Some(raw)) => match codec::decode(&raw, now, &mut self.repairs) {
                Ok(state) => state,
                Err(e) => {
                    self.repairs
                        .record(self.key.as_str(), CorrectionKind::Discarded(e.to_string()), "empty state");
                    codec::PersistedState::default()
                }
            },
            Ok(None) => codec::PersistedState::default(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "could not read persisted state");
                codec::PersistedState::default()
            }
        };

        let current = loaded
            .current_project
            .map(|p| p.id)
            .filter(|id| {
                let known = loaded.projects.iter().any(|p| &p.id == id);
                if !known {
                    self.repairs.record("currentProject", CorrectionKind::Mismatch, "none");
                }
                known
            });

        self.state = StoreState {
            projects: loaded.projects,
            current_project: current,
            loading: false,
            error: None,
        };
        self.initialized = true;
        tracing::info!(
            key = %self.key,
            projects = self.state.projects.len(),
            repairs = self.repairs.len(),
            "store initialized"
        );
        &self.state
    }

    /// Flushes state to the slot and detaches listeners. The store must be
    /// initialized again before further use.
    pub fn dispose(&mut self) -> Result<(), crate::error::SlotError> {
        if !self.initialized {
            return Ok(());
        }
        let payload = self.encode_state(Utc::now());
        let flushed = self.slot.write(&self.key, &payload);
        self.listeners.clear();
        self.initialized = false;
        tracing::debug!(key = %self.key, "store disposed");
        flushed
    }

    // --- Reads ---

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn projects(&self) -> &[Project] {
        &self.state.projects
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.state.project(id)
    }

    pub fn current_project(&self) -> Option<&Project> {
        self.state.current()
    }

    /// Task `id` in the current project.
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.state.current_task(id)
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Corrections applied by normalization and repair since start.
    pub fn repairs(&self) -> &RepairLog {
        &self.repairs
    }

    /// Message of the last failed slot write, cleared by the next success.
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn slot_key(&self) -> &str {
        &self.key
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // --- Projects ---

    /// Creates a project with no tasks and selects it.
    pub fn create_project(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> StoreResult<Project> {
        let name = name.into();
        self.run("create_project", |store, now| {
            if name.trim().is_empty() {
                return Err(StoreError::EmptyProjectName);
            }
            let description = description.filter(|d| !d.is_empty());
            let project = Project::new(name, description, now);
            let mut projects = store.state.projects.clone();
            projects.push(project.clone());
            store.commit(projects, Some(project.id.clone()));
            Ok(project)
        })
    }

    pub fn update_project(&mut self, id: &ProjectId, update: ProjectUpdate) -> StoreResult<Project> {
        self.run("update_project", |store, now| {
            if update.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
                return Err(StoreError::EmptyProjectName);
            }
            let project = store
                .state
                .project(id)
                .ok_or_else(|| StoreError::ProjectNotFound(id.clone()))?;
            let next = project.with_update(update, now);
            store.commit_project(next.clone());
            Ok(next)
        })
    }

    /// Removes a project, clearing the selection if it was selected.
    pub fn delete_project(&mut self, id: &ProjectId) -> StoreResult<Project> {
        self.run("delete_project", |store, _now| {
            let index = store
                .state
                .position(id)
                .ok_or_else(|| StoreError::ProjectNotFound(id.clone()))?;
            let mut projects = store.state.projects.clone();
            let removed = projects.remove(index);
            let current = store.state.current_project.clone().filter(|c| c != id);
            store.commit(projects, current);
            Ok(removed)
        })
    }

    /// Selects a project, or clears the selection with `None`. An unknown
    /// id is an error and keeps the previous selection.
    pub fn select_project(&mut self, id: Option<&ProjectId>) -> StoreResult<Option<Project>> {
        self.run("select_project", |store, _now| {
            let selected = match id {
                Some(id) => Some(
                    store
                        .state
                        .project(id)
                        .cloned()
                        .ok_or_else(|| StoreError::ProjectNotFound(id.clone()))?,
                ),
                None => None,
            };
            let current = selected.as_ref().map(|p| p.id.clone());
            if current != store.state.current_project {
                let projects = store.state.projects.clone();
                store.commit(projects, current);
            }
            Ok(selected)
        })
    }

    // --- Tasks (all scoped to the current project) ---

    pub fn create_task(&mut self, draft: TaskDraft) -> StoreResult<Task> {
        self.run("create_task", |store, now| {
            let project = store.require_current()?;
            let task = Task::from_draft(project.id.clone(), draft, now, &mut store.repairs);
            let next = project.with_task_added(task.clone(), now);
            store.commit_project(next);
            tracing::debug!(task = %task.id, "task created");
            Ok(task)
        })
    }

    /// Merges `update` into a task. Dates that cannot be converted are
    /// dropped from the update rather than failing it.
    pub fn update_task(&mut self, id: &TaskId, update: TaskUpdate) -> StoreResult<Task> {
        self.run("update_task", |store, now| {
            let project = store.require_current()?;
            let task = project.task(id).ok_or_else(|| StoreError::TaskNotFound(id.clone()))?;
            let next_task = task.with_update(update, now, &mut store.repairs);
            let next = project.with_task_replaced(next_task.clone(), now);
            store.commit_project(next);
            Ok(next_task)
        })
    }

    /// Removes a task and strips dependencies on it from the other tasks of
    /// the project.
    pub fn delete_task(&mut self, id: &TaskId) -> StoreResult<Task> {
        self.run("delete_task", |store, now| {
            let project = store.require_current()?;
            let removed = project
                .task(id)
                .cloned()
                .ok_or_else(|| StoreError::TaskNotFound(id.clone()))?;
            let next = project.with_task_removed(id, now);
            store.commit_project(next);
            Ok(removed)
        })
    }

    /// Adds a dependency to a task. An equal `(task_id, type)` entry already
    /// present makes this a no-op.
    pub fn add_dependency(&mut self, id: &TaskId, dependency: TaskDependency) -> StoreResult<Task> {
        self.run("add_dependency", |store, now| {
            let project = store.require_current()?;
            let task = project.task(id).ok_or_else(|| StoreError::TaskNotFound(id.clone()))?;
            match task.with_dependency(dependency, now) {
                Some(next_task) => {
                    let next = project.with_task_replaced(next_task.clone(), now);
                    store.commit_project(next);
                    Ok(next_task)
                }
                None => {
                    tracing::debug!(task = %id, "dependency already present");
                    Ok(task.clone())
                }
            }
        })
    }

    /// Removes every dependency of task `id` that points at
    /// `dependency_task_id`.
    pub fn remove_dependency(&mut self, id: &TaskId, dependency_task_id: &TaskId) -> StoreResult<Task> {
        self.run("remove_dependency", |store, now| {
            let project = store.require_current()?;
            let task = project.task(id).ok_or_else(|| StoreError::TaskNotFound(id.clone()))?;
            match task.without_dependencies_on(dependency_task_id, now) {
                Some(next_task) => {
                    let next = project.with_task_replaced(next_task.clone(), now);
                    store.commit_project(next);
                    Ok(next_task)
                }
                None => Ok(task.clone()),
            }
        })
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    // --- Internals ---

    /// Runs one operation: flags `loading`, resets `error`, records failure,
    /// and persists and notifies once the new state is in place.
    fn run<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut Self, DateTime<Utc>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let result = if self.initialized {
            self.state.loading = true;
            self.state.error = None;
            f(self, Utc::now())
        } else {
            Err(StoreError::NotInitialized)
        };
        self.state.loading = false;

        match &result {
            Ok(_) => {
                if std::mem::take(&mut self.dirty) {
                    self.persist();
                    self.notify();
                }
            }
            Err(e) => {
                self.dirty = false;
                tracing::warn!(op, error = %e, "store operation failed");
                self.state.error = Some(e.to_string());
            }
        }
        result
    }

    fn require_current(&self) -> StoreResult<Project> {
        self.state.current().cloned().ok_or(StoreError::NoProjectSelected)
    }

    fn commit(&mut self, projects: Vec<Project>, current: Option<ProjectId>) {
        self.state.projects = projects;
        self.state.current_project = current;
        self.dirty = true;
    }

    fn commit_project(&mut self, project: Project) {
        let projects = self.state.projects_with(project);
        let current = self.state.current_project.clone();
        self.commit(projects, current);
    }

    fn encode_state(&mut self, now: DateTime<Utc>) -> String {
        codec::encode(&self.state.projects, self.state.current(), now, &mut self.repairs)
    }

    fn persist(&mut self) {
        let payload = self.encode_state(Utc::now());
        match self.slot.write(&self.key, &payload) {
            Ok(()) => self.last_persist_error = None,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "could not persist state");
                self.last_persist_error = Some(e.to_string());
            }
        }
    }

    fn notify(&mut self) {
        for listener in &mut self.listeners {
            listener(&self.state);
        }
    }
}
