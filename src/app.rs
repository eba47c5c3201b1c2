use anyhow::Context;

use rust_gantt_store::io::{self, chart_rows};
use rust_gantt_store::{
    Config, DateInput, FileSlot, Project, ProjectId, ProjectUpdate, Store, Task, TaskDependency,
    TaskDraft, TaskId, TaskUpdate,
};

use crate::{Command, DepCommand, ExportCommand, ImportCommand, ProjectCommand, TaskCommand, TaskFields};

/// Command-line front end over the store.
pub struct GanttApp {
    pub store: Store<FileSlot>,
    pub status_message: String,
}

impl GanttApp {
    pub fn new(config: &Config) -> Self {
        let store = Store::open(config.slot(), config.slot_key.clone());
        if !store.repairs().is_empty() {
            tracing::info!(count = store.repairs().len(), "repaired persisted state on load");
        }
        Self {
            store,
            status_message: "Ready".to_string(),
        }
    }

    /// Flush state back to the slot.
    pub fn close(&mut self) -> anyhow::Result<()> {
        self.store.dispose().context("failed to save state")
    }

    pub fn run(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Project(cmd) => self.project(cmd)?,
            Command::Task(cmd) => self.task(cmd)?,
            Command::Dep(cmd) => self.dependency(cmd)?,
            Command::Export(cmd) => self.export(cmd)?,
            Command::Import(cmd) => self.import(cmd)?,
            Command::Show => self.show()?,
        }
        if let Some(err) = self.store.last_persist_error() {
            eprintln!("warning: state was not saved: {err}");
        }
        println!("{}", self.status_message);
        Ok(())
    }

    // --- Projects ---

    fn project(&mut self, cmd: ProjectCommand) -> anyhow::Result<()> {
        match cmd {
            ProjectCommand::Create { name, description } => {
                let project = self.store.create_project(name, description)?;
                self.status_message = format!("Created project '{}' ({})", project.name, project.id);
            }
            ProjectCommand::List => {
                let current = self.store.state().current_project.clone();
                for project in self.store.projects() {
                    let marker = if Some(&project.id) == current.as_ref() { "*" } else { " " };
                    println!(
                        "{marker} {}  {}  ({} tasks)",
                        project.id,
                        project.name,
                        project.tasks.len()
                    );
                }
                self.status_message = format!("Projects: {}", self.store.projects().len());
            }
            ProjectCommand::Update { id, name, description } => {
                let update = ProjectUpdate {
                    name,
                    description: description.map(|d| Some(d).filter(|d| !d.is_empty())),
                };
                let project = self.store.update_project(&ProjectId::from(id), update)?;
                self.status_message = format!("Updated project '{}'", project.name);
            }
            ProjectCommand::Delete { id } => {
                let project = self.store.delete_project(&ProjectId::from(id))?;
                self.status_message = format!("Deleted project '{}'", project.name);
            }
            ProjectCommand::Select { id, none } => {
                let id = if none { None } else { id.map(ProjectId::from) };
                self.status_message = match self.store.select_project(id.as_ref())? {
                    Some(project) => format!("Selected '{}'", project.name),
                    None => "Selection cleared".to_string(),
                };
            }
        }
        Ok(())
    }

    // --- Tasks ---

    fn task(&mut self, cmd: TaskCommand) -> anyhow::Result<()> {
        match cmd {
            TaskCommand::Add { name, fields, depends_on } => {
                let draft = TaskDraft {
                    name: Some(name),
                    description: fields.description,
                    start_date: fields.start.map(DateInput::from),
                    end_date: fields.end.map(DateInput::from),
                    completion: fields.completion,
                    status: fields.status,
                    dependencies: depends_on
                        .into_iter()
                        .map(|id| TaskDependency::finish_to_start(TaskId::from(id)))
                        .collect(),
                };
                let task = self.store.create_task(draft)?;
                self.status_message = format!("Task added: {}", describe(&task));
            }
            TaskCommand::List => {
                let project = self.current()?;
                for task in &project.tasks {
                    println!("{}  {}", task.id, describe(task));
                }
                self.status_message = format!("Tasks: {}", project.tasks.len());
            }
            TaskCommand::Update { id, name, fields } => {
                let update = task_update(name, fields);
                let task = self.store.update_task(&TaskId::from(id), update)?;
                self.status_message = format!("Task updated: {}", describe(&task));
            }
            TaskCommand::Delete { id } => {
                let task = self.store.delete_task(&TaskId::from(id))?;
                self.status_message = format!("Task deleted: '{}'", task.name);
            }
        }
        Ok(())
    }

    fn dependency(&mut self, cmd: DepCommand) -> anyhow::Result<()> {
        match cmd {
            DepCommand::Add { task, on, kind } => {
                let dependency = TaskDependency::new(TaskId::from(on), kind.into());
                let task = self.store.add_dependency(&TaskId::from(task), dependency)?;
                self.status_message = format!(
                    "'{}' now has {} dependencies",
                    task.name,
                    task.dependencies.len()
                );
            }
            DepCommand::Remove { task, on } => {
                let task = self
                    .store
                    .remove_dependency(&TaskId::from(task), &TaskId::from(on))?;
                self.status_message = format!("Dependency removed from '{}'", task.name);
            }
        }
        Ok(())
    }

    // --- Exchange ---

    fn export(&mut self, cmd: ExportCommand) -> anyhow::Result<()> {
        let project = self.current()?;
        if project.tasks.is_empty() {
            self.status_message = "Nothing to export: project has no tasks".to_string();
            return Ok(());
        }
        let rows = chart_rows(&project);
        match cmd {
            ExportCommand::Chart => {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                self.status_message = format!("Exported {} rows", rows.len());
            }
            ExportCommand::Csv { path } => {
                let count = io::export_chart_csv(&rows, &path)?;
                self.status_message = format!("Exported {count} tasks to CSV");
            }
            ExportCommand::Json { path } => {
                io::export_project_json(&project, &path)?;
                self.status_message = format!("Project saved to {}", path.display());
            }
        }
        Ok(())
    }

    fn import(&mut self, cmd: ImportCommand) -> anyhow::Result<()> {
        match cmd {
            ImportCommand::Csv { path } => {
                let (drafts, skipped) = io::import_csv(&path)?;
                let count = drafts.len();
                for draft in drafts {
                    self.store.create_task(draft)?;
                }
                self.status_message = if skipped > 0 {
                    format!("Imported {count} tasks ({skipped} rows skipped)")
                } else {
                    format!("Imported {count} tasks")
                };
            }
        }
        Ok(())
    }

    fn show(&mut self) -> anyhow::Result<()> {
        let project = self.current()?;
        println!("{} ({})", project.name, project.id);
        if let Some(description) = &project.description {
            println!("{description}");
        }
        if let Some((from, to)) = io::visible_range(&project) {
            println!("Timeline: {} -> {}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d"));
        }
        for task in &project.tasks {
            let deps: Vec<String> = task.dependencies.iter().map(|d| d.task_id.to_string()).collect();
            println!("  {}  {}  deps: [{}]", task.id, describe(task), deps.join(", "));
        }
        self.status_message = format!("Tasks: {}", project.tasks.len());
        Ok(())
    }

    fn current(&self) -> anyhow::Result<Project> {
        self.store
            .current_project()
            .cloned()
            .context("no project selected; run `gantt project select <id>`")
    }
}

fn task_update(name: Option<String>, fields: TaskFields) -> TaskUpdate {
    TaskUpdate {
        name,
        description: fields.description.map(|d| Some(d).filter(|d| !d.is_empty())),
        start_date: fields.start.map(DateInput::from),
        end_date: fields.end.map(DateInput::from),
        completion: fields.completion,
        status: fields.status,
        dependencies: None,
    }
}

fn describe(task: &Task) -> String {
    format!(
        "'{}' {} -> {} ({}%, {})",
        task.name,
        task.start_date.format("%Y-%m-%d"),
        task.end_date.format("%Y-%m-%d"),
        task.completion,
        task.status.label()
    )
}
