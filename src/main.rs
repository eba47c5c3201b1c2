mod app;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use rust_gantt_store::{logging, Config, DependencyType, TaskStatus};

#[derive(Parser)]
#[command(name = "gantt", version, about = "Plan projects and tasks for Gantt charts")]
struct Cli {
    /// Directory holding the persisted state (overrides GANTT_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Manage tasks of the selected project
    #[command(subcommand)]
    Task(TaskCommand),

    /// Manage dependencies between tasks of the selected project
    #[command(subcommand)]
    Dep(DepCommand),

    /// Export the selected project
    #[command(subcommand)]
    Export(ExportCommand),

    /// Import tasks into the selected project
    #[command(subcommand)]
    Import(ImportCommand),

    /// Show the selected project and its tasks
    Show,
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Create a project and select it
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List all projects
    List,
    /// Change a project's name or description
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a project
    Delete { id: String },
    /// Select a project, or clear the selection with --none
    Select {
        #[arg(required_unless_present = "none")]
        id: Option<String>,
        #[arg(long)]
        none: bool,
    },
}

#[derive(Args)]
pub struct TaskFields {
    /// Start date (RFC 3339, YYYY-MM-DD, DD/MM/YYYY, ...)
    #[arg(long)]
    pub start: Option<String>,
    /// End date
    #[arg(long)]
    pub end: Option<String>,
    /// Percent complete
    #[arg(long, allow_negative_numbers = true)]
    pub completion: Option<f64>,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<TaskStatus>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Add a task to the selected project
    Add {
        name: String,
        #[command(flatten)]
        fields: TaskFields,
        /// Task ids this task depends on (finish-to-start)
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,
    },
    /// List tasks of the selected project
    List,
    /// Update a task
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Delete a task and every dependency on it
    Delete { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DepKind {
    Fs,
    Ss,
    Ff,
    Sf,
}

impl From<DepKind> for DependencyType {
    fn from(kind: DepKind) -> Self {
        match kind {
            DepKind::Fs => DependencyType::FinishToStart,
            DepKind::Ss => DependencyType::StartToStart,
            DepKind::Ff => DependencyType::FinishToFinish,
            DepKind::Sf => DependencyType::StartToFinish,
        }
    }
}

#[derive(Subcommand)]
pub enum DepCommand {
    /// Make TASK depend on ON
    Add {
        task: String,
        on: String,
        #[arg(long, value_enum, default_value = "fs")]
        kind: DepKind,
    },
    /// Remove every dependency of TASK on ON
    Remove { task: String, on: String },
}

#[derive(Subcommand)]
pub enum ExportCommand {
    /// Print chart rows as JSON
    Chart,
    /// Write chart rows as semicolon-delimited CSV
    Csv { path: PathBuf },
    /// Write the project as JSON
    Json { path: PathBuf },
}

#[derive(Subcommand)]
pub enum ImportCommand {
    /// Add tasks from a CSV file
    Csv { path: PathBuf },
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::parse_loose(s).ok_or_else(|| {
        format!("unknown status '{s}' (expected not-started, in-progress, completed or on-hold)")
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    logging::init_logging(&config.log_filter);

    let mut app = app::GanttApp::new(&config);
    let result = app.run(cli.cmd);
    app.close()?;
    result
}
