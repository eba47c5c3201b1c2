pub mod date_input;
pub mod ids;
pub mod project;
pub mod task;

pub use date_input::{DateField, DateInput};
pub use ids::{ProjectId, TaskId};
pub use project::{Project, ProjectUpdate};
pub use task::{DependencyType, Task, TaskDependency, TaskDraft, TaskStatus, TaskUpdate};
