//! Project and task store for Gantt planning.
//!
//! The [`Store`] owns every project and task, enforces their invariants and
//! keeps one durable slot in sync with its state. Reads of the slot repair
//! malformed or legacy payloads instead of failing.

pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod model;
pub mod persist;
pub mod repair;
pub mod store;

pub use config::Config;
pub use error::{CodecError, ExchangeError, SlotError, StoreError, StoreResult};
pub use model::{
    DateInput, DependencyType, Project, ProjectId, ProjectUpdate, Task, TaskDependency, TaskDraft,
    TaskId, TaskStatus, TaskUpdate,
};
pub use persist::{FileSlot, MemorySlot, StorageSlot};
pub use repair::{Correction, CorrectionKind, RepairLog};
pub use store::{Store, StoreState};
