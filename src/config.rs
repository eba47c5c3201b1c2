//! Runtime configuration.
//!
//! Values come from the environment, with the platform data directory as
//! the default home of the persisted slot:
//! - `GANTT_DATA_DIR`: directory holding the slot file.
//! - `GANTT_SLOT_KEY`: slot key, which is also the file stem.
//! - `GANTT_LOG`: `tracing` filter directive, e.g. `debug` or
//!   `rust_gantt_store=trace`.

use std::path::PathBuf;

use crate::persist::FileSlot;

pub const DEFAULT_SLOT_KEY: &str = "gantt-storage";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub slot_key: String,
    pub log_filter: String,
}

impl Config {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = non_empty("GANTT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let slot_key = non_empty("GANTT_SLOT_KEY").unwrap_or_else(|| DEFAULT_SLOT_KEY.to_string());
        let log_filter = non_empty("GANTT_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            data_dir,
            slot_key,
            log_filter,
        }
    }

    pub fn slot(&self) -> FileSlot {
        FileSlot::new(&self.data_dir)
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "rust-gantt")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".gantt"))
}
