use std::path::Path;

use crate::error::ExchangeError;
use crate::model::Project;

/// Write one project, tasks included, as pretty-printed JSON.
pub fn export_project_json(project: &Project, path: &Path) -> Result<(), ExchangeError> {
    let json = serde_json::to_string_pretty(project).map_err(|e| ExchangeError::Io {
        path: path.display().to_string(),
        source: e.into(),
    })?;
    std::fs::write(path, json).map_err(|source| ExchangeError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn exported_json_reads_back_as_the_same_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        let project = Project::new("Demo", Some("notes".into()), Utc::now());

        export_project_json(&project, &path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let back: Project = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, project);
        assert!(raw.contains("\"createdAt\""));
    }

    #[test]
    fn missing_directory_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("demo.json");
        let project = Project::new("Demo", None, Utc::now());

        let err = export_project_json(&project, &path).unwrap_err();
        assert!(err.to_string().contains("demo.json"));
    }
}
