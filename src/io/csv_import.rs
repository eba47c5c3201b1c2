use std::path::Path;

use crate::error::ExchangeError;
use crate::model::{DateInput, TaskDraft, TaskStatus};

/// Map a status string to a completion percent.
fn status_to_completion(status: &str) -> f64 {
    match TaskStatus::parse_loose(status) {
        Some(TaskStatus::Completed) => 100.0,
        Some(TaskStatus::InProgress) => 50.0,
        _ => match status.trim().to_lowercase().as_str() {
            "released" | "planned" => 25.0,
            _ => 0.0,
        },
    }
}

/// Detect delimiter by checking the first line for common separators.
fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();

    if semicolons >= commas && semicolons >= tabs {
        b';'
    } else if tabs >= commas {
        b'\t'
    } else {
        b','
    }
}

/// Normalize a header string to a canonical column key.
fn normalize_header(h: &str) -> String {
    h.trim().to_lowercase().replace([' ', '-', '_'], "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Start,
    End,
    Status,
    Completion,
    Description,
}

fn header_to_column(normalized: &str) -> Option<Column> {
    match normalized {
        "name" | "task" | "tasklabel" | "taskname" | "label" | "title" | "activity" => {
            Some(Column::Name)
        }
        "start" | "startdate" | "from" | "begin" | "begindate" => Some(Column::Start),
        "end" | "enddate" | "to" | "finish" | "finishdate" | "due" | "duedate" => Some(Column::End),
        "status" | "state" | "stage" | "resource" => Some(Column::Status),
        "completion" | "percentcomplete" | "progress" | "done" | "percent" => Some(Column::Completion),
        "description" | "notes" | "note" | "details" | "comment" | "comments" => {
            Some(Column::Description)
        }
        _ => None,
    }
}

/// Parse "40", "40%" or "0.4" (fraction) into a percent.
fn parse_completion(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    let value: f64 = trimmed.parse().ok()?;
    if !raw.contains('%') && trimmed.contains('.') && (0.0..=1.0).contains(&value) {
        Some(value * 100.0)
    } else {
        Some(value)
    }
}

/// Parse CSV text into task drafts.
///
/// Auto-detects the delimiter (comma, semicolon, tab) and matches column
/// headers flexibly. Only a name column is required. Date cells are passed
/// through untouched so that task creation applies its usual repair policy.
/// Returns `(drafts, skipped_count)`.
pub fn parse_csv(content: &str) -> Result<(Vec<TaskDraft>, usize), ExchangeError> {
    let first_line = content.lines().next().unwrap_or("");
    let delimiter = detect_delimiter(first_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let columns: Vec<Option<Column>> = headers
        .iter()
        .map(|h| header_to_column(&normalize_header(h)))
        .collect();

    if !columns.contains(&Some(Column::Name)) {
        return Err(ExchangeError::MissingColumns(
            headers.iter().map(str::to_string).collect(),
        ));
    }

    let mut drafts = Vec::new();
    let mut skipped = 0usize;

    for (i, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(row = i + 2, error = %e, "skipping CSV row");
                skipped += 1;
                continue;
            }
        };

        let mut draft = TaskDraft::default();
        let mut status_text: Option<&str> = None;
        for (field, column) in record.iter().zip(&columns) {
            let Some(column) = column else { continue };
            if field.is_empty() {
                continue;
            }
            match column {
                Column::Name => draft.name = Some(field.to_string()),
                Column::Start => draft.start_date = Some(DateInput::from(field)),
                Column::End => draft.end_date = Some(DateInput::from(field)),
                Column::Status => {
                    draft.status = TaskStatus::parse_loose(field);
                    status_text = Some(field);
                }
                Column::Completion => draft.completion = parse_completion(field),
                Column::Description => draft.description = Some(field.to_string()),
            }
        }

        if draft.name.is_none() {
            tracing::warn!(row = i + 2, "skipping CSV row without a task name");
            skipped += 1;
            continue;
        }
        if draft.completion.is_none() {
            draft.completion = status_text.map(status_to_completion);
        }
        drafts.push(draft);
    }

    if drafts.is_empty() {
        return Err(ExchangeError::Empty);
    }
    Ok((drafts, skipped))
}

/// Import task drafts from a CSV file.
pub fn import_csv(path: &Path) -> Result<(Vec<TaskDraft>, usize), ExchangeError> {
    let content = std::fs::read_to_string(path).map_err(|source| ExchangeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_csv(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_semicolon_sheet_with_loose_headers() {
        let csv = "Task Label;Start Date;End Date;Status\n\
                   Kickoff;01/03/2024;04/03/2024;Finished\n\
                   Build;2024-03-04;not a date;In Progress\n\
                   ;2024-03-04;2024-03-05;Released\n";
        let (drafts, skipped) = parse_csv(csv).unwrap();

        assert_eq!(drafts.len(), 2);
        assert_eq!(skipped, 1);
        assert_eq!(drafts[0].name.as_deref(), Some("Kickoff"));
        assert_eq!(drafts[0].status, Some(TaskStatus::Completed));
        assert_eq!(drafts[0].completion, Some(100.0));
        assert_eq!(drafts[1].end_date, Some(DateInput::Text("not a date".into())));
        assert_eq!(drafts[1].completion, Some(50.0));
    }

    #[test]
    fn explicit_completion_wins_over_status() {
        let csv = "name,status,percent complete\nA,in progress,80%\nB,done,0.25\n";
        let (drafts, _) = parse_csv(csv).unwrap();
        assert_eq!(drafts[0].completion, Some(80.0));
        assert_eq!(drafts[1].completion, Some(25.0));
    }

    #[test]
    fn missing_name_column_is_rejected() {
        let err = parse_csv("start;end\n2024-01-01;2024-01-02\n").unwrap_err();
        assert!(matches!(err, ExchangeError::MissingColumns(found) if found == ["start", "end"]));
    }

    #[test]
    fn header_only_is_empty() {
        assert!(matches!(parse_csv("name;start\n"), Err(ExchangeError::Empty)));
    }
}
