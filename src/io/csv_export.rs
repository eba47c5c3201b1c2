use std::path::Path;

use super::chart::ChartRow;
use crate::error::ExchangeError;

const HEADER: [&str; 8] = [
    "Task ID",
    "Task Label",
    "Resource",
    "Start Date",
    "End Date",
    "Duration",
    "Percent Complete",
    "Dependencies",
];

/// Write chart rows as semicolon-delimited CSV.
///
/// Dates are formatted as DD/MM/YYYY, dependencies as a comma-joined id
/// list. Returns the number of rows written.
pub fn write_chart_csv<W: std::io::Write>(rows: &[ChartRow], out: W) -> Result<usize, ExchangeError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(out);

    wtr.write_record(HEADER)?;
    for row in rows {
        let start = row.start.format("%d/%m/%Y").to_string();
        let end = row.end.format("%d/%m/%Y").to_string();
        let duration = row.duration_days.to_string();
        let percent = row.percent_complete.to_string();
        let dependencies = row.dependencies.join(",");
        wtr.write_record([
            row.id.as_str(),
            row.name.as_str(),
            row.resource.as_str(),
            start.as_str(),
            end.as_str(),
            duration.as_str(),
            percent.as_str(),
            dependencies.as_str(),
        ])?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(rows.len())
}

/// Export chart rows to a CSV file at `path`.
pub fn export_chart_csv(rows: &[ChartRow], path: &Path) -> Result<usize, ExchangeError> {
    let file = std::fs::File::create(path).map_err(|source| ExchangeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let count = write_chart_csv(rows, file)?;
    tracing::info!(path = %path.display(), rows = count, "exported chart rows");
    Ok(count)
}
