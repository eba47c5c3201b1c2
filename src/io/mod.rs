pub mod chart;
pub mod csv_export;
pub mod csv_import;
pub mod file;

pub use chart::{chart_rows, visible_range, ChartRow};
pub use csv_export::{export_chart_csv, write_chart_csv};
pub use csv_import::{import_csv, parse_csv};
pub use file::export_project_json;
