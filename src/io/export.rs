use std::path::{Path, PathBuf};

use crate::model::task::Task;
use crate::util::time::format_instant;

pub const EXPORT_HEADER: [&str; 4] = ["Task", "Start", "Deadline", "Completed"];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("could not write {path}: {source}")]
    CsvError { path: PathBuf, source: csv::Error },
    #[error("could not write {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Write the task list as a spreadsheet (CSV) with one row per task.
///
/// Start and deadline use the same display pattern as the UI. Returns the
/// number of rows written, not counting the header.
pub fn export_tasks(tasks: &[Task], path: &Path, time_format: &str) -> Result<usize, ExportError> {
    let csv_err = |source| ExportError::CsvError {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(EXPORT_HEADER).map_err(csv_err)?;
    for task in tasks {
        let start = format_instant(task.start, time_format);
        let deadline = format_instant(task.deadline, time_format);
        let completed = if task.completed { "Yes" } else { "No" };
        writer
            .write_record([task.text.as_str(), start.as_str(), deadline.as_str(), completed])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|e| ExportError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(path = %path.display(), rows = tasks.len(), "exported tasks");
    Ok(tasks.len())
}
