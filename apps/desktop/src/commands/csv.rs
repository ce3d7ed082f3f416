//! CSV export and import commands.
//!
//! File variants take the path chosen in the file dialog; `None` means the
//! user dismissed it.

use super::{log_failure, with_repository, CommandError, FileOutcome};
use crate::db::{CsvExportOptions, CsvRepository, ImportSummary};
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// A CSV file written by [`export_csv_file`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub bytes: usize,
}

pub fn export_csv_text(
    state: &AppState,
    options: CsvExportOptions,
) -> Result<String, CommandError> {
    with_repository(state, "export_csv_text", |repo| repo.export_csv(&options))
}

pub fn import_csv_text(state: &AppState, text: &str) -> Result<ImportSummary, CommandError> {
    with_repository(state, "import_csv_text", |repo| repo.import_csv(text))
}

pub fn export_csv_file(
    state: &AppState,
    path: Option<PathBuf>,
    options: CsvExportOptions,
) -> Result<FileOutcome<ExportedFile>, CommandError> {
    let Some(path) = path else {
        return Ok(FileOutcome::Cancelled);
    };

    let text = export_csv_text(state, options)?;
    fs::write(&path, text.as_bytes()).map_err(|e| log_failure("export_csv_file", e.into()))?;
    info!(path = %path.display(), bytes = text.len(), "exported csv");

    Ok(FileOutcome::Completed(ExportedFile {
        path,
        bytes: text.len(),
    }))
}

pub fn import_csv_file(
    state: &AppState,
    path: Option<PathBuf>,
) -> Result<FileOutcome<ImportSummary>, CommandError> {
    let Some(path) = path else {
        return Ok(FileOutcome::Cancelled);
    };

    let text = fs::read_to_string(&path).map_err(|e| log_failure("import_csv_file", e.into()))?;
    let summary = import_csv_text(state, &text)?;
    Ok(FileOutcome::Completed(summary))
}
