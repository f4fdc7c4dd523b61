//! The tabular export helper: writes tables to a multi-sheet workbook and
//! falls back to delimited text when the workbook cannot be written.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, instrument, warn};

use crate::error::{Result, ToolError};
use crate::flatten::{SheetTable, WorkbookData, assign_sheet_names, build_workbook};
use crate::io::{csv_write, excel_write};
use crate::model::{ExportJob, Table};

/// Result of an export. Failures are reported here instead of as errors so
/// callers can tell a fallback apart from a total failure.
#[derive(Debug)]
pub enum ExportOutcome {
    /// The workbook was written to this absolute path.
    Spreadsheet(PathBuf),
    /// The workbook failed and the tables were written as CSV instead.
    Fallback {
        paths: Vec<PathBuf>,
        cause: ToolError,
    },
    /// Neither the workbook nor the CSV fallback could be written.
    Failed {
        spreadsheet: ToolError,
        fallback: ToolError,
    },
}

impl ExportOutcome {
    /// Every file produced by the export.
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            ExportOutcome::Spreadsheet(path) => vec![path.as_path()],
            ExportOutcome::Fallback { paths, .. } => paths.iter().map(PathBuf::as_path).collect(),
            ExportOutcome::Failed { .. } => Vec::new(),
        }
    }

    /// True when some output, primary or fallback, was written.
    pub fn is_written(&self) -> bool {
        !matches!(self, ExportOutcome::Failed { .. })
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ExportOutcome::Fallback { .. })
    }

    /// Converts a total failure into an error, keeping the written paths
    /// otherwise.
    pub fn into_result(self) -> Result<Vec<PathBuf>> {
        match self {
            ExportOutcome::Spreadsheet(path) => Ok(vec![path]),
            ExportOutcome::Fallback { paths, .. } => Ok(paths),
            ExportOutcome::Failed {
                spreadsheet,
                fallback,
            } => Err(ToolError::ExportFailed {
                spreadsheet: spreadsheet.to_string(),
                fallback: fallback.to_string(),
            }),
        }
    }
}

/// Writes export files into a single output directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Path a file with the given name is written to.
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }

    /// Writes one table as a single worksheet. Falls back to `<stem>.csv`.
    #[instrument(level = "info", skip(self, table), fields(records = table.len()))]
    pub fn export_single(&self, table: &Table, filename: &str, sheet_name: &str) -> ExportOutcome {
        let workbook = build_workbook(&[(sheet_name.to_string(), table.clone())]);
        self.export_workbook(&workbook, filename)
    }

    /// Writes one worksheet per entry, in order. Falls back to one
    /// `<stem>-<sheet>.csv` per sheet. An empty sheet list writes nothing and
    /// is reported as [`ExportOutcome::Failed`].
    #[instrument(level = "info", skip(self, sheets), fields(sheets = sheets.len()))]
    pub fn export_multi(&self, sheets: &[(String, Table)], filename: &str) -> ExportOutcome {
        if sheets.is_empty() {
            error!(filename, "export has no sheets, nothing was written");
            return ExportOutcome::Failed {
                spreadsheet: ToolError::EmptyExport(filename.to_string()),
                fallback: ToolError::EmptyExport(filename.to_string()),
            };
        }

        let workbook = build_workbook(sheets);
        self.export_workbook(&workbook, filename)
    }

    pub fn export_job(&self, job: &ExportJob) -> ExportOutcome {
        self.export_multi(&job.sheets, &job.filename)
    }

    fn export_workbook(&self, workbook: &WorkbookData, filename: &str) -> ExportOutcome {
        let path = self.output_path(filename);

        let cause = match self.write_spreadsheet(&path, workbook) {
            Ok(()) => {
                let path = fs::canonicalize(&path).unwrap_or(path);
                info!(path = %path.display(), "data exported");
                return ExportOutcome::Spreadsheet(path);
            }
            Err(cause) => cause,
        };

        warn!(
            path = %path.display(),
            error = %cause,
            "spreadsheet export failed, writing CSV instead"
        );
        match write_fallback(&path, workbook) {
            Ok(paths) => {
                for fallback_path in &paths {
                    info!(path = %fallback_path.display(), "saved as CSV instead");
                }
                ExportOutcome::Fallback { paths, cause }
            }
            Err(fallback) => {
                error!(path = %path.display(), error = %fallback, "CSV fallback failed");
                ExportOutcome::Failed {
                    spreadsheet: cause,
                    fallback,
                }
            }
        }
    }

    fn write_spreadsheet(&self, path: &Path, workbook: &WorkbookData) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        excel_write::write_workbook(path, workbook)
    }
}

fn write_fallback(path: &Path, workbook: &WorkbookData) -> Result<Vec<PathBuf>> {
    match workbook.tables.as_slice() {
        [table] => {
            let csv_path = path.with_extension("csv");
            write_fallback_table(&csv_path, table)?;
            Ok(vec![csv_path])
        }
        tables => {
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            tables
                .iter()
                .zip(fallback_file_names(&stem, tables))
                .map(|(table, name)| {
                    let csv_path = path.with_file_name(name);
                    write_fallback_table(&csv_path, table)?;
                    Ok(csv_path)
                })
                .collect()
        }
    }
}

// Distinct sheet names can map to the same file name once made file safe,
// and file systems may compare names case-insensitively.
fn fallback_file_names(stem: &str, tables: &[SheetTable]) -> Vec<String> {
    let mut used = HashSet::new();
    tables
        .iter()
        .map(|table| {
            let base = format!("{stem}-{}", file_safe(&table.sheet_name));
            let mut name = base.clone();
            let mut counter = 1;
            while !used.insert(name.to_lowercase()) {
                name = format!("{base}_{counter}");
                counter += 1;
            }
            format!("{name}.csv")
        })
        .collect()
}

fn write_fallback_table(path: &Path, table: &SheetTable) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    csv_write::write_csv(path, table)?;
    Ok(())
}

// Sheet names may still hold characters that are invalid in file names.
fn file_safe(sheet_name: &str) -> String {
    sheet_name
        .chars()
        .map(|ch| match ch {
            '<' | '>' | '"' | '|' => '_',
            ch if ch.is_whitespace() => '_',
            ch => ch,
        })
        .collect()
}

/// Logs the record count of each exported sheet under the name it was
/// written with.
pub fn log_export_summary(job: &ExportJob, outcome: &ExportOutcome) {
    if !outcome.is_written() {
        error!(filename = %job.filename, "export failed, nothing was written");
        return;
    }

    for path in outcome.paths() {
        info!(path = %path.display(), "file location");
    }
    for (sheet_name, (_, table)) in sheet_summary(job) {
        info!(sheet = %sheet_name, records = table.len(), "exported sheet");
    }
    info!(records = job.record_count(), sheets = job.sheets.len(), "export complete");
}

fn sheet_summary(job: &ExportJob) -> impl Iterator<Item = (String, &(String, Table))> {
    let names = assign_sheet_names(job.sheets.iter().map(|(name, _)| name.as_str()));
    names.into_iter().zip(job.sheets.iter())
}
