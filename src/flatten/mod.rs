use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::model::{CellValue, Record, Table};

/// Value written in place of missing or null cells.
pub const MISSING_PLACEHOLDER: &str = "N/A";
/// Maximum sheet name length accepted by the spreadsheet format.
pub const MAX_SHEET_NAME_LEN: usize = 31;
/// Upper bound for an auto-sized column width, in characters.
pub const MAX_COLUMN_WIDTH: usize = 50;
/// Extra characters added to the widest cell of a column.
pub const COLUMN_PADDING: usize = 2;

const ILLEGAL_SHEET_CHARS: [char; 7] = ['/', '\\', '?', '*', '[', ']', ':'];

/// A normalized table that will be materialised as a single worksheet. Every
/// row has exactly one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetTable {
    /// Display width of every column: the longest of the header and the
    /// stringified cells plus padding, capped at [`MAX_COLUMN_WIDTH`].
    pub fn column_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(col_idx, header)| {
                let longest_cell = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(col_idx))
                    .map(|cell| cell.to_string().chars().count())
                    .max()
                    .unwrap_or(0);
                let content = header.chars().count().max(longest_cell);
                (content + COLUMN_PADDING).min(MAX_COLUMN_WIDTH)
            })
            .collect()
    }
}

/// Represents all tables required to materialise the Excel workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

/// Normalizes the given sheets in order and assigns each one a unique, valid
/// sheet name.
pub fn build_workbook(sheets: &[(String, Table)]) -> WorkbookData {
    let names = assign_sheet_names(sheets.iter().map(|(raw_name, _)| raw_name.as_str()));
    let tables = names
        .into_iter()
        .zip(sheets)
        .map(|(sheet_name, (_, table))| normalize_table(sheet_name, table))
        .collect();

    WorkbookData { tables }
}

/// Sheet names [`build_workbook`] gives the raw names, in the same order.
pub fn assign_sheet_names<'a>(raw_names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut registry = SheetNameRegistry::default();
    raw_names.into_iter().map(|raw| registry.assign(raw)).collect()
}

/// Lays a table out as rows sharing the union column set. Missing and null
/// cells are replaced by [`MISSING_PLACEHOLDER`] and timestamps are rendered
/// as text.
pub fn normalize_table(sheet_name: String, table: &Table) -> SheetTable {
    let columns = table.columns();
    let rows = table
        .records()
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| normalize_cell(record.get(column)))
                .collect()
        })
        .collect();

    SheetTable {
        sheet_name,
        columns,
        rows,
    }
}

fn normalize_cell(cell: Option<&CellValue>) -> CellValue {
    match cell {
        None | Some(CellValue::Null) => CellValue::Text(MISSING_PLACEHOLDER.to_string()),
        Some(moment @ CellValue::DateTime(_)) => CellValue::Text(moment.to_string()),
        Some(other) => other.clone(),
    }
}

#[derive(Debug, Default)]
struct SheetNameRegistry {
    used: HashSet<String>,
}

impl SheetNameRegistry {
    // Sheet names collide case-insensitively.
    fn claim(&mut self, name: &str) -> bool {
        self.used.insert(name.to_lowercase())
    }

    fn assign(&mut self, raw: &str) -> String {
        let base = sanitize_sheet_name(raw);
        if self.claim(&base) {
            return base;
        }

        let mut counter = 1;
        loop {
            let suffix = format!("_{counter}");
            let max_len = MAX_SHEET_NAME_LEN - suffix.len();
            let prefix: String = base.chars().take(max_len).collect();
            let candidate = format!("{prefix}{suffix}");
            if self.claim(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Strips characters the spreadsheet format rejects and truncates the result
/// to [`MAX_SHEET_NAME_LEN`] characters.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|ch| !ILLEGAL_SHEET_CHARS.contains(ch) && !ch.is_control())
        .collect();

    let truncated: String = trim_sheet_name(&stripped)
        .chars()
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let sanitized = trim_sheet_name(&truncated);

    if sanitized.is_empty() {
        "Sheet".to_string()
    } else {
        sanitized.to_string()
    }
}

fn trim_sheet_name(name: &str) -> &str {
    name.trim().trim_matches('\'').trim()
}

/// Flattens a nested JSON object into a single record. Nested keys are joined
/// with `.`, scalar arrays become comma-separated text and arrays holding
/// objects are kept as compact JSON.
pub fn flatten_json_object(object: &Map<String, Value>) -> Record {
    let mut record = Record::new();
    flatten_into(&mut record, None, object);
    record
}

fn flatten_into(record: &mut Record, prefix: Option<&str>, object: &Map<String, Value>) {
    for (key, value) in object {
        let column = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };

        match value {
            Value::Object(nested) if !nested.is_empty() => {
                flatten_into(record, Some(column.as_str()), nested);
            }
            Value::Object(_) => record.insert(column, CellValue::Null),
            Value::Array(items) => record.insert(column, flatten_array(items)),
            scalar => {
                if let Some(cell) = CellValue::from_json(scalar) {
                    record.insert(column, cell);
                }
            }
        }
    }
}

fn flatten_array(items: &[Value]) -> CellValue {
    if items.is_empty() {
        return CellValue::Null;
    }

    let scalars: Option<Vec<String>> = items
        .iter()
        .map(|item| match item {
            Value::Array(_) | Value::Object(_) => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        })
        .collect();

    match scalars {
        Some(parts) => CellValue::Text(parts.join(", ")),
        None => CellValue::Text(Value::Array(items.to_vec()).to_string()),
    }
}
