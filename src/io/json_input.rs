use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{Result, ToolError};
use crate::flatten::flatten_json_object;
use crate::model::Table;

/// Reads collected records from a JSON document.
///
/// A top-level array of objects becomes a single sheet named `default_sheet`.
/// A top-level object whose values are arrays of objects becomes one sheet
/// per key, in document order.
pub fn read_sheets_from_json(path: &Path, default_sheet: &str) -> Result<Vec<(String, Table)>> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }

    let source = fs::read_to_string(path)?;
    let json: Value = serde_json::from_str(&source)?;
    sheets_from_value(&json, default_sheet)
}

/// Same as [`read_sheets_from_json`] for an already parsed document.
pub fn sheets_from_value(json: &Value, default_sheet: &str) -> Result<Vec<(String, Table)>> {
    match json {
        Value::Array(items) => {
            let table = table_from_items(default_sheet, items)?;
            Ok(vec![(default_sheet.to_string(), table)])
        }
        Value::Object(sheets) => sheets
            .iter()
            .map(|(sheet_name, items)| match items {
                Value::Array(items) => {
                    Ok((sheet_name.clone(), table_from_items(sheet_name, items)?))
                }
                _ => Err(ToolError::InvalidInput(format!(
                    "sheet '{sheet_name}' must be an array of objects"
                ))),
            })
            .collect(),
        _ => Err(ToolError::InvalidInput(
            "expected an array of records or an object of sheet arrays".to_string(),
        )),
    }
}

fn table_from_items(sheet_name: &str, items: &[Value]) -> Result<Table> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(object) => Ok(flatten_json_object(object)),
            _ => Err(ToolError::InvalidInput(format!(
                "record {index} of sheet '{sheet_name}' is not an object"
            ))),
        })
        .collect::<Result<Vec<_>>>()
        .map(Table::from_records)
}
