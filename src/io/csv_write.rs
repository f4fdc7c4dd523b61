use std::path::Path;

use crate::error::Result;
use crate::flatten::SheetTable;

/// Writes a single table as comma-separated text, header first. Existing
/// files are truncated.
pub fn write_csv(path: &Path, table: &SheetTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    if !table.columns.is_empty() {
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
    }

    writer.flush()?;
    Ok(())
}
