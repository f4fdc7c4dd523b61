use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::Result;
use crate::flatten::{SheetTable, WorkbookData};
use crate::model::CellValue;

/// Largest integer magnitude a spreadsheet number holds exactly (2^53).
pub const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Writes the provided workbook data to the given path, one worksheet per
/// table, replacing any existing file.
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = Workbook::new();
    let header_format = Format::new().set_bold();

    for table in &workbook.tables {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&table.sheet_name)?;
        write_table(worksheet, table, &header_format)?;
    }

    workbook_writer.save(path)?;
    Ok(())
}

fn write_table(
    worksheet: &mut Worksheet,
    table: &SheetTable,
    header_format: &Format,
) -> Result<()> {
    if table.columns.is_empty() {
        return Ok(());
    }

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, header, header_format)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            write_cell(worksheet, row_num, col_idx as u16, cell)?;
        }
    }

    for (col_idx, width) in table.column_widths().into_iter().enumerate() {
        worksheet.set_column_width(col_idx as u16, width as f64)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &CellValue) -> Result<()> {
    match cell {
        CellValue::Number(number) if number.is_finite() => {
            worksheet.write_number(row, col, *number)?;
        }
        CellValue::Integer(integer) if integer.unsigned_abs() <= MAX_EXACT_INTEGER => {
            worksheet.write_number(row, col, *integer as f64)?;
        }
        CellValue::Boolean(flag) => {
            worksheet.write_boolean(row, col, *flag)?;
        }
        CellValue::Null => {}
        other => {
            worksheet.write_string(row, col, &other.to_string())?;
        }
    }
    Ok(())
}
