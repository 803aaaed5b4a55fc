//! Spreadsheet reading through `calamine`.
//!
//! The first row of each worksheet's used range is the header row. Blank
//! header cells drop their column; duplicate headers keep the first column.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, Range, Reader, Sheets};
use kmz_sheet_models::{CellValue, Row, Sheet};

use crate::SheetError;

/// Reads every worksheet of the spreadsheet at `path`.
///
/// # Errors
///
/// Returns [`SheetError::Workbook`] if the file cannot be opened or a
/// worksheet cannot be read.
pub fn read_path(path: &Path) -> Result<Vec<Sheet>, SheetError> {
    let label = path.display().to_string();
    let mut workbook = calamine::open_workbook_auto(path).map_err(|e| SheetError::Workbook {
        path: label.clone(),
        source: e,
    })?;
    read_all(&mut workbook, &label)
}

/// Reads every worksheet of an in-memory spreadsheet.
///
/// # Errors
///
/// Returns [`SheetError::Workbook`] if the bytes are not a readable
/// spreadsheet.
pub fn read_bytes(bytes: Vec<u8>) -> Result<Vec<Sheet>, SheetError> {
    let label = "<memory>".to_string();
    let mut workbook =
        calamine::open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
            SheetError::Workbook {
                path: label.clone(),
                source: e,
            }
        })?;
    read_all(&mut workbook, &label)
}

fn read_all<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    label: &str,
) -> Result<Vec<Sheet>, SheetError> {
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| SheetError::Workbook {
                path: format!("{label}#{name}"),
                source: e,
            })?;
        let sheet = range_to_sheet(&name, &range);
        log::debug!(
            "Read sheet '{name}': {} columns, {} rows",
            sheet.columns.len(),
            sheet.rows.len()
        );
        sheets.push(sheet);
    }
    Ok(sheets)
}

/// Converts a worksheet range into a [`Sheet`], using the first row as the
/// header.
#[must_use]
pub fn range_to_sheet(name: &str, range: &Range<Data>) -> Sheet {
    let mut rows_iter = range.rows();

    let headers: Vec<Option<String>> = rows_iter
        .next()
        .map(|header_row| {
            header_row
                .iter()
                .map(|cell| {
                    let text = cell.to_string().trim().to_string();
                    (!text.is_empty()).then_some(text)
                })
                .collect()
        })
        .unwrap_or_default();

    let mut columns: Vec<String> = Vec::new();
    for header in headers.iter().flatten() {
        if !columns.contains(header) {
            columns.push(header.clone());
        }
    }

    let rows = rows_iter
        .map(|cells| {
            let mut row = Row::new();
            for (header, cell) in headers.iter().zip(cells) {
                let Some(header) = header else {
                    continue;
                };
                if row.get(header).is_none() {
                    row.insert(header.as_str(), to_cell_value(cell));
                }
            }
            row
        })
        .collect();

    Sheet {
        name: name.to_string(),
        columns,
        rows,
    }
}

/// Maps a `calamine` cell to a [`CellValue`]. Error cells become blank.
#[allow(clippy::cast_precision_loss)]
fn to_cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}
