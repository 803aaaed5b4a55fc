//! CSV directory input: one `.csv` file per sheet.
//!
//! The file stem is the sheet name (`AGMs.csv` -> `AGMs`). Empty fields are
//! blank cells; everything else is kept as text and parsed on demand. A
//! blank separator row must be written as a row of empty fields (`,,`),
//! since fully empty lines are skipped by the CSV reader.

use std::io::Read;
use std::path::Path;

use kmz_sheet_models::{CellValue, Row, Sheet};

use crate::SheetError;

/// Reads every `.csv` file in `dir` (non-recursive), sorted by file name.
///
/// # Errors
///
/// Returns [`SheetError::Io`] if the directory or a file cannot be read, or
/// [`SheetError::Csv`] if a file is not valid CSV.
pub fn read_dir(dir: &Path) -> Result<Vec<Sheet>, SheetError> {
    let entries = std::fs::read_dir(dir).map_err(|e| SheetError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SheetError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut sheets = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        let file = std::fs::File::open(&path).map_err(|e| SheetError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let sheet = read_csv(&name, file).map_err(|e| SheetError::Csv {
            path: path.display().to_string(),
            source: e,
        })?;
        log::debug!("Read CSV sheet '{name}': {} rows", sheet.rows.len());
        sheets.push(sheet);
    }

    Ok(sheets)
}

/// Parses one CSV stream into a [`Sheet`]. The first record is the header.
///
/// # Errors
///
/// Returns a [`csv::Error`] if the stream is not valid CSV.
pub fn read_csv<R: Read>(name: &str, reader: R) -> Result<Sheet, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut columns: Vec<String> = Vec::new();
    for header in &headers {
        if !header.is_empty() && !columns.contains(header) {
            columns.push(header.clone());
        }
    }

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let mut row = Row::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            if header.is_empty() || row.get(header).is_some() {
                continue;
            }
            let value = if field.is_empty() {
                CellValue::Empty
            } else {
                CellValue::from(field)
            };
            row.insert(header.as_str(), value);
        }
        rows.push(row);
    }

    Ok(Sheet {
        name: name.to_string(),
        columns,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_blank_separators() {
        let data = b"Name,Latitude,Longitude,LineStringColor\n\
            a,29.1,-95.1,red\n\
            ,,,\n\
            b,29.2,-95.2,\n";

        let sheet = read_csv("Centerline", &data[..]).unwrap();

        assert_eq!(
            sheet.columns,
            vec!["Name", "Latitude", "Longitude", "LineStringColor"]
        );
        assert_eq!(sheet.rows.len(), 3);
        assert!(sheet.rows[1].is_blank());
        assert_eq!(sheet.rows[0].get("Name"), Some(&CellValue::from("a")));
        assert_eq!(sheet.rows[2].get("LineStringColor"), Some(&CellValue::Empty));
    }

    #[test]
    fn keeps_leading_zero_text() {
        let data = b"Name\n007\n";
        let sheet = read_csv("AGMs", &data[..]).unwrap();
        assert_eq!(sheet.rows[0].get("Name"), Some(&CellValue::from("007")));
    }

    #[test]
    fn short_records_are_tolerated() {
        let data = b"Name,Latitude,Longitude\nonly-name\n";
        let sheet = read_csv("Notes", &data[..]).unwrap();
        assert_eq!(sheet.rows.len(), 1);
        assert!(sheet.rows[0].get("Latitude").is_none());
    }

    #[test]
    fn reads_directory_of_sheets() {
        let tmp = std::env::temp_dir().join("kmz_sheet_csv_dir_test");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();
        std::fs::write(tmp.join("Notes.csv"), "Name,Latitude,Longitude\nn,1,2\n").unwrap();
        std::fs::write(tmp.join("AGMs.CSV"), "Name,Latitude,Longitude\n7,1,2\n").unwrap();
        std::fs::write(tmp.join("readme.txt"), "ignored").unwrap();

        let sheets = read_dir(&tmp).unwrap();
        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["AGMs", "Notes"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
