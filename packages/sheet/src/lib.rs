#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Workbook loading for the KMZ generator.
//!
//! Reads spreadsheet workbooks (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`)
//! through `calamine`, or a directory of `.csv` files (one file per sheet,
//! file stem = sheet name), and resolves sheet names to the four
//! [`SheetKind`] roles.

pub mod csv_dir;
pub mod xlsx;

use std::collections::BTreeMap;
use std::path::Path;

use kmz_sheet_models::{Sheet, SheetKind, Workbook};

/// Errors that can occur while loading a workbook.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    /// The spreadsheet could not be opened or a worksheet could not be read.
    #[error("Failed to read workbook {path}: {source}")]
    Workbook {
        /// Workbook path (or `<memory>` for uploads).
        path: String,
        /// Underlying `calamine` error.
        source: calamine::Error,
    },

    /// I/O error while listing or opening input files.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A CSV sheet could not be parsed.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// CSV file path.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// The input is neither a spreadsheet nor a CSV directory.
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),
}

/// Spreadsheet extensions handled by `calamine`.
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Loads every sheet found at `path` without resolving roles.
///
/// `path` may be a spreadsheet file or a directory of `.csv` files.
///
/// # Errors
///
/// Returns [`SheetError`] if the input cannot be read or has an unsupported
/// format.
pub fn load_sheets(path: &Path) -> Result<Vec<Sheet>, SheetError> {
    if path.is_dir() {
        return csv_dir::read_dir(path);
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        xlsx::read_path(path)
    } else {
        Err(SheetError::UnsupportedInput(path.display().to_string()))
    }
}

/// Loads a workbook from disk and resolves its sheets.
///
/// # Errors
///
/// Returns [`SheetError`] if the input cannot be read.
pub fn load_workbook(path: &Path) -> Result<Workbook, SheetError> {
    log::info!("Loading workbook {}", path.display());
    let sheets = load_sheets(path)?;
    Ok(resolve_sheets(sheets))
}

/// Loads a workbook from an in-memory upload.
///
/// # Errors
///
/// Returns [`SheetError::Workbook`] if the bytes are not a readable
/// spreadsheet.
pub fn load_workbook_bytes(bytes: Vec<u8>) -> Result<Workbook, SheetError> {
    log::info!("Loading workbook from {} bytes", bytes.len());
    let sheets = xlsx::read_bytes(bytes)?;
    Ok(resolve_sheets(sheets))
}

/// Assigns sheets to their [`SheetKind`] roles.
///
/// Sheet names are matched after trimming and upper-casing. For each role
/// the aliases are tried in priority order (`AGMS` before `AGM`) and the
/// first non-empty sheet wins. Sheets without a role are ignored.
#[must_use]
pub fn resolve_sheets(sheets: Vec<Sheet>) -> Workbook {
    let mut by_key: BTreeMap<String, Sheet> = BTreeMap::new();
    for sheet in sheets {
        let key = sheet.name.trim().to_ascii_uppercase();
        if SheetKind::from_sheet_name(&key).is_none() {
            log::debug!("Ignoring sheet '{}'", sheet.name);
            continue;
        }
        if let Some(previous) = by_key.insert(key, sheet) {
            log::warn!(
                "Sheet '{}' is shadowed by a later sheet with the same name",
                previous.name
            );
        }
    }

    let mut workbook = Workbook::default();
    for &kind in SheetKind::ALL {
        let chosen = kind.aliases().iter().find_map(|alias| {
            by_key
                .get(*alias)
                .filter(|sheet| !sheet.is_empty())
                .cloned()
        });
        match &chosen {
            Some(sheet) => log::info!(
                "{kind}: using sheet '{}' ({} rows)",
                sheet.name,
                sheet.rows.len()
            ),
            None => log::info!("{kind}: no sheet, skipping"),
        }
        workbook.set_sheet(kind, chosen);
    }
    workbook
}

#[cfg(test)]
mod tests {
    use super::*;
    use kmz_sheet_models::Row;

    fn sheet(name: &str, rows: usize) -> Sheet {
        let rows = (0..rows)
            .map(|i| [("Name", i.to_string())].into_iter().collect::<Row>())
            .collect();
        Sheet::from_rows(name, rows)
    }

    #[test]
    fn resolves_names_case_insensitively() {
        let workbook = resolve_sheets(vec![
            sheet(" agms ", 2),
            sheet("Access", 1),
            sheet("centerline", 3),
            sheet("NOTES", 1),
            sheet("Instructions", 5),
        ]);
        assert_eq!(workbook.agms.as_ref().map(|s| s.rows.len()), Some(2));
        assert!(workbook.access.is_some());
        assert_eq!(workbook.centerline.as_ref().map(|s| s.rows.len()), Some(3));
        assert!(workbook.notes.is_some());
    }

    #[test]
    fn prefers_agms_over_agm_alias() {
        let workbook = resolve_sheets(vec![sheet("AGM", 4), sheet("AGMS", 1)]);
        assert_eq!(workbook.agms.map(|s| s.name), Some("AGMS".to_string()));
    }

    #[test]
    fn falls_back_to_later_alias_when_first_is_empty() {
        let workbook = resolve_sheets(vec![sheet("AGMS", 0), sheet("AGM", 2)]);
        assert_eq!(workbook.agms.map(|s| s.name), Some("AGM".to_string()));
    }

    #[test]
    fn empty_sheets_are_absent() {
        let workbook = resolve_sheets(vec![sheet("Notes", 0)]);
        assert!(workbook.notes.is_none());
        assert!(workbook.populated_kinds().is_empty());
    }

    #[test]
    fn rejects_unknown_file_types() {
        let err = load_sheets(Path::new("survey.txt")).unwrap_err();
        assert!(matches!(err, SheetError::UnsupportedInput(_)));
    }

    #[test]
    fn garbage_bytes_are_a_workbook_error() {
        let err = load_workbook_bytes(b"not a spreadsheet".to_vec()).unwrap_err();
        assert!(matches!(err, SheetError::Workbook { .. }));
    }
}
