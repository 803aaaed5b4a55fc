#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spreadsheet types consumed by the KMZ builder.
//!
//! A [`Workbook`] holds up to four [`Sheet`]s, one per [`SheetKind`]. Each
//! sheet is an ordered list of [`Row`]s mapping column headers to
//! [`CellValue`]s. Missing columns and blank cells are normal, not errors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A single spreadsheet cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Blank cell.
    #[default]
    Empty,
    /// Boolean cell.
    Bool(bool),
    /// Numeric cell. NaN is treated the same as [`CellValue::Empty`].
    Number(f64),
    /// Text cell, stored exactly as read (untrimmed).
    Text(String),
}

impl CellValue {
    /// Returns `true` for empty cells, NaN numbers, and text that trims to
    /// nothing.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Bool(_) => false,
            Self::Number(n) => n.is_nan(),
            Self::Text(s) => s.trim().is_empty(),
        }
    }

    /// Renders the cell as text. Returns `None` for blank cells.
    ///
    /// Integer-valued numbers render without a fractional part (`7.0` ->
    /// `"7"`). Text is returned untrimmed.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        match self {
            Self::Empty => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }

    /// Interprets the cell as a number. Text cells are trimmed and parsed.
    ///
    /// Returns `None` for blank cells, booleans, and text that is not a
    /// number. Non-finite values (`inf`) are returned as-is so that callers
    /// can tell "present but unusable" apart from "blank".
    #[must_use]
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) if !n.is_nan() => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One spreadsheet record: column header -> cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    cells: BTreeMap<String, CellValue>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
        }
    }

    /// Sets a cell, replacing any previous value for the column.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Looks up a cell by exact column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Looks up a cell by column name, preferring an exact match and then
    /// falling back to an ASCII case-insensitive one.
    #[must_use]
    pub fn get_ignore_case(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column).or_else(|| {
            self.cells
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(column))
                .map(|(_, value)| value)
        })
    }

    /// Returns `true` if every cell in the row is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_blank)
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<CellValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

/// A named sheet: header order plus data rows in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet name as it appeared in the source workbook.
    pub name: String,
    /// Column headers in source order.
    pub columns: Vec<String>,
    /// Data rows in source order. Blank rows are kept; they are significant
    /// as path separators.
    pub rows: Vec<Row>,
}

impl Sheet {
    /// Creates a sheet from rows, deriving the column list from the rows in
    /// first-seen order.
    #[must_use]
    pub fn from_rows(name: impl Into<String>, rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.cells.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Returns `true` when the sheet has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns `true` if a header matches `column` ignoring ASCII case.
    #[must_use]
    pub fn has_column_ignore_case(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(column))
    }
}

/// The four sheet roles recognized in a seed workbook.
///
/// [`Display`](std::fmt::Display) yields the output folder name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString, AsRefStr,
)]
pub enum SheetKind {
    /// Above-ground markers.
    #[strum(serialize = "AGMs")]
    Agms,
    /// Access points or access routes.
    Access,
    /// Pipeline centerline.
    Centerline,
    /// Free-form annotated notes.
    Notes,
}

impl SheetKind {
    /// All kinds in output folder order.
    pub const ALL: &[Self] = &[Self::Agms, Self::Access, Self::Centerline, Self::Notes];

    /// Upper-cased sheet names accepted for this kind, in priority order.
    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Agms => &["AGMS", "AGM"],
            Self::Access => &["ACCESS"],
            Self::Centerline => &["CENTERLINE"],
            Self::Notes => &["NOTES"],
        }
    }

    /// Name of the output folder for this kind.
    #[must_use]
    pub const fn folder_name(self) -> &'static str {
        match self {
            Self::Agms => "AGMs",
            Self::Access => "Access",
            Self::Centerline => "Centerline",
            Self::Notes => "Notes",
        }
    }

    /// Resolves a raw sheet name (trimmed, case-insensitive) to a kind.
    #[must_use]
    pub fn from_sheet_name(name: &str) -> Option<Self> {
        let key = name.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.aliases().contains(&key.as_str()))
    }
}

/// Up to four typed sheets. Absent sheets skip their feature group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    /// AGM marker rows.
    pub agms: Option<Sheet>,
    /// Access rows.
    pub access: Option<Sheet>,
    /// Centerline rows.
    pub centerline: Option<Sheet>,
    /// Notes rows.
    pub notes: Option<Sheet>,
}

impl Workbook {
    /// Returns the sheet for `kind`, if present.
    #[must_use]
    pub const fn sheet(&self, kind: SheetKind) -> Option<&Sheet> {
        match kind {
            SheetKind::Agms => self.agms.as_ref(),
            SheetKind::Access => self.access.as_ref(),
            SheetKind::Centerline => self.centerline.as_ref(),
            SheetKind::Notes => self.notes.as_ref(),
        }
    }

    /// Replaces the sheet for `kind`.
    pub fn set_sheet(&mut self, kind: SheetKind, sheet: Option<Sheet>) {
        let slot = match kind {
            SheetKind::Agms => &mut self.agms,
            SheetKind::Access => &mut self.access,
            SheetKind::Centerline => &mut self.centerline,
            SheetKind::Notes => &mut self.notes,
        };
        *slot = sheet;
    }

    /// Kinds whose sheet is present and has at least one row, in folder
    /// order.
    #[must_use]
    pub fn populated_kinds(&self) -> Vec<SheetKind> {
        SheetKind::ALL
            .iter()
            .copied()
            .filter(|&kind| self.sheet(kind).is_some_and(|s| !s.is_empty()))
            .collect()
    }
}
