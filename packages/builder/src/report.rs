//! Build summary returned alongside the archive.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Per-folder counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSummary {
    pub name: String,
    /// Input rows in the sheet, blank rows included.
    pub rows: usize,
    pub points: usize,
    pub paths: usize,
    /// Non-blank rows that produced no feature because of a missing or
    /// invalid coordinate.
    pub skipped_rows: usize,
}

/// What the generator set for one Notes input row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDebugRow {
    pub name: String,
    /// Icon href written to the placemark, or empty when the row produced no
    /// placemark.
    pub icon_href_used: String,
}

/// Summary of one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub folders: Vec<FolderSummary>,
    pub notes: Vec<NoteDebugRow>,
    /// Number of style maps synthesized for Notes hover labels.
    pub style_maps: usize,
}

impl BuildReport {
    #[must_use]
    pub fn folder(&self, name: &str) -> Option<&FolderSummary> {
        self.folders.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn total_placemarks(&self) -> usize {
        self.folders.iter().map(|f| f.points + f.paths).sum()
    }

    /// Notes rows that produced no placemark or have no icon href.
    pub fn notes_without_icon(&self) -> impl Iterator<Item = &NoteDebugRow> {
        self.notes.iter().filter(|n| n.icon_href_used.is_empty())
    }

    /// Renders the Notes debug rows as a two-column text table.
    #[must_use]
    pub fn notes_table(&self) -> String {
        let width = self
            .notes
            .iter()
            .map(|n| n.name.chars().count())
            .chain(std::iter::once("Name".len()))
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        let _ = writeln!(out, "{:<width$}  IconHrefUsed", "Name");
        for note in &self.notes {
            let _ = writeln!(out, "{:<width$}  {}", note.name, note.icon_href_used);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> BuildReport {
        BuildReport {
            folders: vec![
                FolderSummary {
                    name: "AGMs".to_string(),
                    rows: 3,
                    points: 2,
                    paths: 0,
                    skipped_rows: 1,
                },
                FolderSummary {
                    name: "Centerline".to_string(),
                    rows: 5,
                    points: 0,
                    paths: 2,
                    skipped_rows: 0,
                },
            ],
            notes: vec![
                NoteDebugRow {
                    name: "Crossing".to_string(),
                    icon_href_used: "http://x/a.png".to_string(),
                },
                NoteDebugRow {
                    name: "Gate".to_string(),
                    icon_href_used: String::new(),
                },
            ],
            style_maps: 1,
        }
    }

    #[test]
    fn totals_points_and_paths() {
        let report = report();
        assert_eq!(report.total_placemarks(), 4);
        assert_eq!(report.folder("centerline").map(|f| f.paths), Some(2));
        assert!(report.folder("Notes").is_none());
    }

    #[test]
    fn lists_notes_without_icon() {
        let report = report();
        let names: Vec<&str> = report
            .notes_without_icon()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, vec!["Gate"]);
    }

    #[test]
    fn notes_table_aligns_columns() {
        let table = report().notes_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Name      IconHrefUsed");
        assert_eq!(lines[1], "Crossing  http://x/a.png");
        assert_eq!(lines[2].trim_end(), "Gate");
    }
}
