//! Feature assembly: workbook sheets to KML folders.

use kmz_kml_models::{
    BALLOON_NAME_TEMPLATE, BalloonStyle, Coordinate, Document, Folder, IconStyle, KmlColor,
    LINE_WIDTH, LabelStyle, LabelVisibility, LineStyle, MAP_NOTE_FALLBACK_ICON, Placemark, Style,
};
use kmz_sheet_models::{Row, Sheet, SheetKind, Workbook};

use crate::config::{AgmOptions, BuildOptions};
use crate::geometry::build_paths;
use crate::normalize::{
    CoordinateCell, Outcome, SkipReason, color_outcome, is_usable_href, normalize_color,
    normalize_identifier, normalize_text, parse_coordinate, parse_flag, resolve_note_icon,
};
use crate::report::{BuildReport, FolderSummary, NoteDebugRow};

pub const COLUMN_NAME: &str = "Name";
pub const COLUMN_ICON: &str = "Icon";
pub const COLUMN_ICON_COLOR: &str = "IconColor";
pub const COLUMN_LINE_COLOR: &str = "LineStringColor";
pub const COLUMN_HIDE_NAME: &str = "HideNameUntilMouseOver";

/// Builds the document tree for a workbook. Folders appear only for
/// populated sheets, in AGMs, Access, Centerline, Notes order.
#[must_use]
pub fn assemble(workbook: &Workbook, options: &BuildOptions) -> (Document, BuildReport) {
    let mut doc = Document {
        name: options.document_name.clone(),
        ..Document::default()
    };
    let mut report = BuildReport::default();

    for kind in workbook.populated_kinds() {
        let Some(sheet) = workbook.sheet(kind) else {
            continue;
        };
        let mut folder = Folder::new(kind.folder_name());
        let summary = match kind {
            SheetKind::Agms => assemble_agms(sheet, &options.agms, &mut folder),
            SheetKind::Access | SheetKind::Centerline => {
                assemble_lines(sheet, options, &mut folder)
            }
            SheetKind::Notes => assemble_notes(
                sheet,
                options.notes.hidden_by_default,
                &mut folder,
                &mut report.notes,
            ),
        };
        log::info!(
            "{}: {} rows -> {} points, {} paths ({} rows skipped)",
            summary.name,
            summary.rows,
            summary.points,
            summary.paths,
            summary.skipped_rows
        );
        report.folders.push(summary);
        doc.folders.push(folder);
    }

    (doc, report)
}

fn assemble_agms(sheet: &Sheet, options: &AgmOptions, folder: &mut Folder) -> FolderSummary {
    let mut summary = summary_for(sheet, &folder.name);
    for (index, row) in sheet.rows.iter().enumerate() {
        let Some(coordinate) = row_coordinate(row, index, &mut summary) else {
            continue;
        };
        let name = normalize_identifier(row.get(COLUMN_NAME));
        let context = format!("AGMs row {}", index + 1);
        let icon = agm_icon(row, options).log_skip(&context);
        let color = color_outcome(row.get(COLUMN_ICON_COLOR)).log_skip(&context);
        folder.placemarks.push(point_placemark(name, coordinate, icon, color));
        summary.points += 1;
    }
    summary
}

fn agm_icon(row: &Row, options: &AgmOptions) -> Outcome<String> {
    match icon_outcome(row) {
        Outcome::Applied(href) => match &options.icon_allow_list {
            Some(allowed) if !allowed.iter().any(|a| a.trim() == href) => {
                Outcome::Skipped(SkipReason::IconNotAllowed(href))
            }
            _ => Outcome::Applied(href),
        },
        skipped @ Outcome::Skipped(_) => skipped,
    }
}

fn icon_outcome(row: &Row) -> Outcome<String> {
    match normalize_text(row.get_ignore_case(COLUMN_ICON)) {
        None => Outcome::Skipped(SkipReason::Blank),
        Some(href) if !is_usable_href(&href) => Outcome::Skipped(SkipReason::UnusableIcon(href)),
        Some(href) => Outcome::Applied(href),
    }
}

fn assemble_lines(sheet: &Sheet, options: &BuildOptions, folder: &mut Folder) -> FolderSummary {
    let mut summary = summary_for(sheet, &folder.name);
    let paths = build_paths(&sheet.rows, &options.geometry);

    if paths.is_empty() {
        log::debug!("{}: no paths, falling back to points", folder.name);
        for (index, row) in sheet.rows.iter().enumerate() {
            let Some(coordinate) = row_coordinate(row, index, &mut summary) else {
                continue;
            };
            let name = normalize_text(row.get(COLUMN_NAME)).unwrap_or_default();
            let context = format!("{} row {}", folder.name, index + 1);
            let icon = icon_outcome(row).log_skip(&context);
            let color = color_outcome(row.get(COLUMN_ICON_COLOR)).log_skip(&context);
            folder.placemarks.push(point_placemark(name, coordinate, icon, color));
            summary.points += 1;
        }
        return summary;
    }

    summary.skipped_rows = sheet
        .rows
        .iter()
        .filter(|row| parse_coordinate(row) == CoordinateCell::Invalid)
        .count();

    let color = sheet_line_color(sheet);
    for path in paths {
        let mut placemark = Placemark::line_string(path);
        placemark.name = Some(String::new());
        placemark.style = color.map(|color| Style {
            line: Some(LineStyle {
                color,
                width: LINE_WIDTH,
            }),
            ..Style::default()
        });
        folder.placemarks.push(placemark);
        summary.paths += 1;
    }
    summary
}

/// Color of the first non-blank `LineStringColor` cell. Every path of the
/// sheet uses it; an unrecognized value leaves all paths uncolored.
fn sheet_line_color(sheet: &Sheet) -> Option<KmlColor> {
    let first = sheet
        .rows
        .iter()
        .filter_map(|row| row.get(COLUMN_LINE_COLOR))
        .find(|cell| !cell.is_blank())?;
    normalize_color(Some(first))
}

fn assemble_notes(
    sheet: &Sheet,
    hidden_by_default: bool,
    folder: &mut Folder,
    debug_rows: &mut Vec<NoteDebugRow>,
) -> FolderSummary {
    let mut summary = summary_for(sheet, &folder.name);
    let has_hide_column = sheet.has_column_ignore_case(COLUMN_HIDE_NAME);

    for (index, row) in sheet.rows.iter().enumerate() {
        let name = normalize_text(row.get(COLUMN_NAME)).unwrap_or_default();
        let Some(coordinate) = row_coordinate(row, index, &mut summary) else {
            debug_rows.push(NoteDebugRow {
                name,
                icon_href_used: String::new(),
            });
            continue;
        };

        let href = resolve_note_icon(row.get_ignore_case(COLUMN_ICON)).map(|href| {
            if is_usable_href(&href) {
                href
            } else {
                log::debug!(
                    "Notes row {}: icon {href:?} cannot be applied, using fallback",
                    index + 1
                );
                MAP_NOTE_FALLBACK_ICON.to_string()
            }
        });

        let hidden = if has_hide_column {
            parse_flag(row.get_ignore_case(COLUMN_HIDE_NAME))
        } else {
            hidden_by_default
        };

        let mut placemark = point_placemark(name.clone(), coordinate, href.clone(), None);
        if let Some(style) = placemark.style.as_mut() {
            style.label = Some(LabelStyle {
                color: Some(KmlColor::OPAQUE_WHITE),
                scale: 1.0,
            });
        }
        placemark.label_visibility = if hidden {
            LabelVisibility::HoverReveal
        } else {
            LabelVisibility::AlwaysVisible
        };
        folder.placemarks.push(placemark);
        summary.points += 1;

        debug_rows.push(NoteDebugRow {
            name,
            icon_href_used: href.unwrap_or_default(),
        });
    }
    summary
}

fn summary_for(sheet: &Sheet, name: &str) -> FolderSummary {
    FolderSummary {
        name: name.to_string(),
        rows: sheet.rows.len(),
        ..FolderSummary::default()
    }
}

/// Valid coordinate of a row, counting non-blank rows without one as
/// skipped.
fn row_coordinate(row: &Row, index: usize, summary: &mut FolderSummary) -> Option<Coordinate> {
    match parse_coordinate(row) {
        CoordinateCell::Valid(coordinate) => Some(coordinate),
        cell => {
            if !row.is_blank() {
                log::debug!(
                    "{} row {}: {} coordinate, skipped",
                    summary.name,
                    index + 1,
                    if cell == CoordinateCell::Missing {
                        "missing"
                    } else {
                        "invalid"
                    }
                );
                summary.skipped_rows += 1;
            }
            None
        }
    }
}

/// A named point whose description mirrors the name and whose balloon shows
/// only the name.
fn point_placemark(
    name: String,
    coordinate: Coordinate,
    icon_href: Option<String>,
    icon_color: Option<KmlColor>,
) -> Placemark {
    let icon = (icon_href.is_some() || icon_color.is_some()).then(|| IconStyle {
        color: icon_color,
        href: icon_href,
    });
    let mut placemark = Placemark::point(coordinate);
    placemark.description = Some(name.clone());
    placemark.name = Some(name);
    placemark.style = Some(Style {
        icon,
        balloon: Some(BalloonStyle {
            text: BALLOON_NAME_TEMPLATE.to_string(),
        }),
        ..Style::default()
    });
    placemark
}
