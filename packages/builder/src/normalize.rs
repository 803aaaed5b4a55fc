//! Cell value normalizers.
//!
//! Pure functions that turn raw spreadsheet cells into validated values.
//! None of them fail: unusable input yields `None` (or an
//! [`Outcome::Skipped`]) and the caller moves on.

use geo::{Distance as _, HaversineMeasure, Point};
use kmz_kml_models::{Coordinate, KmlColor, MAP_NOTE_ICON, NamedColor, RED_X_ICON};
use kmz_sheet_models::{CellValue, Row};

/// Sphere radius used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Header of the latitude column.
pub const COLUMN_LATITUDE: &str = "Latitude";

/// Header of the longitude column.
pub const COLUMN_LONGITUDE: &str = "Longitude";

/// Lower-cased flag values that count as true.
const TRUTHY_FLAGS: &[&str] = &["1", "true", "yes", "y", "t"];

/// Minimum width of a purely numeric AGM identifier.
const IDENTIFIER_WIDTH: usize = 3;

/// Result of applying one normalized value to a feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Applied(T),
    Skipped(SkipReason),
}

/// Why a value was not applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("blank")]
    Blank,
    #[error("unrecognized color '{0}'")]
    UnrecognizedColor(String),
    #[error("icon '{0}' is not in the allow-list")]
    IconNotAllowed(String),
    #[error("icon '{0}' cannot be used as an href")]
    UnusableIcon(String),
}

impl<T> Outcome<T> {
    /// Converts to an `Option`, logging non-blank skips at debug level.
    pub fn log_skip(self, context: &str) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Skipped(SkipReason::Blank) => None,
            Self::Skipped(reason) => {
                log::debug!("{context}: {reason}");
                None
            }
        }
    }
}

/// Trimmed text of a cell, or `None` when blank.
#[must_use]
pub fn normalize_text(value: Option<&CellValue>) -> Option<String> {
    let text = value?.to_text()?;
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Normalizes an AGM identifier.
///
/// Digit strings with a leading zero are kept as-is, digit strings of three
/// or more characters are kept, shorter digit strings are zero-padded to
/// three. Whole non-negative numbers written as decimals (`"10.0"`) become
/// their integer digits and are padded the same way. Everything else,
/// including fractional values like `"10.5"`, is returned unchanged.
#[must_use]
pub fn normalize_identifier(value: Option<&CellValue>) -> String {
    let Some(text) = normalize_text(value) else {
        return String::new();
    };

    if is_ascii_digits(&text) {
        if text.starts_with('0') && text.len() >= 2 {
            return text;
        }
        return pad_identifier(text);
    }

    match text.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 && n.fract() == 0.0 => {
            pad_identifier(format!("{:.0}", n.abs()))
        }
        _ => text,
    }
}

fn is_ascii_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn pad_identifier(digits: String) -> String {
    if digits.len() >= IDENTIFIER_WIDTH {
        digits
    } else {
        format!("{digits:0>IDENTIFIER_WIDTH$}")
    }
}

/// A color cell before normalization: a palette name or raw KML hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorInput {
    Named(NamedColor),
    RawHex(KmlColor),
}

impl ColorInput {
    /// Parses a trimmed color cell. Names are case-insensitive.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(named) = text.parse::<NamedColor>() {
            return Some(Self::Named(named));
        }
        KmlColor::parse_hex(text).map(Self::RawHex)
    }

    #[must_use]
    pub const fn kml_color(self) -> KmlColor {
        match self {
            Self::Named(named) => named.kml_color(),
            Self::RawHex(color) => color,
        }
    }
}

/// Resolves a color cell to a KML color.
#[must_use]
pub fn normalize_color(value: Option<&CellValue>) -> Option<KmlColor> {
    color_outcome(value).log_skip("color")
}

/// Like [`normalize_color`] but reports why a color was skipped.
#[must_use]
pub fn color_outcome(value: Option<&CellValue>) -> Outcome<KmlColor> {
    let Some(text) = normalize_text(value) else {
        return Outcome::Skipped(SkipReason::Blank);
    };
    ColorInput::parse(&text).map_or(
        Outcome::Skipped(SkipReason::UnrecognizedColor(text)),
        |input| Outcome::Applied(input.kml_color()),
    )
}

/// Resolves a Notes icon cell. `"map note"` and `"red x"` map to built-in
/// icons; any other value is used as a literal href.
#[must_use]
pub fn resolve_note_icon(value: Option<&CellValue>) -> Option<String> {
    let text = normalize_text(value)?;
    match text.to_ascii_lowercase().as_str() {
        "map note" => Some(MAP_NOTE_ICON.to_string()),
        "red x" => Some(RED_X_ICON.to_string()),
        _ => Some(text),
    }
}

/// Whether an icon reference can be written as an href. Control characters
/// (embedded newlines, tabs) make it unusable.
#[must_use]
pub fn is_usable_href(href: &str) -> bool {
    !href.is_empty() && !href.chars().any(char::is_control)
}

/// Haversine distance in meters on a sphere of radius [`EARTH_RADIUS_M`].
#[must_use]
pub fn great_circle_distance_m(a: Coordinate, b: Coordinate) -> f64 {
    HaversineMeasure::new(EARTH_RADIUS_M)
        .distance(Point::new(a.lon, a.lat), Point::new(b.lon, b.lat))
}

/// `true` when the points are identical or within `tolerance_m` meters.
#[must_use]
pub fn within_tolerance(a: Coordinate, b: Coordinate, tolerance_m: f64) -> bool {
    a == b || great_circle_distance_m(a, b) <= tolerance_m
}

/// Coordinate state of a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateCell {
    /// Latitude or longitude is blank or missing.
    Missing,
    /// Both cells are present but at least one is not a finite number.
    Invalid,
    Valid(Coordinate),
}

/// Reads the `Latitude`/`Longitude` cells of a row.
#[must_use]
pub fn parse_coordinate(row: &Row) -> CoordinateCell {
    let lat = row.get(COLUMN_LATITUDE);
    let lon = row.get(COLUMN_LONGITUDE);
    let (Some(lat), Some(lon)) = (lat, lon) else {
        return CoordinateCell::Missing;
    };
    if lat.is_blank() || lon.is_blank() {
        return CoordinateCell::Missing;
    }
    match (lat.to_f64(), lon.to_f64()) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
            CoordinateCell::Valid(Coordinate::new(lon, lat))
        }
        _ => CoordinateCell::Invalid,
    }
}

/// Reads a boolean-like cell: `1`, `true`, `yes`, `y`, `t` (any case).
#[must_use]
pub fn parse_flag(value: Option<&CellValue>) -> bool {
    normalize_text(value).is_some_and(|text| TRUTHY_FLAGS.contains(&text.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    fn ident(s: &str) -> String {
        normalize_identifier(Some(&text(s)))
    }

    #[test]
    fn text_is_trimmed_and_blank_is_none() {
        assert_eq!(normalize_text(Some(&text("  A1 "))), Some("A1".to_string()));
        assert_eq!(normalize_text(Some(&text("   "))), None);
        assert_eq!(normalize_text(Some(&CellValue::Number(f64::NAN))), None);
        assert_eq!(normalize_text(None), None);
    }

    #[test]
    fn leading_zero_identifiers_are_unchanged() {
        for s in ["00", "01", "007", "0042", "000123"] {
            assert_eq!(ident(s), s);
        }
    }

    #[test]
    fn short_identifiers_are_padded() {
        assert_eq!(ident("7"), "007");
        assert_eq!(ident("42"), "042");
        assert_eq!(ident("0"), "000");
    }

    #[test]
    fn long_identifiers_are_unchanged() {
        assert_eq!(ident("123"), "123");
        assert_eq!(ident("4567"), "4567");
    }

    #[test]
    fn whole_decimals_are_coerced() {
        assert_eq!(ident("10.0"), "010");
        assert_eq!(ident("1e2"), "100");
        assert_eq!(ident("1234.0"), "1234");
        assert_eq!(normalize_identifier(Some(&CellValue::Number(7.0))), "007");
    }

    #[test]
    fn fractional_and_text_identifiers_are_unchanged() {
        assert_eq!(ident("10.5"), "10.5");
        assert_eq!(ident("-5"), "-5");
        assert_eq!(ident("AGM-7"), "AGM-7");
        assert_eq!(normalize_identifier(None), "");
    }

    #[test]
    fn colors_accept_names_and_hex() {
        assert_eq!(
            normalize_color(Some(&text("Red"))).map(|c| c.to_string()),
            Some("ff0000ff".to_string())
        );
        assert_eq!(
            normalize_color(Some(&text(" ORANGE "))).map(|c| c.to_string()),
            Some("ff008cff".to_string())
        );
        assert_eq!(
            normalize_color(Some(&text("7F00FF00"))).map(|c| c.to_string()),
            Some("7f00ff00".to_string())
        );
    }

    #[test]
    fn unknown_colors_are_skipped_with_reason() {
        assert_eq!(
            color_outcome(Some(&text("teal"))),
            Outcome::Skipped(SkipReason::UnrecognizedColor("teal".to_string()))
        );
        assert_eq!(color_outcome(None), Outcome::Skipped(SkipReason::Blank));
        assert!(normalize_color(Some(&text("ff0000"))).is_none());
    }

    #[test]
    fn note_icon_aliases() {
        assert_eq!(
            resolve_note_icon(Some(&text("Map Note"))).as_deref(),
            Some(MAP_NOTE_ICON)
        );
        assert_eq!(
            resolve_note_icon(Some(&text(" RED X "))).as_deref(),
            Some(RED_X_ICON)
        );
        assert_eq!(
            resolve_note_icon(Some(&text("http://x/pin.png"))).as_deref(),
            Some("http://x/pin.png")
        );
        assert_eq!(resolve_note_icon(Some(&CellValue::Empty)), None);
    }

    #[test]
    fn control_characters_make_href_unusable() {
        assert!(is_usable_href("http://x/pin.png"));
        assert!(!is_usable_href("http://x/\npin.png"));
        assert!(!is_usable_href(""));
    }

    #[test]
    fn haversine_uses_mean_earth_radius() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 0.0);
        let expected = EARTH_RADIUS_M * 1.0_f64.to_radians();
        assert!((great_circle_distance_m(a, b) - expected).abs() < 1e-6);
        assert!(great_circle_distance_m(a, a).abs() < f64::EPSILON);
    }

    #[test]
    fn coordinates_distinguish_missing_from_invalid() {
        let row: Row = [("Latitude", text("29.5")), ("Longitude", text("-95.25"))]
            .into_iter()
            .collect();
        assert_eq!(
            parse_coordinate(&row),
            CoordinateCell::Valid(Coordinate::new(-95.25, 29.5))
        );

        let row: Row = [("Latitude", text("29.5")), ("Longitude", text(""))]
            .into_iter()
            .collect();
        assert_eq!(parse_coordinate(&row), CoordinateCell::Missing);

        let row: Row = [("Latitude", text("29.5"))].into_iter().collect();
        assert_eq!(parse_coordinate(&row), CoordinateCell::Missing);

        let row: Row = [("Latitude", text("north")), ("Longitude", text("-95"))]
            .into_iter()
            .collect();
        assert_eq!(parse_coordinate(&row), CoordinateCell::Invalid);
    }

    #[test]
    fn flags_accept_truthy_spellings() {
        for s in ["1", "true", "YES", " y ", "T"] {
            assert!(parse_flag(Some(&text(s))), "{s}");
        }
        for s in ["0", "no", "false", "", "maybe"] {
            assert!(!parse_flag(Some(&text(s))), "{s}");
        }
        assert!(parse_flag(Some(&CellValue::Bool(true))));
        assert!(parse_flag(Some(&CellValue::Number(1.0))));
        assert!(!parse_flag(None));
    }
}
