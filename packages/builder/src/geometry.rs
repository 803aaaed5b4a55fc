//! Path construction for the Access and Centerline sheets.
//!
//! Rows are walked in order. A row with a missing coordinate is a hard break
//! between paths; with auto-split enabled, a jump longer than the split
//! distance is a soft break. Consecutive near-duplicates collapse and a final
//! point that closes back onto the first is dropped.

use kmz_kml_models::Coordinate;
use kmz_sheet_models::Row;

use crate::config::GeometryOptions;
use crate::normalize::{CoordinateCell, great_circle_distance_m, parse_coordinate, within_tolerance};

/// Builds zero or more paths from rows. Every returned path has at least two
/// points and no two consecutive points within the duplicate tolerance.
#[must_use]
pub fn build_paths(rows: &[Row], options: &GeometryOptions) -> Vec<Vec<Coordinate>> {
    let mut builder = PathBuilder::new(options);
    for (index, row) in rows.iter().enumerate() {
        match parse_coordinate(row) {
            CoordinateCell::Missing => builder.hard_break(),
            CoordinateCell::Invalid => {
                log::debug!("Row {}: invalid coordinate, skipped", index + 1);
            }
            CoordinateCell::Valid(point) => builder.push(point),
        }
    }
    builder.finish()
}

struct PathBuilder<'a> {
    options: &'a GeometryOptions,
    current: Vec<Coordinate>,
    paths: Vec<Vec<Coordinate>>,
}

impl<'a> PathBuilder<'a> {
    const fn new(options: &'a GeometryOptions) -> Self {
        Self {
            options,
            current: Vec::new(),
            paths: Vec::new(),
        }
    }

    fn push(&mut self, point: Coordinate) {
        if let Some(&last) = self.current.last() {
            if within_tolerance(last, point, self.options.duplicate_tolerance_m) {
                return;
            }
            if self.options.auto_split {
                let gap = great_circle_distance_m(last, point);
                if gap > self.options.split_distance_m {
                    log::debug!(
                        "Splitting path at {gap:.0} m jump (limit {:.0} m)",
                        self.options.split_distance_m
                    );
                    self.flush();
                }
            }
        }
        self.current.push(point);
    }

    fn hard_break(&mut self) {
        self.flush();
    }

    fn flush(&mut self) {
        let mut path = std::mem::take(&mut self.current);
        if path.len() < 2 {
            return;
        }
        if self.options.drop_closing_point
            && within_tolerance(path[0], path[path.len() - 1], self.options.closing_tolerance_m)
        {
            path.pop();
            if path.len() < 2 {
                return;
            }
        }
        self.paths.push(path);
    }

    fn finish(mut self) -> Vec<Vec<Coordinate>> {
        self.flush();
        self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kmz_sheet_models::CellValue;

    fn row(lat: &str, lon: &str) -> Row {
        [
            ("Latitude", CellValue::from(lat)),
            ("Longitude", CellValue::from(lon)),
        ]
        .into_iter()
        .collect()
    }

    fn blank() -> Row {
        row("", "")
    }

    fn c(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat)
    }

    #[test]
    fn drops_near_duplicate_and_closing_point() {
        let rows = vec![
            row("10", "20"),
            row("10.00001", "20.00001"),
            row("11", "21"),
            row("10", "20"),
        ];
        let paths = build_paths(&rows, &GeometryOptions::default());
        assert_eq!(paths, vec![vec![c(20.0, 10.0), c(21.0, 11.0)]]);
    }

    #[test]
    fn blank_row_separates_paths() {
        let rows = vec![
            row("1", "1"),
            row("1.1", "1.1"),
            blank(),
            row("2", "2"),
            row("2.1", "2.1"),
        ];
        let paths = build_paths(&rows, &GeometryOptions::default());
        assert_eq!(
            paths,
            vec![
                vec![c(1.0, 1.0), c(1.1, 1.1)],
                vec![c(2.0, 2.0), c(2.1, 2.1)],
            ]
        );
    }

    #[test]
    fn invalid_row_is_skipped_without_break() {
        let rows = vec![row("1", "1"), row("abc", "1"), row("1.1", "1.1")];
        let paths = build_paths(&rows, &GeometryOptions::default());
        assert_eq!(paths, vec![vec![c(1.0, 1.0), c(1.1, 1.1)]]);
    }

    #[test]
    fn single_point_segments_are_discarded() {
        let rows = vec![row("1", "1"), blank(), row("2", "2"), row("2.1", "2.1")];
        let paths = build_paths(&rows, &GeometryOptions::default());
        assert_eq!(paths, vec![vec![c(2.0, 2.0), c(2.1, 2.1)]]);
    }

    #[test]
    fn closing_point_is_dropped_from_loops() {
        let rows = vec![row("1", "1"), row("1.1", "1.1"), row("1", "1")];
        let paths = build_paths(&rows, &GeometryOptions::default());
        assert_eq!(paths, vec![vec![c(1.0, 1.0), c(1.1, 1.1)]]);

        let rows = vec![row("1", "1"), row("1", "1")];
        assert!(build_paths(&rows, &GeometryOptions::default()).is_empty());
    }

    #[test]
    fn closing_point_kept_when_disabled() {
        let options = GeometryOptions {
            drop_closing_point: false,
            ..GeometryOptions::default()
        };
        let rows = vec![row("1", "1"), row("1.1", "1.1"), row("1", "1")];
        let paths = build_paths(&rows, &options);
        assert_eq!(paths[0].len(), 3);
    }

    #[test]
    fn auto_split_breaks_on_long_jump() {
        let options = GeometryOptions {
            auto_split: true,
            ..GeometryOptions::default()
        };
        // 0.01 degrees is ~1.1 km, 1 degree is ~111 km.
        let rows = vec![
            row("0", "0"),
            row("0.01", "0"),
            row("1", "0"),
            row("1.01", "0"),
        ];
        let paths = build_paths(&rows, &options);
        assert_eq!(
            paths,
            vec![
                vec![c(0.0, 0.0), c(0.0, 0.01)],
                vec![c(0.0, 1.0), c(0.0, 1.01)],
            ]
        );

        let joined = build_paths(&rows, &GeometryOptions::default());
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].len(), 4);
    }

    #[test]
    fn zero_tolerance_only_drops_exact_repeats() {
        let options = GeometryOptions {
            duplicate_tolerance_m: 0.0,
            drop_closing_point: false,
            ..GeometryOptions::default()
        };
        let rows = vec![row("1", "1"), row("1", "1"), row("1.000001", "1")];
        let paths = build_paths(&rows, &options);
        assert_eq!(paths, vec![vec![c(1.0, 1.0), c(1.0, 1.000_001)]]);
    }
}
