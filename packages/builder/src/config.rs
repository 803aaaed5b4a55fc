//! Build options, loadable from TOML.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```toml
//! document_name = "Line 42 survey"
//!
//! [geometry]
//! auto_split = true
//! split_distance_m = 5000.0
//!
//! [notes]
//! hidden_by_default = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default soft-break distance between consecutive path points.
pub const DEFAULT_SPLIT_DISTANCE_M: f64 = 5000.0;

/// Default distance within which a path's last point closes onto its first.
pub const DEFAULT_CLOSING_TOLERANCE_M: f64 = 2.0;

/// Default distance within which consecutive path points are duplicates.
pub const DEFAULT_DUPLICATE_TOLERANCE_M: f64 = 2.0;

/// Errors from loading or validating build options.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Config path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`BuildOptions`].
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A distance knob is negative or not finite.
    #[error("Invalid value for {field}: {value} (must be a finite, non-negative number of meters)")]
    InvalidDistance {
        /// Dotted field name.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
}

/// Options for one KMZ build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Optional `<Document><name>`.
    pub document_name: Option<String>,
    /// Path construction for the Access and Centerline sheets.
    pub geometry: GeometryOptions,
    /// Notes label behavior.
    pub notes: NotesOptions,
    /// AGM marker rules.
    pub agms: AgmOptions,
}

/// Path construction knobs. The split distance and the two tolerances are
/// independent of each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryOptions {
    /// Start a new path when consecutive points are farther apart than
    /// [`Self::split_distance_m`].
    pub auto_split: bool,
    /// Soft-break distance in meters.
    pub split_distance_m: f64,
    /// Drop a final point that closes back onto the first point.
    pub drop_closing_point: bool,
    /// Closing-loop tolerance in meters.
    pub closing_tolerance_m: f64,
    /// Consecutive points within this distance (meters) collapse into one.
    /// Zero keeps only exact duplicates out.
    pub duplicate_tolerance_m: f64,
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            auto_split: false,
            split_distance_m: DEFAULT_SPLIT_DISTANCE_M,
            drop_closing_point: true,
            closing_tolerance_m: DEFAULT_CLOSING_TOLERANCE_M,
            duplicate_tolerance_m: DEFAULT_DUPLICATE_TOLERANCE_M,
        }
    }
}

/// Notes options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesOptions {
    /// Label visibility when the `HideNameUntilMouseOver` column is absent
    /// from the Notes sheet. `true` hides every label until hover.
    pub hidden_by_default: bool,
}

/// AGM options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgmOptions {
    /// When set, AGM icons outside this list are ignored (the marker keeps
    /// the viewer's default icon).
    pub icon_allow_list: Option<Vec<String>>,
}

impl BuildOptions {
    /// Parses and validates options from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is invalid or a distance is out of
    /// range.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::de::from_str(s)?;
        options.validate()?;
        Ok(options)
    }

    /// Reads options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let options = Self::from_toml_str(&text)?;
        log::info!("Loaded build options from {}", path.display());
        Ok(options)
    }

    /// Checks that every distance is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDistance`] for the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.geometry;
        for (field, value) in [
            ("geometry.split_distance_m", g.split_distance_m),
            ("geometry.closing_tolerance_m", g.closing_tolerance_m),
            ("geometry.duplicate_tolerance_m", g.duplicate_tolerance_m),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDistance { field, value });
            }
        }
        Ok(())
    }
}
