#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Seed workbook to KMZ pipeline.
//!
//! Rows are normalized ([`normalize`]), turned into points and paths
//! ([`geometry`], [`assemble`]), Notes are bound to hover-reveal style maps
//! ([`hover`]), and the resulting document is rendered and zipped by
//! [`kmz_kml::package`].
//!
//! Every call starts from fresh state, so identical input and options give
//! byte-identical output.

pub mod assemble;
pub mod config;
pub mod geometry;
pub mod hover;
pub mod normalize;
pub mod report;

use kmz_kml::ArchiveError;
use kmz_kml_models::Document;
use kmz_sheet_models::Workbook;

pub use config::{BuildOptions, ConfigError};
pub use report::{BuildReport, FolderSummary, NoteDebugRow};

/// Errors that abort a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Packaging the KML into the archive failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Build options are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Archive bytes plus the summary of how they were built.
#[derive(Debug, Clone)]
pub struct GeneratedKmz {
    pub bytes: Vec<u8>,
    pub report: BuildReport,
}

/// Builds the in-memory document: feature folders followed by the Notes
/// hover styles.
#[must_use]
pub fn build_document(workbook: &Workbook, options: &BuildOptions) -> (Document, BuildReport) {
    let (mut doc, mut report) = assemble::assemble(workbook, options);
    report.style_maps = hover::apply_hover_styles(&mut doc);
    (doc, report)
}

/// Renders the document for a workbook as KML text.
///
/// # Errors
///
/// Returns [`BuildError::Config`] if the options fail validation.
pub fn render_kml(workbook: &Workbook, options: &BuildOptions) -> Result<String, BuildError> {
    options.validate()?;
    let (doc, _) = build_document(workbook, options);
    Ok(kmz_kml::render::render_document(&doc))
}

/// Runs the whole pipeline and returns the archive with its build report.
///
/// # Errors
///
/// Returns [`BuildError`] if the options are invalid or the archive cannot
/// be written.
pub fn generate(workbook: &Workbook, options: &BuildOptions) -> Result<GeneratedKmz, BuildError> {
    options.validate()?;

    let populated = workbook.populated_kinds();
    log::info!(
        "Building KMZ from {} populated sheets: {}",
        populated.len(),
        populated
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let (doc, report) = build_document(workbook, options);
    let bytes = kmz_kml::package(&doc)?;

    log::info!(
        "Generated {} byte KMZ with {} placemarks",
        bytes.len(),
        report.total_placemarks()
    );
    Ok(GeneratedKmz { bytes, report })
}

/// Runs the whole pipeline and returns only the archive bytes.
///
/// # Errors
///
/// See [`generate`].
pub fn build_kmz(workbook: &Workbook, options: &BuildOptions) -> Result<Vec<u8>, BuildError> {
    generate(workbook, options).map(|generated| generated.bytes)
}
