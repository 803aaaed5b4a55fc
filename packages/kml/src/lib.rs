#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! KML serialization and KMZ packaging.
//!
//! [`render::render_document`] turns a [`Document`] into UTF-8 KML text and
//! [`archive::write_kmz`] stores that text as the single `doc.kml` entry of
//! a deflate-compressed zip archive.

pub mod archive;
pub mod render;

use kmz_kml_models::Document;

pub use archive::{ArchiveError, KML_ENTRY_NAME};

/// Renders a document and packs it into KMZ bytes.
///
/// # Errors
///
/// Returns [`ArchiveError`] if the archive cannot be written. No partial
/// archive is returned.
pub fn package(doc: &Document) -> Result<Vec<u8>, ArchiveError> {
    let kml = render::render_document(doc);
    log::info!(
        "Rendered KML: {} folders, {} shared styles, {} bytes",
        doc.folders.len(),
        doc.styles.len(),
        kml.len()
    );
    archive::write_kmz(&kml)
}
