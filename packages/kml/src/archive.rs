//! KMZ packaging: a zip archive with a single deflated `doc.kml` entry.

use std::io::{Cursor, Read as _, Write as _};

/// Name of the KML entry inside every KMZ.
pub const KML_ENTRY_NAME: &str = "doc.kml";

/// Errors from KMZ packaging or unpacking.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Zip container error.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error while writing or reading an entry.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive has no entry with the expected name.
    #[error("Archive has no '{0}' entry")]
    MissingEntry(String),

    /// The KML entry is not valid UTF-8.
    #[error("KML entry is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Packs KML text into an in-memory KMZ archive.
///
/// The entry timestamp is fixed so identical KML always yields identical
/// archive bytes.
///
/// # Errors
///
/// Returns [`ArchiveError`] if the zip writer fails.
pub fn write_kmz(kml: &str) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::DEFAULT);

    writer.start_file(KML_ENTRY_NAME, options)?;
    writer.write_all(kml.as_bytes())?;
    let bytes = writer.finish()?.into_inner();

    log::debug!(
        "Packed {} bytes of KML into {} byte KMZ",
        kml.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Extracts the `doc.kml` text from KMZ bytes.
///
/// # Errors
///
/// Returns [`ArchiveError`] if the bytes are not a zip archive, the entry is
/// missing, or its content is not UTF-8.
pub fn read_kml(kmz: &[u8]) -> Result<String, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(kmz))?;
    let mut entry = match archive.by_name(KML_ENTRY_NAME) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ArchiveError::MissingEntry(KML_ENTRY_NAME.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;
    Ok(String::from_utf8(buf)?)
}

/// Lists the entry names of a KMZ archive in stored order.
///
/// # Errors
///
/// Returns [`ArchiveError::Zip`] if the bytes are not a zip archive.
pub fn entry_names(kmz: &[u8]) -> Result<Vec<String>, ArchiveError> {
    let archive = zip::ZipArchive::new(Cursor::new(kmz))?;
    Ok((0..archive.len())
        .filter_map(|i| archive.name_for_index(i).map(ToString::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_single_deflated_entry() {
        let kml = "<kml>hello</kml>".repeat(50);
        let bytes = write_kmz(&kml).unwrap();

        assert_eq!(entry_names(&bytes).unwrap(), vec![KML_ENTRY_NAME]);

        let mut archive = zip::ZipArchive::new(Cursor::new(&bytes[..])).unwrap();
        let entry = archive.by_index(0).unwrap();
        assert_eq!(entry.compression(), zip::CompressionMethod::Deflated);
        assert!(entry.compressed_size() < entry.size());
    }

    #[test]
    fn reads_back_utf8_text() {
        let kml = "<name>Café – ñ</name>";
        let bytes = write_kmz(kml).unwrap();
        assert_eq!(read_kml(&bytes).unwrap(), kml);
    }

    #[test]
    fn identical_input_gives_identical_bytes() {
        assert_eq!(write_kmz("<kml/>").unwrap(), write_kmz("<kml/>").unwrap());
    }

    #[test]
    fn reports_missing_entry() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.kml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<kml/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(matches!(
            read_kml(&bytes),
            Err(ArchiveError::MissingEntry(_))
        ));
    }

    #[test]
    fn rejects_non_zip_bytes() {
        assert!(matches!(read_kml(b"plain text"), Err(ArchiveError::Zip(_))));
    }
}
