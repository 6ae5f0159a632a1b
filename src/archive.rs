//! Zip export of recorded clips
//!
//! Builds the `recordings.zip` download in memory: every clip under its own
//! filename followed by a `mapping.tsv` manifest.

use crate::mapping::MappingEntry;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ARCHIVE_NAME: &str = "recordings.zip";
pub const MANIFEST_NAME: &str = "mapping.tsv";
pub const MANIFEST_HEADER: &str = "audio_filename\tsentence";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A clip ready to be packed
pub struct ArchiveClip {
    pub entry: MappingEntry,
    pub audio: Vec<u8>,
}

/// Manifest text: header line, then one row per clip, no trailing newline
pub fn manifest(entries: &[MappingEntry]) -> String {
    let rows: Vec<String> = entries
        .iter()
        .map(|e| format!("{}\t{}", e.filename, e.sentence))
        .collect();
    format!("{}\n{}", MANIFEST_HEADER, rows.join("\n"))
}

/// Pack clips and manifest into an in-memory zip
pub fn build_archive(clips: &[ArchiveClip]) -> Result<Vec<u8>, ArchiveError> {
    // webm is already compressed
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for clip in clips {
        zip.start_file(clip.entry.filename.as_str(), options)?;
        zip.write_all(&clip.audio)?;
    }

    let entries: Vec<MappingEntry> = clips.iter().map(|c| c.entry.clone()).collect();
    zip.start_file(MANIFEST_NAME, options)?;
    zip.write_all(manifest(&entries).as_bytes())?;

    Ok(zip.finish()?.into_inner())
}
