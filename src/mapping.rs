//! Mapping table from audio filename to sentence text
//!
//! Persisted as a headerless two-column TSV file and always rewritten
//! in full. Keys are unique and keep their first insertion position.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One (filename, sentence) row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub filename: String,
    pub sentence: String,
}

impl MappingEntry {
    pub fn new(filename: impl Into<String>, sentence: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            sentence: sentence.into(),
        }
    }
}

/// Insertion-ordered key/value table keyed by filename
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
    index: HashMap<String, usize>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the persisted form. Lines that do not hold exactly two
    /// tab-separated fields are skipped.
    pub fn parse(text: &str) -> Self {
        let mut table = Self::new();
        for line in text.lines() {
            let mut parts = line.split('\t');
            if let (Some(filename), Some(sentence), None) =
                (parts.next(), parts.next(), parts.next())
            {
                table.upsert(filename, sentence);
            }
        }
        table
    }

    /// Insert or overwrite a row. An existing key keeps its position.
    pub fn upsert(&mut self, filename: &str, sentence: &str) {
        let sentence = sanitize_sentence(sentence);
        match self.index.get(filename) {
            Some(&pos) => self.entries[pos].sentence = sentence,
            None => {
                self.index.insert(filename.to_string(), self.entries.len());
                self.entries.push(MappingEntry::new(filename, sentence));
            }
        }
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.index
            .get(filename)
            .map(|&pos| self.entries[pos].sentence.as_str())
    }

    /// Keep only rows for which `keep` returns true
    pub fn retain<F: FnMut(&MappingEntry) -> bool>(&mut self, mut keep: F) {
        self.entries.retain(|e| keep(e));
        self.reindex();
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to the persisted form, one `filename\tsentence\n` row per entry
    pub fn to_tsv(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}\t{}\n", e.filename, e.sentence))
            .collect()
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, e)| (e.filename.clone(), pos))
            .collect();
    }
}

/// Tabs and line breaks would split a row, so they become spaces
fn sanitize_sentence(sentence: &str) -> String {
    sentence.replace(['\t', '\r', '\n'], " ")
}

/// Whole-table persistence for the mapping
pub trait MappingStore: Send + Sync {
    /// Load the full table; a missing backing file is an empty table
    fn load(&self) -> Result<MappingTable, MappingError>;

    /// Replace the persisted table with `table`
    fn save(&self, table: &MappingTable) -> Result<(), MappingError>;
}

/// Mapping table stored as a TSV file on disk
pub struct TsvMappingStore {
    path: PathBuf,
}

impl TsvMappingStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MappingStore for TsvMappingStore {
    fn load(&self) -> Result<MappingTable, MappingError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(MappingTable::parse(&text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(MappingTable::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, table: &MappingTable) -> Result<(), MappingError> {
        fs::write(&self.path, table.to_tsv())?;
        debug!("Wrote {} mapping rows to {:?}", table.len(), self.path);
        Ok(())
    }
}
