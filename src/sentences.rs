//! Sentence script parsing and the last-uploaded sentence list
//!
//! A script is plain UTF-8 text with one sentence per line. The most recent
//! list is kept in a flat text file so the page can restore it on reload.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SentenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Script is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),
}

/// Trim surrounding whitespace, counting the ASCII information separators
/// (`\x1c`..=`\x1f`) as whitespace too
pub fn trim_sentence(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_whitespace() || ('\x1c'..='\x1f').contains(&c))
}

/// Split a script into sentences: trimmed, non-empty, in original order
pub fn parse_sentences(text: &str) -> Vec<String> {
    text.split('\n')
        .map(trim_sentence)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decode raw upload bytes and split them into sentences
pub fn parse_script(bytes: Vec<u8>) -> Result<Vec<String>, SentenceError> {
    let text = String::from_utf8(bytes)?;
    Ok(parse_sentences(&text))
}

/// Flat file holding the most recently uploaded sentence list
pub struct SentenceStore {
    path: PathBuf,
}

impl SentenceStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the stored list
    pub fn replace(&self, sentences: &[String]) -> Result<(), SentenceError> {
        fs::write(&self.path, sentences.join("\n"))?;
        debug!("Stored {} sentences in {:?}", sentences.len(), self.path);
        Ok(())
    }

    /// Load the stored list; empty if nothing was uploaded yet
    pub fn load(&self) -> Result<Vec<String>, SentenceError> {
        match fs::read(&self.path) {
            Ok(bytes) => parse_script(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}
