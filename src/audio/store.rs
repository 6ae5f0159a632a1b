//! Directory of recorded clips
//!
//! Every clip is written under its sentence fingerprint, so recording the
//! same sentence again replaces the previous take.

use crate::archive::MANIFEST_NAME;
use crate::fingerprint::Fingerprint;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum AudioStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Clip not found: {0}")]
    NotFound(String),
}

/// Flat directory holding one audio blob per sentence
pub struct AudioStore {
    dir: PathBuf,
}

impl AudioStore {
    /// Open the store, creating the directory if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, AudioStoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a clip, overwriting any earlier take of the same sentence
    pub fn save(&self, fingerprint: &Fingerprint, audio: &[u8]) -> Result<PathBuf, AudioStoreError> {
        let path = self.dir.join(fingerprint.filename());
        fs::write(&path, audio)?;
        info!("Saved {} bytes of audio to {:?}", audio.len(), path);
        Ok(path)
    }

    /// Path of a clip, or `None` when the name is not a plain file name or
    /// would collide with the archive manifest. Names come from the mapping
    /// file, which may have been edited by hand.
    fn clip_path(&self, filename: &str) -> Option<PathBuf> {
        let name = Path::new(filename).file_name()?;
        if name != filename || filename == MANIFEST_NAME {
            return None;
        }
        Some(self.dir.join(name))
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.clip_path(filename).map(|p| p.is_file()).unwrap_or(false)
    }

    pub fn read(&self, filename: &str) -> Result<Vec<u8>, AudioStoreError> {
        let path = self
            .clip_path(filename)
            .ok_or_else(|| AudioStoreError::NotFound(filename.to_string()))?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AudioStoreError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete clips. Failures are logged and skipped.
    pub fn remove_all(&self, filenames: &[String]) -> usize {
        let mut removed = 0;
        for filename in filenames {
            let Some(path) = self.clip_path(filename) else {
                continue;
            };
            match fs::remove_file(&path) {
                Ok(_) => {
                    debug!("Removed clip: {:?}", path);
                    removed += 1;
                }
                Err(e) => warn!("Failed to remove {:?}: {}", path, e),
            }
        }
        removed
    }
}
