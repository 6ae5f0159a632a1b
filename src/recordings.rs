//! Recording store shared by the request handlers
//!
//! Owns the sentence list, the mapping table and the clip directory. Every
//! read-modify-write runs under a single writer lock so concurrent uploads
//! and exports cannot lose mapping rows or race on clip files.

use crate::archive::{self, ArchiveClip, ArchiveError};
use crate::audio::store::AudioStoreError;
use crate::audio::AudioStore;
use crate::config::Config;
use crate::fingerprint::Fingerprint;
use crate::mapping::{MappingError, MappingStore, MappingTable, TsvMappingStore};
use crate::sentences::{self, SentenceError, SentenceStore};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum RecordingsError {
    #[error(transparent)]
    Sentences(#[from] SentenceError),
    #[error("Mapping table error: {0}")]
    Mapping(#[from] MappingError),
    #[error("Audio store error: {0}")]
    Audio(#[from] AudioStoreError),
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("Sentence text is empty")]
    EmptySentence,
}

/// Result of an export
pub struct Export {
    /// Zip archive bytes
    pub archive: Vec<u8>,
    /// Number of clips packed into the archive
    pub clip_count: usize,
    /// Mapping rows dropped because their clip was already gone
    pub stale_count: usize,
}

pub struct Recordings {
    sentences: SentenceStore,
    mapping: Box<dyn MappingStore>,
    audio: AudioStore,
    writer: Mutex<()>,
}

impl Recordings {
    pub fn new(sentences: SentenceStore, mapping: Box<dyn MappingStore>, audio: AudioStore) -> Self {
        Self {
            sentences,
            mapping,
            audio,
            writer: Mutex::new(()),
        }
    }

    /// Open the file-backed stores named in the configuration
    pub fn open(config: &Config) -> Result<Self, RecordingsError> {
        let sentences = SentenceStore::new(&config.sentences_file);
        let mapping = TsvMappingStore::new(&config.mapping_file);
        let audio = AudioStore::new(&config.audio_dir)?;
        info!(
            "Clips in {:?}, mapping in {:?}, sentences in {:?}",
            audio.dir(),
            mapping.path(),
            sentences.path()
        );
        Ok(Self::new(sentences, Box::new(mapping), audio))
    }

    /// Parse an uploaded script and make it the current sentence list
    pub fn replace_sentences(&self, script: Vec<u8>) -> Result<Vec<String>, RecordingsError> {
        let sentences = sentences::parse_script(script)?;
        let _guard = self.writer.lock();
        self.sentences.replace(&sentences)?;
        info!("Uploaded script with {} sentences", sentences.len());
        Ok(sentences)
    }

    /// The last uploaded sentence list
    pub fn current_sentences(&self) -> Result<Vec<String>, RecordingsError> {
        Ok(self.sentences.load()?)
    }

    /// Store a clip for `sentence` and record it in the mapping table
    pub fn save_recording(&self, sentence: &str, audio: &[u8]) -> Result<Fingerprint, RecordingsError> {
        if sentences::trim_sentence(sentence).is_empty() {
            return Err(RecordingsError::EmptySentence);
        }
        let fingerprint = Fingerprint::of(sentence);

        let _guard = self.writer.lock();
        self.audio.save(&fingerprint, audio)?;

        let mut table = self.mapping.load()?;
        if table.get(fingerprint.filename()).is_some() {
            debug!("Replacing earlier take of {:?}", sentence);
        }
        table.upsert(fingerprint.filename(), sentence);
        self.mapping.save(&table)?;

        debug!("Mapped {} -> {:?}", fingerprint, sentence);
        Ok(fingerprint)
    }

    /// Number of mapping rows whose clip is on disk
    pub fn recorded_count(&self) -> Result<usize, RecordingsError> {
        let table = self.mapping.load()?;
        Ok(table
            .entries()
            .iter()
            .filter(|e| self.audio.exists(&e.filename))
            .count())
    }

    /// Pack every recorded clip into a zip, then clear them out.
    ///
    /// Rows whose clip is missing are skipped. Clips are deleted only once
    /// the archive is complete. The mapping table then keeps exactly the rows
    /// whose clip is still on disk, so a clip that could not be deleted stays
    /// reachable by the next export.
    pub fn export_archive(&self) -> Result<Export, RecordingsError> {
        let _guard = self.writer.lock();
        let mut table = self.mapping.load()?;

        let mut clips = Vec::new();
        let mut stale_count = 0;
        for entry in table.entries() {
            if !self.audio.exists(&entry.filename) {
                debug!("Skipping stale mapping row: {}", entry.filename);
                stale_count += 1;
                continue;
            }
            let audio = self.audio.read(&entry.filename)?;
            clips.push(ArchiveClip {
                entry: entry.clone(),
                audio,
            });
        }

        let archive = archive::build_archive(&clips)?;

        let exported: Vec<String> = clips.iter().map(|c| c.entry.filename.clone()).collect();
        let removed = self.audio.remove_all(&exported);
        if removed < exported.len() {
            warn!(
                "{} exported clips could not be deleted and stay mapped",
                exported.len() - removed
            );
        }

        self.prune_mapping(&mut table)?;

        info!(
            "Exported {} clips ({} stale rows dropped, {} bytes)",
            clips.len(),
            stale_count,
            archive.len()
        );

        Ok(Export {
            archive,
            clip_count: clips.len(),
            stale_count,
        })
    }

    /// Drop every row whose clip is no longer on disk. Returns whether the
    /// table changed and was saved.
    fn prune_mapping(&self, table: &mut MappingTable) -> Result<bool, RecordingsError> {
        let before = table.len();
        table.retain(|e| self.audio.exists(&e.filename));
        if table.len() == before {
            return Ok(false);
        }
        self.mapping.save(table)?;
        Ok(true)
    }
}
