//! Sentence fingerprints
//!
//! A recording is stored under a name derived from its sentence text:
//! the lowercase hex MD5 digest of the exact UTF-8 bytes, plus the audio
//! extension. Existing mapping files depend on this format bit-for-bit.

use std::fmt;

/// Extension of every stored clip (browsers record webm/opus)
pub const AUDIO_EXTENSION: &str = "webm";

/// Hash-derived filename identifying a sentence's audio clip
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derive the fingerprint of a sentence. The text is hashed as given, not trimmed.
    pub fn of(sentence: &str) -> Self {
        let digest = md5::compute(sentence.as_bytes());
        Self(format!("{:x}.{}", digest, AUDIO_EXTENSION))
    }

    /// The clip filename, e.g. `8b1a9953c4611296a827abf8c47804d7.webm`
    pub fn filename(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
