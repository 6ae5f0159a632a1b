//! Audio module for recorded clips
//!
//! Stores one browser-recorded clip per distinct sentence, named by fingerprint

pub mod store;

pub use store::AudioStore;
