//! SHA-256 fingerprints of loaded artifact files

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Per-file checksums of the bundle as it was loaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BundleFingerprint {
    files: BTreeMap<String, String>,
}

impl BundleFingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, file_name: &str, contents: &[u8]) {
        self.files
            .insert(file_name.to_string(), compute_checksum(contents));
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    /// Single digest over all file checksums, stable across load order
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for (name, checksum) in &self.files {
            hasher.update(name.as_bytes());
            hasher.update(b":");
            hasher.update(checksum.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}
