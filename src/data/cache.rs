use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::loader::{parse_csv, LoadError};
use super::model::Dataset;

// ---------------------------------------------------------------------------
// Fingerprint – content hash of an upload
// ---------------------------------------------------------------------------

/// SHA-256 of the uploaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Fingerprint(out)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough for logs.
        for b in &self.0[..6] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DatasetCache
// ---------------------------------------------------------------------------

/// Parsed uploads keyed by content fingerprint.
///
/// Entries live until [`DatasetCache::retain`] is called with an upload set
/// that no longer contains them.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<Fingerprint, Arc<Dataset>>,
    hits: u64,
    misses: u64,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `bytes`, parsing on a miss.
    ///
    /// Parse failures are not cached.
    pub fn get_or_parse(
        &mut self,
        name: &str,
        bytes: &[u8],
    ) -> Result<(Fingerprint, Arc<Dataset>), LoadError> {
        let fingerprint = Fingerprint::of(bytes);
        if let Some(dataset) = self.entries.get(&fingerprint) {
            self.hits += 1;
            log::debug!("Cache hit for {name} ({fingerprint})");
            return Ok((fingerprint, Arc::clone(dataset)));
        }

        self.misses += 1;
        log::debug!("Cache miss for {name} ({fingerprint})");
        let dataset = Arc::new(parse_csv(name, bytes)?);
        self.entries.insert(fingerprint, Arc::clone(&dataset));
        Ok((fingerprint, dataset))
    }

    /// Drop every entry whose fingerprint is not in `live`.
    pub fn retain(&mut self, live: &HashSet<Fingerprint>) {
        let before = self.entries.len();
        self.entries.retain(|fp, _| live.contains(fp));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            log::debug!("Evicted {evicted} cached dataset(s)");
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
