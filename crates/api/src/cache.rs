use dashmap::DashMap;
use extract::ExtractionResult;
use ingest::PatentRecord;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Extraction results keyed by a hash of the input record.
pub struct ExtractionCache {
    entries: Arc<DashMap<String, ExtractionResult>>,
    max_entries: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ExtractionCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_entries,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, record: &PatentRecord) -> Option<ExtractionResult> {
        let found = self
            .entries
            .get(&Self::key(record))
            .map(|r| r.value().clone());

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn insert(&self, record: &PatentRecord, result: ExtractionResult) {
        if self.max_entries == 0 {
            return;
        }

        if self.entries.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self
                .entries
                .iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.entries.remove(&key);
            }
        }

        self.entries.insert(Self::key(record), result);
    }

    /// SHA-256 over every field the extractor reads
    fn key(record: &PatentRecord) -> String {
        let mut hasher = Sha256::new();
        for part in [&record.patent_id, &record.title, &record.abstract_text, &record.description] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        for claim in &record.claims {
            hasher.update(claim.as_bytes());
            hasher.update([1u8]);
        }
        hex::encode(hasher.finalize())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}
