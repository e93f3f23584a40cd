//! crates/legal_welfare_core/src/cache.rs
//!
//! Per-user cache of analyzed documents and generated letters.
//!
//! Each user keeps two most-recent-first lists capped at a fixed capacity; adding
//! past the cap evicts from the tail. Nothing here returns an error: storage
//! problems are logged by `KeyedStore` and show up as missing history.

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info};

use crate::domain::{
    AnalyzedDocument, AnalyzedDocumentStats, DocumentStats, GeneratedLetter, LetterStats,
    NewAnalyzedDocument, NewGeneratedLetter,
};
use crate::store::{KeyedStore, Namespace};

/// Maximum number of records kept per user and kind.
pub const DEFAULT_CAPACITY: usize = 100;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

//=========================================================================================
// RecentList
//=========================================================================================

/// A fixed-capacity list ordered newest first.
#[derive(Debug, Clone)]
pub struct RecentList<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> RecentList<T> {
    /// Wraps an already ordered list. Nothing is evicted until the next push.
    pub fn from_vec(items: Vec<T>, capacity: usize) -> Self {
        Self { items, capacity }
    }

    /// Inserts `item` at the front and returns whatever fell off the tail.
    pub fn push_front(&mut self, item: T) -> Vec<T> {
        self.items.insert(0, item);
        if self.items.len() > self.capacity {
            self.items.split_off(self.capacity)
        } else {
            Vec::new()
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

//=========================================================================================
// DocumentCache
//=========================================================================================

#[derive(Clone)]
pub struct DocumentCache {
    store: KeyedStore,
    capacity: usize,
}

impl DocumentCache {
    pub fn new(store: KeyedStore) -> Self {
        Self::with_capacity(store, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(store: KeyedStore, capacity: usize) -> Self {
        Self { store, capacity }
    }

    // --- Analyzed documents ---

    /// All analyzed documents for a user, most recent first.
    pub fn analyzed_documents(&self, user_id: &str) -> Vec<AnalyzedDocument> {
        self.store.read(Namespace::AnalyzedDocuments, user_id)
    }

    /// Stores a new analyzed document and returns it with its assigned id and time.
    pub fn add_analyzed_document(
        &self,
        user_id: &str,
        document: NewAnalyzedDocument,
    ) -> AnalyzedDocument {
        let now = Utc::now();
        let record = AnalyzedDocument {
            id: generate_id("doc", now),
            filename: document.filename,
            analyzed_at: now,
            result: document.result,
            session_id: document.session_id,
        };
        self.prepend(Namespace::AnalyzedDocuments, user_id, record.clone());
        record
    }

    pub fn analyzed_document_stats(&self, user_id: &str) -> AnalyzedDocumentStats {
        tally_analyzed(&self.analyzed_documents(user_id))
    }

    pub fn clear_analyzed_documents(&self, user_id: &str) {
        self.store.remove(Namespace::AnalyzedDocuments, user_id);
    }

    // --- Generated letters ---

    /// All generated letters for a user, most recent first.
    pub fn generated_letters(&self, user_id: &str) -> Vec<GeneratedLetter> {
        self.store.read(Namespace::LettersGenerated, user_id)
    }

    /// Stores a new generated letter and returns it with its assigned id and time.
    pub fn add_generated_letter(&self, user_id: &str, letter: NewGeneratedLetter) -> GeneratedLetter {
        let now = Utc::now();
        let record = GeneratedLetter {
            id: generate_id("letter", now),
            filename: letter.filename,
            template_name: letter.template_name,
            generated_at: now,
            success: letter.success,
        };
        self.prepend(Namespace::LettersGenerated, user_id, record.clone());
        record
    }

    pub fn generated_letter_stats(&self, user_id: &str) -> LetterStats {
        LetterStats {
            total_letters: self.generated_letters(user_id).len(),
        }
    }

    pub fn clear_generated_letters(&self, user_id: &str) {
        self.store.remove(Namespace::LettersGenerated, user_id);
    }

    // --- Combined ---

    /// Dashboard view: document and letter stats together.
    pub fn document_stats(&self, user_id: &str) -> DocumentStats {
        DocumentStats {
            analyzed: self.analyzed_document_stats(user_id),
            letters: self.generated_letter_stats(user_id),
        }
    }

    /// Drops both record kinds for one user, e.g. on logout.
    pub fn clear_user_cache(&self, user_id: &str) {
        self.clear_analyzed_documents(user_id);
        self.clear_generated_letters(user_id);
        info!("Cleared cached history for user {}", user_id);
    }

    /// Drops both record kinds for every user. Returns the number of keys removed.
    pub fn clear_all_user_caches(&self) -> usize {
        let removed = self.store.remove_all_namespaced();
        info!("Cleared all user caches ({} keys)", removed);
        removed
    }

    fn prepend<T>(&self, namespace: Namespace, user_id: &str, record: T)
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        let mut list = RecentList::from_vec(self.store.read(namespace, user_id), self.capacity);
        let evicted = list.push_front(record);
        if !evicted.is_empty() {
            debug!(
                "Evicted {} {} record(s) for user {}",
                evicted.len(),
                namespace.suffix(),
                user_id
            );
        }
        self.store.write(namespace, user_id, list.as_slice());
    }
}

/// Counts inclusive (bias count of exactly zero) and flagged (positive bias count)
/// documents. Documents without a bias count are in neither bucket.
pub fn tally_analyzed(documents: &[AnalyzedDocument]) -> AnalyzedDocumentStats {
    let mut stats = AnalyzedDocumentStats {
        total_analyzed: documents.len(),
        ..Default::default()
    };
    for doc in documents {
        match doc.result.biased_count {
            Some(0) => stats.total_inclusive += 1,
            Some(n) if n > 0 => stats.total_flagged += 1,
            _ => {}
        }
    }
    stats
}

/// `<prefix>_<unix millis>_<9 random base36 chars>`
fn generate_id(prefix: &str, now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}_{}_{}", prefix, now.timestamp_millis(), suffix)
}
