/*!
 * Translation reuse across documents.
 *
 * The same entity (same key and kind) often appears in several compendium
 * documents. Translations found in one target document can pre-fill new
 * entries in another. Lookups go through the `TranslationRepository` trait so
 * the merge engine never depends on where translations come from.
 *
 * A `ReuseReport` lists the entries shared by several source documents and
 * what a run actually reused.
 */

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use parking_lot::RwLock;
use serde::Serialize;

use crate::document::{Document, EntryKey, EntryStatus, Fields};

/// Source of existing translations, keyed by entry key and entity kind
pub trait TranslationRepository: Send + Sync {
    /// Translated fields for an entity, if any are known
    fn lookup(&self, key: &EntryKey, kind: &str) -> Option<Fields>;
}

/// Cache key combining the entry key and its entity kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ReuseKey {
    key: EntryKey,
    kind: String,
}

impl ReuseKey {
    fn new(key: &EntryKey, kind: &str) -> Self {
        Self {
            key: key.clone(),
            kind: kind.to_string(),
        }
    }
}

/// Result of inserting into the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The key was new
    Inserted,
    /// The key already held an identical value
    Unchanged,
    /// The key already held a different value, which was kept
    Conflict,
}

/// Run-scoped, append-only cache of translated entries.
///
/// Clones share the same storage. The first value stored for a key wins;
/// later different values are rejected with a warning.
#[derive(Clone)]
pub struct ReuseCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<ReuseKey, Fields>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,

    /// Whether reuse is enabled
    enabled: bool,
}

impl ReuseCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            enabled,
        }
    }

    /// Insert a translation if the key is absent
    pub fn insert(&self, key: &EntryKey, kind: &str, fields: Fields) -> InsertOutcome {
        if !self.enabled {
            return InsertOutcome::Unchanged;
        }

        let cache_key = ReuseKey::new(key, kind);
        let mut cache = self.cache.write();

        match cache.get(&cache_key) {
            Some(existing) if *existing == fields => InsertOutcome::Unchanged,
            Some(_) => {
                warn!(
                    "Conflicting translations for {} '{}', keeping the first one",
                    kind, key
                );
                InsertOutcome::Conflict
            }
            None => {
                cache.insert(cache_key, fields);
                debug!("Cached translation for {} '{}'", kind, key);
                InsertOutcome::Inserted
            }
        }
    }

    /// Look up a translation, counting hits and misses
    pub fn get(&self, key: &EntryKey, kind: &str) -> Option<Fields> {
        if !self.enabled {
            return None;
        }

        let found = self.cache.read().get(&ReuseKey::new(key, kind)).cloned();
        match found {
            Some(fields) => {
                *self.hits.write() += 1;
                debug!("Reuse hit for {} '{}'", kind, key);
                Some(fields)
            }
            None => {
                *self.misses.write() += 1;
                None
            }
        }
    }

    /// Cache every translated entry of a target document.
    ///
    /// Returns the number of newly inserted entries.
    pub fn populate_from(&self, document: &Document) -> usize {
        let kind = document.kind_or_default();
        document
            .entries
            .iter()
            .filter(|(_, entry)| is_reusable(entry.status(), entry.has_translation()))
            .filter(|(key, entry)| {
                self.insert(key, kind, entry.fields.clone()) == InsertOutcome::Inserted
            })
            .count()
    }

    /// Hits, misses and hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Drop all cached translations and counters at the end of a run
    pub fn reset(&self) {
        self.cache.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;
        debug!("Reuse cache reset");
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for ReuseCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TranslationRepository for ReuseCache {
    fn lookup(&self, key: &EntryKey, kind: &str) -> Option<Fields> {
        self.get(key, kind)
    }
}

fn is_reusable(status: EntryStatus, has_translation: bool) -> bool {
    status == EntryStatus::Translated && has_translation
}

/// Repository over a fixed set of loaded target documents.
///
/// Documents are searched in the order given; the first translated match wins.
pub struct DocumentRepository {
    documents: Vec<Document>,
}

impl DocumentRepository {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

impl TranslationRepository for DocumentRepository {
    fn lookup(&self, key: &EntryKey, kind: &str) -> Option<Fields> {
        self.documents
            .iter()
            .filter(|document| document.kind_or_default() == kind)
            .filter_map(|document| document.entries.get(key))
            .find(|entry| is_reusable(entry.status(), entry.has_translation()))
            .map(|entry| entry.fields.clone())
    }
}

/// Entry key present in more than one source document of the same kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedEntry {
    pub key: EntryKey,
    pub kind: String,
    /// Source documents holding the entry, sorted
    pub documents: Vec<String>,
    /// Whether some target document holds a finished translation of it
    pub translated: bool,
}

/// Find entries shared across source documents.
///
/// Entries are grouped by key and kind; results are sorted by key.
pub fn detect_shared_content(sources: &[Document], targets: &[Document]) -> Vec<SharedEntry> {
    let mut occurrences: BTreeMap<(EntryKey, String), Vec<String>> = BTreeMap::new();
    for source in sources {
        let kind = source.kind_or_default();
        for key in source.entries.keys() {
            occurrences
                .entry((key.clone(), kind.to_string()))
                .or_default()
                .push(source.id.clone());
        }
    }

    let repository = DocumentRepository::new(targets.to_vec());
    occurrences
        .into_iter()
        .filter(|(_, documents)| documents.len() > 1)
        .map(|((key, kind), mut documents)| {
            documents.sort();
            let translated = repository.lookup(&key, &kind).is_some();
            SharedEntry {
                key,
                kind,
                documents,
                translated,
            }
        })
        .collect()
}

/// Shared content and reuse activity of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReuseReport {
    pub shared: Vec<SharedEntry>,
    /// Entries pre-filled during the run, as `(document, key)`
    pub reused: Vec<(String, EntryKey)>,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl ReuseReport {
    pub fn new(shared: Vec<SharedEntry>) -> Self {
        Self {
            shared,
            ..Self::default()
        }
    }

    /// Share of shared entries that already have a translation, 0 when none are shared
    pub fn translated_percentage(&self) -> f64 {
        if self.shared.is_empty() {
            return 0.0;
        }
        let translated = self.shared.iter().filter(|entry| entry.translated).count();
        translated as f64 / self.shared.len() as f64 * 100.0
    }

    pub fn describe(&self) -> String {
        format!(
            "{} shared entr(ies), {} reused, {} cache hit(s), {} miss(es)",
            self.shared.len(),
            self.reused.len(),
            self.cache_hits,
            self.cache_misses
        )
    }

    /// Markdown report
    pub fn render_markdown(&self, generated_at: DateTime<Utc>) -> String {
        const MAX_REUSED_ROWS: usize = 50;
        const MAX_UNTRANSLATED: usize = 20;

        let mut out = String::new();
        let _ = writeln!(out, "# Translation Reuse Report\n");
        let _ = writeln!(out, "Generated: {}\n", generated_at.format("%Y-%m-%d %H:%M:%S UTC"));

        let _ = writeln!(out, "## Summary\n");
        let _ = writeln!(out, "- **Shared entries**: {}", self.shared.len());
        let _ = writeln!(out, "- **Translated shared entries**: {:.1}%", self.translated_percentage());
        let _ = writeln!(out, "- **Reused in this run**: {}", self.reused.len());
        let _ = writeln!(out, "- **Cache hits / misses**: {} / {}\n", self.cache_hits, self.cache_misses);

        if !self.reused.is_empty() {
            let _ = writeln!(out, "## Reused Translations\n");
            let _ = writeln!(out, "| Document | Entry |");
            let _ = writeln!(out, "|----------|-------|");
            for (document, key) in self.reused.iter().take(MAX_REUSED_ROWS) {
                let _ = writeln!(out, "| {} | {} |", document, key);
            }
            if self.reused.len() > MAX_REUSED_ROWS {
                let _ = writeln!(out, "| ... | {} more |", self.reused.len() - MAX_REUSED_ROWS);
            }
            out.push('\n');
        }

        let untranslated: Vec<&SharedEntry> = self.shared.iter().filter(|entry| !entry.translated).collect();
        if !untranslated.is_empty() {
            let _ = writeln!(out, "## Untranslated Shared Entries\n");
            for entry in untranslated.iter().take(MAX_UNTRANSLATED) {
                let _ = writeln!(
                    out,
                    "- **{}** ({}, in: {})",
                    entry.key,
                    entry.kind,
                    entry.documents.join(", ")
                );
            }
            if untranslated.len() > MAX_UNTRANSLATED {
                let _ = writeln!(out, "- ... {} more", untranslated.len() - MAX_UNTRANSLATED);
            }
        }

        out
    }
}
