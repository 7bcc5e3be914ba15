use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::entry::HasSlug;
use crate::identity::RemoteIdentity;

/// Previously opened repositories, most recent first.
pub type HistoryList = Vec<RemoteIdentity>;

/// Move items whose slug appears in `history` to the front.
///
/// Matched items come first in history order, so the most recently opened
/// one leads. Items sharing a slug move together and keep their relative
/// order, as do all unmatched items. Applying the same history twice gives
/// the same order as applying it once.
pub fn apply_history_boost<T: HasSlug>(items: Vec<T>, history: &[RemoteIdentity]) -> Vec<T> {
    if history.is_empty() || items.is_empty() {
        return items;
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut boosted = Vec::with_capacity(slots.len());
    let mut seen: HashSet<&RemoteIdentity> = HashSet::new();

    for slug in history {
        if !seen.insert(slug) {
            continue;
        }
        for slot in slots.iter_mut() {
            if slot.as_ref().and_then(|item| item.slug()) == Some(slug) {
                boosted.extend(slot.take());
            }
        }
    }

    boosted.extend(slots.into_iter().flatten());
    boosted
}

/// Record a selection: move `slug` to the front and keep at most `limit`.
pub fn record_selection(history: &[RemoteIdentity], slug: &RemoteIdentity, limit: usize) -> HistoryList {
    let mut updated = Vec::with_capacity(history.len() + 1);
    updated.push(slug.clone());
    updated.extend(history.iter().filter(|s| *s != slug).cloned());
    updated.truncate(limit);
    updated
}

/// Where the history list lives between runs.
pub trait HistoryStore {
    fn load(&self) -> Result<HistoryList>;
    fn save(&mut self, history: &HistoryList) -> Result<()>;

    /// Load, record `slug`, save, and return the new list.
    fn record(&mut self, slug: &RemoteIdentity, limit: usize) -> Result<HistoryList> {
        let history = record_selection(&self.load()?, slug, limit);
        self.save(&history)?;
        tracing::debug!(slug = %slug, len = history.len(), "history updated");
        Ok(history)
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct HistoryFile {
    recent: HistoryList,
}

/// History kept as JSON at `<base_dir>/history.json`.
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonHistoryStore {
    /// A missing or unreadable file is an empty history.
    fn load(&self) -> Result<HistoryList> {
        let Ok(data) = std::fs::read_to_string(&self.path) else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<HistoryFile>(&data) {
            Ok(file) => Ok(file.recent),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt history file");
                Ok(Vec::new())
            }
        }
    }

    fn save(&mut self, history: &HistoryList) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(&HistoryFile {
            recent: history.clone(),
        })?;
        std::fs::write(&self.path, data)
            .with_context(|| format!("Failed to write history file: {}", self.path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    pub history: HistoryList,
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<HistoryList> {
        Ok(self.history.clone())
    }

    fn save(&mut self, history: &HistoryList) -> Result<()> {
        self.history = history.clone();
        Ok(())
    }
}
