use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use crate::entry::RemoteCatalogEntry;
use crate::error::CatalogError;

/// One batch of catalog records and the cursor for the batch after it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogPage {
    pub entries: Vec<RemoteCatalogEntry>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A paged, cursor-driven source of remote repositories.
///
/// Pages are requested one at a time: the cursor for page N+1 is only
/// known once page N has arrived. `None` asks for the first page.
pub trait CatalogSource {
    fn next_page(
        &mut self,
        cursor: Option<String>,
    ) -> impl Future<Output = Result<CatalogPage, CatalogError>> + Send;
}

/// Cooperative stop flag shared between a consumer and a running reconcile.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Catalog backed by pages held in memory.
///
/// Cursors are page indexes. An optional failure can be placed at a page
/// index to exercise error propagation.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    pages: Vec<Vec<RemoteCatalogEntry>>,
    fail_at: Option<usize>,
    requests: usize,
}

impl StaticCatalog {
    pub fn new(pages: Vec<Vec<RemoteCatalogEntry>>) -> Self {
        Self {
            pages,
            fail_at: None,
            requests: 0,
        }
    }

    /// Fail the request for page `index` instead of returning it.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Number of `next_page` calls served so far.
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Load pages from a JSON file: an array of arrays of catalog entries.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        let pages: Vec<Vec<RemoteCatalogEntry>> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), pages = pages.len(), "catalog file loaded");
        Ok(Self::new(pages))
    }
}

impl CatalogSource for StaticCatalog {
    async fn next_page(&mut self, cursor: Option<String>) -> Result<CatalogPage, CatalogError> {
        self.requests += 1;
        let index = match cursor {
            None => 0,
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| CatalogError::Request(format!("bad cursor '{}'", c)))?,
        };

        if self.fail_at == Some(index) {
            return Err(CatalogError::Request(format!("page {} unavailable", index)));
        }

        let entries = self.pages.get(index).cloned().unwrap_or_default();
        let next_cursor = if index + 1 < self.pages.len() {
            Some((index + 1).to_string())
        } else {
            None
        };
        Ok(CatalogPage {
            entries,
            next_cursor,
        })
    }
}
