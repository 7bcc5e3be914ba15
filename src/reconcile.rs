//! Reconciliation of local directories with the remote catalog.
//!
//! The output order is fixed by three independent orderings concatenated:
//! catalog records in the order the source yields them, then local GitHub
//! clones grouped by owner (largest group first, names ascending inside a
//! group), then non-remote git directories and plain directories. Filters
//! and descriptions are applied to that list, and the history boost runs
//! last.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::str::FromStr;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::catalog::{CancelSignal, CatalogSource};
use crate::entry::{
    DisplayItem, LocalEntry, LocalKind, LocalRepoInfo, ReconciledEntry, RemoteCatalogEntry,
    RemoteEntry, Snapshot,
};
use crate::error::ReconcileError;
use crate::history::{apply_history_boost, HistoryList};
use crate::identity::RemoteIdentity;
use crate::scan::{DirectoryKinds, LocalInventory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForkVisibility {
    #[default]
    All,
    Hide,
    Only,
}

impl FromStr for ForkVisibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ForkVisibility::All),
            "hide" => Ok(ForkVisibility::Hide),
            "only" => Ok(ForkVisibility::Only),
            other => Err(format!("unknown fork visibility '{}' (expected all, hide or only)", other)),
        }
    }
}

impl ForkVisibility {
    fn admits(self, entry: &ReconciledEntry) -> bool {
        match self {
            ForkVisibility::All => true,
            ForkVisibility::Hide => !entry.is_fork(),
            ForkVisibility::Only => entry.is_fork(),
        }
    }
}

/// When to put the directory name into an item's description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowFolderNames {
    Never,
    /// Only for items whose slug is shared with another item.
    #[default]
    OnDuplicates,
    Always,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub ignore_owners: BTreeSet<String>,
    pub fork_visibility: ForkVisibility,
    /// Maximum number of catalog records to take; 0 means no limit.
    pub catalog_cap: usize,
    pub show_folder_names: ShowFolderNames,
    pub owner_filter: Option<String>,
    pub not_cloned_only: bool,
    pub kinds: DirectoryKinds,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            ignore_owners: BTreeSet::new(),
            fork_visibility: ForkVisibility::All,
            catalog_cap: crate::config::DEFAULT_CATALOG_CAP,
            show_folder_names: ShowFolderNames::OnDuplicates,
            owner_filter: None,
            not_cloned_only: false,
            kinds: DirectoryKinds::all(),
        }
    }
}

/// What a listing session hands to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Sent once, before any directory is read. `None` when boosting is off.
    History(Option<HistoryList>),
    /// A complete, refined result list.
    Entries(Snapshot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No catalog was consulted; a single snapshot was emitted.
    NoCatalog,
    /// The source reported no further pages.
    Exhausted,
    /// The catalog cap was hit; remaining pages were not requested.
    CapReached,
    /// The cancel signal was raised or the consumer went away.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub pages: usize,
    pub catalog_entries: usize,
    pub snapshots: usize,
    pub stop: StopReason,
}

/// Sort local GitHub clones: owners with more clones first (ties keep first
/// appearance), names ascending within an owner.
pub fn group_by_owner(repos: Vec<LocalRepoInfo>) -> Vec<LocalRepoInfo> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<LocalRepoInfo>> = Vec::new();

    for repo in repos {
        match index.get(&repo.slug.owner) {
            Some(&i) => groups[i].push(repo),
            None => {
                index.insert(repo.slug.owner.clone(), groups.len());
                groups.push(vec![repo]);
            }
        }
    }

    for group in groups.iter_mut() {
        group.sort_by(|a, b| a.slug.name.cmp(&b.slug.name));
    }
    groups.sort_by(|a, b| b.len().cmp(&a.len()));
    groups.into_iter().flatten().collect()
}

/// Accumulated state of one reconcile pass.
#[derive(Debug, Clone)]
pub struct CatalogFold {
    options: ReconcileOptions,
    pending: Vec<LocalRepoInfo>,
    catalog: Vec<RemoteEntry>,
    seen: HashSet<RemoteIdentity>,
    bottom: Vec<LocalEntry>,
}

impl CatalogFold {
    pub fn new(inventory: LocalInventory, options: ReconcileOptions) -> Self {
        let kinds = options.kinds;
        let pending = if kinds.github {
            group_by_owner(inventory.repos)
        } else {
            Vec::new()
        };

        let mut bottom = Vec::new();
        if kinds.non_remote {
            bottom.extend(inventory.non_remote.into_iter().map(|dir_name| LocalEntry {
                slug: None,
                dir_name,
                fork_parent: None,
                kind: LocalKind::NonRemote,
            }));
        }
        if kinds.non_git {
            bottom.extend(inventory.non_git.into_iter().map(|dir_name| LocalEntry {
                slug: None,
                dir_name,
                fork_parent: None,
                kind: LocalKind::NonGit,
            }));
        }

        Self {
            options,
            pending,
            catalog: Vec::new(),
            seen: HashSet::new(),
            bottom,
        }
    }

    pub fn catalog_len(&self) -> usize {
        self.catalog.len()
    }

    pub fn cap_reached(&self) -> bool {
        self.options.catalog_cap != 0 && self.catalog.len() >= self.options.catalog_cap
    }

    /// Fold one catalog page in. Returns true once the catalog cap is reached;
    /// records past the cap are dropped.
    pub fn push_page(&mut self, page: Vec<RemoteCatalogEntry>) -> bool {
        for record in page {
            if self.cap_reached() {
                break;
            }
            if !self.seen.insert(record.slug.clone()) {
                tracing::debug!(slug = %record.slug, "duplicate catalog record skipped");
                continue;
            }

            let clone = self
                .pending
                .iter()
                .position(|local| local.slug == record.slug)
                .map(|i| self.pending.remove(i));

            let (dir_name, local_parent) = match clone {
                Some(local) => (Some(local.dir_name), local.fork_parent),
                None => (None, None),
            };

            self.catalog.push(RemoteEntry {
                slug: record.slug,
                dir_name,
                disk_usage_kb: record.disk_usage_kb,
                is_archived: record.is_archived,
                fork_parent: record.fork_parent.or(local_parent),
            });
        }
        self.cap_reached()
    }

    /// The current full result list.
    pub fn snapshot(&self, history: Option<&[RemoteIdentity]>) -> Snapshot {
        let entries = self
            .catalog
            .iter()
            .cloned()
            .map(ReconciledEntry::Remote)
            .chain(
                self.pending
                    .iter()
                    .cloned()
                    .map(|info| ReconciledEntry::Local(info.into())),
            )
            .chain(self.bottom.iter().cloned().map(ReconciledEntry::Local))
            .filter(|entry| self.admits(entry))
            .collect();

        let items = describe(entries, self.options.show_folder_names);
        match history {
            Some(history) => apply_history_boost(items, history),
            None => items,
        }
    }

    fn admits(&self, entry: &ReconciledEntry) -> bool {
        let options = &self.options;
        if let Some(slug) = entry.slug() {
            if options.ignore_owners.contains(&slug.owner) {
                return false;
            }
        }
        if !options.fork_visibility.admits(entry) {
            return false;
        }
        if let (Some(owner), Some(slug)) = (options.owner_filter.as_deref(), entry.slug()) {
            if slug.owner != owner {
                return false;
            }
        }
        if options.not_cloned_only {
            return matches!(entry, ReconciledEntry::Remote(r) if r.dir_name.is_none());
        }
        true
    }
}

/// Attach descriptions: the fork parent for forks, and the directory name
/// where `show` asks for it.
pub fn describe(entries: Vec<ReconciledEntry>, show: ShowFolderNames) -> Vec<DisplayItem> {
    let mut slug_counts: HashMap<RemoteIdentity, usize> = HashMap::new();
    for slug in entries.iter().filter_map(ReconciledEntry::slug) {
        *slug_counts.entry(slug.clone()).or_insert(0) += 1;
    }

    entries
        .into_iter()
        .map(|entry| {
            let mut parts = Vec::new();
            if let Some(parent) = entry.fork_parent() {
                parts.push(format!("forked from {}", parent));
            }
            let duplicated = entry
                .slug()
                .is_some_and(|slug| slug_counts.get(slug).copied().unwrap_or(0) > 1);
            let show_folder = match show {
                ShowFolderNames::Never => false,
                ShowFolderNames::OnDuplicates => duplicated,
                ShowFolderNames::Always => entry.slug().is_some(),
            };
            if show_folder {
                if let Some(dir_name) = entry.dir_name() {
                    parts.push(dir_name.to_string());
                }
            }

            DisplayItem {
                description: (!parts.is_empty()).then(|| parts.join(" ")),
                entry,
            }
        })
        .collect()
}

pub struct Reconciler {
    options: ReconcileOptions,
    history: Option<HistoryList>,
}

impl Reconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self {
            options,
            history: None,
        }
    }

    pub fn with_history(mut self, history: Option<HistoryList>) -> Self {
        self.history = history;
        self
    }

    /// Fold catalog pages into the inventory, sending a snapshot after each.
    ///
    /// Pages are requested strictly one after another. The cancel signal is
    /// checked before every request and after every page; once it is raised
    /// nothing more is sent. A catalog error is returned after the snapshots
    /// already sent, which stay valid.
    pub async fn run<S: CatalogSource>(
        &self,
        inventory: LocalInventory,
        catalog: Option<&mut S>,
        cancel: &CancelSignal,
        tx: &mpsc::Sender<Update>,
    ) -> Result<RunOutcome, ReconcileError> {
        let history = self.history.as_deref();
        let mut fold = CatalogFold::new(inventory, self.options.clone());
        let mut outcome = RunOutcome {
            pages: 0,
            catalog_entries: 0,
            snapshots: 0,
            stop: StopReason::NoCatalog,
        };

        let source = match catalog {
            Some(source) if self.options.kinds.github => source,
            _ => {
                if !cancel.is_cancelled() && tx.send(Update::Entries(fold.snapshot(history))).await.is_ok() {
                    outcome.snapshots = 1;
                } else {
                    outcome.stop = StopReason::Cancelled;
                }
                return Ok(outcome);
            }
        };

        let mut cursor: Option<String> = None;
        loop {
            if cancel.is_cancelled() {
                outcome.stop = StopReason::Cancelled;
                break;
            }

            let page = source
                .next_page(cursor.take())
                .await
                .map_err(|source| ReconcileError::Catalog {
                    pages: outcome.pages,
                    source,
                })?;
            outcome.pages += 1;

            let capped = fold.push_page(page.entries);
            outcome.catalog_entries = fold.catalog_len();

            if cancel.is_cancelled() {
                outcome.stop = StopReason::Cancelled;
                break;
            }
            if tx.send(Update::Entries(fold.snapshot(history))).await.is_err() {
                tracing::debug!("snapshot receiver dropped, stopping");
                outcome.stop = StopReason::Cancelled;
                break;
            }
            outcome.snapshots += 1;

            if capped {
                outcome.stop = StopReason::CapReached;
                break;
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => {
                    outcome.stop = StopReason::Exhausted;
                    break;
                }
            }
        }

        tracing::info!(
            pages = outcome.pages,
            catalog_entries = outcome.catalog_entries,
            snapshots = outcome.snapshots,
            stop = ?outcome.stop,
            "reconcile finished"
        );
        Ok(outcome)
    }
}

/// Snapshots of a reconcile running on its own task.
pub struct SnapshotStream {
    rx: mpsc::Receiver<Update>,
    handle: JoinHandle<Result<RunOutcome, ReconcileError>>,
}

impl SnapshotStream {
    /// Wait for the next snapshot; `None` once the run has ended.
    pub async fn next(&mut self) -> Option<Snapshot> {
        while let Some(update) = self.rx.recv().await {
            if let Update::Entries(snapshot) = update {
                return Some(snapshot);
            }
        }
        None
    }

    /// Drain remaining snapshots and return how the run ended.
    pub async fn finish(mut self) -> Result<RunOutcome, ReconcileError> {
        while self.rx.recv().await.is_some() {}
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(ReconcileError::Aborted(e.to_string())),
        }
    }
}

/// Start reconciling on a new task and return the stream of snapshots.
///
/// The channel holds one snapshot, so the engine fetches at most one page
/// ahead of the consumer.
pub fn reconcile<S>(
    inventory: LocalInventory,
    catalog: Option<S>,
    options: ReconcileOptions,
    history: Option<HistoryList>,
    cancel: CancelSignal,
) -> SnapshotStream
where
    S: CatalogSource + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    let reconciler = Reconciler::new(options).with_history(history);
    let handle = tokio::spawn(async move {
        let mut catalog = catalog;
        reconciler
            .run(inventory, catalog.as_mut(), &cancel, &tx)
            .await
    });
    SnapshotStream { rx, handle }
}
