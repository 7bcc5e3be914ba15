use serde::Serialize;

use crate::identity::RemoteIdentity;

/// A git directory whose default remote resolved to a GitHub identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRepoInfo {
    pub slug: RemoteIdentity,
    pub dir_name: String,
    pub fork_parent: Option<RemoteIdentity>,
}

/// One repository record from the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct RemoteCatalogEntry {
    pub slug: RemoteIdentity,
    #[serde(default)]
    pub disk_usage_kb: u64,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub fork_parent: Option<RemoteIdentity>,
}

/// Which local listing produced a `Local` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocalKind {
    /// Cloned from GitHub but absent from (or not checked against) the catalog.
    Github,
    /// A git repository with no remotes configured.
    NonRemote,
    /// A plain directory.
    NonGit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalEntry {
    pub slug: Option<RemoteIdentity>,
    pub dir_name: String,
    pub fork_parent: Option<RemoteIdentity>,
    pub kind: LocalKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteEntry {
    pub slug: RemoteIdentity,
    /// Set when a local clone was matched to this catalog record.
    pub dir_name: Option<String>,
    pub disk_usage_kb: u64,
    pub is_archived: bool,
    pub fork_parent: Option<RemoteIdentity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReconciledEntry {
    Local(LocalEntry),
    Remote(RemoteEntry),
}

impl ReconciledEntry {
    pub fn slug(&self) -> Option<&RemoteIdentity> {
        match self {
            ReconciledEntry::Local(l) => l.slug.as_ref(),
            ReconciledEntry::Remote(r) => Some(&r.slug),
        }
    }

    pub fn dir_name(&self) -> Option<&str> {
        match self {
            ReconciledEntry::Local(l) => Some(&l.dir_name),
            ReconciledEntry::Remote(r) => r.dir_name.as_deref(),
        }
    }

    pub fn fork_parent(&self) -> Option<&RemoteIdentity> {
        match self {
            ReconciledEntry::Local(l) => l.fork_parent.as_ref(),
            ReconciledEntry::Remote(r) => r.fork_parent.as_ref(),
        }
    }

    pub fn is_fork(&self) -> bool {
        self.fork_parent().is_some()
    }

    /// True when the entry has a directory on disk to open.
    pub fn is_cloned(&self) -> bool {
        self.dir_name().is_some()
    }

    /// Text a picker would show as the item label.
    pub fn label(&self) -> String {
        match self.slug() {
            Some(slug) => slug.to_string(),
            None => self.dir_name().unwrap_or_default().to_string(),
        }
    }
}

impl From<LocalRepoInfo> for LocalEntry {
    fn from(info: LocalRepoInfo) -> Self {
        Self {
            slug: Some(info.slug),
            dir_name: info.dir_name,
            fork_parent: info.fork_parent,
            kind: LocalKind::Github,
        }
    }
}

/// A reconciled entry plus the text used to tell it apart from its neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayItem {
    #[serde(flatten)]
    pub entry: ReconciledEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DisplayItem {
    pub fn new(entry: ReconciledEntry) -> Self {
        Self {
            entry,
            description: None,
        }
    }
}

/// A full, self-contained result list; later snapshots replace earlier ones.
pub type Snapshot = Vec<DisplayItem>;

/// Anything that may carry a repository slug, for history ranking.
pub trait HasSlug {
    fn slug(&self) -> Option<&RemoteIdentity>;
}

impl HasSlug for ReconciledEntry {
    fn slug(&self) -> Option<&RemoteIdentity> {
        ReconciledEntry::slug(self)
    }
}

impl HasSlug for DisplayItem {
    fn slug(&self) -> Option<&RemoteIdentity> {
        self.entry.slug()
    }
}

impl HasSlug for RemoteIdentity {
    fn slug(&self) -> Option<&RemoteIdentity> {
        Some(self)
    }
}
