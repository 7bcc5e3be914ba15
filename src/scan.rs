use std::collections::BTreeMap;
use std::path::Path;

use tokio::task::JoinSet;

use crate::classify::DirListing;
use crate::config::DirNamePattern;
use crate::entry::LocalRepoInfo;
use crate::git::{self, DEFAULT_REMOTE, UPSTREAM_REMOTE};

/// Which local listings to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryKinds {
    pub github: bool,
    pub non_remote: bool,
    pub non_git: bool,
}

impl DirectoryKinds {
    pub fn all() -> Self {
        Self {
            github: true,
            non_remote: true,
            non_git: true,
        }
    }

    pub fn github_only() -> Self {
        Self {
            github: true,
            non_remote: false,
            non_git: false,
        }
    }

    fn needs_remotes(&self) -> bool {
        self.github || self.non_remote
    }
}

impl Default for DirectoryKinds {
    fn default() -> Self {
        Self::all()
    }
}

/// Everything known about the repositories directory before the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalInventory {
    /// Git directories whose `origin` is a GitHub repository.
    pub repos: Vec<LocalRepoInfo>,
    /// Git directories with no remotes at all.
    pub non_remote: Vec<String>,
    /// Directories that are not git repositories.
    pub non_git: Vec<String>,
}

/// Build a `LocalInventory` from a classified directory listing.
///
/// Every git directory's config is read concurrently; one directory failing
/// never affects the others. Results are combined in listing order once all
/// reads have finished.
pub async fn scan(
    root: &Path,
    mut listing: DirListing,
    kinds: DirectoryKinds,
    ignore: Option<&DirNamePattern>,
) -> LocalInventory {
    if let Some(pattern) = ignore {
        listing.retain(|name| !pattern.is_match(name));
    }

    let mut inventory = LocalInventory::default();
    if kinds.non_git {
        inventory.non_git = listing.non_git_dirs.clone();
    }
    if !kinds.needs_remotes() {
        return inventory;
    }

    let mut reads = JoinSet::new();
    for (index, dir_name) in listing.git_dirs.iter().enumerate() {
        let dir = root.join(dir_name);
        reads.spawn(async move { (index, git::read_dir_remotes(&dir).await) });
    }

    let mut remotes: Vec<Option<BTreeMap<String, String>>> = vec![None; listing.git_dirs.len()];
    while let Some(joined) = reads.join_next().await {
        match joined {
            Ok((index, map)) => remotes[index] = Some(map),
            Err(e) => tracing::warn!(error = %e, "git config read task failed"),
        }
    }

    for (dir_name, map) in listing.git_dirs.into_iter().zip(remotes) {
        let Some(map) = map else {
            continue;
        };

        if map.is_empty() {
            if kinds.non_remote {
                inventory.non_remote.push(dir_name);
            }
            continue;
        }

        if kinds.github {
            match local_repo_info(&dir_name, &map) {
                Some(info) => inventory.repos.push(info),
                None => {
                    tracing::debug!(dir = %dir_name, "no GitHub origin remote, leaving out of repositories")
                }
            }
        }
    }

    tracing::debug!(
        repos = inventory.repos.len(),
        non_remote = inventory.non_remote.len(),
        non_git = inventory.non_git.len(),
        "local inventory built"
    );

    inventory
}

/// Pair a directory with its `origin` identity and, for forks, the parent
/// named by `upstream`.
pub fn local_repo_info(dir_name: &str, remotes: &BTreeMap<String, String>) -> Option<LocalRepoInfo> {
    let slug = git::parse_hosted_identity(remotes.get(DEFAULT_REMOTE)?)?;
    let fork_parent = remotes
        .get(UPSTREAM_REMOTE)
        .and_then(|url| git::parse_hosted_identity(url))
        .filter(|parent| *parent != slug);
    Some(LocalRepoInfo {
        slug,
        dir_name: dir_name.to_string(),
        fork_parent,
    })
}
