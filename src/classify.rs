use std::path::Path;

use crate::error::{Error, Result};

/// Consecutive `read_dir` errors tolerated before the listing gives up.
const MAX_CONSECUTIVE_ENTRY_ERRORS: usize = 16;

/// An immediate child directory of the repositories directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDirectory {
    pub name: String,
    pub is_git_repository: bool,
}

/// Child directory names split by whether they hold a `.git` directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    pub git_dirs: Vec<String>,
    pub non_git_dirs: Vec<String>,
}

impl DirListing {
    pub fn directories(&self) -> impl Iterator<Item = LocalDirectory> + '_ {
        let git = self.git_dirs.iter().map(|name| LocalDirectory {
            name: name.clone(),
            is_git_repository: true,
        });
        let non_git = self.non_git_dirs.iter().map(|name| LocalDirectory {
            name: name.clone(),
            is_git_repository: false,
        });
        git.chain(non_git)
    }

    /// Drop every name the predicate rejects from both lists.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.git_dirs.retain(|name| keep(name));
        self.non_git_dirs.retain(|name| keep(name));
    }
}

/// List the immediate child directories of `root`.
///
/// Symlinks are not followed. An entry whose metadata cannot be read is
/// skipped; only failing to read `root` itself is an error. Names are
/// returned sorted so repeated scans agree.
pub async fn classify(root: &Path) -> Result<DirListing> {
    let mut read_dir = tokio::fs::read_dir(root).await.map_err(|source| Error::ReadRoot {
        path: root.to_path_buf(),
        source,
    })?;

    let mut listing = DirListing::default();
    let mut failures = 0;

    loop {
        let entry = match read_dir.next_entry().await {
            Ok(Some(entry)) => {
                failures = 0;
                entry
            }
            Ok(None) => break,
            Err(e) if failures < MAX_CONSECUTIVE_ENTRY_ERRORS => {
                failures += 1;
                tracing::debug!(root = %root.display(), error = %e, "skipping unreadable directory entry");
                continue;
            }
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "too many unreadable entries, listing ended early");
                break;
            }
        };

        let file_type = match entry.file_type().await {
            Ok(ft) => ft,
            Err(e) => {
                tracing::debug!(path = %entry.path().display(), error = %e, "skipping entry without metadata");
                continue;
            }
        };
        if !file_type.is_dir() {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::debug!(path = %entry.path().display(), "skipping non UTF-8 directory name");
            continue;
        };

        let git_path = entry.path().join(".git");
        let is_git = match tokio::fs::symlink_metadata(&git_path).await {
            Ok(meta) => meta.is_dir(),
            Err(_) => false,
        };

        if is_git {
            listing.git_dirs.push(name);
        } else {
            listing.non_git_dirs.push(name);
        }
    }

    listing.git_dirs.sort();
    listing.non_git_dirs.sort();

    tracing::debug!(
        root = %root.display(),
        git = listing.git_dirs.len(),
        non_git = listing.non_git_dirs.len(),
        "classified directories"
    );

    Ok(listing)
}
