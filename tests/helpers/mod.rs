#![allow(dead_code)]

use repopick::config::{Config, Settings};
use repopick::entry::{LocalRepoInfo, RemoteCatalogEntry};
use repopick::identity::RemoteIdentity;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Build a Config rooted in the temp dir, with `<tmp>/repos` as the
/// repositories directory.
pub fn test_config(tmp: &TempDir) -> Config {
    let base_dir = tmp.path().join(".repopick");
    let settings = Settings {
        repos_dir: Some(repos_dir(tmp)),
        ..Settings::default()
    };
    Config::new(base_dir, settings)
}

pub fn repos_dir(tmp: &TempDir) -> PathBuf {
    let dir = tmp.path().join("repos");
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Create `<root>/<name>/.git/config` with the given content.
pub fn git_dir_with_config(root: &Path, name: &str, config: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(dir.join(".git")).unwrap();
    std::fs::write(dir.join(".git").join("config"), config).unwrap();
    std::fs::write(dir.join("test.txt"), "Sample content").unwrap();
    dir
}

/// Create a git directory whose `origin` points at `url`.
pub fn git_dir_with_origin(root: &Path, name: &str, url: &str) -> PathBuf {
    git_dir_with_config(
        root,
        name,
        &format!("[remote \"origin\"]\n        url={}\n", url),
    )
}

pub fn github_clone(root: &Path, name: &str, slug: &str) -> PathBuf {
    git_dir_with_origin(root, name, &format!("https://github.com/{}.git", slug))
}

pub fn plain_dir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("test.txt"), "Sample content").unwrap();
    dir
}

/// Lay out the mixed directory fixture: GitHub clones from two owners,
/// duplicate clones through different URL spellings, a fork with an
/// upstream remote, a GitLab clone, a repo without remotes and a plain
/// directory.
pub fn mixed_fixture(root: &Path) {
    github_clone(root, "githubAuthor1", "test-author/vscode-extension-name");
    github_clone(root, "anotherGithubAuthor1", "test-author/something-else");
    github_clone(root, "githubAuthor2", "another-owner/something-else");
    github_clone(root, "anotherGithubAuthor2", "another-owner/something-else-here");
    git_dir_with_origin(
        root,
        "githubDuplicate",
        "git+ssh://git@github.com/another-owner/something-else-here.git",
    );
    git_dir_with_origin(root, "github-top", "git+ssh://git@github.com/another-owner/a.git");
    git_dir_with_config(
        root,
        "github-fork",
        "[remote \"origin\"]\n        url=https://github.com/awesome-contributor/vscode.git\n[remote \"upstream\"]\n        url=https://github.com/microsoft/vscode.git\n",
    );
    git_dir_with_origin(
        root,
        "gitlabRepo",
        "https://gitlab.com/smartive/open-source/christoph/typescript-hero.git",
    );
    git_dir_with_config(root, "nonRemote", "");
    plain_dir(root, "nonGit");
}

pub fn slug(s: &str) -> RemoteIdentity {
    s.parse().unwrap()
}

pub fn local(s: &str, dir_name: &str) -> LocalRepoInfo {
    LocalRepoInfo {
        slug: slug(s),
        dir_name: dir_name.to_string(),
        fork_parent: None,
    }
}

pub fn catalog_entry(s: &str, disk_usage_kb: u64) -> RemoteCatalogEntry {
    RemoteCatalogEntry {
        slug: slug(s),
        disk_usage_kb,
        is_archived: false,
        fork_parent: None,
    }
}

pub fn fork_entry(s: &str, parent: &str) -> RemoteCatalogEntry {
    RemoteCatalogEntry {
        fork_parent: Some(slug(parent)),
        ..catalog_entry(s, 100)
    }
}
