mod helpers;

use repopick::classify::{classify, LocalDirectory};
use repopick::error::Error;

#[tokio::test]
async fn classify_splits_git_and_plain_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let root = helpers::repos_dir(&tmp);
    helpers::github_clone(&root, "repoX", "alice/proj");
    helpers::git_dir_with_origin(&root, "repoY", "git@github.com:alice/proj.git");
    helpers::plain_dir(&root, "plainDir");

    let listing = classify(&root).await.unwrap();
    assert_eq!(listing.git_dirs, vec!["repoX", "repoY"]);
    assert_eq!(listing.non_git_dirs, vec!["plainDir"]);
}

#[tokio::test]
async fn classify_ignores_files_and_nested_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let root = helpers::repos_dir(&tmp);
    std::fs::write(root.join("notes.txt"), "not a directory").unwrap();
    helpers::plain_dir(&root, "outer");
    helpers::github_clone(&root.join("outer"), "inner", "alice/inner");

    let listing = classify(&root).await.unwrap();
    assert!(listing.git_dirs.is_empty());
    assert_eq!(listing.non_git_dirs, vec!["outer"]);
}

#[tokio::test]
async fn classify_requires_git_to_be_a_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let root = helpers::repos_dir(&tmp);
    // A worktree or submodule checkout has a `.git` file, not a directory.
    let dir = helpers::plain_dir(&root, "worktree");
    std::fs::write(dir.join(".git"), "gitdir: /elsewhere/.git/worktrees/x\n").unwrap();

    let listing = classify(&root).await.unwrap();
    assert!(listing.git_dirs.is_empty());
    assert_eq!(listing.non_git_dirs, vec!["worktree"]);
}

#[cfg(unix)]
#[tokio::test]
async fn classify_skips_symlinked_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let root = helpers::repos_dir(&tmp);
    let target = helpers::github_clone(tmp.path(), "elsewhere", "alice/proj");
    std::os::unix::fs::symlink(&target, root.join("link")).unwrap();
    helpers::plain_dir(&root, "real");

    let listing = classify(&root).await.unwrap();
    assert!(listing.git_dirs.is_empty());
    assert_eq!(listing.non_git_dirs, vec!["real"]);
}

#[tokio::test]
async fn classify_missing_root_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = classify(&tmp.path().join("missing")).await.unwrap_err();
    assert!(matches!(err, Error::ReadRoot { .. }));
}

#[tokio::test]
async fn directories_lists_git_before_plain() {
    let tmp = tempfile::tempdir().unwrap();
    let root = helpers::repos_dir(&tmp);
    helpers::plain_dir(&root, "a-plain");
    helpers::github_clone(&root, "b-repo", "alice/b");

    let listing = classify(&root).await.unwrap();
    let dirs: Vec<LocalDirectory> = listing.directories().collect();
    assert_eq!(
        dirs,
        vec![
            LocalDirectory {
                name: "b-repo".to_string(),
                is_git_repository: true
            },
            LocalDirectory {
                name: "a-plain".to_string(),
                is_git_repository: false
            },
        ]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn classify_keeps_going_past_unreadable_entries() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempfile::tempdir().unwrap();
    let root = helpers::repos_dir(&tmp);
    let locked = helpers::plain_dir(&root, "locked");
    helpers::github_clone(&root, "repoX", "alice/proj");
    helpers::plain_dir(&root, "zzz");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

    let listing = classify(&root).await;
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

    // `locked/.git` cannot be checked, so the directory counts as plain.
    let listing = listing.unwrap();
    assert_eq!(listing.git_dirs, vec!["repoX"]);
    assert_eq!(listing.non_git_dirs, vec!["locked", "zzz"]);
}
