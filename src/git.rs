use std::collections::BTreeMap;
use std::path::Path;

use crate::identity::RemoteIdentity;

/// Remote whose URL names the repository itself.
pub const DEFAULT_REMOTE: &str = "origin";

/// Remote pointing at the repository a fork was made from.
pub const UPSTREAM_REMOTE: &str = "upstream";

const HOSTS: &[&str] = &["github.com", "www.github.com"];

/// Extract `remote name -> url` from git config text.
///
/// Reads `[remote "<name>"]` sections line by line. Comments, blank lines
/// and keys without a value are skipped rather than rejected, so a config
/// git itself accepts never fails here. A remote section without a `url`
/// still shows up, mapped to an empty string.
pub fn parse_remotes(config_text: &str) -> BTreeMap<String, String> {
    let mut remotes: BTreeMap<String, String> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in config_text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if trimmed.starts_with('[') {
            current = trimmed
                .strip_prefix('[')
                .and_then(|rest| rest.split_once(']'))
                .and_then(|(header, _)| remote_section_name(header));
            if let Some(name) = &current {
                remotes.entry(name.clone()).or_default();
            }
            continue;
        }

        let Some(remote) = current.as_ref() else {
            continue;
        };
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("url") {
            continue;
        }
        let value = strip_quotes(strip_inline_comment(value).trim());
        let url = remotes.entry(remote.clone()).or_default();
        if url.is_empty() {
            *url = value.to_string();
        }
    }

    remotes
}

/// `remote "origin"` -> `origin`; any other section header -> `None`.
fn remote_section_name(header: &str) -> Option<String> {
    let header = header.trim();
    let (keyword, rest) = header.split_once(char::is_whitespace)?;
    if !keyword.eq_ignore_ascii_case("remote") {
        return None;
    }
    let name = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Cut a value at the first `#` or `;` outside double quotes.
fn strip_inline_comment(value: &str) -> &str {
    let mut quoted = false;
    for (i, c) in value.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '#' | ';' if !quoted => return &value[..i],
            _ => {}
        }
    }
    value
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Read the remotes configured for the repository at `dir`.
///
/// A missing or unreadable `.git/config` is an expected state (a repository
/// that was never pushed anywhere) and yields an empty map.
pub async fn read_dir_remotes(dir: &Path) -> BTreeMap<String, String> {
    let config_path = dir.join(".git").join("config");
    match tokio::fs::read_to_string(&config_path).await {
        Ok(text) => parse_remotes(&text),
        Err(e) => {
            tracing::debug!(path = %config_path.display(), error = %e, "no readable git config, treating as no remotes");
            BTreeMap::new()
        }
    }
}

/// Parse a remote URL into an `owner/name` identity on GitHub.
///
/// Supported formats:
/// - `https://github.com/owner/repo.git` (also `http`, `git`, `git+https`)
/// - `ssh://git@github.com/owner/repo.git` (also `git+ssh`, optional port)
/// - `git@github.com:owner/repo.git`
/// - `github:owner/repo`
/// - `github.com/owner/repo` (no scheme)
///
/// URLs for any other host return `None`.
pub fn parse_hosted_identity(url: &str) -> Option<RemoteIdentity> {
    let url = url.trim();

    if let Some(path) = url.strip_prefix("github:") {
        return identity_from_path(path);
    }

    if let Some((scheme, rest)) = url.split_once("://") {
        let scheme = scheme.to_ascii_lowercase();
        if !matches!(
            scheme.as_str(),
            "https" | "http" | "git" | "ssh" | "git+ssh" | "git+https" | "git+http"
        ) {
            return None;
        }
        let (authority, path) = rest.split_once('/')?;
        let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        let host = host.split_once(':').map_or(host, |(h, _)| h);
        if !is_supported_host(host) {
            return None;
        }
        return identity_from_path(path);
    }

    if let Some((host, path)) = url.split_once('/') {
        if is_supported_host(host) {
            return identity_from_path(path);
        }
    }

    // scp-like syntax: [user@]host:owner/repo
    let (authority, path) = url.split_once(':')?;
    if authority.contains('/') {
        return None;
    }
    let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    if !is_supported_host(host) {
        return None;
    }
    identity_from_path(path)
}

fn is_supported_host(host: &str) -> bool {
    HOSTS.iter().any(|h| h.eq_ignore_ascii_case(host))
}

fn identity_from_path(path: &str) -> Option<RemoteIdentity> {
    let path = path.trim_start_matches('/').trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, name) = path.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some(RemoteIdentity::new(owner, name))
}
