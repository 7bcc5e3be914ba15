use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::reconcile::{ForkVisibility, ReconcileOptions, ShowFolderNames};
use crate::scan::DirectoryKinds;

pub const DEFAULT_HISTORY_LIMIT: usize = 30;
pub const DEFAULT_CATALOG_CAP: usize = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_dir: PathBuf,
    pub settings: Settings,
}

/// Resolved settings, every field filled with a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub repos_dir: Option<PathBuf>,
    pub ignore_owners: BTreeSet<String>,
    pub ignore_dir_name_regex: String,
    pub fork_visibility: ForkVisibility,
    pub boost_recently_opened: bool,
    pub history_limit: usize,
    pub catalog_cap: usize,
    pub show_folder_names: ShowFolderNames,
    pub github_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repos_dir: None,
            ignore_owners: BTreeSet::new(),
            ignore_dir_name_regex: String::new(),
            fork_visibility: ForkVisibility::All,
            boost_recently_opened: true,
            history_limit: DEFAULT_HISTORY_LIMIT,
            catalog_cap: DEFAULT_CATALOG_CAP,
            show_folder_names: ShowFolderNames::OnDuplicates,
            github_token: None,
        }
    }
}

/// On-disk config file (~/.repopick/config.toml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub repos_dir: Option<String>,
    pub ignore_owners: Option<Vec<String>>,
    pub ignore_dir_name_regex: Option<String>,
    pub fork_visibility: Option<ForkVisibility>,
    pub boost_recently_opened: Option<bool>,
    pub history_limit: Option<usize>,
    pub catalog_cap: Option<usize>,
    pub show_folder_names: Option<ShowFolderNames>,
    pub github_token: Option<String>,
}

impl ConfigFile {
    /// Overlay the values present in the file onto the defaults.
    pub fn into_settings(self, home_dir: Option<&Path>) -> Settings {
        let defaults = Settings::default();
        Settings {
            repos_dir: self.repos_dir.map(|p| expand_home(&p, home_dir)),
            ignore_owners: self
                .ignore_owners
                .map(|owners| owners.into_iter().collect())
                .unwrap_or(defaults.ignore_owners),
            ignore_dir_name_regex: self
                .ignore_dir_name_regex
                .unwrap_or(defaults.ignore_dir_name_regex),
            fork_visibility: self.fork_visibility.unwrap_or(defaults.fork_visibility),
            boost_recently_opened: self
                .boost_recently_opened
                .unwrap_or(defaults.boost_recently_opened),
            history_limit: self.history_limit.unwrap_or(defaults.history_limit),
            catalog_cap: self.catalog_cap.unwrap_or(defaults.catalog_cap),
            show_folder_names: self.show_folder_names.unwrap_or(defaults.show_folder_names),
            github_token: self.github_token.filter(|t| !t.trim().is_empty()),
        }
    }
}

fn expand_home(path: &str, home_dir: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~/"), home_dir) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if path == "~" => home_dir.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    }
}

/// Read `<base_dir>/config.toml`, returning defaults if missing or unparseable.
pub fn load_config_file(base_dir: &Path) -> ConfigFile {
    let path = base_dir.join("config.toml");
    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
            Ok(cf) => cf,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to parse config.toml, using defaults");
                ConfigFile::default()
            }
        },
        Err(_) => ConfigFile::default(),
    }
}

/// Write a `ConfigFile` to `<base_dir>/config.toml`.
pub fn save_config_file(base_dir: &Path, config_file: &ConfigFile) -> Result<()> {
    let path = base_dir.join("config.toml");
    let contents = toml::to_string_pretty(config_file)
        .context("failed to serialize config.toml")?;
    std::fs::write(&path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

impl Config {
    pub fn new(base_dir: PathBuf, settings: Settings) -> Self {
        Self { base_dir, settings }
    }

    pub fn load() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Could not find home directory")?;
        let base_dir = home_dir.join(".repopick");
        Ok(Self::load_from(base_dir, Some(&home_dir)))
    }

    pub fn load_from(base_dir: PathBuf, home_dir: Option<&Path>) -> Self {
        let settings = load_config_file(&base_dir).into_settings(home_dir);
        let config = Self::new(base_dir, settings);
        tracing::debug!(
            base_dir = %config.base_dir.display(),
            repos_dir = ?config.settings.repos_dir,
            "config loaded"
        );
        config
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir).context("Failed to create repopick directory")?;
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join("config.toml")
    }

    pub fn history_path(&self) -> PathBuf {
        self.base_dir.join("history.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.base_dir.join("repopick.log")
    }

    /// The repositories directory; listing cannot start without one.
    pub fn repos_dir(&self) -> std::result::Result<&Path, Error> {
        self.settings
            .repos_dir
            .as_deref()
            .ok_or_else(|| Error::NoRootDirectory(self.config_path()))
    }

    /// Everything the reconcile step needs, taken out of the settings once.
    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            ignore_owners: self.settings.ignore_owners.clone(),
            fork_visibility: self.settings.fork_visibility,
            catalog_cap: self.settings.catalog_cap,
            show_folder_names: self.settings.show_folder_names,
            owner_filter: None,
            not_cloned_only: false,
            kinds: DirectoryKinds::all(),
        }
    }

    /// Write a default config.toml. Existing files are kept unless `force`.
    pub fn init_default_file(&self, force: bool) -> Result<bool> {
        self.ensure_dirs()?;
        if !force && self.config_path().exists() {
            return Ok(false);
        }
        let defaults = Settings::default();
        let file = ConfigFile {
            repos_dir: dirs::home_dir().map(|h| h.join("repos").display().to_string()),
            ignore_owners: Some(Vec::new()),
            ignore_dir_name_regex: Some(defaults.ignore_dir_name_regex),
            fork_visibility: Some(defaults.fork_visibility),
            boost_recently_opened: Some(defaults.boost_recently_opened),
            history_limit: Some(defaults.history_limit),
            catalog_cap: Some(defaults.catalog_cap),
            show_folder_names: Some(defaults.show_folder_names),
            github_token: None,
        };
        save_config_file(&self.base_dir, &file)?;
        Ok(true)
    }
}

/// A directory name pattern from settings.
///
/// `/pattern/flags` is a regex with flags (`i`, `m`, `s`, `x`; `g`, `y`
/// and `u` are accepted and ignored). Any other non-empty string is used
/// as a regex as-is.
#[derive(Debug, Clone)]
pub struct DirNamePattern(Regex);

impl DirNamePattern {
    pub fn parse(input: &str) -> std::result::Result<Option<Self>, Error> {
        if input.is_empty() {
            return Ok(None);
        }

        let invalid = |source| Error::InvalidPattern {
            pattern: input.to_string(),
            source,
        };

        let delimited = input
            .strip_prefix('/')
            .and_then(|rest| rest.rsplit_once('/'))
            .filter(|(pattern, flags)| {
                !pattern.is_empty() && flags.chars().all(|c| "gimsuyx".contains(c))
            });

        let regex = match delimited {
            Some((pattern, flags)) => RegexBuilder::new(pattern)
                .case_insensitive(flags.contains('i'))
                .multi_line(flags.contains('m'))
                .dot_matches_new_line(flags.contains('s'))
                .ignore_whitespace(flags.contains('x'))
                .build()
                .map_err(invalid)?,
            None => Regex::new(input).map_err(invalid)?,
        };
        Ok(Some(Self(regex)))
    }

    pub fn is_match(&self, dir_name: &str) -> bool {
        self.0.is_match(dir_name)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}
