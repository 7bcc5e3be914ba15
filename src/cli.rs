use clap::{Parser, Subcommand};
use std::path::PathBuf;

use repopick::identity::RemoteIdentity;
use repopick::reconcile::ForkVisibility;

#[derive(Parser)]
#[command(name = "repopick")]
#[command(about = "Repo Picker - Rank local clones and your GitHub repositories into one list to open")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List repositories and directories, best matches first
    List {
        /// Also fetch your repository catalog from GitHub
        #[arg(long)]
        remote: bool,
        /// Read the catalog from a JSON file (array of pages) instead of GitHub
        #[arg(long, value_name = "PATH")]
        catalog_file: Option<PathBuf>,
        /// Fork visibility: all, hide or only (default from config)
        #[arg(long)]
        forks: Option<ForkVisibility>,
        /// Only show repositories of this owner
        #[arg(long)]
        owner: Option<String>,
        /// Only show catalog repositories without a local clone
        #[arg(long)]
        not_cloned: bool,
        /// Comma-separated kinds to list: github, non-remote, non-git
        #[arg(long, value_delimiter = ',', default_value = "github,non-remote,non-git")]
        kinds: Vec<String>,
        /// Print items as JSON
        #[arg(long)]
        json: bool,
        /// Print every intermediate snapshot, not just the final one
        #[arg(long)]
        progress: bool,
    },

    /// Record that a repository was opened (moves it to the top next time)
    Record {
        /// Repository slug (owner/name)
        slug: RemoteIdentity,
    },

    /// Show recently opened repositories, most recent first
    History,

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}
