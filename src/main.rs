mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

use cli::{Cli, Commands};
use repopick::catalog::{CancelSignal, CatalogSource, StaticCatalog};
use repopick::config::Config;
use repopick::entry::{DisplayItem, Snapshot};
use repopick::github::GithubCatalog;
use repopick::history::{HistoryStore, JsonHistoryStore};
use repopick::logging;
use repopick::reconcile::{ForkVisibility, ReconcileOptions, RunOutcome, Update};
use repopick::scan::DirectoryKinds;
use repopick::session::{self, SessionRequest};

#[tokio::main]
async fn main() -> Result<()> {
    better_panic::install();

    let config = Config::load()?;

    logging::setup_logging(&config)?;

    let cli = Cli::parse();

    tracing::debug!(command = ?cli.command, "dispatching command");

    match cli.command {
        Commands::List {
            remote,
            catalog_file,
            forks,
            owner,
            not_cloned,
            kinds,
            json,
            progress,
        } => {
            let args = ListArgs {
                remote,
                catalog_file,
                forks,
                owner,
                not_cloned,
                kinds: parse_kinds(&kinds)?,
                json,
                progress,
            };
            cmd_list(&config, args).await
        }

        Commands::Record { slug } => {
            let mut store = JsonHistoryStore::new(config.history_path());
            let history = store.record(&slug, config.settings.history_limit)?;
            println!("Recorded {} ({} in history)", slug, history.len());
            Ok(())
        }

        Commands::History => {
            let store = JsonHistoryStore::new(config.history_path());
            for slug in store.load()? {
                println!("{}", slug);
            }
            Ok(())
        }

        Commands::Init { force } => {
            if config.init_default_file(force)? {
                println!("Config written to {}", config.config_path().display());
            } else {
                println!(
                    "Config already exists at {} (use --force to overwrite)",
                    config.config_path().display()
                );
            }
            Ok(())
        }
    }
}

struct ListArgs {
    remote: bool,
    catalog_file: Option<PathBuf>,
    forks: Option<ForkVisibility>,
    owner: Option<String>,
    not_cloned: bool,
    kinds: DirectoryKinds,
    json: bool,
    progress: bool,
}

fn parse_kinds(values: &[String]) -> Result<DirectoryKinds> {
    let mut kinds = DirectoryKinds {
        github: false,
        non_remote: false,
        non_git: false,
    };
    for value in values {
        match value.trim() {
            "github" => kinds.github = true,
            "non-remote" => kinds.non_remote = true,
            "non-git" => kinds.non_git = true,
            other => anyhow::bail!("Unknown kind '{}' (expected github, non-remote or non-git)", other),
        }
    }
    Ok(kinds)
}

async fn cmd_list(config: &Config, args: ListArgs) -> Result<()> {
    let mut options = config.reconcile_options();
    options.kinds = args.kinds;
    options.owner_filter = args.owner;
    options.not_cloned_only = args.not_cloned;
    if let Some(forks) = args.forks {
        options.fork_visibility = forks;
    }

    let store = JsonHistoryStore::new(config.history_path());
    let cancel = CancelSignal::new();
    let (tx, mut rx) = mpsc::channel::<Update>(1);

    let json = args.json;
    let progress = args.progress;
    let printer = tokio::spawn(async move {
        let mut last: Option<Snapshot> = None;
        while let Some(update) = rx.recv().await {
            match update {
                Update::History(history) => {
                    tracing::debug!(len = ?history.as_ref().map(Vec::len), "history snapshot received");
                }
                Update::Entries(snapshot) => {
                    if progress {
                        print_snapshot(&snapshot, json);
                        println!();
                    }
                    last = Some(snapshot);
                }
            }
        }
        if !progress {
            if let Some(snapshot) = last {
                print_snapshot(&snapshot, json);
            }
        }
    });

    let outcome = if let Some(path) = args.catalog_file {
        let mut catalog = StaticCatalog::load(&path)?;
        run_session(config, options, Some(&mut catalog), cancel, &store, tx).await
    } else if args.remote {
        let mut catalog = GithubCatalog::from_token_or_env(config.settings.github_token.as_deref())?;
        run_session(config, options, Some(&mut catalog), cancel, &store, tx).await
    } else {
        run_session::<StaticCatalog>(config, options, None, cancel, &store, tx).await
    };

    printer.await.context("output task failed")?;
    let outcome = outcome?;
    tracing::info!(?outcome, "list finished");
    Ok(())
}

async fn run_session<S: CatalogSource>(
    config: &Config,
    options: ReconcileOptions,
    catalog: Option<&mut S>,
    cancel: CancelSignal,
    store: &JsonHistoryStore,
    tx: mpsc::Sender<Update>,
) -> Result<RunOutcome> {
    let request = SessionRequest {
        config,
        options,
        catalog,
        cancel,
    };
    // tx is dropped when this returns, which ends the printer loop.
    let outcome = session::run(request, store, &tx).await?;
    Ok(outcome)
}

fn print_snapshot(snapshot: &Snapshot, json: bool) {
    if json {
        match serde_json::to_string_pretty(snapshot) {
            Ok(out) => println!("{}", out),
            Err(e) => eprintln!("Error: failed to serialize items: {}", e),
        }
        return;
    }
    for item in snapshot {
        println!("{}", format_item(item));
    }
}

fn format_item(item: &DisplayItem) -> String {
    let mut line = item.entry.label();
    if let Some(description) = &item.description {
        line.push_str("  ");
        line.push_str(description);
    }
    line
}
