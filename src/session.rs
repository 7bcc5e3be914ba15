use tokio::sync::mpsc;

use crate::catalog::{CancelSignal, CatalogSource};
use crate::classify::classify;
use crate::config::{Config, DirNamePattern};
use crate::error::{Error, Result};
use crate::history::HistoryStore;
use crate::reconcile::{ReconcileOptions, Reconciler, RunOutcome, Update};
use crate::scan::scan;

/// One listing request: what to show and where the catalog comes from.
pub struct SessionRequest<'a, S> {
    pub config: &'a Config,
    pub options: ReconcileOptions,
    pub catalog: Option<&'a mut S>,
    pub cancel: CancelSignal,
}

/// Run a full listing and send every update to `tx`.
///
/// The history list goes out first, before the repositories directory is
/// touched. A missing repositories directory fails before anything is sent.
pub async fn run<S, H>(
    request: SessionRequest<'_, S>,
    store: &H,
    tx: &mpsc::Sender<Update>,
) -> Result<RunOutcome>
where
    S: CatalogSource,
    H: HistoryStore + ?Sized,
{
    let SessionRequest {
        config,
        options,
        catalog,
        cancel,
    } = request;

    let root = config.repos_dir()?.to_path_buf();
    let ignore = DirNamePattern::parse(&config.settings.ignore_dir_name_regex)?;

    let history = if config.settings.boost_recently_opened {
        Some(store.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load history, continuing without it");
            Vec::new()
        }))
    } else {
        None
    };
    // A consumer that has already gone away is not an error here; the
    // reconcile loop notices it and stops.
    let _ = tx.send(Update::History(history.clone())).await;

    let listing = classify(&root).await?;
    let inventory = scan(&root, listing, options.kinds, ignore.as_ref()).await;

    let outcome = Reconciler::new(options)
        .with_history(history)
        .run(inventory, catalog, &cancel, tx)
        .await
        .map_err(Error::from)?;
    Ok(outcome)
}
