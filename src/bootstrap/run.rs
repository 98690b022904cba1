use anyhow::Context;
use hl_app::App;
use hl_core::config::AppConfig;
use hl_core::record::{Category, RecordDraft};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::wiring::wire_app;

/// Runs the app until Ctrl-C, logging every published view and metric change.
pub async fn run_app(config: AppConfig) -> anyhow::Result<()> {
    let wired = wire_app(&config);
    let app = wired.app;
    let watchers = spawn_watchers(&app);

    match app.metrics.request_authorization().await {
        Ok(status) => info!(?status, "metrics authorization answered"),
        Err(err) => warn!(error = %err, "metrics unavailable"),
    }

    match config.session.owner() {
        Some(owner) => {
            app.records
                .start_records(owner.clone())
                .await
                .with_context(|| format!("Failed to start record sync for {owner}"))?;
            let id = app
                .records
                .add_record(RecordDraft::new("Oatmeal", 250, Category::Breakfast))
                .await
                .context("Failed to add the welcome record")?;
            info!(record_id = %id, "welcome record added");
        }
        None => warn!("no session.owner_id configured, record sync stays off"),
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("shutting down");

    app.records.stop_records().await;
    for watcher in watchers {
        watcher.abort();
    }
    Ok(())
}

fn spawn_watchers(app: &App) -> Vec<JoinHandle<()>> {
    let mut view = app.records.subscribe_view();
    let mut current = app.metrics.subscribe_current();
    let mut weekly = app.metrics.subscribe_weekly();
    let mut state = app.metrics.subscribe_state();
    let mut sync_issues = app.records.subscribe_issues();
    let mut metric_issues = app.metrics.subscribe_issues();
    let metrics = app.metrics.clone();

    vec![
        tokio::spawn(async move {
            while view.changed().await.is_ok() {
                let Some(today) = view.borrow_and_update().clone() else {
                    info!("today view cleared");
                    continue;
                };
                let totals: Vec<String> = today
                    .category_totals
                    .iter()
                    .map(|(category, total)| format!("{category}={total}"))
                    .collect();
                info!(
                    records = today.todays_records.len(),
                    total = today.total(),
                    totals = %totals.join(" "),
                    "today view updated"
                );
            }
        }),
        tokio::spawn(async move {
            while current.changed().await.is_ok() {
                let metrics_now = *current.borrow_and_update();
                info!(
                    steps = metrics_now.count,
                    energy = metrics_now.energy,
                    progress = metrics.energy_progress(),
                    "current metrics"
                );
            }
        }),
        tokio::spawn(async move {
            while weekly.changed().await.is_ok() {
                let series = *weekly.borrow_and_update();
                info!(series = ?series.as_slice(), "weekly steps");
            }
        }),
        tokio::spawn(async move {
            while state.changed().await.is_ok() {
                let state = *state.borrow_and_update();
                info!(?state, "metrics state");
            }
        }),
        tokio::spawn(async move {
            while let Ok(issue) = sync_issues.recv().await {
                warn!(owner = %issue.owner, error = %issue.error, "record sync issue");
            }
        }),
        tokio::spawn(async move {
            while let Ok(issue) = metric_issues.recv().await {
                warn!(kind = ?issue.kind, error = %issue.error, "metric issue");
            }
        }),
    ]
}
