//! Orchestration for the CLI commands: fetching snapshots, running probes and
//! keeping a dashboard file current from push notifications.

use crate::Result;
use crate::api::{ApiCallEvent, ApiClient};
use crate::config::ClientConfig;
use crate::dashboard::{Dashboard, Reaction};
use crate::feed::{LogLevel, LogSource};
use crate::form::{ApiTestResult, IdentifyForm};
use crate::push::{PushClient, PushCommand, ReconnectPolicy};
use crate::render;
use anyhow::Context;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Pause between a successful probe and the follow-up snapshot fetch, giving
/// the backend time to commit the merge.
pub const REFRESH_AFTER_IDENTIFY: Duration = Duration::from_millis(500);

/// Build an API client whose identify timings land in the returned channel.
pub fn api_client_with_timings(
    config: &ClientConfig,
) -> Result<(ApiClient, mpsc::UnboundedReceiver<ApiCallEvent>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let client = ApiClient::new(config)?.with_observer(Arc::new(move |event: &ApiCallEvent| {
        let _ = tx.send(event.clone());
    }));
    Ok((client, rx))
}

/// Move queued call timings into the dashboard feed.
pub fn drain_timings(rx: &mut mpsc::UnboundedReceiver<ApiCallEvent>, dashboard: &mut Dashboard) {
    while let Ok(event) = rx.try_recv() {
        dashboard.record_api_call(&event);
    }
}

/// Replace the dashboard snapshot with a fresh fetch. Failures are recorded in
/// the feed, not returned.
pub async fn refresh(api: &ApiClient, dashboard: &mut Dashboard) {
    dashboard.begin_refresh();
    match api.contacts().await {
        Ok(contacts) => {
            info!(count = contacts.len(), "loaded contacts");
            dashboard.contacts_loaded(contacts);
        }
        Err(e) => {
            warn!(error = %e, "failed to fetch contacts");
            dashboard.contacts_failed(&e.to_string());
        }
    }
}

/// Submit the form, record the outcome and refresh the snapshot on success.
pub async fn identify(
    api: &ApiClient,
    dashboard: &mut Dashboard,
    form: &IdentifyForm,
) -> Result<ApiTestResult> {
    let request = form.to_request()?;

    let started = Instant::now();
    let outcome = api.identify(&request).await;
    let result = ApiTestResult::from_outcome(request, outcome, started.elapsed().as_millis() as u64);

    if dashboard.record_api_result(result.clone()) == Reaction::Refresh {
        tokio::time::sleep(REFRESH_AFTER_IDENTIFY).await;
        refresh(api, dashboard).await;
        dashboard.note(
            LogLevel::Info,
            "Refreshed contacts after API call",
            LogSource::Database,
        );
    }
    Ok(result)
}

/// One line per feed entry at `level` (all entries for `None`), oldest first.
pub fn format_logs(dashboard: &Dashboard, level: Option<LogLevel>) -> String {
    let mut out = String::new();
    for entry in dashboard.feed().filtered(level) {
        out.push_str(&format!(
            "{} {:<5} [{}] {}\n",
            entry.timestamp.format("%H:%M:%S%.3f"),
            entry.level,
            entry.source,
            entry.message
        ));
    }
    out
}

pub fn write_dashboard(dashboard: &Dashboard, out: &str) -> Result<()> {
    let html = render::render_html_dashboard(&dashboard.view())?;
    fs::write(out, html).with_context(|| format!("write dashboard {}", out))?;
    Ok(())
}

/// Keep `out` current until Ctrl-C or the push channel gives up.
pub async fn watch(config: &ClientConfig, out: &str) -> Result<()> {
    let (api, mut timings) = api_client_with_timings(config)?;
    let push = PushClient::new(config, ReconnectPolicy::default())?;
    info!(url = %push.endpoint(), out, "watching push channel");

    let (event_tx, mut event_rx) = mpsc::channel(64);
    let (cmd_tx, cmd_rx) = mpsc::channel(4);
    let running = tokio::spawn(push.run(event_tx, cmd_rx));

    let mut dashboard = Dashboard::new();
    refresh(&api, &mut dashboard).await;
    write_dashboard(&dashboard, out)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut closing = false;
    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                if dashboard.handle_push(event) == Reaction::Refresh {
                    refresh(&api, &mut dashboard).await;
                }
                drain_timings(&mut timings, &mut dashboard);
                write_dashboard(&dashboard, out)?;
            }
            _ = &mut ctrl_c, if !closing => {
                info!("interrupted, closing push channel");
                closing = true;
                let _ = cmd_tx.send(PushCommand::Close).await;
            }
        }
    }

    running.await.context("push channel task panicked")??;
    write_dashboard(&dashboard, out)?;
    println!("Wrote {}", out);
    Ok(())
}
