use std::sync::Arc;

use serenity::http::Http;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::AppError;
use crate::service::panel;
use crate::state::AppState;

/// Starts the panel resync scheduler.
///
/// Every 30 seconds, re-applies each guild's stored panel snapshot and
/// button state to its persisted message. Each run is independent and
/// idempotent, and per-guild failures are isolated inside
/// [`panel::resync_all`].
///
/// # Arguments
/// - `state`: Shared application state (panel store and gate)
/// - `discord_http`: Discord HTTP client for fetching and editing messages
pub async fn start_scheduler(state: AppState, discord_http: Arc<Http>) -> Result<(), AppError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async("*/30 * * * * *", move |_uuid, _lock| {
        let state = state.clone();
        let http = discord_http.clone();

        Box::pin(async move {
            panel::resync_all(&http, &state.panels, &state.gate).await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!("Panel resync scheduler started");

    Ok(())
}
