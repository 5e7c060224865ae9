mod bot;
mod config;
mod data;
mod error;
mod model;
mod scheduler;
mod service;
mod startup;
mod state;

use std::sync::Arc;

use tracing::Level;

use crate::config::Config;
use crate::error::AppError;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    let (configs, panels, questions) = startup::load_stores().await?;
    let state = AppState::new(
        Arc::new(configs),
        Arc::new(panels),
        Arc::new(questions),
        service::intake::ANSWER_TIMEOUT,
    );

    tracing::info!("Starting application bot");

    let (client, discord_http) = bot::start::init_bot(&config, state.clone()).await?;

    // Start the panel resync scheduler alongside the gateway connection
    let scheduler_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = scheduler::panel_sync::start_scheduler(scheduler_state, discord_http).await
        {
            tracing::error!("Panel resync scheduler error: {}", e);
        }
    });

    bot::start::start_bot(client).await
}
