//! Error types for the application bot.
//!
//! This module provides the application's error hierarchy. `AppError` is the
//! top-level type that wraps infrastructure errors (config, IO, JSON,
//! Discord, scheduler), while `IntakeError` carries the user-facing intake
//! taxonomy with its own reply-text mapping.

pub mod config;
pub mod intake;

use thiserror::Error;

use crate::error::config::ConfigError;

/// Top-level application error type.
///
/// Aggregates all infrastructure error types that can occur in the
/// application. Most variants use `#[from]` for automatic conversion.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error during startup or environment variable loading.
    #[error(transparent)]
    ConfigErr(#[from] ConfigError),

    /// Filesystem error while reading or writing a persisted record file.
    #[error(transparent)]
    IoErr(#[from] std::io::Error),

    /// Serialization error for a persisted record or embed snapshot.
    #[error(transparent)]
    JsonErr(#[from] serde_json::Error),

    /// Discord API error from Serenity.
    ///
    /// Boxed due to large size: serenity::Error would otherwise dominate the
    /// size of every AppError value.
    #[error(transparent)]
    DiscordErr(#[from] Box<serenity::Error>),

    /// Cron scheduler error.
    #[error(transparent)]
    SchedulerErr(#[from] tokio_cron_scheduler::JobSchedulerError),

    /// Internal error with custom message.
    ///
    /// # Fields
    /// - Detailed error message for operator-side logging
    #[error("{0}")]
    InternalError(String),
}

impl From<serenity::Error> for AppError {
    fn from(err: serenity::Error) -> Self {
        AppError::DiscordErr(Box::new(err))
    }
}
