//! Cron jobs for automated tasks.

pub mod panel_sync;
