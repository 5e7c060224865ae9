//! Application state shared across event handlers and background jobs.
//!
//! `AppState` holds the stores and registries every handler needs. It is
//! built once at startup and cloned (cheaply, everything is
//! reference-counted) into the bot handler and the resync scheduler. The
//! stores and the gate are the only state shared across sessions, and both
//! are read-mostly: sessions never mutate them.

use std::sync::Arc;
use std::time::Duration;

use crate::data::{GuildConfigStore, PanelStore, QuestionSet};
use crate::service::intake::ActiveSessions;
use crate::service::panel::PanelGate;
use crate::service::waiter::ReplyRouter;

#[derive(Clone)]
pub struct AppState {
    /// Per-guild log channel and role configuration, written by `/setup`.
    pub configs: Arc<GuildConfigStore>,

    /// Per-guild panel records, written by `/setup`, read by the resync job.
    pub panels: Arc<PanelStore>,

    /// The shared, immutable question set.
    pub questions: Arc<QuestionSet>,

    /// Per-guild open/closed admission control.
    pub gate: Arc<PanelGate>,

    /// Pending direct-message waits, fed by the gateway message handler.
    pub router: Arc<ReplyRouter>,

    /// Users with a live application session.
    pub sessions: Arc<ActiveSessions>,

    /// Per-question answer deadline.
    pub answer_timeout: Duration,
}

impl AppState {
    pub fn new(
        configs: Arc<GuildConfigStore>,
        panels: Arc<PanelStore>,
        questions: Arc<QuestionSet>,
        answer_timeout: Duration,
    ) -> Self {
        Self {
            configs,
            panels,
            questions,
            gate: Arc::new(PanelGate::new()),
            router: Arc::new(ReplyRouter::new()),
            sessions: Arc::new(ActiveSessions::new()),
            answer_timeout,
        }
    }
}
