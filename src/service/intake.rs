//! Session admission and the per-user question/answer state machine.
//!
//! One application session exists per applicant at a time. Admission checks
//! the guild config and panel gate, delivers the welcome message, and only
//! then constructs a session; the session then walks its question cursor
//! forward one [`MessageWaiter`] call at a time until completion or a
//! timeout abandons it. Many sessions run concurrently as independent
//! tasks; the only state they share is read-only.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serenity::all::{GuildId, UserId};

use crate::data::QuestionSet;
use crate::error::intake::IntakeError;
use crate::model::{ApplicationLog, GuildConfig};
use crate::service::outbound::Outbound;
use crate::service::waiter::{MessageWaiter, ReplyRouter, WaitError, WaitOutcome};
use crate::state::AppState;

/// Per-question answer deadline for the DM exchange.
pub const ANSWER_TIMEOUT: Duration = Duration::from_secs(60);

const WELCOME_MESSAGE: &str = "Welcome to the application process! Let's get started.";
const COMPLETION_MESSAGE: &str = "Your application has been submitted. Thank you!";
const PUBLISH_FAILED_NOTICE: &str =
    "Your application was received, but it could not be delivered to the review team. \
     Please contact a moderator.";
const GRANT_FAILED_NOTICE: &str =
    " Your role could not be assigned automatically and may be delayed.";

/// Registry of users with a live application session.
///
/// Enforces the single-live-session-per-user invariant: the second button
/// press while a session is running is rejected instead of silently
/// starting a competing exchange.
#[derive(Default)]
pub struct ActiveSessions {
    users: Mutex<HashSet<UserId>>,
}

impl ActiveSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, user_id: UserId) -> bool {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&user_id)
    }

    fn try_claim(self: &Arc<Self>, user_id: UserId) -> Option<SessionClaim> {
        let inserted = self
            .users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id);
        inserted.then(|| SessionClaim {
            registry: Arc::clone(self),
            user_id,
        })
    }
}

/// Releases the user's session slot when the session ends, on every path.
struct SessionClaim {
    registry: Arc<ActiveSessions>,
    user_id: UserId,
}

impl Drop for SessionClaim {
    fn drop(&mut self) {
        self.registry
            .users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.user_id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    AwaitingAnswer(usize),
    Completing,
    Done,
    Abandoned,
}

/// How a session ended. Partial completion stays visible: a session that
/// finished its exchange reaches `Completed` even when publication or the
/// role grant failed, and the flags say which.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed { published: bool, role_granted: bool },
    Abandoned,
}

/// One applicant's in-progress question/answer exchange.
pub struct ApplicationSession<O: Outbound> {
    user_id: UserId,
    guild_id: GuildId,
    config: GuildConfig,
    questions: Arc<QuestionSet>,
    router: Arc<ReplyRouter>,
    outbound: Arc<O>,
    answer_timeout: Duration,
    state: SessionState,
    answers: Vec<(String, String)>,
    started_at: DateTime<Utc>,
    _claim: SessionClaim,
}

/// Admits a new application session for `user_id` in `guild_id`.
///
/// Requires a guild config, an open panel gate, and no other live session
/// for the user. The welcome message is delivered before a session object
/// exists, so a delivery failure retains nothing to clean up.
pub async fn begin<O: Outbound>(
    state: &AppState,
    outbound: Arc<O>,
    guild_id: GuildId,
    user_id: UserId,
) -> Result<ApplicationSession<O>, IntakeError> {
    let Some(config) = state.configs.get(guild_id) else {
        return Err(IntakeError::ConfigMissing(guild_id));
    };
    if state.gate.status(guild_id).is_closed() {
        return Err(IntakeError::PanelClosed(guild_id));
    }
    let claim = state
        .sessions
        .try_claim(user_id)
        .ok_or(IntakeError::SessionInProgress(user_id))?;

    if outbound.send_dm(user_id, WELCOME_MESSAGE).await.is_err() {
        return Err(IntakeError::DeliveryFailed(user_id));
    }

    tracing::info!(
        "Started application session for user {} in guild {}",
        user_id,
        guild_id
    );

    Ok(ApplicationSession {
        user_id,
        guild_id,
        config,
        questions: Arc::clone(&state.questions),
        router: Arc::clone(&state.router),
        outbound,
        answer_timeout: state.answer_timeout,
        state: SessionState::AwaitingAnswer(0),
        answers: Vec::with_capacity(state.questions.len()),
        started_at: Utc::now(),
        _claim: claim,
    })
}

impl<O: Outbound> ApplicationSession<O> {
    /// Drives the state machine to a terminal state.
    ///
    /// Questions are asked strictly in sequence and answers recorded in ask
    /// order; an answered index is never revisited. Errors are fatal only
    /// for delivery failures; a timeout resolves to `Abandoned`.
    pub async fn run(mut self) -> Result<SessionOutcome, IntakeError> {
        let mut published = false;
        let mut role_granted = false;

        loop {
            self.state = match self.state {
                SessionState::AwaitingAnswer(index) => self.await_answer(index).await?,
                SessionState::Completing => {
                    (published, role_granted) = self.complete().await;
                    SessionState::Done
                }
                SessionState::Done | SessionState::Abandoned => break,
            };
        }

        if self.state == SessionState::Abandoned {
            return Ok(SessionOutcome::Abandoned);
        }

        tracing::info!(
            "Application session for user {} in guild {} completed after {}s",
            self.user_id,
            self.guild_id,
            (Utc::now() - self.started_at).num_seconds()
        );

        Ok(SessionOutcome::Completed {
            published,
            role_granted,
        })
    }

    /// Asks question `index` and records the reply, or abandons on timeout.
    async fn await_answer(&mut self, index: usize) -> Result<SessionState, IntakeError> {
        let Some(question) = self.questions.get(index) else {
            return Ok(SessionState::Completing);
        };

        let waiter = MessageWaiter::new(&self.router, self.outbound.as_ref());
        match waiter.ask(self.user_id, question, self.answer_timeout).await {
            Ok(WaitOutcome::Answered(reply)) => {
                self.answers.push((question.to_string(), reply));
                Ok(SessionState::AwaitingAnswer(index + 1))
            }
            Ok(WaitOutcome::TimedOut) => {
                let timeout = IntakeError::AnswerTimeout(self.user_id);
                tracing::warn!("{}; abandoning session", timeout);
                if self
                    .outbound
                    .send_dm(self.user_id, timeout.user_message())
                    .await
                    .is_err()
                {
                    tracing::warn!(
                        "Could not deliver the timeout notice to user {}",
                        self.user_id
                    );
                }
                Ok(SessionState::Abandoned)
            }
            Err(WaitError::DeliveryFailed(user_id)) => Err(IntakeError::DeliveryFailed(user_id)),
            Err(WaitError::AlreadyPending(user_id)) => Err(IntakeError::WaitConflict(user_id)),
        }
    }

    /// Publishes the log record and requests the role grant.
    ///
    /// The two effects are attempted independently; each failure is logged
    /// and surfaced to the applicant as a soft warning in the completion
    /// notice rather than failing the session.
    async fn complete(&mut self) -> (bool, bool) {
        let record = ApplicationLog::new(std::mem::take(&mut self.answers));

        let published = match self
            .outbound
            .publish_log(self.config.log_channel_id, &record)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    "Failed to publish application log for guild {}: {}",
                    self.guild_id,
                    e
                );
                false
            }
        };

        let role_granted = match self
            .outbound
            .grant_role(self.guild_id, self.user_id, self.config.role_id)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    "Failed to grant role {} to user {} in guild {}: {}",
                    self.config.role_id,
                    self.user_id,
                    self.guild_id,
                    e
                );
                false
            }
        };

        let mut notice = if published {
            COMPLETION_MESSAGE.to_string()
        } else {
            PUBLISH_FAILED_NOTICE.to_string()
        };
        if !role_granted {
            notice.push_str(GRANT_FAILED_NOTICE);
        }
        if self.outbound.send_dm(self.user_id, &notice).await.is_err() {
            tracing::warn!(
                "Could not deliver the completion notice to user {}",
                self.user_id
            );
        }

        (published, role_granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GuildConfigStore, PanelStore};
    use crate::model::PanelStatus;
    use crate::service::test_support::FakeOutbound;
    use serenity::all::{ChannelId, RoleId};
    use tempfile::TempDir;

    const GUILD: GuildId = GuildId::new(1);
    const USER: UserId = UserId::new(42);
    const LOG_CHANNEL: ChannelId = ChannelId::new(100);
    const ROLE: RoleId = RoleId::new(300);

    async fn test_state(temp_dir: &TempDir, prompts: &[&str], configured: bool) -> AppState {
        let configs = GuildConfigStore::load(temp_dir.path().join("config.json"))
            .await
            .unwrap();
        if configured {
            configs
                .upsert(
                    GUILD,
                    GuildConfig {
                        log_channel_id: LOG_CHANNEL,
                        role_id: ROLE,
                    },
                )
                .await
                .unwrap();
        }
        let panels = PanelStore::load(temp_dir.path().join("embed.json"))
            .await
            .unwrap();

        AppState::new(
            Arc::new(configs),
            Arc::new(panels),
            Arc::new(QuestionSet::from_prompts(prompts)),
            Duration::from_secs(60),
        )
    }

    async fn answer(state: &AppState, text: &str) {
        while !state.router.resolve(USER, text.to_string()) {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn completes_session_and_records_answers_in_ask_order() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir, &["Why do you want to join?", "Experience?"], true).await;
        let (outbound, mut dm_rx) = FakeOutbound::new();

        let session = begin(&state, Arc::clone(&outbound), GUILD, USER).await.unwrap();
        assert!(state.sessions.is_active(USER));
        let running = tokio::spawn(session.run());

        let (_, welcome) = dm_rx.recv().await.unwrap();
        assert_eq!(welcome, WELCOME_MESSAGE);

        let (_, question) = dm_rx.recv().await.unwrap();
        assert_eq!(question, "Why do you want to join?");
        answer(&state, "Because").await;

        let (_, question) = dm_rx.recv().await.unwrap();
        assert_eq!(question, "Experience?");
        answer(&state, "5 years").await;

        let (_, notice) = dm_rx.recv().await.unwrap();
        assert_eq!(notice, COMPLETION_MESSAGE);

        let outcome = running.await.unwrap().unwrap();
        assert_eq!(
            outcome,
            SessionOutcome::Completed {
                published: true,
                role_granted: true
            }
        );

        let logs = outbound.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].0, LOG_CHANNEL);
        assert_eq!(
            logs[0].1.fields,
            vec![
                ("Why do you want to join?".to_string(), "Because".to_string()),
                ("Experience?".to_string(), "5 years".to_string()),
            ]
        );
        assert_eq!(outbound.grants(), vec![(GUILD, USER, ROLE)]);
        assert!(!state.sessions.is_active(USER));
    }

    #[tokio::test(start_paused = true)]
    async fn abandons_session_on_answer_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir, &["Why do you want to join?"], true).await;
        let (outbound, mut dm_rx) = FakeOutbound::new();

        let session = begin(&state, Arc::clone(&outbound), GUILD, USER).await.unwrap();
        let running = tokio::spawn(session.run());

        let (_, welcome) = dm_rx.recv().await.unwrap();
        assert_eq!(welcome, WELCOME_MESSAGE);
        let _ = dm_rx.recv().await.unwrap();

        // No reply arrives; paused time advances past the deadline.
        let (_, notice) = dm_rx.recv().await.unwrap();
        assert_eq!(
            notice,
            IntakeError::AnswerTimeout(USER).user_message()
        );

        let outcome = running.await.unwrap().unwrap();
        assert_eq!(outcome, SessionOutcome::Abandoned);
        assert!(outbound.logs().is_empty());
        assert!(outbound.grants().is_empty());
        assert!(!state.sessions.is_active(USER));
    }

    #[tokio::test]
    async fn closed_gate_rejects_new_starts() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir, &["Why do you want to join?"], true).await;
        let (outbound, _dm_rx) = FakeOutbound::new();

        state.gate.set_status(GUILD, PanelStatus::Closed);

        let result = begin(&state, Arc::clone(&outbound), GUILD, USER).await;
        assert!(matches!(result, Err(IntakeError::PanelClosed(GUILD))));
        assert!(outbound.dms().is_empty());
        assert!(!state.sessions.is_active(USER));
    }

    #[tokio::test]
    async fn unconfigured_guild_rejects_new_starts() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir, &["Why do you want to join?"], false).await;
        let (outbound, _dm_rx) = FakeOutbound::new();

        let result = begin(&state, outbound, GUILD, USER).await;
        assert!(matches!(result, Err(IntakeError::ConfigMissing(GUILD))));
    }

    #[tokio::test]
    async fn second_start_is_rejected_while_session_lives() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir, &["Why do you want to join?"], true).await;
        let (outbound, _dm_rx) = FakeOutbound::new();

        let session = begin(&state, Arc::clone(&outbound), GUILD, USER).await.unwrap();

        let second = begin(&state, Arc::clone(&outbound), GUILD, USER).await;
        assert!(matches!(second, Err(IntakeError::SessionInProgress(USER))));

        // Dropping the session releases the slot for a fresh start.
        drop(session);
        assert!(begin(&state, outbound, GUILD, USER).await.is_ok());
    }

    #[tokio::test]
    async fn welcome_delivery_failure_retains_no_session() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir, &["Why do you want to join?"], true).await;
        let (outbound, _dm_rx) = FakeOutbound::new();
        outbound.fail_dms();

        let result = begin(&state, Arc::clone(&outbound), GUILD, USER).await;
        assert!(matches!(result, Err(IntakeError::DeliveryFailed(USER))));
        assert!(!state.sessions.is_active(USER));

        outbound.restore_dms();
        assert!(begin(&state, outbound, GUILD, USER).await.is_ok());
    }

    #[tokio::test]
    async fn partial_completion_attempts_both_effects() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir, &["Experience?"], true).await;
        let (outbound, mut dm_rx) = FakeOutbound::new();
        outbound.fail_publish();

        let session = begin(&state, Arc::clone(&outbound), GUILD, USER).await.unwrap();
        let running = tokio::spawn(session.run());

        let _ = dm_rx.recv().await.unwrap();
        let _ = dm_rx.recv().await.unwrap();
        answer(&state, "5 years").await;

        let (_, notice) = dm_rx.recv().await.unwrap();
        assert_eq!(notice, PUBLISH_FAILED_NOTICE);

        let outcome = running.await.unwrap().unwrap();
        assert_eq!(
            outcome,
            SessionOutcome::Completed {
                published: false,
                role_granted: true
            }
        );
        assert!(outbound.logs().is_empty());
        assert_eq!(outbound.grants(), vec![(GUILD, USER, ROLE)]);
    }

    #[tokio::test]
    async fn closing_the_gate_leaves_running_sessions_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir, &["Why do you want to join?", "Experience?"], true).await;
        let (outbound, mut dm_rx) = FakeOutbound::new();

        let session = begin(&state, Arc::clone(&outbound), GUILD, USER).await.unwrap();
        let running = tokio::spawn(session.run());

        let _ = dm_rx.recv().await.unwrap();
        let _ = dm_rx.recv().await.unwrap();

        // Toggled mid-way; only new starts are gated.
        state.gate.set_status(GUILD, PanelStatus::Closed);

        answer(&state, "Because").await;
        let _ = dm_rx.recv().await.unwrap();
        answer(&state, "5 years").await;
        let _ = dm_rx.recv().await.unwrap();

        let outcome = running.await.unwrap().unwrap();
        assert_eq!(
            outcome,
            SessionOutcome::Completed {
                published: true,
                role_granted: true
            }
        );
    }

    #[tokio::test]
    async fn empty_question_set_completes_immediately() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir, &[], true).await;
        let (outbound, _dm_rx) = FakeOutbound::new();

        let session = begin(&state, Arc::clone(&outbound), GUILD, USER).await.unwrap();
        let outcome = session.run().await.unwrap();

        assert_eq!(
            outcome,
            SessionOutcome::Completed {
                published: true,
                role_granted: true
            }
        );
        assert_eq!(outbound.logs().len(), 1);
        assert!(outbound.logs()[0].1.fields.is_empty());
    }
}
