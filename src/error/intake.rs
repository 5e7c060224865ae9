use serenity::all::{GuildId, UserId};
use thiserror::Error;

/// Conditions that reject, abandon, or fail an application intake.
///
/// Every variant has a private user-facing reply via [`user_message`];
/// the `Display` form is the operator-facing description used in logs.
///
/// [`user_message`]: IntakeError::user_message
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeError {
    /// No application config exists for the guild; nothing was set up.
    #[error("applications are not configured for guild {0}")]
    ConfigMissing(GuildId),

    /// The guild's panel gate is closed to new applications.
    #[error("application panel is closed for guild {0}")]
    PanelClosed(GuildId),

    /// A direct message to the applicant could not be delivered.
    #[error("could not deliver a direct message to user {0}")]
    DeliveryFailed(UserId),

    /// The applicant did not answer the current question before the deadline.
    #[error("user {0} did not answer within the allowed time")]
    AnswerTimeout(UserId),

    /// The applicant already has a live session; only one is allowed.
    #[error("user {0} already has an application in progress")]
    SessionInProgress(UserId),

    /// A reply wait was already registered for the applicant. The session
    /// layer never issues two concurrent waits, so this indicates a bug.
    #[error("a reply wait is already pending for user {0}")]
    WaitConflict(UserId),
}

impl IntakeError {
    /// Reply text shown to the applicant, always as an ephemeral response or
    /// a direct message, never as public channel noise.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ConfigMissing(_) => "Applications are not set up for this server yet.",
            Self::PanelClosed(_) => "Applications are closed.",
            Self::DeliveryFailed(_) => {
                "I cannot DM you at the moment. Please make sure your DMs are open."
            }
            Self::AnswerTimeout(_) => {
                "You did not respond in time. Please restart your application."
            }
            Self::SessionInProgress(_) => {
                "You already have an application in progress. Check your DMs."
            }
            Self::WaitConflict(_) => "Something went wrong. Please try again later.",
        }
    }
}
