//! Shared fakes for exercising the intake pipeline without a live gateway.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serenity::all::{ChannelId, GuildId, RoleId, UserId};
use serenity::async_trait;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::model::ApplicationLog;
use crate::service::outbound::Outbound;

/// In-memory [`Outbound`] that records every requested effect and can be
/// told to fail any of them. DM sends are additionally forwarded on a
/// channel so tests can await the next prompt instead of polling.
pub struct FakeOutbound {
    dms: Mutex<Vec<(UserId, String)>>,
    logs: Mutex<Vec<(ChannelId, ApplicationLog)>>,
    grants: Mutex<Vec<(GuildId, UserId, RoleId)>>,
    dm_failure: AtomicBool,
    publish_failure: AtomicBool,
    grant_failure: AtomicBool,
    dm_tx: mpsc::UnboundedSender<(UserId, String)>,
}

impl FakeOutbound {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(UserId, String)>) {
        let (dm_tx, dm_rx) = mpsc::unbounded_channel();
        let fake = Arc::new(Self {
            dms: Mutex::new(Vec::new()),
            logs: Mutex::new(Vec::new()),
            grants: Mutex::new(Vec::new()),
            dm_failure: AtomicBool::new(false),
            publish_failure: AtomicBool::new(false),
            grant_failure: AtomicBool::new(false),
            dm_tx,
        });
        (fake, dm_rx)
    }

    pub fn fail_dms(&self) {
        self.dm_failure.store(true, Ordering::SeqCst);
    }

    pub fn restore_dms(&self) {
        self.dm_failure.store(false, Ordering::SeqCst);
    }

    pub fn fail_publish(&self) {
        self.publish_failure.store(true, Ordering::SeqCst);
    }

    pub fn fail_grants(&self) {
        self.grant_failure.store(true, Ordering::SeqCst);
    }

    pub fn dms(&self) -> Vec<(UserId, String)> {
        self.dms.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn logs(&self) -> Vec<(ChannelId, ApplicationLog)> {
        self.logs.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn grants(&self) -> Vec<(GuildId, UserId, RoleId)> {
        self.grants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Outbound for FakeOutbound {
    async fn send_dm(&self, user_id: UserId, text: &str) -> Result<(), AppError> {
        if self.dm_failure.load(Ordering::SeqCst) {
            return Err(AppError::InternalError("DMs are closed".to_string()));
        }
        self.dms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((user_id, text.to_string()));
        let _ = self.dm_tx.send((user_id, text.to_string()));

        Ok(())
    }

    async fn publish_log(
        &self,
        channel_id: ChannelId,
        record: &ApplicationLog,
    ) -> Result<(), AppError> {
        if self.publish_failure.load(Ordering::SeqCst) {
            return Err(AppError::InternalError("log channel unavailable".to_string()));
        }
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((channel_id, record.clone()));

        Ok(())
    }

    async fn grant_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), AppError> {
        if self.grant_failure.load(Ordering::SeqCst) {
            return Err(AppError::InternalError("missing permissions".to_string()));
        }
        self.grants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((guild_id, user_id, role_id));

        Ok(())
    }
}
