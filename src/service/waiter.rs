//! Timeout-bound single-reply waits for the direct-message exchange.
//!
//! A session asks a question by sending the prompt and then waiting on a
//! [`ReplyRouter`] slot for its user. The gateway message handler feeds
//! inbound direct messages into [`ReplyRouter::resolve`]; whichever of the
//! reply and the deadline fires first wins, and the loser is discarded with
//! its listener deregistered.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serenity::all::UserId;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::service::outbound::Outbound;

/// How a completed wait resolved. A wait resolves exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Answered(String),
    TimedOut,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The prompt could not be delivered; the wait never started.
    #[error("could not deliver the prompt to user {0}")]
    DeliveryFailed(UserId),

    /// A wait is already registered for this recipient. Sessions hold at
    /// most one outstanding wait, so a second claim indicates a bug.
    #[error("a reply wait is already pending for user {0}")]
    AlreadyPending(UserId),
}

/// Routes inbound direct messages to the wait registered for their author.
///
/// At most one pending wait exists per user. The pending sender is removed
/// from the map before either side resolves, so the losing side of a
/// reply/deadline race has no observable effect, and an expired wait's
/// channel is never reused by a later one.
#[derive(Default)]
pub struct ReplyRouter {
    pending: Mutex<HashMap<UserId, oneshot::Sender<String>>>,
}

impl ReplyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pending wait for `user_id`.
    ///
    /// A slot whose receiver is gone (a cancelled wait) is reclaimed; a
    /// live slot is refused.
    fn claim(&self, user_id: UserId) -> Result<oneshot::Receiver<String>, WaitError> {
        let mut pending = self.lock();
        if let Some(existing) = pending.get(&user_id) {
            if !existing.is_closed() {
                return Err(WaitError::AlreadyPending(user_id));
            }
            pending.remove(&user_id);
        }

        let (tx, rx) = oneshot::channel();
        pending.insert(user_id, tx);
        Ok(rx)
    }

    /// Deregisters the pending wait for `user_id`, returning whether a slot
    /// was still registered.
    fn release(&self, user_id: UserId) -> bool {
        self.lock().remove(&user_id).is_some()
    }

    /// Delivers an inbound reply to the author's pending wait, if any.
    ///
    /// Returns `true` when a wait consumed the reply; a reply with no
    /// registered wait (e.g. arriving after the deadline) is ignored.
    pub fn resolve(&self, user_id: UserId, reply: String) -> bool {
        let Some(tx) = self.lock().remove(&user_id) else {
            return false;
        };
        tx.send(reply).is_ok()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, oneshot::Sender<String>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sends one prompt to one recipient and waits for exactly one reply.
pub struct MessageWaiter<'a, O: Outbound + ?Sized> {
    router: &'a ReplyRouter,
    outbound: &'a O,
}

impl<'a, O: Outbound + ?Sized> MessageWaiter<'a, O> {
    pub fn new(router: &'a ReplyRouter, outbound: &'a O) -> Self {
        Self { router, outbound }
    }

    /// Sends `prompt` to `recipient` and resolves with the first reply or
    /// the deadline, whichever comes first.
    ///
    /// The prompt is sent before the listener is armed; a failed send
    /// reports `DeliveryFailed` without ever starting the timer. On the
    /// deadline the listener is deregistered, and when the reply won the
    /// race right at the wire the reply is honored.
    pub async fn ask(
        &self,
        recipient: UserId,
        prompt: &str,
        timeout: Duration,
    ) -> Result<WaitOutcome, WaitError> {
        if self.outbound.send_dm(recipient, prompt).await.is_err() {
            return Err(WaitError::DeliveryFailed(recipient));
        }

        let mut rx = self.router.claim(recipient)?;

        tokio::select! {
            reply = &mut rx => Ok(match reply {
                Ok(text) => WaitOutcome::Answered(text),
                // The sender vanished without sending; only an evicted
                // stale slot can cause this.
                Err(_) => WaitOutcome::TimedOut,
            }),
            _ = tokio::time::sleep(timeout) => {
                if self.router.release(recipient) {
                    Ok(WaitOutcome::TimedOut)
                } else {
                    match rx.try_recv() {
                        Ok(text) => Ok(WaitOutcome::Answered(text)),
                        Err(_) => Ok(WaitOutcome::TimedOut),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::FakeOutbound;
    use std::sync::Arc;

    const USER: UserId = UserId::new(42);

    #[tokio::test]
    async fn delivers_reply_to_pending_wait() {
        let router = Arc::new(ReplyRouter::new());
        let (outbound, mut dm_rx) = FakeOutbound::new();

        let ask_router = Arc::clone(&router);
        let ask_outbound = Arc::clone(&outbound);
        let wait = tokio::spawn(async move {
            MessageWaiter::new(&ask_router, ask_outbound.as_ref())
                .ask(USER, "Experience?", Duration::from_secs(60))
                .await
        });

        let (recipient, prompt) = dm_rx.recv().await.unwrap();
        assert_eq!(recipient, USER);
        assert_eq!(prompt, "Experience?");

        while !router.resolve(USER, "5 years".to_string()) {
            tokio::task::yield_now().await;
        }

        let outcome = wait.await.unwrap().unwrap();
        assert_eq!(outcome, WaitOutcome::Answered("5 years".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_and_deregisters_listener() {
        let router = Arc::new(ReplyRouter::new());
        let (outbound, mut dm_rx) = FakeOutbound::new();

        let ask_router = Arc::clone(&router);
        let ask_outbound = Arc::clone(&outbound);
        let wait = tokio::spawn(async move {
            MessageWaiter::new(&ask_router, ask_outbound.as_ref())
                .ask(USER, "Experience?", Duration::from_secs(60))
                .await
        });

        let _ = dm_rx.recv().await.unwrap();

        let outcome = wait.await.unwrap().unwrap();
        assert_eq!(outcome, WaitOutcome::TimedOut);

        // A reply arriving after the deadline finds no listener.
        assert!(!router.resolve(USER, "too late".to_string()));
    }

    #[tokio::test]
    async fn failed_send_never_arms_the_listener() {
        let router = ReplyRouter::new();
        let (outbound, _dm_rx) = FakeOutbound::new();
        outbound.fail_dms();

        let result = MessageWaiter::new(&router, outbound.as_ref())
            .ask(USER, "Experience?", Duration::from_secs(60))
            .await;

        assert_eq!(result, Err(WaitError::DeliveryFailed(USER)));
        assert!(!router.resolve(USER, "anything".to_string()));
    }

    #[test]
    fn refuses_second_concurrent_claim() {
        let router = ReplyRouter::new();

        let _rx = router.claim(USER).unwrap();
        assert!(matches!(
            router.claim(USER),
            Err(WaitError::AlreadyPending(USER))
        ));
    }

    #[test]
    fn reclaims_slot_of_a_cancelled_wait() {
        let router = ReplyRouter::new();

        let rx = router.claim(USER).unwrap();
        drop(rx);

        assert!(router.claim(USER).is_ok());
    }

    #[test]
    fn resolves_exactly_once() {
        let router = ReplyRouter::new();

        let mut rx = router.claim(USER).unwrap();
        assert!(router.resolve(USER, "first".to_string()));
        assert!(!router.resolve(USER, "second".to_string()));
        assert!(!router.release(USER));

        assert_eq!(rx.try_recv().unwrap(), "first");
    }
}
