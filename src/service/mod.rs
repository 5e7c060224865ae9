//! Business logic for the application intake pipeline.
//!
//! - **outbound** - the platform-effect seam (DM delivery, log publication,
//!   role grants) and its Discord implementation
//! - **waiter** - the timeout-bound single-reply wait primitive
//! - **intake** - session admission and the per-user question/answer state
//!   machine
//! - **panel** - the panel gate, embed/button rendering, and the idempotent
//!   resync batch

pub mod intake;
pub mod outbound;
pub mod panel;
pub mod waiter;

#[cfg(test)]
pub mod test_support;
