//! Single-assignment completion token.
//!
//! A streaming upload reports its outcome exactly once. The token enforces
//! that: it starts `Pending` and allows at most one transition, to either
//! `Completed` or `Failed`. Any later attempt is rejected with
//! [`AlreadySettled`] and must be ignored by the caller.

use std::sync::atomic::{AtomicU8, Ordering};

const PENDING: u8 = 0;
const COMPLETED: u8 = 1;
const FAILED: u8 = 2;

/// Observable state of a [`CompletionToken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    Pending,
    Completed,
    Failed,
}

/// Returned when a token that already left `Pending` is settled again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("completion already settled as {0:?}")]
pub struct AlreadySettled(pub CompletionState);

#[derive(Debug, Default)]
pub struct CompletionToken {
    state: AtomicU8,
}

impl CompletionToken {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(PENDING),
        }
    }

    /// Transition `Pending -> Completed`.
    pub fn complete(&self) -> Result<(), AlreadySettled> {
        self.settle(COMPLETED)
    }

    /// Transition `Pending -> Failed`.
    pub fn fail(&self) -> Result<(), AlreadySettled> {
        self.settle(FAILED)
    }

    pub fn state(&self) -> CompletionState {
        decode(self.state.load(Ordering::Acquire))
    }

    pub fn is_settled(&self) -> bool {
        self.state() != CompletionState::Pending
    }

    fn settle(&self, target: u8) -> Result<(), AlreadySettled> {
        self.state
            .compare_exchange(PENDING, target, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|current| AlreadySettled(decode(current)))
    }
}

fn decode(raw: u8) -> CompletionState {
    match raw {
        COMPLETED => CompletionState::Completed,
        FAILED => CompletionState::Failed,
        _ => CompletionState::Pending,
    }
}
