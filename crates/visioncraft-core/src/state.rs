//! Per-invocation progress tracking
//!
//! Each workflow instance owns one `OperationTracker`. Starting an invocation hands out
//! a `Ticket` carrying a monotonically increasing sequence number; a result is only
//! applied when its ticket is still the latest one issued, so a slow response can never
//! overwrite the outcome of a newer invocation. Observers subscribe to a
//! `tokio::sync::watch` channel instead of polling shared flags.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

use crate::error::{ClientError, ErrorKind};

/// User-visible failure: what went wrong, and the message to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ClientError> for Failure {
    fn from(err: &ClientError) -> Self {
        Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum OperationState<T> {
    Idle,
    InFlight,
    Succeeded(T),
    Failed(Failure),
}

impl<T> OperationState<T> {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, OperationState::InFlight)
    }

    pub fn succeeded(&self) -> Option<&T> {
        match self {
            OperationState::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            OperationState::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Proof that an invocation was started; required to publish its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Whether a finished invocation's outcome reached the published state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    Stale,
}

pub struct OperationTracker<T> {
    latest: AtomicU64,
    state: watch::Sender<OperationState<T>>,
}

impl<T> Default for OperationTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OperationTracker<T> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(OperationState::Idle);
        Self {
            latest: AtomicU64::new(0),
            state,
        }
    }

    /// Start a new invocation. Any earlier invocation still in flight becomes stale.
    pub fn begin(&self) -> Ticket {
        let mut seq = 0;
        self.state.send_modify(|state| {
            seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            *state = OperationState::InFlight;
        });
        Ticket { seq }
    }

    pub fn succeed(&self, ticket: Ticket, value: T) -> Applied {
        self.publish(ticket, OperationState::Succeeded(value))
    }

    pub fn fail(&self, ticket: Ticket, err: &ClientError) -> Applied {
        self.publish(ticket, OperationState::Failed(Failure::from(err)))
    }

    /// Return to `Idle`, discarding the current result and invalidating in-flight tickets.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.latest.fetch_add(1, Ordering::SeqCst);
            *state = OperationState::Idle;
        });
    }

    fn publish(&self, ticket: Ticket, next: OperationState<T>) -> Applied {
        let mut next = Some(next);
        let applied = self.state.send_if_modified(|state| {
            if self.latest.load(Ordering::SeqCst) != ticket.seq {
                return false;
            }
            if let Some(next) = next.take() {
                *state = next;
            }
            true
        });

        if applied {
            Applied::Applied
        } else {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.latest.load(Ordering::SeqCst),
                "Discarding stale response"
            );
            Applied::Stale
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<OperationState<T>> {
        self.state.subscribe()
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.borrow().is_in_flight()
    }
}

impl<T: Clone> OperationTracker<T> {
    /// Snapshot of the published state.
    pub fn current(&self) -> OperationState<T> {
        self.state.borrow().clone()
    }
}
