// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session channels.
//!
//! A [`ClientSessionChannel`] wraps one secure conversation to one
//! endpoint: it owns the channel state machine, forwards service requests,
//! and pumps Publish requests so subscription notifications stream in
//! continuously. State transitions are observed through a watch stream,
//! not polled and not event handlers.

mod session;

pub use session::ClientSessionChannel;

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// CommunicationState
// =============================================================================

/// Lifecycle state of a channel or subscription.
///
/// `Created` is initial. `Closed` and `Faulted` are terminal for a channel
/// instance; reconnecting means creating a fresh instance. Subscriptions
/// reuse the same states and loop back to `Opening` on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationState {
    /// Constructed, not yet opened.
    #[default]
    Created,

    /// Opening is in progress.
    Opening,

    /// Open and usable.
    Opened,

    /// Teardown has begun.
    Closing,

    /// Fully closed.
    Closed,

    /// Failed; no further requests are possible on this instance.
    Faulted,
}

impl CommunicationState {
    /// Returns `true` if requests can be sent in this state.
    #[inline]
    pub const fn is_opened(&self) -> bool {
        matches!(self, Self::Opened)
    }

    /// Returns `true` for the terminal states of a channel instance.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Faulted)
    }

    /// Returns `true` once teardown has begun or completed.
    #[inline]
    pub const fn is_closing_or_closed(&self) -> bool {
        matches!(self, Self::Closing | Self::Closed | Self::Faulted)
    }
}

impl fmt::Display for CommunicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Opening => write!(f, "Opening"),
            Self::Opened => write!(f, "Opened"),
            Self::Closing => write!(f, "Closing"),
            Self::Closed => write!(f, "Closed"),
            Self::Faulted => write!(f, "Faulted"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(CommunicationState::Opened.is_opened());
        assert!(!CommunicationState::Opening.is_opened());

        assert!(CommunicationState::Closed.is_terminal());
        assert!(CommunicationState::Faulted.is_terminal());
        assert!(!CommunicationState::Closing.is_terminal());

        assert!(CommunicationState::Closing.is_closing_or_closed());
        assert!(!CommunicationState::Opened.is_closing_or_closed());
    }

    #[test]
    fn test_initial_state() {
        assert_eq!(CommunicationState::default(), CommunicationState::Created);
    }
}
