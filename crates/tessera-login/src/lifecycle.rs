//! Login flow state machine.
//!
//! The service keeps no session state between requests. Each operation
//! walks a [`LoginFlow`] through the states it covers so that an
//! out-of-order step fails loudly instead of issuing a token.
//!
//! # State Machine
//!
//! ```text
//!     ┌─────────────────┐
//!     │ Unauthenticated │
//!     └────────┬────────┘
//!              │ (begin_login)
//!              ▼
//!  ┌──────────────────────────┐
//!  │ AwaitingProviderCallback │
//!  └────────────┬─────────────┘
//!               │ (provider callback, identity resolved)
//!               ▼
//!     ┌──────────────────┐
//!     │ IdentityResolved │
//!     └────────┬─────────┘
//!              │ (refresh token issued)
//!              ▼
//!    ┌────────────────────┐        ┌──────────────────┐
//!    │ SessionEstablished │───────▶│ AccessTokenIssued│◄──┐
//!    └─────────┬──────────┘        └───┬──────────┬───┘   │
//!              │                       │          └───────┘
//!              │ (logout)              │ (logout)
//!              ▼                       ▼
//!            ┌─────────────────────────────┐
//!            │          LoggedOut          │
//!            └─────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{LoginError, Result};

/// A step of the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginState {
    /// No session.
    Unauthenticated,
    /// The user was sent to the provider.
    AwaitingProviderCallback,
    /// The provider identity was mapped to a local user.
    IdentityResolved,
    /// A refresh token was issued.
    SessionEstablished,
    /// An access token was minted from the refresh token.
    AccessTokenIssued,
    /// The session cookie was cleared.
    LoggedOut,
}

/// Check if a transition is valid according to the state machine.
#[must_use]
pub const fn is_valid_transition(from: LoginState, to: LoginState) -> bool {
    use LoginState::{
        AccessTokenIssued, AwaitingProviderCallback, IdentityResolved, LoggedOut,
        SessionEstablished, Unauthenticated,
    };

    matches!(
        (from, to),
        (Unauthenticated, AwaitingProviderCallback)
            | (AwaitingProviderCallback, IdentityResolved)
            | (IdentityResolved, SessionEstablished)
            // Access tokens can be minted repeatedly
            | (SessionEstablished | AccessTokenIssued, AccessTokenIssued | LoggedOut)
    )
}

/// Validates a transition and returns the target state if valid.
///
/// # Errors
///
/// Returns `LoginError::InvalidTransition` if the transition is not allowed.
pub fn validate_transition(from: LoginState, to: LoginState) -> Result<LoginState> {
    if is_valid_transition(from, to) {
        Ok(to)
    } else {
        Err(LoginError::InvalidTransition { from, to })
    }
}

/// Returns true if no transition leaves this state.
#[must_use]
pub const fn is_terminal(state: LoginState) -> bool {
    matches!(state, LoginState::LoggedOut)
}

/// The state of one in-flight login operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginFlow {
    state: LoginState,
}

impl LoginFlow {
    /// A flow for a visitor without a session.
    #[must_use]
    pub const fn start() -> Self {
        Self {
            state: LoginState::Unauthenticated,
        }
    }

    /// A flow resumed from a state implied by the request, such as a
    /// provider callback or a presented refresh token.
    #[must_use]
    pub const fn resume(state: LoginState) -> Self {
        Self { state }
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> LoginState {
        self.state
    }

    /// Move to the next state.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::InvalidTransition` if the move is not allowed.
    pub fn advance(&mut self, to: LoginState) -> Result<()> {
        self.state = validate_transition(self.state, to)?;
        tracing::trace!(state = ?self.state, "Login flow advanced");
        Ok(())
    }
}
