//! Core identifier types for tessera.
//!
//! User IDs are assigned by storage and travel inside tokens as the `sub`
//! claim. The claim always holds the canonical decimal string form, never a
//! JSON number, so parsing is strict.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A storage-assigned user identifier.
///
/// The canonical text form is the decimal representation without sign or
/// leading zeros. That form is what [`UserId::from_subject`] accepts.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(u64);

impl UserId {
    /// Create a new `UserId` from its numeric value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Return the numeric value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Return the big-endian byte encoding, used for ordered storage keys.
    #[must_use]
    pub const fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Decode a `UserId` from its big-endian byte encoding.
    #[must_use]
    pub const fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }

    /// Parse a `UserId` from a token subject.
    ///
    /// # Errors
    ///
    /// Returns `IdError::MalformedSubject` if the subject is empty, contains
    /// anything other than ASCII digits, or has leading zeros. Returns
    /// `IdError::SubjectOutOfRange` if it does not fit in 64 bits.
    pub fn from_subject(subject: &str) -> Result<Self, IdError> {
        if subject.is_empty() || !subject.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::MalformedSubject);
        }
        if subject.len() > 1 && subject.starts_with('0') {
            return Err(IdError::MalformedSubject);
        }

        subject
            .parse::<u64>()
            .map(Self)
            .map_err(|_| IdError::SubjectOutOfRange)
    }

    /// Return the subject form of this id.
    #[must_use]
    pub fn to_subject(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_subject(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_subject(&value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.to_subject()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The subject is not a canonical decimal number.
    #[error("malformed subject: expected a decimal user id")]
    MalformedSubject,

    /// The subject is numeric but does not fit in a user id.
    #[error("subject out of range")]
    SubjectOutOfRange,
}
