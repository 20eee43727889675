//! Domain types stored in the database.
//!
//! These types represent the persisted state of local users and the external
//! identities linked to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_core::{UserData, UserId};

/// A local user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Storage-assigned identifier.
    pub id: UserId,
    /// Document embedded verbatim in access tokens.
    pub public_data: UserData,
    /// Document that never leaves storage.
    pub private_data: UserData,
    /// Last successful login. The Unix epoch means "never".
    pub last_login: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Linked external identities, oldest first.
    #[serde(default)]
    pub authentications: Vec<Authentication>,
}

impl User {
    /// Returns true if a login has been recorded for this user.
    #[must_use]
    pub fn has_logged_in(&self) -> bool {
        self.last_login > DateTime::<Utc>::UNIX_EPOCH
    }

    /// The first email found among the linked authentications.
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.authentications
            .iter()
            .find_map(|auth| auth.email.as_deref().filter(|email| !email.is_empty()))
    }
}

/// An external identity linked to a local user.
///
/// The `(provider, subject)` pair is unique across all records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
    /// Name of the identity provider that issued the subject.
    pub provider: String,
    /// Provider-scoped stable identifier.
    pub subject: String,
    /// Email reported by the provider, if any.
    pub email: Option<String>,
    /// The user owning this authentication.
    pub user_id: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// An external identity that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    /// Name of the identity provider.
    pub provider: String,
    /// Provider-scoped stable identifier.
    pub subject: String,
    /// Email reported by the provider, if any.
    pub email: Option<String>,
}

impl NewIdentity {
    /// Create a new identity tuple.
    #[must_use]
    pub fn new(
        provider: impl Into<String>,
        subject: impl Into<String>,
        email: Option<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            subject: subject.into(),
            email,
        }
    }
}

/// The persisted form of a user, without the authentication relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UserRecord {
    pub id: UserId,
    pub public_data: UserData,
    pub private_data: UserData,
    pub last_login: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// A fresh record with empty documents and no recorded login.
    pub fn fresh(id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            public_data: UserData::new(),
            private_data: UserData::new(),
            last_login: DateTime::<Utc>::UNIX_EPOCH,
            created_at: now,
        }
    }

    /// Attach authentications, sorted oldest first.
    pub fn into_user(self, mut authentications: Vec<Authentication>) -> User {
        authentications.sort_by_key(|auth| auth.created_at);
        User {
            id: self.id,
            public_data: self.public_data,
            private_data: self.private_data,
            last_login: self.last_login,
            created_at: self.created_at,
            authentications,
        }
    }
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            public_data: user.public_data.clone(),
            private_data: user.private_data.clone(),
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}
