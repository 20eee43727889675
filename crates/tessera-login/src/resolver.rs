//! Mapping external identities to local users.
//!
//! The `(provider, subject)` pair is the identity key. Two providers
//! reporting the same email still yield two distinct users.

use std::sync::Arc;

use chrono::Utc;
use tessera_store::{Authentication, NewIdentity, Store, User};

use crate::error::{LoginError, Result};
use crate::types::ResolvedIdentity;

/// Resolves `(provider, subject)` pairs to users, creating them on first sight.
pub struct IdentityResolver<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for IdentityResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> IdentityResolver<S> {
    /// Create a resolver over the given store.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve an identity to its user, creating the user on first sight.
    ///
    /// A changed email reported by the provider is written back to the
    /// authentication. A missing email never erases a stored one.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::StorageUnavailable` if the store fails and
    /// `LoginError::DuplicateAuthenticationRace` if creation lost a race and
    /// the winning record could not be read.
    pub fn resolve(
        &self,
        provider: &str,
        subject: &str,
        email: Option<&str>,
    ) -> Result<ResolvedIdentity> {
        if let Some(auth) = self.store.find_authentication(provider, subject)? {
            return self.load_existing(auth, email);
        }

        let identity = NewIdentity::new(provider, subject, email.map(str::to_string));
        match self.store.create_user_with_authentication(&identity) {
            Ok((user, authentication)) => {
                tracing::info!(user_id = %user.id, provider, "Created user for new identity");
                Ok(ResolvedIdentity {
                    user,
                    authentication,
                    is_new_user: true,
                })
            }
            Err(e) if e.is_duplicate() => {
                tracing::warn!(provider, "Lost identity creation race, retrying lookup");
                match self.store.find_authentication(provider, subject)? {
                    Some(auth) => self.load_existing(auth, email),
                    None => Err(LoginError::DuplicateAuthenticationRace {
                        provider: provider.to_string(),
                        subject: subject.to_string(),
                    }),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stamp the user's last login with the current time.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::StorageUnavailable` if the update fails.
    pub fn record_login(&self, user: &mut User) -> Result<()> {
        user.last_login = Utc::now();
        self.store.update_user(user)?;
        tracing::debug!(user_id = %user.id, "Recorded login");
        Ok(())
    }

    /// Look up the user for an identity without creating or touching anything.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::StorageUnavailable` if the store fails.
    pub fn lookup(&self, provider: &str, subject: &str) -> Result<Option<User>> {
        let Some(auth) = self.store.find_authentication(provider, subject)? else {
            return Ok(None);
        };
        Ok(self.store.get_user(&auth.user_id)?)
    }

    fn load_existing(
        &self,
        mut authentication: Authentication,
        email: Option<&str>,
    ) -> Result<ResolvedIdentity> {
        let refreshed = match email {
            Some(email) if authentication.email.as_deref() != Some(email) => {
                authentication.email = Some(email.to_string());
                self.store.update_authentication(&authentication)?;
                tracing::debug!(user_id = %authentication.user_id, "Refreshed authentication email");
                true
            }
            _ => false,
        };

        let mut user = self
            .store
            .get_user(&authentication.user_id)?
            .ok_or(LoginError::UserNotFound(authentication.user_id))?;

        if refreshed {
            if let Some(linked) = user.authentications.iter_mut().find(|a| {
                a.provider == authentication.provider && a.subject == authentication.subject
            }) {
                linked.email.clone_from(&authentication.email);
            }
        }

        Ok(ResolvedIdentity {
            user,
            authentication,
            is_new_user: false,
        })
    }
}
