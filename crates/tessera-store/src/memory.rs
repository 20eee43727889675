//! In-memory storage implementation.
//!
//! Used by tests and by deployments that do not need users to survive a
//! restart.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use parking_lot::RwLock;
use tessera_core::UserId;

use crate::error::{Result, StoreError};
use crate::types::{Authentication, NewIdentity, User, UserRecord};
use crate::Store;

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<UserId, UserRecord>,
    authentications: HashMap<(String, String), Authentication>,
    last_user_id: u64,
}

impl MemoryState {
    fn authentications_of(&self, user_id: UserId) -> Vec<Authentication> {
        self.authentications
            .values()
            .filter(|auth| auth.user_id == user_id)
            .cloned()
            .collect()
    }
}

/// A `Store` kept entirely in process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.state.read().users.len()
    }
}

impl Store for MemoryStore {
    fn find_authentication(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<Authentication>> {
        let state = self.state.read();
        Ok(state
            .authentications
            .get(&(provider.to_string(), subject.to_string()))
            .cloned())
    }

    fn create_user_with_authentication(
        &self,
        identity: &NewIdentity,
    ) -> Result<(User, Authentication)> {
        let mut state = self.state.write();
        let key = (identity.provider.clone(), identity.subject.clone());

        if state.authentications.contains_key(&key) {
            return Err(StoreError::Duplicate {
                provider: identity.provider.clone(),
                subject: identity.subject.clone(),
            });
        }

        let id = state
            .last_user_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Database("user id space exhausted".to_string()))?;
        state.last_user_id = id;

        let user_id = UserId::new(id);
        let now = Utc::now();
        let record = UserRecord::fresh(user_id, now);
        let auth = Authentication {
            provider: identity.provider.clone(),
            subject: identity.subject.clone(),
            email: identity.email.clone(),
            user_id,
            created_at: now,
        };

        state.users.insert(user_id, record.clone());
        state.authentications.insert(key, auth.clone());

        Ok((record.into_user(vec![auth.clone()]), auth))
    }

    fn update_authentication(&self, authentication: &Authentication) -> Result<()> {
        let mut state = self.state.write();
        let stored = state
            .authentications
            .get_mut(&(
                authentication.provider.clone(),
                authentication.subject.clone(),
            ))
            .ok_or(StoreError::NotFound)?;
        stored.email.clone_from(&authentication.email);
        Ok(())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let state = self.state.read();
        Ok(state
            .users
            .get(user_id)
            .cloned()
            .map(|record| record.into_user(state.authentications_of(*user_id))))
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.write();
        let record = state.users.get_mut(&user.id).ok_or(StoreError::NotFound)?;
        *record = UserRecord::from(user);
        Ok(())
    }
}
