//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};
use tessera_core::UserId;

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf, meta};
use crate::types::{Authentication, NewIdentity, User, UserRecord};
use crate::Store;

/// RocksDB-backed storage implementation.
///
/// Writes that check before they write (user creation, updates of existing
/// records) are serialized through `write_lock`, which gives the
/// `(provider, subject)` uniqueness guarantee across threads.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get_authentication_by_key(&self, identity_key: &[u8]) -> Result<Option<Authentication>> {
        let cf = self.cf(cf::AUTHENTICATIONS)?;

        self.db
            .get_cf(&cf, identity_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn get_user_record(&self, user_id: &UserId) -> Result<Option<UserRecord>> {
        let cf = self.cf(cf::USERS)?;
        let key = keys::user_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_authentications_by_user(&self, user_id: &UserId) -> Result<Vec<Authentication>> {
        let cf_by_user = self.cf(cf::AUTHENTICATIONS_BY_USER)?;
        let prefix = keys::user_prefix(user_id);

        let mut authentications = Vec::new();
        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            // Stop if we're past the prefix
            if !key.starts_with(&prefix) {
                break;
            }

            let Some(identity_key) = keys::extract_identity_key(&key) else {
                continue;
            };
            if let Some(auth) = self.get_authentication_by_key(identity_key)? {
                authentications.push(auth);
            }
        }

        Ok(authentications)
    }

    /// Read the next user id to assign. Ids start at 1.
    fn next_user_id(&self) -> Result<u64> {
        let cf = self.cf(cf::META)?;

        let value = self
            .db
            .get_cf(&cf, meta::NEXT_USER_ID)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match value {
            None => Ok(1),
            Some(bytes) => keys::decode_counter(&bytes).ok_or_else(|| {
                StoreError::Serialization("corrupt user id counter".to_string())
            }),
        }
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Authentication Operations
    // =========================================================================

    fn find_authentication(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<Authentication>> {
        self.get_authentication_by_key(&keys::identity_key(provider, subject))
    }

    fn create_user_with_authentication(
        &self,
        identity: &NewIdentity,
    ) -> Result<(User, Authentication)> {
        let cf_users = self.cf(cf::USERS)?;
        let cf_auths = self.cf(cf::AUTHENTICATIONS)?;
        let cf_by_user = self.cf(cf::AUTHENTICATIONS_BY_USER)?;
        let cf_meta = self.cf(cf::META)?;

        let identity_key = keys::identity_key(&identity.provider, &identity.subject);

        let _guard = self.write_lock.lock();

        if self.get_authentication_by_key(&identity_key)?.is_some() {
            return Err(StoreError::Duplicate {
                provider: identity.provider.clone(),
                subject: identity.subject.clone(),
            });
        }

        let id = self.next_user_id()?;
        let next = id
            .checked_add(1)
            .ok_or_else(|| StoreError::Database("user id space exhausted".to_string()))?;
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

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, keys::user_key(&user_id), Self::serialize(&record)?);
        batch.put_cf(&cf_auths, &identity_key, Self::serialize(&auth)?);
        batch.put_cf(
            &cf_by_user,
            keys::user_identity_key(&user_id, &identity_key),
            [],
        );
        batch.put_cf(&cf_meta, meta::NEXT_USER_ID, next.to_be_bytes());

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(user_id = %user_id, provider = %auth.provider, "Stored new user");

        Ok((record.into_user(vec![auth.clone()]), auth))
    }

    fn update_authentication(&self, authentication: &Authentication) -> Result<()> {
        let cf = self.cf(cf::AUTHENTICATIONS)?;
        let identity_key = keys::identity_key(&authentication.provider, &authentication.subject);

        let _guard = self.write_lock.lock();

        let mut stored = self
            .get_authentication_by_key(&identity_key)?
            .ok_or(StoreError::NotFound)?;
        stored.email.clone_from(&authentication.email);

        self.db
            .put_cf(&cf, identity_key, Self::serialize(&stored)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    // =========================================================================
    // User Operations
    // =========================================================================

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let Some(record) = self.get_user_record(user_id)? else {
            return Ok(None);
        };
        let authentications = self.list_authentications_by_user(user_id)?;
        Ok(Some(record.into_user(authentications)))
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let cf = self.cf(cf::USERS)?;

        let _guard = self.write_lock.lock();

        if self.get_user_record(&user.id)?.is_none() {
            return Err(StoreError::NotFound);
        }

        let record = UserRecord::from(user);
        self.db
            .put_cf(&cf, keys::user_key(&user.id), Self::serialize(&record)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}
