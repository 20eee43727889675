//! User and authentication storage for tessera.
//!
//! This crate provides persistence for local users and the external
//! identities linked to them. Two implementations of [`Store`] are shipped:
//! an embedded [`RocksStore`] and an in-memory [`MemoryStore`].
//!
//! # Architecture
//!
//! The `RocksDB` store uses the following column families:
//!
//! - `users`: User records, keyed by `user_id`
//! - `authentications`: Authentication records, keyed by `(provider, subject)`
//! - `authentications_by_user`: Index for listing authentications by user
//! - `meta`: The user id counter
//!
//! # Example
//!
//! ```no_run
//! use tessera_store::{NewIdentity, RocksStore, Store};
//!
//! let store = RocksStore::open("/tmp/tessera-db").unwrap();
//!
//! let identity = NewIdentity::new("github", "123", Some("a@x.com".to_string()));
//! let (user, auth) = store.create_user_with_authentication(&identity).unwrap();
//! assert_eq!(auth.user_id, user.id);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use rocks::RocksStore;
pub use types::{Authentication, NewIdentity, User};

use tessera_core::UserId;

/// The storage trait defining all database operations.
///
/// Implementations must enforce uniqueness of the `(provider, subject)` pair
/// at the write layer: concurrent creations for the same pair must leave
/// exactly one record behind and report [`StoreError::Duplicate`] to the
/// losers.
pub trait Store: Send + Sync {
    // =========================================================================
    // Authentication Operations
    // =========================================================================

    /// Find the authentication for an external identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_authentication(&self, provider: &str, subject: &str)
        -> Result<Option<Authentication>>;

    /// Create a user and its first authentication in one atomic write.
    ///
    /// The user starts with empty public and private data and no recorded
    /// login.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Duplicate` if the identity is already linked to a
    /// user. Nothing is written in that case.
    fn create_user_with_authentication(
        &self,
        identity: &NewIdentity,
    ) -> Result<(User, Authentication)>;

    /// Update the mutable fields (currently only `email`) of an authentication.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the authentication doesn't exist.
    fn update_authentication(&self, authentication: &Authentication) -> Result<()>;

    // =========================================================================
    // User Operations
    // =========================================================================

    /// Get a user by ID, including its authentications.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// Update a user's documents and last login.
    ///
    /// The `authentications` field is ignored; links are managed through the
    /// authentication operations.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    fn update_user(&self, user: &User) -> Result<()>;
}
