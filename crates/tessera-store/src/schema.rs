//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// User records, keyed by the big-endian `user_id`.
    pub const USERS: &str = "users";

    /// Authentication records, keyed by the encoded `(provider, subject)` pair.
    ///
    /// Key uniqueness in this family is what enforces one record per identity.
    pub const AUTHENTICATIONS: &str = "authentications";

    /// Index: authentications by user, keyed by `user_id || identity_key`.
    pub const AUTHENTICATIONS_BY_USER: &str = "authentications_by_user";

    /// Counters and other bookkeeping values.
    pub const META: &str = "meta";
}

/// Keys stored in the [`cf::META`] column family.
pub mod meta {
    /// The next user id to assign, as a big-endian `u64`.
    pub const NEXT_USER_ID: &[u8] = b"next_user_id";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::USERS,
        cf::AUTHENTICATIONS,
        cf::AUTHENTICATIONS_BY_USER,
        cf::META,
    ]
}
