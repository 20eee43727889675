//! Core types and utilities for tessera.
//!
//! This crate provides the foundational types shared by the token engine,
//! the identity resolver and the storage layer:
//!
//! - **Identifiers**: the storage-assigned [`UserId`] and its canonical
//!   decimal subject form
//! - **Documents**: [`UserData`], the opaque per-user key/value document
//! - **Error types**: common error definitions shared across crates
//!
//! # Example
//!
//! ```
//! use tessera_core::{UserData, UserId};
//!
//! // The `sub` claim carries the decimal form of the id
//! let user_id: UserId = "42".parse().unwrap();
//! assert_eq!(user_id.to_string(), "42");
//!
//! // Public data can carry an audience override
//! let mut data = UserData::new();
//! data.set("aud", "billing-service");
//! assert_eq!(data.get_str("aud"), Some("billing-service"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod data;
pub mod error;
pub mod ids;

pub use data::UserData;
pub use error::{CoreError, Result};
pub use ids::{IdError, UserId};
