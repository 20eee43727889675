//! HTTP request handlers.
//!
//! This module contains all the endpoint handlers for the gateway API.

pub mod auth;
pub mod health;
pub mod tokens;
