//! Blocking client for the synthesis backend REST API.

mod token_store;

pub mod api;
pub mod auth_events;

pub use token_store::{ApiTokenStore, TokenStoreError};
