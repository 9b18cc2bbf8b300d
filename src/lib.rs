//! Library exports for reuse in the CLI, benchmarks and tests.

/// Application directory resolution.
pub mod app_dirs;
/// TOML configuration with per-field defaults.
pub mod config;
/// Shared dashboard data shapes.
pub mod domain;
/// Blocking REST client, auth events and token persistence.
pub mod gateway;
/// Tracing setup with per-launch log files.
pub mod logging;
/// Local CPU and memory sampling.
pub mod resources;
/// Reactive state store and its persisted record.
pub mod store;
/// Server-sent-events training feed.
pub mod stream;

mod http_client;
