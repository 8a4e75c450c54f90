//! Configuration types for schema providers.
//!
//! # Security
//! These configuration structs intentionally do NOT store passwords or
//! credentials. Credentials travel inside the connection string and are
//! consumed by the provider constructors.

mod connection;

pub use connection::ConnectionConfig;
