//! Persistent state: configuration file and the saved session.
//!
//! Uses the OS keyring for the session token and TOML for configuration.

use crate::error::StorageError;

pub mod config;
pub mod credentials;

type Result<T> = std::result::Result<T, StorageError>;
