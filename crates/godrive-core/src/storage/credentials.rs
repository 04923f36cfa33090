//! Session persistence.
//!
//! The session (token and user) is stored as JSON in the OS keyring, one
//! entry per configuration profile.

use super::Result;
use crate::api::models::Session;
use crate::core::session::SessionStorage;
use crate::error::StorageError;
use keyring::Entry;
use std::sync::{Mutex, PoisonError};

const KEYRING_SERVICE: &str = "godrive";

/// Saves the session in the OS keyring under `session-<profile>`.
#[derive(Debug, Clone)]
pub struct KeyringSessionStorage {
    profile_name: String,
}

impl KeyringSessionStorage {
    pub fn new(profile_name: impl Into<String>) -> Self {
        Self {
            profile_name: profile_name.into(),
        }
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(KEYRING_SERVICE, &format!("session-{}", self.profile_name))
            .map_err(|e| StorageError::KeyringError(e.to_string()))
    }
}

impl SessionStorage for KeyringSessionStorage {
    fn load(&self) -> Result<Option<Session>> {
        let payload = match self.entry()?.get_password() {
            Ok(payload) => payload,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => return Err(StorageError::KeyringError(e.to_string())),
        };

        serde_json::from_str(&payload)
            .map(Some)
            .map_err(|e| StorageError::SessionCorrupted {
                message: e.to_string(),
            })
    }

    fn save(&self, session: &Session) -> Result<()> {
        let payload = serde_json::to_string(session).map_err(|e| StorageError::SessionCorrupted {
            message: e.to_string(),
        })?;

        self.entry()?
            .set_password(&payload)
            .map_err(|e| StorageError::KeyringError(e.to_string()))
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(()),
            // nothing saved, which is fine for logout
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::KeyringError(e.to_string())),
        }
    }
}

/// Process-local storage; the session is gone when the process exits.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStorage {
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<Session>> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &Session) -> Result<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
