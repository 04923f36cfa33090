//! Local client state: the authenticated session and the last known location.
//!
//! [`ClientStore`] is an explicit context object. Clone it into whatever needs
//! it (the HTTP client, [`ServerState`](crate::core::server_state::ServerState),
//! CLI handlers); every clone sees the same state. Writes are synchronous and
//! visible to all readers as soon as the call returns.

use crate::api::models::{Location, Session, User};
use crate::error::StorageError;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Persistence collaborator for the session.
///
/// Queried once when the store is built with [`ClientStore::with_storage`],
/// written on every session change.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<Session>, StorageError>;
    fn save(&self, session: &Session) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Snapshot of everything the store holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    pub session: Option<Session>,
    pub location: Option<Location>,
}

#[derive(Clone)]
pub struct ClientStore {
    state: Arc<watch::Sender<ClientState>>,
    storage: Option<Arc<dyn SessionStorage>>,
}

impl Default for ClientStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClientStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientStore")
            .field("authenticated", &self.is_authenticated())
            .field("location", &self.location())
            .field("persistent", &self.storage.is_some())
            .finish()
    }
}

impl ClientStore {
    /// Empty, unauthenticated store without persistence.
    pub fn new() -> Self {
        let (state, _) = watch::channel(ClientState::default());
        Self {
            state: Arc::new(state),
            storage: None,
        }
    }

    /// Store backed by `storage`; a previously saved session is restored.
    pub fn with_storage(storage: Arc<dyn SessionStorage>) -> Self {
        let restored = match storage.load() {
            Ok(session) => session,
            Err(e) => {
                log::warn!("Could not restore saved session: {}", e);
                None
            }
        };
        if let Some(session) = &restored {
            log::debug!("Restored session for user {}", session.user.id);
        }

        let (state, _) = watch::channel(ClientState {
            session: restored,
            location: None,
        });
        Self {
            state: Arc::new(state),
            storage: Some(storage),
        }
    }

    pub fn snapshot(&self) -> ClientState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every write.
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state.subscribe()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state
            .borrow()
            .session
            .as_ref()
            .map(|session| session.token.clone())
    }

    pub fn current_user(&self) -> Option<User> {
        self.state
            .borrow()
            .session
            .as_ref()
            .map(|session| session.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().session.is_some()
    }

    /// Replace the session. Any previous session is dropped.
    pub fn set_session(&self, session: Session) {
        self.persist(&session);
        self.state.send_modify(|state| state.session = Some(session));
    }

    /// Refresh the user of the current session. Ignored when logged out.
    pub fn replace_user(&self, user: User) {
        let mut updated = None;
        self.state.send_if_modified(|state| match &mut state.session {
            Some(session) if session.user != user => {
                session.user = user;
                updated = Some(session.clone());
                true
            }
            _ => false,
        });
        if let Some(session) = updated {
            self.persist(&session);
        }
    }

    /// Logout teardown: drop the session and its persisted copy.
    pub fn clear_session(&self) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.clear() {
                log::warn!("Could not clear saved session: {}", e);
            }
        }
        self.state.send_modify(|state| state.session = None);
    }

    pub fn location(&self) -> Option<Location> {
        self.state.borrow().location
    }

    pub fn set_location(&self, location: Location) {
        self.state
            .send_modify(|state| state.location = Some(location));
    }

    fn persist(&self, session: &Session) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save(session) {
                log::warn!("Could not persist session: {}", e);
            }
        }
    }
}
