//! Session store.
//!
//! Owns the session token: persists it through a [`KeyValueStore`], keeps
//! the shared [`CredentialSlot`] in sync, and notifies observers whenever
//! the session starts or ends.

use crate::ports::credential::CredentialSlot;
use crate::ports::key_value_store::{KeyValueStore, StoreError};
use empathy_domain::SessionToken;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Storage key the token is persisted under.
pub const TOKEN_KEY: &str = "token";

/// Errors that can occur while reading or writing the session.
#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("Session storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Single source of truth for the authentication token.
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    credential: CredentialSlot,
    observers: watch::Sender<Option<SessionToken>>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, credential: CredentialSlot) -> Self {
        let (observers, _) = watch::channel(credential.current());
        Self {
            store,
            credential,
            observers,
        }
    }

    /// Read a previously persisted token and attach it to future requests.
    ///
    /// A stored value that is not a valid token is removed and treated as
    /// absent.
    pub fn load(&self) -> Result<Option<SessionToken>, SessionStoreError> {
        let token = match self.store.get(TOKEN_KEY)? {
            Some(raw) => match SessionToken::new(raw) {
                Ok(token) => Some(token),
                Err(_) => {
                    warn!("Discarding blank persisted session token");
                    self.store.remove(TOKEN_KEY)?;
                    None
                }
            },
            None => None,
        };

        debug!("Loaded session: signed_in={}", token.is_some());
        self.publish(token.clone());
        Ok(token)
    }

    /// Persist a new token and attach it to future requests.
    pub fn set(&self, token: SessionToken) -> Result<(), SessionStoreError> {
        self.store.set(TOKEN_KEY, token.as_str())?;
        info!("Session started");
        self.publish(Some(token));
        Ok(())
    }

    /// Forget the token and stop attaching credentials.
    ///
    /// The credential is detached even when removing it from storage fails.
    pub fn clear(&self) -> Result<(), SessionStoreError> {
        let removed = self.store.remove(TOKEN_KEY);
        info!("Session cleared");
        self.publish(None);
        removed.map_err(SessionStoreError::from)
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.credential.current()
    }

    pub fn is_signed_in(&self) -> bool {
        self.credential.is_set()
    }

    /// Credential handle to hand to the API adapter.
    pub fn credential(&self) -> &CredentialSlot {
        &self.credential
    }

    /// Watch session changes. The receiver starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionToken>> {
        self.observers.subscribe()
    }

    fn publish(&self, token: Option<SessionToken>) {
        self.credential.replace(token.clone());
        self.observers.send_replace(token);
    }
}
