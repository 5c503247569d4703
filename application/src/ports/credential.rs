//! Shared bearer credential
//!
//! [`CredentialSlot`] is the one piece of state shared between the session
//! store (the only writer) and the chat API adapter (a reader). It is passed
//! explicitly to both instead of living in a process-wide default.

use empathy_domain::SessionToken;
use std::sync::{Arc, PoisonError, RwLock};

/// Handle to the credential attached to outgoing requests
///
/// Cloning yields another handle to the same slot. Readers always see the
/// latest value at call time.
#[derive(Clone, Default)]
pub struct CredentialSlot {
    inner: Arc<RwLock<Option<SessionToken>>>,
}

impl CredentialSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token to attach to the next request, if any
    pub fn current(&self) -> Option<SessionToken> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `Authorization` header value for the next request, if any
    pub fn authorization(&self) -> Option<String> {
        self.current().map(|token| token.bearer())
    }

    pub fn is_set(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Only the session store writes the slot.
    pub(crate) fn replace(&self, token: Option<SessionToken>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

impl std::fmt::Debug for CredentialSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSlot")
            .field("set", &self.is_set())
            .finish()
    }
}
