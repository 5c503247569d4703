//! Authenticate use case.
//!
//! Sequences the account flows around the [`SessionStore`]: sign in (login,
//! store the token, load the profile), resume a persisted session at
//! startup, sign up, and sign out.

use crate::ports::chat_api::{ApiError, ChatApi};
use crate::use_cases::session_store::{SessionStore, SessionStoreError};
use empathy_domain::{Credentials, DomainError, HistoryEntry, SessionToken, SignupForm, User};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Shown when login fails, whatever the server said.
pub const SIGN_IN_FAILED: &str = "Failed to Sign In. Please check your credentials.";
/// Shown when registration fails, whatever the server said.
pub const SIGN_UP_FAILED: &str = "Failed to Sign Up. Please try another email.";
/// Shown when a stored token is rejected.
pub const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";

/// Errors that can occur during authentication flows.
#[derive(Error, Debug)]
pub enum AuthenticateError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] DomainError),

    #[error("Sign in failed: {0}")]
    SignIn(ApiError),

    #[error("Sign up failed: {0}")]
    SignUp(ApiError),

    #[error("Loading profile failed: {0}")]
    Profile(ApiError),

    #[error(transparent)]
    Session(#[from] SessionStoreError),
}

impl AuthenticateError {
    /// Generic text for the user; raw server errors stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AuthenticateError::InvalidInput(e) => e.to_string(),
            AuthenticateError::SignIn(_) => SIGN_IN_FAILED.to_string(),
            AuthenticateError::SignUp(_) => SIGN_UP_FAILED.to_string(),
            AuthenticateError::Profile(e) if e.is_auth() => SESSION_EXPIRED.to_string(),
            AuthenticateError::Profile(_) => {
                "Could not load your profile. Please try again.".to_string()
            }
            AuthenticateError::Session(_) => {
                "Could not access session storage.".to_string()
            }
        }
    }

    /// Whether the session was dropped as part of this failure
    pub fn ended_session(&self) -> bool {
        matches!(self, AuthenticateError::Profile(e) if e.is_auth())
    }
}

/// What a signed-in user sees first: their profile and conversation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user: User,
    pub history: Vec<HistoryEntry>,
}

/// Use case for account and session flows.
#[derive(Clone)]
pub struct AuthenticateUseCase {
    api: Arc<dyn ChatApi>,
    session: Arc<SessionStore>,
}

impl AuthenticateUseCase {
    pub fn new(api: Arc<dyn ChatApi>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Log in, store the token, then load the profile.
    ///
    /// The token is dropped again if the profile cannot be loaded, so a
    /// failed sign-in never leaves a credential behind.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Profile, AuthenticateError> {
        info!("Signing in as {}", credentials.username());

        let response = self
            .api
            .login(credentials)
            .await
            .map_err(|e| {
                warn!("Login failed: {}", e);
                AuthenticateError::SignIn(e)
            })?;

        let token = SessionToken::new(response.access_token).map_err(|_| {
            AuthenticateError::SignIn(ApiError::Decode("empty access_token".to_string()))
        })?;
        self.session.set(token)?;

        match self.load_profile().await {
            Ok(profile) => Ok(profile),
            Err(e) => {
                if self.session.is_signed_in() {
                    if let Err(clear_err) = self.session.clear() {
                        warn!("Failed to drop token after profile error: {}", clear_err);
                    }
                }
                Err(e)
            }
        }
    }

    /// Fetch the current user, then the history list.
    ///
    /// A rejected token ends the session.
    pub async fn load_profile(&self) -> Result<Profile, AuthenticateError> {
        let user = match self.api.fetch_current_user().await {
            Ok(user) => user,
            Err(e) => return Err(self.profile_failure(e)),
        };
        debug!("Loaded profile for {}", user.username);

        let history = match self.api.fetch_history().await {
            Ok(history) => history,
            Err(e) => return Err(self.profile_failure(e)),
        };
        debug!("Loaded {} history entries", history.len());

        Ok(Profile { user, history })
    }

    /// Pick up a persisted session at startup.
    ///
    /// Returns `Ok(None)` when no token was stored.
    pub async fn resume(&self) -> Result<Option<Profile>, AuthenticateError> {
        if self.session.load()?.is_none() {
            return Ok(None);
        }
        info!("Resuming persisted session");
        self.load_profile().await.map(Some)
    }

    /// Register a new account. Returns the username to pre-fill sign-in.
    ///
    /// Registration does not sign the user in.
    pub async fn sign_up(&self, form: &SignupForm) -> Result<String, AuthenticateError> {
        info!("Signing up {}", form.username());
        let user = self.api.signup(form).await.map_err(|e| {
            warn!("Signup failed: {}", e);
            AuthenticateError::SignUp(e)
        })?;
        Ok(if user.username.is_empty() {
            form.username().to_string()
        } else {
            user.username
        })
    }

    pub fn sign_out(&self) -> Result<(), AuthenticateError> {
        self.session.clear()?;
        Ok(())
    }

    fn profile_failure(&self, error: ApiError) -> AuthenticateError {
        warn!("Profile load failed: {}", error);
        if error.is_auth() {
            if let Err(e) = self.session.clear() {
                warn!("Could not clear rejected session: {}", e);
            }
        }
        AuthenticateError::Profile(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::chat_api::{ChatReply, LoginResponse};
    use crate::ports::credential::CredentialSlot;
    use crate::ports::key_value_store::{KeyValueStore, StoreError};
    use crate::use_cases::session_store::TOKEN_KEY;
    use async_trait::async_trait;
    use empathy_domain::{ChatInput, ConversationId, Message};
    use std::collections::HashMap;
    use std::sync::Mutex;

    // ==================== Test Mocks ====================

    #[derive(Default)]
    struct MemoryStore {
        values: Mutex<HashMap<String, String>>,
    }

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }
    }

    /// Records every call together with the credential attached at call time.
    struct RecordingApi {
        credential: CredentialSlot,
        calls: Mutex<Vec<(&'static str, Option<String>)>>,
        login_result: Result<LoginResponse, ApiError>,
        user_result: Result<User, ApiError>,
        signup_result: Result<User, ApiError>,
    }

    impl RecordingApi {
        fn new(credential: CredentialSlot) -> Self {
            Self {
                credential,
                calls: Mutex::new(Vec::new()),
                login_result: Ok(LoginResponse {
                    access_token: "tok-1".to_string(),
                    token_type: "bearer".to_string(),
                }),
                user_result: Ok(User::new("Ann", "a@x.com")),
                signup_result: Ok(User::new("Ann", "a@x.com")),
            }
        }

        fn record(&self, name: &'static str) {
            self.calls
                .lock()
                .unwrap()
                .push((name, self.credential.authorization()));
        }

        fn call_names(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().iter().map(|(n, _)| *n).collect()
        }
    }

    #[async_trait]
    impl ChatApi for RecordingApi {
        async fn login(&self, _credentials: &Credentials) -> Result<LoginResponse, ApiError> {
            self.record("login");
            self.login_result.clone()
        }

        async fn signup(&self, _form: &SignupForm) -> Result<User, ApiError> {
            self.record("signup");
            self.signup_result.clone()
        }

        async fn fetch_current_user(&self) -> Result<User, ApiError> {
            self.record("fetch_current_user");
            self.user_result.clone()
        }

        async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
            self.record("fetch_history");
            Ok(vec![HistoryEntry::new(
                ConversationId::new("c1").unwrap(),
                "First chat",
            )])
        }

        async fn fetch_conversation(
            &self,
            _id: &ConversationId,
        ) -> Result<Vec<Message>, ApiError> {
            self.record("fetch_conversation");
            Ok(vec![])
        }

        async fn send_message(
            &self,
            _input: &ChatInput,
            _conversation_id: Option<&ConversationId>,
        ) -> Result<ChatReply, ApiError> {
            self.record("send_message");
            Err(ApiError::Network("unused".to_string()))
        }
    }

    fn setup(
        configure: impl FnOnce(&mut RecordingApi),
    ) -> (AuthenticateUseCase, Arc<RecordingApi>, Arc<MemoryStore>) {
        let credential = CredentialSlot::new();
        let store = Arc::new(MemoryStore::default());
        let session = Arc::new(SessionStore::new(store.clone(), credential.clone()));
        let mut api = RecordingApi::new(credential);
        configure(&mut api);
        let api = Arc::new(api);
        (
            AuthenticateUseCase::new(api.clone(), session),
            api,
            store,
        )
    }

    fn unauthorized() -> ApiError {
        ApiError::Auth {
            status: 401,
            body: "Could not validate credentials".to_string(),
        }
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_sign_in_stores_token_then_loads_user_and_history_in_order() {
        let (use_case, api, store) = setup(|_| {});
        let credentials = Credentials::new("a@x.com", "pw").unwrap();

        let profile = use_case.sign_in(&credentials).await.unwrap();

        assert_eq!(profile.user.name, "Ann");
        assert_eq!(profile.history.len(), 1);
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("tok-1"));

        let calls = api.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                ("login", None),
                ("fetch_current_user", Some("Bearer tok-1".to_string())),
                ("fetch_history", Some("Bearer tok-1".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_sign_in_failure_keeps_signed_out() {
        let (use_case, api, store) = setup(|api| api.login_result = Err(unauthorized()));
        let credentials = Credentials::new("a@x.com", "wrong").unwrap();

        let err = use_case.sign_in(&credentials).await.unwrap_err();

        assert!(matches!(err, AuthenticateError::SignIn(ApiError::Auth { status: 401, .. })));
        assert_eq!(err.user_message(), SIGN_IN_FAILED);
        assert!(store.get(TOKEN_KEY).unwrap().is_none());
        assert_eq!(api.call_names(), vec!["login"]);
    }

    #[tokio::test]
    async fn test_blank_access_token_is_rejected() {
        let (use_case, _api, store) = setup(|api| {
            api.login_result = Ok(LoginResponse {
                access_token: String::new(),
                token_type: "bearer".to_string(),
            })
        });
        let credentials = Credentials::new("a@x.com", "pw").unwrap();

        let err = use_case.sign_in(&credentials).await.unwrap_err();
        assert!(matches!(err, AuthenticateError::SignIn(ApiError::Decode(_))));
        assert!(store.get(TOKEN_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_profile_outage_after_login_drops_token() {
        let (use_case, api, store) =
            setup(|api| api.user_result = Err(ApiError::Network("down".to_string())));
        let credentials = Credentials::new("a@x.com", "pw").unwrap();

        let err = use_case.sign_in(&credentials).await.unwrap_err();

        assert!(matches!(err, AuthenticateError::Profile(ApiError::Network(_))));
        assert!(!err.ended_session());
        assert!(!use_case.session().is_signed_in());
        assert!(api.credential.authorization().is_none());
        assert!(store.get(TOKEN_KEY).unwrap().is_none());
        // The bearer was attached for the profile fetch, then dropped
        assert_eq!(
            api.calls.lock().unwrap()[1],
            ("fetch_current_user", Some("Bearer tok-1".to_string()))
        );
    }

    #[tokio::test]
    async fn test_resume_without_token_makes_no_calls() {
        let (use_case, api, _store) = setup(|_| {});

        assert!(use_case.resume().await.unwrap().is_none());
        assert!(api.call_names().is_empty());
    }

    #[tokio::test]
    async fn test_resume_with_persisted_token() {
        let (use_case, api, store) = setup(|_| {});
        store.set(TOKEN_KEY, "persisted").unwrap();

        let profile = use_case.resume().await.unwrap().unwrap();

        assert_eq!(profile.user.username, "a@x.com");
        let calls = api.calls.lock().unwrap().clone();
        assert_eq!(calls[0], ("fetch_current_user", Some("Bearer persisted".to_string())));
        assert_eq!(calls[1].0, "fetch_history");
    }

    #[tokio::test]
    async fn test_expired_token_ends_session() {
        let (use_case, api, store) = setup(|api| api.user_result = Err(unauthorized()));
        store.set(TOKEN_KEY, "expired").unwrap();

        let err = use_case.resume().await.unwrap_err();

        assert!(err.ended_session());
        assert_eq!(err.user_message(), SESSION_EXPIRED);
        assert!(!use_case.session().is_signed_in());
        assert!(store.get(TOKEN_KEY).unwrap().is_none());
        // History is never requested once the user fetch failed
        assert_eq!(api.call_names(), vec!["fetch_current_user"]);
    }

    #[tokio::test]
    async fn test_sign_up_returns_username_and_does_not_sign_in() {
        let (use_case, api, store) = setup(|_| {});
        let form = SignupForm::new("Ann", "a@x.com", "pw").unwrap();

        let username = use_case.sign_up(&form).await.unwrap();

        assert_eq!(username, "a@x.com");
        assert!(store.get(TOKEN_KEY).unwrap().is_none());
        assert_eq!(api.call_names(), vec!["signup"]);
    }

    #[tokio::test]
    async fn test_sign_up_conflict_uses_generic_message() {
        let (use_case, _api, _store) = setup(|api| {
            api.signup_result = Err(ApiError::Validation {
                status: 400,
                body: "Username already registered".to_string(),
            })
        });
        let form = SignupForm::new("Ann", "a@x.com", "pw").unwrap();

        let err = use_case.sign_up(&form).await.unwrap_err();
        assert_eq!(err.user_message(), SIGN_UP_FAILED);
        assert!(!err.user_message().contains("already registered"));
    }

    #[tokio::test]
    async fn test_sign_out_detaches_credential() {
        let (use_case, api, _store) = setup(|_| {});
        let credentials = Credentials::new("a@x.com", "pw").unwrap();
        use_case.sign_in(&credentials).await.unwrap();

        use_case.sign_out().unwrap();

        assert!(!use_case.session().is_signed_in());
        assert!(api.credential.authorization().is_none());
    }

    #[tokio::test]
    async fn test_clone_shares_session() {
        let (use_case, _api, store) = setup(|_| {});
        let other = use_case.clone();
        let credentials = Credentials::new("a@x.com", "pw").unwrap();

        other.sign_in(&credentials).await.unwrap();
        assert!(use_case.session().is_signed_in());

        use_case.sign_out().unwrap();
        assert!(!other.session().is_signed_in());
        assert!(store.get(TOKEN_KEY).unwrap().is_none());
    }
}
