//! reqwest implementation of the chat API port

use crate::http::error::{HttpSetupError, classify_status, transport_error};
use crate::http::protocol::{ChatRequest, ConversationBody, SignupRequest, error_detail};
use async_trait::async_trait;
use empathy_application::{ApiError, ChatApi, ChatReply, CredentialSlot, LoginResponse};
use empathy_domain::{
    ChatInput, ConversationId, Credentials, HistoryEntry, Message, SignupForm, User,
};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Chat API client over HTTP
///
/// The bearer credential is read from the shared [`CredentialSlot`] when
/// each request is built, so a sign-in or sign-out takes effect on the very
/// next call.
pub struct HttpChatApi {
    client: Client,
    base_url: Url,
    credential: CredentialSlot,
}

impl HttpChatApi {
    /// Create a client with the default timeout
    pub fn new(base_url: &str, credential: CredentialSlot) -> Result<Self, HttpSetupError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT, credential)
    }

    pub fn with_timeout(
        base_url: &str,
        timeout: Duration,
        credential: CredentialSlot,
    ) -> Result<Self, HttpSetupError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("empathy-chat/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            credential,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Attach the session credential, if one is set right now.
    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.credential.authorization() {
            Some(value) => builder.header(AUTHORIZATION, value),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        debug!("{} -> {} ({} bytes)", operation, status.as_u16(), body.len());

        if !status.is_success() {
            return Err(classify_status(status, error_detail(&body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("{} response: {}", operation, e)))
    }
}

fn parse_base_url(raw: &str) -> Result<Url, HttpSetupError> {
    let url = Url::parse(raw).map_err(|e| HttpSetupError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(HttpSetupError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "expected an http(s) URL".to_string(),
        });
    }
    Ok(url)
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let request = self.client.post(self.endpoint(&["token"])).form(&[
            ("username", credentials.username()),
            ("password", credentials.password()),
        ]);
        self.execute("login", request).await
    }

    async fn signup(&self, form: &SignupForm) -> Result<User, ApiError> {
        let request = self
            .client
            .post(self.endpoint(&["users", "signup"]))
            .json(&SignupRequest {
                name: form.name(),
                username: form.username(),
                password: form.password(),
            });
        self.execute("signup", request).await
    }

    async fn fetch_current_user(&self) -> Result<User, ApiError> {
        let request = self.authorized(self.client.get(self.endpoint(&["users", "me"])));
        self.execute("fetch_current_user", request).await
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let request = self.authorized(self.client.get(self.endpoint(&["history"])));
        self.execute("fetch_history", request).await
    }

    async fn fetch_conversation(&self, id: &ConversationId) -> Result<Vec<Message>, ApiError> {
        let request = self.authorized(
            self.client
                .get(self.endpoint(&["history", id.as_str()])),
        );
        let body: ConversationBody = self.execute("fetch_conversation", request).await?;
        Ok(body.messages)
    }

    async fn send_message(
        &self,
        input: &ChatInput,
        conversation_id: Option<&ConversationId>,
    ) -> Result<ChatReply, ApiError> {
        let request = self.authorized(self.client.post(self.endpoint(&["chat"])).json(
            &ChatRequest {
                user_message: input.content(),
                conversation_id: conversation_id.map(ConversationId::as_str),
            },
        ));
        self.execute("send_message", request).await
    }
}
