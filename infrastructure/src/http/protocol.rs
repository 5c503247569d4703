//! Wire types for the chat service's JSON API

use empathy_domain::Message;
use serde::{Deserialize, Serialize};

/// `POST /users/signup` body
#[derive(Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub name: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

/// `POST /chat` body. `conversation_id` is sent as `null` for a new
/// conversation.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub user_message: &'a str,
    pub conversation_id: Option<&'a str>,
}

/// `GET /history/{id}` response; other conversation fields are ignored
#[derive(Debug, Deserialize)]
pub struct ConversationBody {
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// FastAPI-style error body
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Longest error text kept from a response body, in characters
pub const MAX_DETAIL_CHARS: usize = 200;

/// Human-readable error text from a response body.
///
/// Uses `detail` when the body is a FastAPI error, the raw text otherwise.
/// Text past [`MAX_DETAIL_CHARS`] is cut off with a trailing `...`.
pub fn error_detail(body: &str) -> String {
    let detail = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    };
    clip(detail)
}

fn clip(text: String) -> String {
    match text.char_indices().nth(MAX_DETAIL_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use empathy_domain::Role;

    #[test]
    fn test_chat_request_serializes_null_id() {
        let request = ChatRequest {
            user_message: "hello",
            conversation_id: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"user_message": "hello", "conversation_id": null})
        );
    }

    #[test]
    fn test_conversation_body_ignores_extra_fields() {
        let body: ConversationBody = serde_json::from_str(
            r#"{"id":"c1","username":"a@x.com","title":"t","timestamp":"2024-01-01T00:00:00",
                "messages":[{"role":"user","content":"hi"},{"role":"ai","content":"hello"}]}"#,
        )
        .unwrap();
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[1].role, Role::Ai);
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(
            error_detail(r#"{"detail":"Incorrect username or password"}"#),
            "Incorrect username or password"
        );
        assert_eq!(error_detail("Internal Server Error\n"), "Internal Server Error");
        assert!(error_detail(r#"{"detail":[{"loc":["body"]}]}"#).contains("loc"));
    }

    #[test]
    fn test_oversized_detail_is_clipped() {
        let body = serde_json::json!({ "detail": "é".repeat(MAX_DETAIL_CHARS + 50) }).to_string();

        let detail = error_detail(&body);

        assert!(detail.ends_with("..."));
        assert_eq!(detail.chars().count(), MAX_DETAIL_CHARS + 3);
        assert!(detail.starts_with("éé"));
    }

    #[test]
    fn test_detail_at_limit_is_kept_whole() {
        let text = "x".repeat(MAX_DETAIL_CHARS);
        assert_eq!(error_detail(&text), text);
    }
}
