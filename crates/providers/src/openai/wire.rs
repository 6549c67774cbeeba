//! JSON bodies of the `chat/completions` endpoint.

use std::collections::HashMap;

use relay_core::llm::{ChatError, ChatOutcome, ChatResult, Message, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ChatRequestBody<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatResponseBody {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
    #[serde(default)]
    pub usage: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default = "assistant_role")]
    pub role: Role,
    // null when the model answered with tool calls only
    #[serde(default)]
    pub content: Option<String>,
}

fn assistant_role() -> Role {
    Role::Assistant
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatErrorBody {
    #[serde(default)]
    pub error: Option<HashMap<String, serde_json::Value>>,
}

impl ChatErrorBody {
    pub fn message(&self) -> Option<&str> {
        self.error.as_ref()?.get("message")?.as_str()
    }
}

/// Turns a raw response body into an outcome.
///
/// The first choice wins. With no choices the body is read as an error
/// payload; a body with neither is a decode failure.
pub fn interpret(body: &[u8]) -> Result<ChatOutcome, ChatError> {
    let parsed: ChatResponseBody =
        serde_json::from_slice(body).map_err(|e| ChatError::Decode(e.to_string()))?;

    let usage = parsed.usage.unwrap_or_default();
    if let Some(choice) = parsed.choices.unwrap_or_default().into_iter().next() {
        let token = |k: &str| {
            usage
                .get(k)
                .and_then(serde_json::Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
        };
        return Ok(ChatOutcome::Completed(ChatResult {
            message: Message {
                role: choice.message.role,
                content: choice.message.content.unwrap_or_default(),
            },
            finish_reason: choice.finish_reason,
            prompt_tokens: token("prompt_tokens"),
            completion_tokens: token("completion_tokens"),
            usage,
        }));
    }

    let err_body: ChatErrorBody =
        serde_json::from_slice(body).map_err(|e| ChatError::Decode(e.to_string()))?;
    match err_body.message() {
        Some(m) => Ok(ChatOutcome::Rejected(m.to_string())),
        None => Err(ChatError::Decode(
            "response carried neither choices nor an error message".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_api_shape() {
        let msgs = vec![Message::user("hi"), Message::assistant("hello")];
        let body = ChatRequestBody {
            model: "gpt-3.5-turbo",
            messages: &msgs,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello"}
                ]
            })
        );
    }

    #[test]
    fn first_choice_is_taken_with_usage() {
        let body = br#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1677858242,
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "\n\nHello"}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 13, "completion_tokens": 7, "total_tokens": 20}
        }"#;
        let ChatOutcome::Completed(r) = interpret(body).unwrap() else {
            panic!("expected a completion");
        };
        assert_eq!(r.message, Message::assistant("\n\nHello"));
        assert_eq!(r.finish_reason.as_deref(), Some("stop"));
        assert_eq!(r.prompt_tokens, Some(13));
        assert_eq!(r.completion_tokens, Some(7));
        assert_eq!(r.usage["total_tokens"], serde_json::json!(20));
    }

    #[test]
    fn null_content_becomes_empty() {
        let body = br#"{"choices":[{"index":0,"message":{"role":"assistant","content":null},"finish_reason":"tool_calls"}]}"#;
        let ChatOutcome::Completed(r) = interpret(body).unwrap() else {
            panic!("expected a completion");
        };
        assert_eq!(r.message.content, "");
        assert!(r.usage.is_empty());
    }

    #[test]
    fn error_payload_without_choices_is_rejected() {
        let body = br#"{"error":{"message":"rate limited","type":"requests","code":null}}"#;
        assert_eq!(
            interpret(body).unwrap(),
            ChatOutcome::Rejected("rate limited".into())
        );
    }

    #[test]
    fn empty_choices_fall_back_to_error() {
        let body = br#"{"choices":[],"error":{"message":"model not found"}}"#;
        assert_eq!(
            interpret(body).unwrap(),
            ChatOutcome::Rejected("model not found".into())
        );
    }

    #[test]
    fn neither_choices_nor_error_is_decode_failure() {
        assert!(matches!(interpret(b"{}"), Err(ChatError::Decode(_))));
        assert!(matches!(
            interpret(br#"{"error":{"code":500}}"#),
            Err(ChatError::Decode(_))
        ));
    }

    #[test]
    fn malformed_json_is_decode_failure() {
        assert!(matches!(interpret(b"<html>bad gateway</html>"), Err(ChatError::Decode(_))));
        assert!(matches!(interpret(b""), Err(ChatError::Decode(_))));
    }
}
