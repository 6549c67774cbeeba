pub mod session;

pub mod llm {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        User,
        Assistant,
        System,
    }

    /// One turn of a conversation, in the shape the chat-completions API uses.
    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
    pub struct Message {
        pub role: Role,
        pub content: String,
    }

    impl Message {
        pub fn user<S: Into<String>>(s: S) -> Self {
            Self {
                role: Role::User,
                content: s.into(),
            }
        }
        pub fn assistant<S: Into<String>>(s: S) -> Self {
            Self {
                role: Role::Assistant,
                content: s.into(),
            }
        }
    }

    #[derive(Clone, Debug)]
    pub struct ChatOpts {
        pub model: String,
        /// Surface provider-reported errors as `ChatError::Provider` instead of reply text.
        pub strict_provider_errors: bool,
    }

    impl ChatOpts {
        pub fn new<S: Into<String>>(model: S) -> Self {
            Self {
                model: model.into(),
                strict_provider_errors: false,
            }
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct ChatResult {
        /// First choice's message, content exactly as the provider sent it.
        pub message: Message,
        pub finish_reason: Option<String>,
        pub prompt_tokens: Option<u32>,
        pub completion_tokens: Option<u32>,
        pub usage: HashMap<String, serde_json::Value>,
    }

    /// What a provider answered for one request.
    #[derive(Clone, Debug, PartialEq)]
    pub enum ChatOutcome {
        Completed(ChatResult),
        /// No choices came back; carries the provider's error message.
        Rejected(String),
    }

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum ChatError {
        #[error("configuration: {0}")] Config(String),
        #[error("transport: {0}")] Transport(String),
        #[error("timeout: {0}")] Timeout(String),
        #[error("decode: {0}")] Decode(String),
        #[error("provider: {0}")] Provider(String),
    }

    impl ChatError {
        pub fn is_transport(&self) -> bool {
            matches!(self, ChatError::Transport(_) | ChatError::Timeout(_))
        }
    }

    #[allow(async_fn_in_trait)]
    pub trait ModelClient: Send + Sync {
        /// Whether a credential is configured. Checked before any network use.
        fn has_credentials(&self) -> bool;

        async fn send_chat(&self, msgs: &[Message], opts: &ChatOpts) -> Result<ChatOutcome, ChatError>;
    }

}
