use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::llm::{ChatError, ChatOpts, ChatOutcome, Message, ModelClient};

/// Reset directive, matched case-insensitively against the whole input.
pub const CLEAR_COMMAND: &str = "/clear";
pub const CLEARED_REPLY: &str = "Conversation context cleared.";
pub const EMPTY_REPLY_PLACEHOLDER: &str =
    "[The API returned empty content. If this keeps happening, send /clear to reset the context.]";

/// Ordered turn history. Only grows, except through [`Conversation::clear`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn push(&mut self, m: Message) {
        self.turns.push(m);
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

pub fn is_clear_command(text: &str) -> bool {
    text.eq_ignore_ascii_case(CLEAR_COMMAND)
}

/// Runs one exchange against `client`, recording it in `conversation`.
///
/// The user turn is appended before the request goes out and is kept even if
/// the request fails. A provider error payload comes back as the reply text
/// unless `opts.strict_provider_errors` is set.
pub async fn complete<C: ModelClient>(
    client: &C,
    opts: &ChatOpts,
    conversation: &mut Conversation,
    text: &str,
) -> Result<String, ChatError> {
    if !client.has_credentials() {
        return Err(ChatError::Config("missing API key".into()));
    }
    if is_clear_command(text) {
        info!(target: "core::session", "clear: dropped {} turns", conversation.len());
        conversation.clear();
        return Ok(CLEARED_REPLY.to_string());
    }

    conversation.push(Message::user(text));
    let outcome = client
        .send_chat(conversation.turns(), opts)
        .await
        .map_err(|e| {
            error!(target: "core::session", "exchange failed: {}", e);
            e
        })?;

    match outcome {
        ChatOutcome::Completed(result) => {
            let reply = result.message.content.trim().to_string();
            conversation.push(result.message);
            info!(
                target: "core::session",
                "reply: chars={} finish={:?} turns={}",
                reply.len(),
                result.finish_reason,
                conversation.len()
            );
            if reply.is_empty() {
                Ok(EMPTY_REPLY_PLACEHOLDER.to_string())
            } else {
                Ok(reply)
            }
        }
        ChatOutcome::Rejected(msg) => {
            warn!(target: "core::session", "provider error: {}", msg);
            if opts.strict_provider_errors {
                Err(ChatError::Provider(msg))
            } else {
                Ok(msg.trim().to_string())
            }
        }
    }
}

/// A single conversation bound to a client, owned by the caller.
pub struct ChatSession<C> {
    client: C,
    opts: ChatOpts,
    conversation: Conversation,
}

impl<C: ModelClient> ChatSession<C> {
    pub fn new(client: C, opts: ChatOpts) -> Self {
        Self {
            client,
            opts,
            conversation: Conversation::new(),
        }
    }

    pub async fn send(&mut self, text: &str) -> Result<String, ChatError> {
        complete(&self.client, &self.opts, &mut self.conversation, text).await
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn opts(&self) -> &ChatOpts {
        &self.opts
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

/// Conversations keyed by name, sharing one client.
///
/// Calls on the same key are serialized by that conversation's lock; calls on
/// different keys do not wait on each other.
pub struct SessionRegistry<C> {
    client: C,
    opts: ChatOpts,
    sessions: Mutex<HashMap<String, Arc<Mutex<Conversation>>>>,
}

impl<C: ModelClient> SessionRegistry<C> {
    pub fn new(client: C, opts: ChatOpts) -> Self {
        Self {
            client,
            opts,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn send(&self, key: &str, text: &str) -> Result<String, ChatError> {
        let conversation = self.conversation(key).await;
        let mut guard = conversation.lock().await;
        complete(&self.client, &self.opts, &mut guard, text).await
    }

    /// Returns the conversation for `key`, creating an empty one on first use.
    pub async fn conversation(&self, key: &str) -> Arc<Mutex<Conversation>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::new())))
            .clone()
    }

    pub async fn snapshot(&self, key: &str) -> Vec<Message> {
        let conversation = {
            let sessions = self.sessions.lock().await;
            sessions.get(key).cloned()
        };
        match conversation {
            Some(c) => c.lock().await.turns().to_vec(),
            None => Vec::new(),
        }
    }

    pub async fn keys(&self) -> Vec<String> {
        let sessions = self.sessions.lock().await;
        let mut keys: Vec<String> = sessions.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn remove(&self, key: &str) -> bool {
        self.sessions.lock().await.remove(key).is_some()
    }

    pub fn opts(&self) -> &ChatOpts {
        &self.opts
    }
}
