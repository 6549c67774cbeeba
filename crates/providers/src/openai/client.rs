use crate::openai::config::OpenAiConfig;
use crate::openai::wire::{self, ChatRequestBody};
use relay_core::llm::{ChatError, ChatOpts, ChatOutcome, Message, ModelClient};
use reqwest::{header, Client};
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    cfg: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(cfg: OpenAiConfig) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(key) = cfg.api_key() {
            let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", key.trim()))?;
            auth.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, auth);
        }
        let mut builder = Client::builder()
            .default_headers(headers)
            .use_rustls_tls()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .timeout(cfg.timeout);
        builder = match &cfg.proxy {
            Some(p) => builder.proxy(reqwest::Proxy::all(p)?),
            None => builder.no_proxy(),
        };
        let http = builder.build()?;
        Ok(Self { http, cfg })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.cfg
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.cfg.base_url.trim_end_matches('/')
        )
    }
}

#[allow(async_fn_in_trait)]
impl ModelClient for OpenAiClient {
    fn has_credentials(&self) -> bool {
        self.cfg.api_key().is_some()
    }

    async fn send_chat(&self, msgs: &[Message], opts: &ChatOpts) -> Result<ChatOutcome, ChatError> {
        if !self.has_credentials() {
            return Err(ChatError::Config("missing API key".into()));
        }
        let url = self.completions_url();
        let body = ChatRequestBody {
            model: &opts.model,
            messages: msgs,
        };
        let payload = serde_json::to_vec(&body).map_err(|e| ChatError::Decode(e.to_string()))?;
        info!(target:"providers::openai","chat completion model={} url={} turns={}", opts.model, url, msgs.len());
        debug!(target:"providers::openai","request body: {}", String::from_utf8_lossy(&payload));

        let resp = self
            .http
            .post(&url)
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_err)?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(map_reqwest_err)?;
        debug!(target:"providers::openai","response status={} body: {}", status, String::from_utf8_lossy(&bytes));
        if !status.is_success() {
            // The body still decides the outcome; error payloads come back as text.
            warn!(target:"providers::openai","chat completion non-2xx status={}", status);
        }

        wire::interpret(&bytes).map_err(|e| {
            error!(target:"providers::openai","response decode failed status={}: {}", status, e);
            e
        })
    }
}

fn map_reqwest_err(e: reqwest::Error) -> ChatError {
    if e.is_timeout() {
        ChatError::Timeout(e.to_string())
    } else if e.is_builder() {
        ChatError::Config(e.to_string())
    } else {
        ChatError::Transport(e.to_string())
    }
}
