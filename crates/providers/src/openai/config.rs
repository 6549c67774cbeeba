use anyhow::Context;
use directories::BaseDirs;
use relay_core::llm::ChatOpts;
use serde::Deserialize;
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OpenAiFileConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_ms: Option<u64>,
    pub strict_provider_errors: Option<bool>,
}

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub strict_provider_errors: bool,
    pub proxy: Option<String>,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("strict_provider_errors", &self.strict_provider_errors)
            .field("proxy", &self.proxy)
            .finish()
    }
}

impl OpenAiConfig {
    /// Loads the default config file if it exists, then applies the environment.
    /// An unreadable or malformed default file is logged and skipped.
    pub fn from_env_and_file() -> anyhow::Result<Self> {
        let file_cfg = match Self::config_path() {
            Some(path) if path.exists() => Self::read_file(&path).unwrap_or_else(|e| {
                warn!(target: "providers::openai", "ignoring config file: {:#}", e);
                OpenAiFileConfig::default()
            }),
            _ => OpenAiFileConfig::default(),
        };
        Ok(Self::resolve(file_cfg, |k| env::var(k).ok()))
    }

    /// Like [`OpenAiConfig::from_env_and_file`], but the file at `path` must exist and parse.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let file_cfg = Self::read_file(path)?;
        Ok(Self::resolve(file_cfg, |k| env::var(k).ok()))
    }

    fn read_file(path: &Path) -> anyhow::Result<OpenAiFileConfig> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parse config file: {}", path.display()))
    }

    /// Environment wins over the file; the file wins over built-in defaults.
    pub fn resolve(file_cfg: OpenAiFileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let api_key = non_blank(env("OPENAI_API_KEY")).or(non_blank(file_cfg.api_key));
        let base_url = non_blank(env("OPENAI_BASE_URL"))
            .or(non_blank(file_cfg.base_url))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = non_blank(env("OPENAI_MODEL"))
            .or(non_blank(file_cfg.model))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let proxy = non_blank(env("HTTPS_PROXY")).or_else(|| non_blank(env("HTTP_PROXY")));

        OpenAiConfig {
            api_key,
            base_url,
            model,
            timeout: Duration::from_millis(file_cfg.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
            strict_provider_errors: file_cfg.strict_provider_errors.unwrap_or(false),
            proxy,
        }
    }

    /// The configured key, if it is present and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn chat_opts(&self) -> ChatOpts {
        ChatOpts {
            model: self.model.clone(),
            strict_provider_errors: self.strict_provider_errors,
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        let p = if cfg!(target_os = "windows") {
            base.home_dir().join(".relay").join("config.toml")
        } else {
            base.config_dir().join("relay").join("config.toml")
        };
        Some(p)
    }
}
