use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use providers::openai::OpenAiConfig;

#[derive(Debug, Parser)]
#[command(name = "relay")]
#[command(version, about = "Relay chat messages to an OpenAI-compatible chat-completions API", long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    pub log_stderr: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Interactive conversation on stdin (default)
    Chat,

    /// Send one message and print the reply
    Ask {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
}

impl Cli {
    /// File and environment first, then flags on top.
    pub fn load_config(&self) -> Result<OpenAiConfig> {
        let cfg = match &self.config {
            Some(path) => OpenAiConfig::from_file(path)?,
            None => OpenAiConfig::from_env_and_file()?,
        };
        Ok(self.apply_overrides(cfg))
    }

    fn apply_overrides(&self, mut cfg: OpenAiConfig) -> OpenAiConfig {
        if let Some(m) = &self.model {
            cfg.model = m.clone();
        }
        if let Some(u) = &self.base_url {
            cfg.base_url = u.clone();
        }
        cfg
    }
}
