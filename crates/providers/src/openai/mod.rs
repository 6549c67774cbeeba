pub mod client;
pub mod config;
pub mod wire;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;
