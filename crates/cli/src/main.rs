mod cli;
mod logging;
mod render;
mod repl;
mod strings;

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use providers::openai::OpenAiClient;
use relay_core::session::{ChatSession, SessionRegistry};
use tracing::{info, warn};

use cli::{Cli, Command};
use strings::PREFIX_ASSISTANT;

fn main() -> Result<()> {
    let args = Cli::parse();
    let _log_guard = logging::init(args.log_stderr)?;

    let cfg = args.load_config()?;
    info!(target: "relay", "config: {:?}", cfg);
    if cfg.api_key().is_none() {
        warn!(target: "relay", "no API key configured; set OPENAI_API_KEY or api_key in the config file");
    }
    let opts = cfg.chat_opts();
    let client = OpenAiClient::new(cfg).context("build HTTP client")?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    let width = render::terminal_width();

    match args.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            let mut repl = repl::Repl::new(SessionRegistry::new(client, opts), width);
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            repl.run(&rt, stdin.lock(), &mut stdout)
        }
        Command::Ask { message } => {
            let text = message.join(" ");
            let mut session = ChatSession::new(client, opts);
            let reply = rt.block_on(session.send(&text))?;
            let mut stdout = io::stdout().lock();
            for l in render::wrap_prefixed(PREFIX_ASSISTANT, &reply, width) {
                writeln!(stdout, "{}", l)?;
            }
            Ok(())
        }
    }
}
