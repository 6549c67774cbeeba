use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use relay_core::llm::ModelClient;
use relay_core::session::SessionRegistry;
use tokio::runtime::Runtime;
use tracing::{error, info};

use crate::render;
use crate::strings::{self, DEFAULT_SESSION, PREFIX_ASSISTANT};

/// Commands the REPL handles itself. Anything else, `/clear` included,
/// goes to the current conversation.
#[derive(Debug, PartialEq, Eq)]
enum LocalCommand {
    Quit,
    Help,
    History,
    Sessions,
    Session(String),
}

fn parse_local_command(text: &str) -> Option<LocalCommand> {
    let rest = text.strip_prefix('/')?;
    let mut parts = rest.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_lowercase();
    let arg = parts.next().unwrap_or("").trim();
    match cmd.as_str() {
        "quit" | "exit" => Some(LocalCommand::Quit),
        "help" => Some(LocalCommand::Help),
        "history" => Some(LocalCommand::History),
        "sessions" => Some(LocalCommand::Sessions),
        "session" if !arg.is_empty() => Some(LocalCommand::Session(arg.to_string())),
        _ => None,
    }
}

pub struct Repl<C> {
    registry: SessionRegistry<C>,
    current: String,
    width: usize,
}

impl<C: ModelClient> Repl<C> {
    pub fn new(registry: SessionRegistry<C>, width: usize) -> Self {
        Self {
            registry,
            current: DEFAULT_SESSION.to_string(),
            width,
        }
    }

    /// Reads lines until EOF or `/quit`, blocking on each exchange in turn.
    pub fn run<R: BufRead, W: Write>(&mut self, rt: &Runtime, input: R, out: &mut W) -> Result<()> {
        writeln!(out, "{}", strings::BANNER)?;
        for line in input.lines() {
            let line = line.context("read input line")?;
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if !self.handle_line(rt, text, out)? {
                break;
            }
            out.flush()?;
        }
        Ok(())
    }

    // Returns false when the loop should stop.
    fn handle_line<W: Write>(&mut self, rt: &Runtime, text: &str, out: &mut W) -> Result<bool> {
        match parse_local_command(text) {
            Some(LocalCommand::Quit) => return Ok(false),
            Some(LocalCommand::Help) => {
                for l in strings::help_lines() {
                    writeln!(out, "{}", l)?;
                }
            }
            Some(LocalCommand::History) => {
                let turns = rt.block_on(self.registry.snapshot(&self.current));
                for m in &turns {
                    for l in render::wrap_message(m, self.width) {
                        writeln!(out, "{}", l)?;
                    }
                }
            }
            Some(LocalCommand::Sessions) => {
                let mut keys = rt.block_on(self.registry.keys());
                if !keys.contains(&self.current) {
                    keys.push(self.current.clone());
                    keys.sort();
                }
                for k in keys {
                    let marker = if k == self.current { "*" } else { " " };
                    writeln!(out, "{} {}", marker, k)?;
                }
            }
            Some(LocalCommand::Session(name)) => {
                let turns = rt.block_on(self.registry.snapshot(&name)).len();
                info!(target: "relay", "switch session: {} -> {}", self.current, name);
                writeln!(out, "{}", strings::session_switched(&name, turns))?;
                self.current = name;
            }
            None => {
                info!(target: "relay", "send: session={} input_len={} chars", self.current, text.len());
                match rt.block_on(self.registry.send(&self.current, text)) {
                    Ok(reply) => {
                        for l in render::wrap_prefixed(PREFIX_ASSISTANT, &reply, self.width) {
                            writeln!(out, "{}", l)?;
                        }
                    }
                    Err(e) => {
                        error!(target: "relay", "send failed: {}", e);
                        writeln!(out, "{}", strings::error_line(&e))?;
                    }
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::llm::{ChatError, ChatOpts, ChatOutcome, ChatResult, Message};
    use relay_core::session::CLEARED_REPLY;
    use std::collections::HashMap;

    /// Answers with the length of the history it received.
    struct CountingClient {
        has_key: bool,
    }

    impl ModelClient for CountingClient {
        fn has_credentials(&self) -> bool {
            self.has_key
        }

        async fn send_chat(&self, msgs: &[Message], _opts: &ChatOpts) -> Result<ChatOutcome, ChatError> {
            Ok(ChatOutcome::Completed(ChatResult {
                message: Message::assistant(format!("seen {}", msgs.len())),
                finish_reason: None,
                prompt_tokens: None,
                completion_tokens: None,
                usage: HashMap::new(),
            }))
        }
    }

    fn run_script(has_key: bool, script: &str) -> String {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let registry = SessionRegistry::new(CountingClient { has_key }, ChatOpts::new("test-model"));
        let mut repl = Repl::new(registry, 80);
        let mut out = Vec::new();
        repl.run(&rt, script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_local_commands() {
        assert_eq!(parse_local_command("/quit"), Some(LocalCommand::Quit));
        assert_eq!(parse_local_command("/EXIT"), Some(LocalCommand::Quit));
        assert_eq!(
            parse_local_command("/session  work "),
            Some(LocalCommand::Session("work".into()))
        );
        assert_eq!(parse_local_command("/session"), None);
        assert_eq!(parse_local_command("/clear"), None);
        assert_eq!(parse_local_command("hello"), None);
    }

    #[test]
    fn replies_accumulate_and_clear_resets() {
        let out = run_script(true, "hi\n\nagain\n/clear\nfresh\n");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], strings::BANNER);
        assert_eq!(lines[1], "> seen 1");
        assert_eq!(lines[2], "> seen 3");
        assert_eq!(lines[3], format!("> {}", CLEARED_REPLY));
        assert_eq!(lines[4], "> seen 1");
    }

    #[test]
    fn quit_stops_reading() {
        let out = run_script(true, "hi\n/quit\nnever sent\n");
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn errors_are_printed_and_loop_continues() {
        let out = run_script(false, "hi\nstill here\n");
        let errors = out
            .lines()
            .filter(|l| *l == "error: configuration: missing API key")
            .count();
        assert_eq!(errors, 2);
    }

    #[test]
    fn sessions_keep_separate_history() {
        let out = run_script(true, "a\nb\n/session work\nc\n/history\n/session default\n/history\n/sessions\n");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "> seen 1");
        assert_eq!(lines[2], "> seen 3");
        assert_eq!(lines[3], "[info] session 'work' (0 turns)");
        assert_eq!(lines[4], "> seen 1");
        // history of "work"
        assert_eq!(&lines[5..7], &["| c", "> seen 1"]);
        assert_eq!(lines[7], "[info] session 'default' (4 turns)");
        assert_eq!(&lines[8..12], &["| a", "> seen 1", "| b", "> seen 3"]);
        assert_eq!(&lines[12..], &["* default", "  work"]);
    }
}
