// Centralized REPL strings and labels. ASCII-friendly by default.

// Role prefixes used when printing turns
pub const PREFIX_USER: &str = "| ";
pub const PREFIX_ASSISTANT: &str = "> ";
pub const PREFIX_SYSTEM: &str = "# ";

pub const DEFAULT_SESSION: &str = "default";

pub const BANNER: &str =
    "relay: type a message and press Enter. /clear resets the context, /help lists commands.";

pub fn help_lines() -> &'static [&'static str] {
    &[
        "/clear            Reset the current conversation (sent to the session)",
        "/history          Show the turns of the current conversation",
        "/session <name>   Switch to (or start) a named conversation",
        "/sessions         List conversations started in this run",
        "/help             Show this list",
        "/quit, /exit      Leave",
    ]
}

pub fn session_switched(name: &str, turns: usize) -> String {
    format!("[info] session '{}' ({} turns)", name, turns)
}

pub fn error_line(e: &dyn std::fmt::Display) -> String {
    format!("error: {}", e)
}
