use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "sales-desk")]
#[command(about = "Chat assistant for shop, till and ledger numbers")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "sales-desk.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit JSON log lines instead of compact text
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Poll the chat and post the daily briefing (default)
    Run,
    /// Answer one question on stdout without the chat
    Ask {
        /// The question, e.g. "retail sales yesterday"
        text: Vec<String>,
    },
    /// Build the daily briefing now and print it
    Report,
    /// Load and validate the configuration, then exit
    Check,
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}
