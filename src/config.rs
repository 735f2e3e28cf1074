//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "pausable-timer")]
#[command(about = "An HTTP-controlled pausable countdown timer")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Countdown duration in milliseconds
    #[arg(short, long, default_value = "600000", value_parser = clap::value_parser!(u64).range(1..))]
    pub duration_ms: u64,

    /// Shell command to run when the countdown expires
    #[arg(long)]
    pub on_expiry: Option<String>,

    /// Start the countdown as soon as the server is up
    #[arg(long)]
    pub autostart: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}
