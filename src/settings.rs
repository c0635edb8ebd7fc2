//! Command-line settings for the gateway binary.

use std::path::PathBuf;

use clap::Parser;

/// Quota-enforcing chat completion gateway.
#[derive(Debug, Parser)]
#[command(name = "chatgate", version, about)]
pub struct Settings {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Directory for the JSON document store (default: ~/.chatgate/data).
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl Settings {
    /// Resolve the data directory, defaulting to `~/.chatgate/data`.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".chatgate")
                .join("data")
        })
    }
}
