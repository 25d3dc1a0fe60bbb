use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Kaiwu chat-completions adapter
#[derive(Debug, Parser)]
#[command(name = "kaiwu", about = "Serve a chat-completions backend through a vendor-neutral chat endpoint")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "kaiwu.toml", env = "KAIWU_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "KAIWU_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter in `RUST_LOG` syntax
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,
}
