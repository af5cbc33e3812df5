use std::path::PathBuf;

use clap::Parser;

/// Cortex LLM gateway
#[derive(Debug, Parser)]
#[command(name = "cortex", about = "Cost-aware routing gateway for LLM APIs")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "cortex.toml", env = "CORTEX_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "CORTEX_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,
}
