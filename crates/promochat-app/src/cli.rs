use clap::Parser;
use std::path::PathBuf;

use promochat_types::GREETING_DELAY_MS;

/// CLI arguments for promochat
#[derive(Parser, Debug)]
#[command(name = "promochat")]
#[command(about = "Promo page chat assistant in the terminal")]
#[command(version)]
pub struct Cli {
    /// Base URL of the hosted relay
    #[arg(long, value_name = "URL", env = "PROMOCHAT_RELAY_URL")]
    pub relay_url: Option<String>,

    /// API key for the hosted relay
    #[arg(long, value_name = "KEY", env = "PROMOCHAT_RELAY_KEY", hide_env_values = true)]
    pub relay_key: Option<String>,

    /// Model requested from the relay
    #[arg(long, value_name = "MODEL", env = "PROMOCHAT_RELAY_MODEL")]
    pub relay_model: Option<String>,

    /// Base URL of the local model server (e.g., http://localhost:11434)
    #[arg(long, value_name = "URL", env = "PROMOCHAT_LOCAL_URL")]
    pub local_url: Option<String>,

    /// Model name on the local model server
    #[arg(long, value_name = "MODEL", env = "PROMOCHAT_LOCAL_MODEL")]
    pub local_model: Option<String>,

    /// Directory holding chat history and session data (default: ~/.promochat/store)
    #[arg(long, value_name = "DIR", env = "PROMOCHAT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long)]
    pub ephemeral: bool,

    /// Backend to start with (remote or local); overrides the saved preference
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Open the chat with a greeting about this subject
    #[arg(long, value_name = "TEXT")]
    pub trigger: Option<String>,

    /// Send a single message, print the settled reply and exit
    #[arg(long, value_name = "TEXT")]
    pub once: Option<String>,

    /// Pause before a greeting appears, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = GREETING_DELAY_MS)]
    pub greeting_delay_ms: u64,

    /// Dump every backend request to the console and to ~/.promochat/logs
    #[arg(long)]
    pub log_requests: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
