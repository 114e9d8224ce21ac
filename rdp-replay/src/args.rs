use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rdp-replay")]
#[command(about = "Replay a scripted input trace and print the resulting session commands")]
#[command(version)]
pub struct Args {
    /// Event script (TOML)
    pub script: PathBuf,

    /// Engine configuration file, overrides the script's [config] table
    #[arg(short, long, env = "RDP_INPUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Keep firing pending timers after the last event
    #[arg(long)]
    pub drain: bool,

    /// Only print commands that reach the remote session
    #[arg(long)]
    pub remote_only: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
