use anyhow::{Context, Result};
use clap::Parser;
use rdp_input::InputConfig;
use rdp_replay::args::Args;
use rdp_replay::script::Script;
use std::io::{BufWriter, Write};
use tracing::info;

fn init_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { "debug" } else { "info" };

    // Commands go to stdout, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("rdp_replay={},rdp_input={}", log_level, log_level).into()
            }),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    info!("Starting rdp-replay {}", env!("CARGO_PKG_VERSION"));

    let script = Script::load(&args.script)
        .with_context(|| format!("Failed to load script {}", args.script.display()))?;
    let config = match &args.config {
        Some(path) => InputConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => script.config.clone().unwrap_or_default(),
    };

    let lines = script.replay(config, args.drain);
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut printed = 0;
    for line in lines
        .iter()
        .filter(|l| !args.remote_only || l.command.is_remote_input())
    {
        serde_json::to_writer(&mut out, line)?;
        writeln!(out)?;
        printed += 1;
    }
    out.flush()?;

    info!("Printed {} commands", printed);
    Ok(())
}
