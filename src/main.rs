//! `snapdiff`: snapshot directory trees and classify what changed between
//! two snapshots.
//!
//! ```bash
//! snapdiff scan /srv/photos -o before.snap -m "before cleanup"
//! snapdiff compare before.snap /srv/photos --exclude '*.tmp'
//! ```

mod cli;
mod commands;
mod error;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use snapdiff_config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    tracing::debug!(?config, "Configuration loaded");

    let stdout = std::io::stdout().lock();
    match cli.command {
        Command::Scan(args) => commands::scan(args, &config, stdout).await,
        Command::Compare(args) => commands::compare(args, &config, stdout).await,
        Command::Show { file } => commands::show(&file, stdout),
    }
}

/// Logs go to stderr so reports on stdout stay machine-readable.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
