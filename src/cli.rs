use clap::{ArgAction, Args, Parser, Subcommand};
use snapdiff_compare::ChangeKind;
use std::path::PathBuf;

/// Snapshot directory trees and report what changed between two snapshots,
/// following files that were moved or renamed.
#[derive(Debug, Parser)]
#[command(name = "snapdiff", version, about)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "SNAPDIFF_CONFIG")]
    pub config: Option<PathBuf>,
    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Snapshot one or more directories into a single file
    Scan(ScanArgs),
    /// Classify every file of two snapshots (or live directories)
    Compare(CompareArgs),
    /// Print where a snapshot file came from and what it holds
    Show {
        /// Snapshot file
        file: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directories to scan; several are merged into one namespace
    #[arg(required = true)]
    pub dirs: Vec<PathBuf>,
    /// Snapshot file to write
    #[arg(short, long)]
    pub output: PathBuf,
    /// Free-text description stored with the snapshot
    #[arg(short = 'm', long)]
    pub description: Option<String>,
    /// Files read at the same time
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Old side: a snapshot file or a directory to scan now
    pub old: PathBuf,
    /// New side: a snapshot file or a directory to scan now
    pub new: PathBuf,
    /// Glob of paths to exclude from pairing (repeatable, added to configured ones)
    #[arg(short, long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,
    /// Kind of change to show (repeatable)
    #[arg(short, long = "show", value_name = "KIND", value_parser = parse_kind)]
    pub show: Vec<ChangeKind>,
    /// Show every kind, including IDENTICAL and EXCLUDED
    #[arg(long, conflicts_with = "show")]
    pub all: bool,
    /// One JSON object per change instead of text
    #[arg(long)]
    pub json: bool,
    /// Report DEDUPLICATED/DUPLICATED where content survives on the other side
    #[arg(long)]
    pub duplicates: bool,
    /// Files read at the same time when scanning a directory
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,
}

fn parse_kind(value: &str) -> Result<ChangeKind, String> {
    value.parse::<ChangeKind>().map_err(|e| (*e).to_string())
}
