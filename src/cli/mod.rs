use std::path::PathBuf;

use clap::Parser;

/// Command-line surface: a config file path and a database path, both
/// validated at startup per §6 ("Exit code 0 on clean shutdown, non-zero
/// on startup validation failure").
#[derive(Parser, Debug)]
#[command(name = "piju", about = "Self-hosted music server control plane")]
pub struct Cli {
    /// Path to the JSON5 config file. Defaults to $PIJU_CONFIG or
    /// $HOME/.pijudrc when omitted.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Path to the SQLite catalog database. Must already exist.
    #[arg(short = 'd', long = "database")]
    pub database: PathBuf,
}
