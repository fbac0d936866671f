//! Command-line argument definitions (clap).

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "simple-fansd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CPU temperature driven BMC fan control via ipmitool", long_about = None)]
pub struct Args {
    /// JSON config file; environment variables override its values
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Set log level (TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL)
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Log ipmitool invocations instead of running them (no root required)
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Run a single control tick and exit
    #[arg(long)]
    pub once: bool,

    /// Print the resolved configuration and exit
    #[arg(long = "show-config")]
    pub show_config: bool,
}
