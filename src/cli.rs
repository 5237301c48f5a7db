use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hostprep")]
#[command(version)]
#[command(about = "Provision a freshly installed Linux host", long_about = None)]
#[command(after_help = "Modules (canonical order): packages, users, hardening, ssh, firewall\n\n\
Examples:\n  hostprep --all --dry-run\n  hostprep --modules=packages,users --verbose")]
pub struct Cli {
    /// Report intended changes without applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Mirror the log to the console
    #[arg(short, long)]
    pub verbose: bool,

    /// Accepted for compatibility; no module changes behaviour under it yet
    #[arg(long)]
    pub force: bool,

    /// Modules to run, comma-separated, in order
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub modules: Vec<String>,

    /// Run every module in canonical order
    #[arg(long)]
    pub all: bool,

    /// Settings file (defaults to /etc/hostprep/config.toml when present)
    #[arg(long, env = "HOSTPREP_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Where the run log is appended
    #[arg(long, value_name = "PATH", default_value = crate::config::DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Identity file used to detect the distribution
    #[arg(long, value_name = "PATH", default_value = provision::distro::OS_RELEASE)]
    pub os_release: PathBuf,

    /// Skip detection and treat the host as this distribution id
    #[arg(long, value_name = "ID")]
    pub distro: Option<String>,
}
