use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

/// Command line arguments. Every option overrides the config file when set.
#[derive(Debug, Parser)]
#[command(
    name = "pixfetch",
    version,
    about = "Fetch, cache and downscale images through a bounded async pipeline",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Maximum concurrent load tasks.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Commit downloads to the disk cache.
    #[arg(long)]
    pub disk_cache: Option<bool>,

    /// Memory cache budget in MiB.
    #[arg(long, value_name = "MB")]
    pub memory_budget_mb: Option<usize>,

    /// Preferred disk cache directory.
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Number of recycled display slots.
    #[arg(long, default_value_t = 4)]
    pub slots: usize,

    /// File with one URL per line. Lines starting with `#` are ignored.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Image URLs to load.
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,
}
