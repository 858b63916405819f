use clap::Parser;
use std::path::PathBuf;

/// Check for outdated Swift Package Manager and CocoaPods dependencies
#[derive(Parser, Debug, Clone)]
#[command(name = "scu")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the iOS project directory (defaults to current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Use cached versions only (no remote lookups)
    #[arg(short, long)]
    pub cached: bool,

    /// Show detailed logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory for the JSON report and the default version cache
    #[arg(short, long, value_name = "DIR", default_value = "results")]
    pub output_dir: PathBuf,

    /// Version cache file (defaults to <output-dir>/version_cache.json)
    #[arg(long, value_name = "FILE")]
    pub cache_file: Option<PathBuf>,

    /// Print the JSON report to stdout instead of the table
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Args {
    /// Get the project path, defaulting to current directory
    pub fn project_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
