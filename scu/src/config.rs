use crate::cli::Args;
use crate::resolver::ResolveMode;
use std::path::PathBuf;

pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const GITLAB_TOKEN_VAR: &str = "GITLAB_TOKEN";

const CACHE_FILE_NAME: &str = "version_cache.json";

/// Runtime configuration assembled from command-line arguments and the
/// environment
#[derive(Debug, Clone)]
pub struct Config {
    pub project_root: PathBuf,
    pub mode: ResolveMode,
    pub output_dir: PathBuf,
    pub cache_file: PathBuf,
    pub tokens: Tokens,
    pub show_colors: bool,
    pub json: bool,
}

/// Optional API credentials; only raise rate limits
#[derive(Debug, Clone, Default)]
pub struct Tokens {
    pub github: Option<String>,
    pub gitlab: Option<String>,
}

impl Tokens {
    pub fn from_env() -> Self {
        Self {
            github: non_empty_var(GITHUB_TOKEN_VAR),
            gitlab: non_empty_var(GITLAB_TOKEN_VAR),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_args(args: &Args) -> Self {
        let cache_file = args
            .cache_file
            .clone()
            .unwrap_or_else(|| args.output_dir.join(CACHE_FILE_NAME));

        Self {
            project_root: args.project_path(),
            mode: if args.cached {
                ResolveMode::CacheOnly
            } else {
                ResolveMode::Online
            },
            output_dir: args.output_dir.clone(),
            cache_file,
            tokens: Tokens::from_env(),
            show_colors: !args.no_color,
            json: args.json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["scu"]);
        let config = Config::from_args(&args);

        assert_eq!(config.project_root, PathBuf::from("."));
        assert_eq!(config.mode, ResolveMode::Online);
        assert_eq!(config.cache_file, PathBuf::from("results/version_cache.json"));
        assert!(config.show_colors);
    }

    #[test]
    fn test_cached_mode_and_overrides() {
        let args = Args::parse_from([
            "scu",
            "/tmp/MyApp",
            "--cached",
            "--output-dir",
            "out",
            "--cache-file",
            "/tmp/cache.json",
            "--no-color",
        ]);
        let config = Config::from_args(&args);

        assert_eq!(config.project_root, PathBuf::from("/tmp/MyApp"));
        assert_eq!(config.mode, ResolveMode::CacheOnly);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.cache_file, PathBuf::from("/tmp/cache.json"));
        assert!(!config.show_colors);
    }
}
