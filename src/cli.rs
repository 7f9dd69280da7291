//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// seafbot - Helldivers 2 war status reports for Discord
///
/// Posts a "SEAF Combat Report" embed with the most contested planets,
/// hourly between 21:00 and 00:59 UTC and whenever someone types `!update`.
///
/// Examples:
///   seafbot --token $DISCORD_TOKEN
///   seafbot --channel war-room --no-schedule
///   seafbot --dry-run --format json
///   seafbot --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Discord bot token
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .seafbot.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Channel name that receives scheduled reports
    #[arg(long, value_name = "NAME")]
    pub channel: Option<String>,

    /// Base URL of the war status API
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Status API request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of planets listed individually
    #[arg(long, value_name = "NUM")]
    pub featured: Option<usize>,

    /// Do not arm the hourly schedule (manual `!update` only)
    #[arg(long)]
    pub no_schedule: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Fetch once and print the report to stdout without connecting to Discord
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for --dry-run (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Generate a default .seafbot.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for dry-run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.featured == Some(0) {
            return Err("Featured planet count must be at least 1".to_string());
        }

        if let Some(ref channel) = self.channel {
            if channel.trim().is_empty() {
                return Err("Channel name must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Get the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            token: None,
            config: None,
            channel: None,
            api_url: None,
            timeout: None,
            featured: None,
            no_schedule: false,
            verbose: false,
            quiet: false,
            dry_run: false,
            format: OutputFormat::Markdown,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "seafbot",
            "--channel",
            "war-room",
            "--no-schedule",
            "--dry-run",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.channel.as_deref(), Some("war-room"));
        assert!(args.no_schedule);
        assert!(args.dry_run);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.api_url = Some("helldivers-2.fly.dev".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_values() {
        let mut args = make_args();
        args.featured = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
