//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.seafbot.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".seafbot.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// War status API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Discord connection settings.
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Automatic update schedule.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Report rendering settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// War status API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the status API.
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_seconds: default_api_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://helldivers-2.fly.dev".to_string()
}

fn default_api_timeout() -> u64 {
    30
}

/// Discord settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. Usually supplied via `DISCORD_TOKEN` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Channel name that receives scheduled reports.
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Prefix for chat commands.
    #[serde(default = "default_prefix")]
    pub command_prefix: String,

    /// Gateway intents bitmask.
    #[serde(default = "default_intents")]
    pub intents: u64,

    /// "Playing" activity shown on the bot's profile.
    #[serde(default = "default_activity")]
    pub activity: String,

    /// Gateway websocket URL.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// REST API base URL.
    #[serde(default = "default_rest_url")]
    pub rest_url: String,

    /// Delay before reconnecting a dropped gateway session.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_seconds: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            channel: default_channel(),
            command_prefix: default_prefix(),
            intents: default_intents(),
            activity: default_activity(),
            gateway_url: default_gateway_url(),
            rest_url: default_rest_url(),
            reconnect_delay_seconds: default_reconnect_delay(),
        }
    }
}

fn default_channel() -> String {
    "galactic-war-effort".to_string()
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_intents() -> u64 {
    // GUILDS | GUILD_MESSAGES | GUILD_MESSAGE_TYPING | MESSAGE_CONTENT
    35329
}

fn default_activity() -> String {
    "Spreading the Sweet Seed of Democracy".to_string()
}

fn default_gateway_url() -> String {
    "wss://gateway.discord.gg/?v=10&encoding=json".to_string()
}

fn default_rest_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_reconnect_delay() -> u64 {
    5
}

/// Automatic update schedule (UTC).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Arm the hourly schedule at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// First hour of the active window (inclusive).
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,

    /// Hour at which the active window closes (exclusive). May wrap midnight.
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,

    /// Minutes between scheduled reports.
    #[serde(default = "default_interval")]
    pub interval_minutes: u64,

    /// Skip recurring fires that land outside the window.
    #[serde(default)]
    pub recheck_window: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            interval_minutes: default_interval(),
            recheck_window: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_start_hour() -> u32 {
    21
}

fn default_end_hour() -> u32 {
    1
}

fn default_interval() -> u64 {
    60
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Embed title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Embed footer.
    #[serde(default = "default_footer")]
    pub footer: String,

    /// Embed accent color.
    #[serde(default = "default_color")]
    pub color: u32,

    /// Number of planets listed individually.
    #[serde(default = "default_featured_count")]
    pub featured_count: usize,

    /// Noun used for player counts.
    #[serde(default = "default_participant_label")]
    pub participant_label: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            footer: default_footer(),
            color: default_color(),
            featured_count: default_featured_count(),
            participant_label: default_participant_label(),
        }
    }
}

fn default_title() -> String {
    "SEAF Combat Report".to_string()
}

fn default_footer() -> String {
    "All reports verified directly by General Brasch".to_string()
}

fn default_color() -> u32 {
    0x00eaff
}

fn default_featured_count() -> usize {
    5
}

fn default_participant_label() -> String {
    "Helldivers".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.seafbot.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref token) = args.token {
            self.discord.token = Some(token.clone());
        }
        if let Some(ref channel) = args.channel {
            self.discord.channel = channel.clone();
        }
        if let Some(ref url) = args.api_url {
            self.api.base_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }
        if let Some(featured) = args.featured {
            self.report.featured_count = featured;
        }

        if args.no_schedule {
            self.schedule.enabled = false;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), String> {
        if self.schedule.start_hour > 23 || self.schedule.end_hour > 23 {
            return Err("Schedule hours must be between 0 and 23".to_string());
        }
        if self.schedule.interval_minutes == 0 {
            return Err("Schedule interval must be at least 1 minute".to_string());
        }
        if self.report.featured_count == 0 {
            return Err("Featured planet count must be at least 1".to_string());
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err("API URL must start with 'http://' or 'https://'".to_string());
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }

    /// Write the default configuration into `dir`, refusing to overwrite.
    pub fn write_default(dir: &Path) -> Result<std::path::PathBuf> {
        let target = dir.join(CONFIG_FILE_NAME);
        if target.exists() {
            anyhow::bail!("{} already exists", target.display());
        }

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(Self::default_toml().as_bytes())
            .context("Failed to write default config")?;
        tmp.persist_noclobber(&target)
            .with_context(|| format!("Failed to write {}", target.display()))?;

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.discord.channel, "galactic-war-effort");
        assert_eq!(config.discord.intents, 35329);
        assert_eq!(config.schedule.start_hour, 21);
        assert_eq!(config.schedule.end_hour, 1);
        assert_eq!(config.schedule.interval_minutes, 60);
        assert!(!config.schedule.recheck_window);
        assert_eq!(config.report.featured_count, 5);
        assert_eq!(config.report.color, 0x00eaff);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[api]
base_url = "http://localhost:8080"

[discord]
channel = "war-room"

[schedule]
start_hour = 20
recheck_window = true

[report]
featured_count = 3
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.discord.channel, "war-room");
        assert_eq!(config.discord.command_prefix, "!");
        assert_eq!(config.schedule.start_hour, 20);
        assert_eq!(config.schedule.end_hour, 1);
        assert!(config.schedule.recheck_window);
        assert_eq!(config.report.featured_count, 3);
        assert_eq!(config.report.title, "SEAF Combat Report");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.schedule.start_hour = 24;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.schedule.interval_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.report.featured_count = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[discord]"));
        assert!(toml_str.contains("[schedule]"));
        assert!(toml_str.contains("[report]"));
        assert!(!toml_str.contains("token"));
    }

    #[test]
    fn test_write_default_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = Config::write_default(dir.path()).unwrap();
        assert!(path.ends_with(CONFIG_FILE_NAME));

        let loaded = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.discord.channel, "galactic-war-effort");

        assert!(Config::write_default(dir.path()).is_err());
    }

    #[test]
    fn test_load_from_dir_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());
    }
}
