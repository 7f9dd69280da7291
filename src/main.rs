//! seafbot - Helldivers 2 war status reports for Discord
//!
//! Polls the war status API and posts a "SEAF Combat Report" embed to a
//! Discord channel, hourly during the evening window and on `!update`.
//!
//! Exit codes:
//!   0 - Success (clean shutdown, or --dry-run report printed)
//!   1 - Runtime error (bad config, missing or rejected token, fetch failure
//!       in --dry-run)

mod analysis;
mod cli;
mod config;
mod cycle;
mod error;
mod gateway;
mod models;
mod report;
mod scheduler;
mod status;

use analysis::SnapshotTracker;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use cycle::{trigger_queue, CycleRunner};
use error::GatewayError;
use gateway::{
    ChannelDirectory, ChannelRef, CommandRouter, DiscordRest, GatewaySession, GatewaySettings,
};
use scheduler::Schedule;
use status::{fetch_all, HttpStatusFetcher};
use std::time::Duration;
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Initialize logging
    init_logging(&args, &config);

    info!("seafbot v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let result = if args.dry_run {
        run_dry(&config, args.format).await
    } else {
        run_bot(config).await
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .seafbot.toml.
fn handle_init_config() -> Result<()> {
    match Config::write_default(std::path::Path::new(".")) {
        Ok(path) => {
            println!("✅ Created {} with default settings.", path.display());
            println!("   Edit it to customize the channel, schedule, and report.");
            Ok(())
        }
        Err(e) => {
            eprintln!("⚠️  {}. Remove it first or edit it manually.", e);
            std::process::exit(1);
        }
    }
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("Warning: failed to load {}: {:#}", config::CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

/// Handle --dry-run: fetch once and print the report.
async fn run_dry(config: &Config, format: OutputFormat) -> Result<()> {
    let fetcher = HttpStatusFetcher::new(&config.api.base_url, config.api.timeout_seconds)?;

    let outcome = fetch_all(&fetcher)
        .await
        .map_err(|e| anyhow::anyhow!("{} ({})", e.user_message(), e))?;
    if !outcome.failures.is_empty() {
        warn!("{} campaign(s) failed and were skipped", outcome.failures.len());
    }

    let mut tracker = SnapshotTracker::new();
    let report = report::build_report(outcome.records, &mut tracker, &config.report, Utc::now());

    let output = match format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };
    println!("{}", output);

    Ok(())
}

/// Connect to Discord and serve scheduled and manual updates until Ctrl-C.
async fn run_bot(config: Config) -> Result<()> {
    let token = config
        .discord
        .token
        .clone()
        .filter(|t| !t.trim().is_empty())
        .context("No Discord token: pass --token, set DISCORD_TOKEN, or add discord.token to the config")?;

    let fetcher = HttpStatusFetcher::new(&config.api.base_url, config.api.timeout_seconds)?;
    let channels = ChannelDirectory::default();
    let rest = DiscordRest::new(&config.discord.rest_url, &token, channels.clone())?;

    let (triggers, trigger_rx) = trigger_queue();

    // Inbound commands
    let router = CommandRouter::new(config.discord.command_prefix.clone(), triggers.clone());
    let session = GatewaySession::new(
        GatewaySettings {
            url: config.discord.gateway_url.clone(),
            token,
            intents: config.discord.intents,
            activity: config.discord.activity.clone(),
            reconnect_delay: Duration::from_secs(config.discord.reconnect_delay_seconds),
        },
        channels,
        router,
    );
    let mut gateway_task = tokio::spawn(session.run_forever());

    // Scheduled updates
    if config.schedule.enabled {
        let schedule = Schedule::from_config(&config.schedule);
        match schedule.first_delay(Utc::now()) {
            Some(delay) => {
                tokio::spawn(scheduler::run(
                    schedule,
                    delay,
                    triggers.clone(),
                    ChannelRef::Name(config.discord.channel.clone()),
                ));
            }
            None => info!(
                "Outside the {:02}:00-{:02}:00 UTC window; scheduled updates not armed",
                config.schedule.start_hour, config.schedule.end_hour
            ),
        }
    } else {
        info!("Scheduled updates disabled");
    }
    drop(triggers);

    let runner = CycleRunner::new(fetcher, rest, config.report.clone());

    tokio::select! {
        _ = runner.run(trigger_rx) => {
            // The command router lives in the gateway task, so the queue only
            // closes once that task has ended.
            gateway_outcome(gateway_task.await)?;
        }
        joined = &mut gateway_task => gateway_outcome(joined)?,
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            info!("Shutting down");
        }
    }

    Ok(())
}

/// Turn the gateway task's result into the bot's exit status.
fn gateway_outcome(joined: Result<Result<(), GatewayError>, JoinError>) -> Result<()> {
    joined
        .context("Discord gateway task panicked")?
        .context("Discord gateway stopped")
}
