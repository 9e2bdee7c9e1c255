//! aaaa-sync - keep a Route 53 AAAA record in sync with local IPv6 addresses.

use aaaa_sync::changes::ChangeBuilder;
use aaaa_sync::config::{fqdn, Config, UpsertMode};
use aaaa_sync::detector::InterfaceDetector;
use aaaa_sync::logging;
use aaaa_sync::providers::create_provider;
use aaaa_sync::reconcile::{Outcome, Reconciler, Target};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "aaaa-sync")]
#[command(about = "Update a Route 53 AAAA record with this host's public IPv6 addresses")]
#[command(version)]
struct Cli {
    /// AWS CLI profile name
    #[arg(short, long)]
    profile: String,

    /// Route 53 hosted zone ID
    #[arg(short, long)]
    zone_id: String,

    /// Hostname whose AAAA record is maintained
    #[arg(short = 'n', long)]
    hostname: String,

    /// Mirror log lines to the console
    #[arg(short, long)]
    verbose: bool,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to read addresses from (overrides config)
    #[arg(short, long)]
    interface: Option<String>,

    /// Record TTL in seconds (overrides config)
    #[arg(long)]
    ttl: Option<u32>,

    /// How new addresses are added to an existing record (overrides config)
    #[arg(long, value_enum)]
    upsert_mode: Option<UpsertMode>,

    /// Print the change batch instead of submitting it
    #[arg(long)]
    dry_run: bool,
}

fn get_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    let candidates = [
        Config::default_path().ok(),
        Some(PathBuf::from("/etc/aaaa-sync/config.toml")),
        Some(PathBuf::from("config.toml")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return candidate;
        }
    }

    // Return default even if it doesn't exist
    Config::default_path().unwrap_or_else(|_| PathBuf::from("config.toml"))
}

/// Read the config file and apply CLI overrides. Validation happens once
/// logging is up, so a rejected config still reaches the log file.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load_from(&get_config_path(cli.config.clone()))?;

    if let Some(interface) = &cli.interface {
        config.interface = interface.clone();
    }
    if let Some(ttl) = cli.ttl {
        config.ttl = ttl;
    }
    if let Some(mode) = cli.upsert_mode {
        config.upsert_mode = mode;
    }

    Ok(config)
}

/// Log file for this run. An unreadable config logs to the default directory.
fn startup_log_file(loaded: &anyhow::Result<Config>, hostname: &str) -> PathBuf {
    let log_dir = match loaded {
        Ok(config) => config.resolved_log_dir(),
        Err(_) => Config::default().resolved_log_dir(),
    };
    logging::log_file_path(&log_dir, hostname)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    run(Cli::parse()).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let hostname = fqdn(&cli.hostname);
    let loaded = load_config(&cli);
    logging::init(&startup_log_file(&loaded, &hostname), cli.verbose)?;

    let result = match loaded {
        Ok(config) => match config.validate() {
            Ok(()) => sync(&cli, &config, hostname).await,
            Err(e) => Err(e.into()),
        },
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        tracing::error!("Sync failed: {:#}", e);
    }
    result
}

async fn sync(cli: &Cli, config: &Config, hostname: String) -> anyhow::Result<()> {
    let detector = InterfaceDetector::new(&config.if_inet6_path, &config.interface);
    let provider = create_provider(&cli.profile).await;
    let builder = ChangeBuilder::new(hostname.clone(), config.ttl, config.upsert_mode);
    let target = Target {
        zone_id: cli.zone_id.clone(),
        hostname,
    };

    let outcome = Reconciler::new(
        &detector,
        provider.as_ref(),
        target,
        builder,
        Duration::from_secs(config.timeout_secs),
    )
    .dry_run(cli.dry_run)
    .run()
    .await?;

    if let Outcome::Planned(changes) = outcome {
        println!("{}", serde_json::to_string_pretty(&changes)?);
    }

    Ok(())
}
