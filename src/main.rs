use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use std::path::PathBuf;
use teamfetch::fetcher::{fetch_all_organizations, FetchOptions, DEFAULT_CACHE_HOURS};
use teamfetch::logging::{init_logging, parse_rotation, LogConfig, LOG_FILENAME};
use teamfetch::metadata::MetadataStore;
use teamfetch::source::{ensure_command_available, ProcessInvoker};
use teamfetch::{load_config, AppConfig};
use tracing::{info, warn};

/// Teamfetch - incremental organization teams fetcher with file-based caching
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Force refresh all data, ignoring cache
    #[arg(long, env = "TEAMFETCH_FORCE_REFRESH", default_value = "false")]
    force_refresh: bool,

    /// Cache duration in hours
    #[arg(long, env = "TEAMFETCH_CACHE_HOURS", default_value_t = DEFAULT_CACHE_HOURS)]
    cache_hours: u64,

    /// Path to the configuration file
    #[arg(short, long, env = "TEAMFETCH_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Also sweep cached artifacts older than this many days
    #[arg(long, env = "TEAMFETCH_CLEANUP_CACHE_DAYS")]
    cleanup_cache_days: Option<u64>,

    /// Enable JSON log format (for log aggregation)
    #[arg(long, env = "TEAMFETCH_LOG_JSON", default_value = "false")]
    log_json: bool,

    /// Log rotation period: daily, hourly, or never
    #[arg(long, env = "TEAMFETCH_LOG_ROTATION", default_value = "daily")]
    log_rotation: String,

    /// Custom log directory (default: ~/.teamfetch/logs)
    #[arg(long, env = "TEAMFETCH_LOG_DIR")]
    log_dir: Option<String>,
}

async fn sweep_old_cache(config: &AppConfig, max_age_days: u64) {
    for org in config.organizations() {
        match MetadataStore::open(&config.org_data_dir(org)).await {
            Ok(store) => {
                let removed = store.cleanup_old_cache(max_age_days).await;
                if removed > 0 {
                    info!("Removed {removed} old cache files for {org}");
                }
            }
            Err(e) => warn!("Could not open metadata store for {org}: {e}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let log_dir = args.log_dir.map(PathBuf::from).unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".teamfetch")
            .join("logs")
    });
    let log_file = log_dir.join(LOG_FILENAME);

    let log_config = LogConfig {
        log_dir,
        json_format: args.log_json,
        rotation: parse_rotation(&args.log_rotation),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_config) {
        eprintln!("Error: Failed to initialize logging: {e}");
        eprintln!("Logs: {}", log_file.display());
        return Err(e);
    }

    let config = load_config(&args.config).await?;
    ensure_command_available(&config.api.command)?;

    if args.force_refresh {
        info!("Force refresh mode enabled - ignoring all cache files");
    } else if args.cache_hours != DEFAULT_CACHE_HOURS {
        info!("Using custom cache duration: {} hours", args.cache_hours);
    }

    let options = FetchOptions {
        force_refresh: args.force_refresh,
        cache_hours: args.cache_hours,
    };

    let summary = fetch_all_organizations(&config, options, ProcessInvoker).await;

    if let Some(days) = args.cleanup_cache_days {
        sweep_old_cache(&config, days).await;
    }

    if !summary.all_succeeded() {
        return Err(eyre!(
            "data fetch failed for {} of {} organizations: {}",
            summary.failed.len(),
            summary.failed.len() + summary.succeeded.len(),
            summary.failed.join(", ")
        ));
    }

    info!("All data fetched successfully");
    Ok(())
}
