use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mlbb_dashboard::api::state::AppState;
use mlbb_dashboard::calculate::format_percent;
use mlbb_dashboard::config::{AppConfig, ConfigOrigin};
use mlbb_dashboard::dashboard::{Dashboard, DashboardParams, DashboardQuery};
use mlbb_dashboard::fetch::{Fetcher, FetcherConfig};
use mlbb_dashboard::source::{MlbbClient, StaticSource, StatsSource};

#[derive(Parser)]
#[command(name = "mlbb-dashboard")]
#[command(about = "Mobile Legends hero pick/win rate dashboard")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard server
    Serve {
        /// Bind address (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port number (defaults to server.port)
        #[arg(long)]
        port: Option<u16>,

        /// Serve hero-list.json and hero-rank.json from this directory
        /// instead of calling the stats API
        #[arg(long)]
        offline: Option<PathBuf>,
    },

    /// Print the quadrant breakdown for one filter combination
    Summary {
        /// Ranking window in days (1, 3, 7, 15, 30)
        #[arg(long)]
        days: Option<String>,

        /// Rank tier (all, epic, legend, mythic, honor, glory)
        #[arg(long)]
        rank: Option<String>,

        /// Comma-separated quadrant keys to include
        #[arg(long)]
        regions: Option<String>,

        /// Read fixtures from this directory instead of the stats API
        #[arg(long)]
        offline: Option<PathBuf>,
    },

    /// Delete cached upstream responses
    ClearCache,
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_fetcher(config: &AppConfig) -> Result<Fetcher> {
    let fetcher = Fetcher::new(FetcherConfig {
        cache_dir: config.upstream.cache_dir.clone(),
        cache_ttl: config.upstream.cache_ttl()?,
        timeout: config.upstream.timeout(),
        ..FetcherConfig::default()
    })?;
    Ok(fetcher)
}

fn build_source(config: &AppConfig, offline: Option<&Path>) -> Result<Arc<dyn StatsSource>> {
    if let Some(dir) = offline {
        let source = StaticSource::from_dir(dir)
            .with_context(|| format!("loading fixtures from {}", dir.display()))?;
        tracing::info!("Serving offline data from {}", dir.display());
        return Ok(Arc::new(source));
    }

    let base_url = config.upstream.base_url()?;
    tracing::info!("Using stats API at {}", base_url);
    Ok(Arc::new(MlbbClient::new(build_fetcher(config)?, base_url)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, origin) = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_tracing(level, cli.json_logs);

    tracing::info!("Starting mlbb-dashboard v{}", env!("CARGO_PKG_VERSION"));
    if origin == ConfigOrigin::Defaults {
        tracing::warn!(
            "Config file {} not found, using defaults",
            cli.config.display()
        );
    }

    match cli.command {
        Commands::Serve {
            host,
            port,
            offline,
        } => {
            let source = build_source(&config, offline.as_deref())?;
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let state = AppState::new(source, Arc::new(config))?;
            let app = mlbb_dashboard::api::build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Dashboard: http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Summary {
            days,
            rank,
            regions,
            offline,
        } => {
            let source = build_source(&config, offline.as_deref())?;
            let query = DashboardQuery::from(&DashboardParams {
                days,
                rank,
                regions,
                ..DashboardParams::default()
            });

            let dashboard = Dashboard::load(
                source.as_ref(),
                query,
                config.upstream.ranking_page_size,
            )
            .await?;

            println!(
                "=== {} · {} ===",
                dashboard.query.days.label(),
                dashboard.query.rank.label()
            );
            println!("Heroes ranked:    {}", dashboard.total);
            println!("Upstream total:   {}", dashboard.upstream_total);
            println!(
                "Mean pick rate:   {}",
                format_percent(dashboard.means.pick.map(|v| v / 100.0))
            );
            println!(
                "Mean win rate:    {}",
                format_percent(dashboard.means.win.map(|v| v / 100.0))
            );

            for (region, points) in dashboard.chart_by_region() {
                if !dashboard.query.regions.contains(region) {
                    continue;
                }
                println!("\n{} ({})", region.label(), points.len());
                for datum in points {
                    println!(
                        "  {:<20} pick {:>5.1}%  win {:>5.1}%  ban {:>5.1}%",
                        datum.hero, datum.pick_rate, datum.win_rate, datum.ban_rate
                    );
                }
            }
        }
        Commands::ClearCache => {
            let fetcher = build_fetcher(&config)?;
            if fetcher.clear_cache().await? {
                println!("Cleared {}", config.upstream.cache_dir.display());
            } else {
                println!("Nothing to clear at {}", config.upstream.cache_dir.display());
            }
        }
    }

    Ok(())
}
