use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use raidmeter::calculate::{
    aggregate, is_auto_excluded, merge_deaths, score_specs, AggregateOptions,
};
use raidmeter::config::AppConfig;
use raidmeter::fetch::{Fetcher, FetcherConfig};
use raidmeter::models::{
    clean_player_name, resolve_rows, Metric, RawRow, ScoreOptions, ScoredSpec, Tier,
};
use raidmeter::scrape::extract_meter_rows;
use raidmeter::storage::{read_store, write_store, StorageConfig};
use raidmeter::parse_percentile;

#[derive(Parser)]
#[command(name = "raidmeter")]
#[command(about = "TurtleLogs raid meter analytics")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Analyze a saved viewer page (HTML) or a JSON row dump
    Analyze {
        /// Path to the file to analyze
        path: PathBuf,

        /// Percentile filter: "75" or "0.75"; 100 = full sample
        #[arg(long, default_value = "100")]
        percentile: String,

        /// Ranking metric: popularity, avg, median, combined
        #[arg(long, default_value = "combined")]
        metric: String,

        /// Treat lower source values as better (deaths, damage taken)
        #[arg(long)]
        lower_is_better: bool,

        /// Popularity weight in combined mode
        #[arg(long, default_value = "0.45")]
        w_pop: f64,

        /// Median weight in combined mode
        #[arg(long, default_value = "0.55")]
        w_med: f64,

        /// Base URL used to resolve relative icon paths
        #[arg(long, default_value = "https://turtlogs.com/")]
        base_url: String,
    },

    /// Print the cumulative cross-log death ranking
    Deaths,

    /// Manage the user exclusion list
    Exclude {
        /// Player name
        name: String,

        /// Remove instead of add
        #[arg(long)]
        remove: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting raidmeter v{}", env!("CARGO_PKG_VERSION"));

    // Load config; a missing file just means defaults
    let config_path = PathBuf::from(&cli.config);
    let mut config = if config_path.exists() {
        AppConfig::from_file(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        AppConfig::default()
    };
    if let Some(ref data_dir) = cli.data_dir {
        config.data_dir = PathBuf::from(data_dir);
    }

    let storage = StorageConfig::new(config.data_dir.clone());

    match cli.command {
        Commands::Serve { host, port } => {
            let fetcher = Fetcher::new(FetcherConfig {
                cache_dir: storage.raw_dir(),
                cache_ttl: Duration::from_secs(config.fetch.cache_ttl_seconds),
                timeout: Duration::from_secs(config.fetch.timeout_seconds),
                ..Default::default()
            })?;

            let state = raidmeter::api::state::AppState {
                storage: Arc::new(storage),
                fetcher: Arc::new(fetcher),
            };
            let app = raidmeter::api::build_router(state);

            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }

        Commands::Analyze {
            path,
            percentile,
            metric,
            lower_is_better,
            w_pop,
            w_med,
            base_url,
        } => {
            let percentile = parse_percentile(&percentile)
                .with_context(|| format!("Invalid percentile: {}", percentile))?;
            let metric: Metric = metric
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;

            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {:?}", path))?;

            let raw: Vec<RawRow> = if path.extension().and_then(|e| e.to_str()) == Some("json") {
                serde_json::from_str(&content).context("Failed to parse JSON rows")?
            } else {
                let base = Url::parse(&base_url).context("Invalid base URL")?;
                extract_meter_rows(&content, &base)?
            };

            let total_raw = raw.len();
            let rows = resolve_rows(raw);
            let dropped = total_raw - rows.len();
            if dropped > 0 {
                tracing::info!("Dropped {} row(s) without a resolvable spec icon", dropped);
            }

            let agg = aggregate(&rows, AggregateOptions { percentile });
            let opts = ScoreOptions {
                metric,
                lower_is_better,
                w_pop,
                w_med,
            };
            let ranked = score_specs(&agg.spec_stats, opts);

            println!("\n=== Sample ===");
            match agg.threshold {
                Some(t) => println!(
                    "{}/{} rows at or above threshold {:.2} (p={})",
                    agg.sample_size, agg.total, t, percentile
                ),
                None => println!("{}/{} rows (full sample)", agg.sample_size, agg.total),
            }

            println!("\n=== Class stats ===");
            println!("{:<12} {:>5} {:>12} {:>12}", "Class", "count", "avg", "median");
            for c in &agg.class_stats {
                println!(
                    "{:<12} {:>5} {:>12.2} {:>12.2}",
                    c.class_name, c.count, c.avg, c.median
                );
            }

            println!("\n=== Spec stats ===");
            println!(
                "{:<12} {:<24} {:>5} {:>12} {:>12}",
                "Class", "Spec", "count", "avg", "median"
            );
            for s in &agg.spec_stats {
                println!(
                    "{:<12} {:<24} {:>5} {:>12.2} {:>12.2}",
                    s.class_name, s.spec_name, s.count, s.avg, s.median
                );
            }

            print_tier_list(&ranked);
        }

        Commands::Deaths => {
            let store = read_store(&storage)?;
            let ranking = merge_deaths(&store.logs, &store.exclusions);

            if ranking.is_empty() {
                println!("No logs uploaded yet.");
                return Ok(());
            }

            println!(
                "=== Death ranking ({} players, {} logs) ===\n",
                ranking.len(),
                store.logs.len()
            );
            println!(
                "{:>4} {:<20} {:<10} {:>8} {:>6} {:>8}",
                "#", "Player", "Class", "deaths", "logs", "per log"
            );
            for p in &ranking {
                let per_log = if p.logs > 0 {
                    p.deaths / p.logs as f64
                } else {
                    0.0
                };
                println!(
                    "{:>4} {:<20} {:<10} {:>8} {:>6} {:>8.1}",
                    p.rank, p.name, p.class.class_name, p.deaths, p.logs, per_log
                );
            }
        }

        Commands::Exclude { name, remove } => {
            let name = clean_player_name(&name);
            if name.is_empty() {
                anyhow::bail!("Provide a player name.");
            }

            let mut store = read_store(&storage)?;
            if remove {
                let key = name.to_lowercase();
                let before = store.exclusions.len();
                store.exclusions.retain(|x| x.trim().to_lowercase() != key);
                if store.exclusions.len() == before {
                    println!("Not in the exclusion list: {}", name);
                } else {
                    write_store(&storage, &store)?;
                    println!("Removed exclusion: {}", name);
                }
            } else if is_auto_excluded(&name) {
                println!("{} is already covered by the built-in exclusion list.", name);
            } else if store.has_exclusion(&name) {
                println!("Already excluded: {}", name);
            } else {
                store.exclusions.push(name.clone());
                write_store(&storage, &store)?;
                println!("Excluded: {}", name);
            }
        }
    }

    Ok(())
}

/// Print the ranked specs grouped by tier.
fn print_tier_list(ranked: &[ScoredSpec]) {
    println!("\n=== Tier list ===");
    for tier in [Tier::S, Tier::A, Tier::B, Tier::C, Tier::D] {
        let members: Vec<&ScoredSpec> = ranked.iter().filter(|s| s.tier == tier).collect();
        println!("[{}] ({})", tier, members.len());
        for m in members {
            println!(
                "  #{:<3} {} {} — score {:.3}, {:.1}% of sample, median {:.1}",
                m.rank,
                m.stat.class_name,
                m.stat.spec_name,
                m.score,
                m.popularity * 100.0,
                m.stat.median
            );
        }
    }
}
