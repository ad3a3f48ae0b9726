//! CLI entry point for the train tracker.
//!
//! Serves the aggregated MTA feed data over HTTP, or runs a single
//! aggregate cycle / feed decode from the command line.

use std::ffi::OsStr;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use train_tracker::{
    aggregate::Aggregator,
    fetch::{BasicClient, FetchConfig, fetch_bytes},
    output::{print_summary, to_json, write_json},
    parser::parse_feed,
    records::project_feed,
    registry::SourceRegistry,
    server::{build_router, serve},
};

#[derive(Parser)]
#[command(name = "train_tracker")]
#[command(about = "Aggregates MTA GTFS-RT feeds into train arrival records", long_about = None)]
struct Cli {
    /// JSON file with an ordered list of sources; defaults to MTA lines from the environment
    #[arg(long, global = true, value_name = "FILE")]
    sources: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,

    /// Connect timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    connect_timeout_secs: u64,

    /// Maximum concurrent feed fetches (0 = one per source)
    #[arg(long, global = true, default_value_t = 0)]
    concurrency: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 3000)]
        port: u16,

        /// Directory of static files served for unmatched paths
        #[arg(long, default_value = "public")]
        static_dir: String,
    },
    /// Run one aggregate cycle and print or save the JSON result
    FetchAll {
        /// File to write the JSON array to instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Decode a single feed from a file or URL and print its records
    Inspect {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,
    },
    /// Show which sources have an endpoint configured
    ListSources,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/train_tracker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("train_tracker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let fetch_config = FetchConfig {
        timeout: Duration::from_secs(cli.timeout_secs),
        connect_timeout: Duration::from_secs(cli.connect_timeout_secs),
    };

    match cli.command {
        Commands::Serve { port, static_dir } => {
            let aggregator = build_aggregator(cli.sources.as_deref(), &fetch_config, cli.concurrency)?;

            let static_dir = Path::new(&static_dir);
            let static_dir = static_dir.is_dir().then_some(static_dir);
            if static_dir.is_none() {
                info!("Static directory not found, serving API routes only");
            }

            let router = build_router(aggregator, static_dir);
            serve(SocketAddr::from(([0, 0, 0, 0], port)), router).await?;
        }
        Commands::FetchAll { output } => {
            let aggregator = build_aggregator(cli.sources.as_deref(), &fetch_config, cli.concurrency)?;
            let results = aggregator.run().await;
            print_summary(&results);

            match output {
                Some(path) => write_json(&path, &results)?,
                None => println!("{}", to_json(&results)?),
            }
        }
        Commands::Inspect { source } => {
            let bytes = fetcher(&source, &fetch_config).await?;
            let feed = parse_feed(&bytes)?;
            let records = project_feed(&feed);

            info!(
                entities = feed.entity.len(),
                records = records.len(),
                "Feed decoded"
            );
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::ListSources => {
            let registry = load_registry(cli.sources.as_deref())?;
            for source in registry.iter() {
                info!(line = %source.name, configured = source.is_configured(), "Source");
            }

            let unconfigured = registry.iter().filter(|s| !s.is_configured()).count();
            info!(
                total = registry.len(),
                unconfigured,
                "Source list summary"
            );
        }
    }

    Ok(())
}

fn load_registry(path: Option<&str>) -> Result<SourceRegistry> {
    match path {
        Some(path) => SourceRegistry::load(path),
        None => SourceRegistry::from_env(),
    }
}

fn build_aggregator(
    sources: Option<&str>,
    fetch_config: &FetchConfig,
    concurrency: usize,
) -> Result<Aggregator> {
    let registry = load_registry(sources)?;
    let client = BasicClient::with_config(fetch_config)?;
    Ok(Aggregator::new(Arc::new(client), registry).with_concurrency(concurrency))
}

/// Loads feed data from a local file path or fetches it over HTTP.
#[tracing::instrument(skip(source, fetch_config), fields(source = %source))]
async fn fetcher(source: &str, fetch_config: &FetchConfig) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http") {
        let client = BasicClient::with_config(fetch_config)?;
        fetch_bytes(&client, source).await?.to_vec()
    } else {
        std::fs::read(source)?
    };
    Ok(bytes)
}
