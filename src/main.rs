use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tvgrab::{
    config::Config,
    epg::{self, XmltvWriter},
    http::HttpClient,
    resolve::StreamResolver,
    server::{self, AppState, SigningKey},
};

#[derive(Parser)]
#[command(name = "tvgrab", version, about = "IPTV EPG grabber emitting XMLTV")]
struct Cli {
    /// Log level for tvgrab (overrides RUST_LOG).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Append logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Network hops allowed per stream URL.
    #[arg(long, global = true)]
    max_hops: Option<usize>,

    /// Stream URLs resolved at once.
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Build an XMLTV document from an EPG JSON file or URL.
    Build {
        /// Path or http(s) URL of the EPG JSON.
        #[arg(long)]
        epg: String,
        /// Output file; stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Extra hour shifts, e.g. `--shift 1,2`.
        #[arg(long = "shift", value_delimiter = ',', allow_negative_numbers = true)]
        shifts: Vec<i64>,
    },
    /// Resolve one stream URL and print the outcome as JSON.
    Resolve {
        url: String,
        #[arg(long)]
        base: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    let mut config = Config::from_env();
    if let Some(max_hops) = cli.max_hops {
        config.resolver.max_hops = max_hops.max(1);
    }
    if let Some(concurrency) = cli.concurrency {
        config.resolver.concurrency = concurrency.max(1);
    }

    match cli.command {
        Command::Serve { host, port } => {
            let addr = format!(
                "{}:{}",
                host.unwrap_or_else(|| config.host.clone()),
                port.unwrap_or(config.port)
            );
            tracing::info!("Starting tvgrab server on {}", addr);

            let state = AppState::new(&config, SigningKey::from_env())?;
            let app = server::create_router(state);

            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app).await?;
        }
        Command::Build {
            epg: source,
            output,
            shifts,
        } => {
            if !shifts.is_empty() {
                config.xmltv.shifts = shifts;
            }

            let client = HttpClient::new(config.resolver.hop_timeout)?;
            let resolver = StreamResolver::with_client(client.clone(), config.resolver.clone())?;
            let writer = XmltvWriter::new(config.xmltv.clone());

            let xml = epg::grab(&source, &client, &resolver, &writer)
                .await
                .with_context(|| format!("failed to build XMLTV from {}", source))?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, xml)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!("XMLTV written to {}", path.display());
                }
                None => println!("{}", xml),
            }
        }
        Command::Resolve { url, base } => {
            let base = base.as_deref().map(url::Url::parse).transpose()?;
            let resolver = StreamResolver::new(config.resolver.clone())?;
            let resolution = resolver.resolve(&url, base.as_ref()).await;
            println!("{}", serde_json::to_string_pretty(&resolution)?);
        }
    }

    Ok(())
}

fn init_logging(level: Option<&str>, file: Option<&Path>) -> anyhow::Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(format!("tvgrab={level},tower_http={level}"))
            .with_context(|| format!("invalid log level: {}", level))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "tvgrab=info,tower_http=info".into()),
    };

    let registry = tracing_subscriber::registry().with(filter);

    match file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            registry
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
    }

    Ok(())
}
