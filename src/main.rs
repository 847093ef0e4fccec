use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soulbrowser_content::{serve_lines, ContentConfig, ContentHost};

/// SoulBrowser content host - in-page automation engine
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "human")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve newline-delimited JSON requests on stdin/stdout
    Serve {
        /// Document fixture to host (overrides configuration)
        #[arg(long, value_name = "FILE")]
        document: Option<PathBuf>,
    },

    /// Send one request and print its reply
    Send {
        /// Request message as JSON, e.g. '{"type":"content-script-exists"}'
        message: String,

        /// Document fixture to host (overrides configuration)
        #[arg(long, value_name = "FILE")]
        document: Option<PathBuf>,

        /// How long to wait for a reply
        #[arg(long, default_value_t = 15_000)]
        timeout_ms: u64,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.log_level, cli.debug, &cli.log_format) {
        eprintln!("Failed to initialize logging: {err:#}");
        std::process::exit(1);
    }

    if let Err(err) = run(cli).await {
        error!("Command failed: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ContentConfig::load(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { document } => {
            if document.is_some() {
                config.document = document;
            }
            cmd_serve(config).await
        }
        Commands::Send {
            message,
            document,
            timeout_ms,
        } => {
            if document.is_some() {
                config.document = document;
            }
            cmd_send(config, &message, Duration::from_millis(timeout_ms)).await
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => {
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

async fn cmd_serve(config: ContentConfig) -> Result<()> {
    let host = ContentHost::from_config(&config).context("Failed to start content host")?;
    info!("Serving requests on stdin");

    let stats = serve_lines(
        host.dispatcher().clone(),
        host.subscribe(),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;
    host.shutdown();

    info!(
        received = stats.received,
        answered = stats.answered,
        unanswered = stats.unanswered,
        malformed = stats.malformed,
        "Input closed"
    );
    Ok(())
}

async fn cmd_send(config: ContentConfig, message: &str, limit: Duration) -> Result<()> {
    let message: Value = serde_json::from_str(message).context("Message is not valid JSON")?;
    let host = ContentHost::from_config(&config).context("Failed to start content host")?;
    let mut notifications = host.subscribe();
    let (client, listener, _handle) = host.connect();

    let reply = client.send_with_timeout(message, limit).await;
    while let Ok(notification) = notifications.try_recv() {
        println!("{}", serde_json::to_string(&notification)?);
    }

    match reply {
        Ok(Ok(data)) => {
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
        Ok(Err(reason)) => bail!("Request rejected: {reason}"),
        Err(err) => {
            host.shutdown();
            bail!("No reply ({err}); {} request(s) left unanswered", listener.parked())
        }
    }
}

fn init_logging(level: &str, debug: bool, format: &LogFormat) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    // stdout carries protocol frames, so logs go to stderr.
    match format {
        LogFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    Ok(())
}
