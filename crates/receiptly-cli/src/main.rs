//! Receiptly command-line interface.
//!
//! - `serve` runs the HTTP API.
//! - `extract` runs the pipeline once on a local image.
//! - `invoke` feeds one gateway proxy event to the function face, for local testing.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use receiptly::{ExtractionPipeline, ExtractionResult, FunctionHandler, GatewayRequest, ServiceConfig, extract_file};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "receiptly")]
#[command(about = "Extract structured fields from receipt images")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    #[cfg(feature = "api")]
    Serve {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to a TOML or JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Extract fields from a local image file
    Extract {
        /// Image to extract from
        path: PathBuf,

        /// Path to a TOML or JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Run one gateway proxy event through the function handler
    Invoke {
        /// Event JSON file (reads stdin when omitted)
        event: Option<PathBuf>,

        /// Path to a TOML or JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json);

    match cli.command {
        #[cfg(feature = "api")]
        Commands::Serve { host, port, config } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            receiptly::api::serve_with_config(config).await?;
        }
        Commands::Extract { path, config, format } => {
            let config = load_config(config.as_deref())?;
            let pipeline = ExtractionPipeline::new(&config);
            let result = match extract_file(&pipeline, &path).await {
                Ok(result) => result,
                Err(receiptly::ReceiptlyError::Io(e)) => {
                    return Err(e).with_context(|| format!("Failed to read {}", path.display()));
                }
                Err(e) => receiptly::resolve_outcome(Err(e)).1,
            };
            print_result(&result, format)?;
            if !result.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Invoke { event, config } => {
            let config = load_config(config.as_deref())?;
            let raw = match event {
                Some(path) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read event file {}", path.display()))?,
                None => {
                    let mut raw = String::new();
                    tokio::io::stdin()
                        .read_to_string(&mut raw)
                        .await
                        .context("Failed to read event from stdin")?;
                    raw
                }
            };
            let request: GatewayRequest = serde_json::from_str(&raw).context("Invalid gateway event JSON")?;

            let handler = FunctionHandler::from_config(&config);
            let response = handler.handle(request).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.with_ansi(std::io::stderr().is_terminal()).init();
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<ServiceConfig> {
    ServiceConfig::load(path).context("Failed to load configuration")
}

fn print_result(result: &ExtractionResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Text => {
            println!("Status: {:?}", result.status);
            println!("Processed at: {}", result.processed_at.to_rfc3339());
            if let Some(message) = &result.error_message {
                println!("Error: {message}");
            }
            for warning in &result.warnings {
                println!("Warning: {warning}");
            }
            for (key, value) in &result.extracted_data {
                println!("{key}: {value}");
            }
        }
    }
    Ok(())
}
