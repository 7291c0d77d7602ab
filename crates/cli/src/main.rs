mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::serve::ServeConfig;

/// Default listening port when neither --port nor PORT is set.
const DEFAULT_PORT: u16 = 4000;

/// Default upstream forecaster endpoint (the docker-compose service name).
const DEFAULT_FORECAST_URL: &str = "http://forecast:8000/forecast";

/// Default document-store file.
const DEFAULT_DATA_PATH: &str = "forecasts.jsonl";

/// Demandcast forecast relay.
#[derive(Parser)]
#[command(name = "demandcast", version, about = "Demandcast forecast relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP relay server
    Serve {
        /// Port to listen on (falls back to the PORT env var, then 4000)
        #[arg(long)]
        port: Option<u16>,
        /// Upstream forecaster URL (falls back to the FORECAST_URL env var)
        #[arg(long)]
        forecast_url: Option<String>,
        /// JSON-lines document-store path (falls back to DEMANDCAST_DATA)
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            forecast_url,
            data,
        } => {
            let port = match port {
                Some(p) => p,
                None => match std::env::var("PORT").ok() {
                    Some(raw) => match raw.parse::<u16>() {
                        Ok(p) => p,
                        Err(_) => {
                            eprintln!("error: PORT must be a number, got '{}'", raw);
                            process::exit(1);
                        }
                    },
                    None => DEFAULT_PORT,
                },
            };

            let forecast_url = forecast_url
                .or_else(|| std::env::var("FORECAST_URL").ok())
                .unwrap_or_else(|| DEFAULT_FORECAST_URL.to_string());

            let data = data
                .or_else(|| std::env::var("DEMANDCAST_DATA").ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

            let config = ServeConfig {
                port,
                forecast_url,
                data,
            };

            let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
            if let Err(e) = rt.block_on(serve::start_server(config)) {
                eprintln!("Server error: {}", e);
                process::exit(1);
            }
        }
    }
}
