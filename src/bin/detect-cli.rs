use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "detect-cli")]
#[command(about = "Client for the detection proxy and its admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Admin API key (Bearer token)
    #[arg(short, long, default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// Show the active origin/IP guard configuration
    Guard,
    /// Inspect result cache and rate-limit state
    Cache,
    /// Drop expired cache entries and rate-limit windows
    Purge,
    /// Submit text for detection
    Detect {
        /// Text to classify
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if !cli.key.is_empty() {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
        );
    }

    let res = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", base)).headers(headers).send().await?,
        Commands::Guard => client.get(format!("{}/admin/guard", base)).headers(headers).send().await?,
        Commands::Cache => client.get(format!("{}/admin/cache", base)).headers(headers).send().await?,
        Commands::Purge => {
            client
                .post(format!("{}/admin/cache/purge", base))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Detect { text, file } => {
            let text = match (text, file) {
                (_, Some(path)) => std::fs::read_to_string(path)?,
                (Some(text), None) => text,
                (None, None) => return Err("provide TEXT or --file".into()),
            };
            client
                .post(format!("{}/api/detect", base))
                .json(&json!({ "text": text }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let body = res.text().await?;

    match serde_json::from_str::<Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", body),
    }

    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        std::process::exit(1);
    }
    Ok(())
}
