use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Management CLI for the relay settings service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// Show stored settings (secrets redacted)
    Show,
    /// Show event relay status
    Relay,
    /// Run the live check for one broker field
    Check {
        /// Form field name, e.g. actionHubMqHost
        field: String,
        /// Value to check
        #[arg(default_value = "")]
        value: String,
    },
    /// Submit a settings form from a JSON file
    Submit {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)),
        Commands::Show => client.get(format!("{}/settings", cli.url)),
        Commands::Relay => client.get(format!("{}/relay/status", cli.url)),
        Commands::Check { field, value } => client
            .get(format!("{}/settings/check/{}", cli.url, field))
            .query(&[("value", value)]),
        Commands::Submit { file } => {
            let form: Value = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            client.post(format!("{}/settings", cli.url)).json(&form)
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: settings service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
