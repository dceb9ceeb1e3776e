use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "asset-cli")]
#[command(about = "Management CLI for the asset-sender API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    #[arg(short, long, env = "ASSET_SENDER_API_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show API status and ledger counts
    Status,
    /// List exchange ledger entries
    Ledger,
    /// Show a wallet transaction
    Tx { txid: String },
    /// Trace the sender of a transaction
    Sender { txid: String },
    /// Classify a wallet transaction
    Classify { txid: String },
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

    let base = cli.url.trim_end_matches('/');
    let path = match &cli.command {
        Commands::Status => "/admin/status".to_string(),
        Commands::Ledger => "/admin/ledger".to_string(),
        Commands::Tx { txid } => format!("/api/transactions/{}", txid),
        Commands::Sender { txid } => format!("/api/transactions/{}/sender", txid),
        Commands::Classify { txid } => format!("/api/transactions/{}/classification", txid),
    };

    let res = client
        .get(format!("{}{}", base, path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
