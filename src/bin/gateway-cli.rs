use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use rocket_gateway::auth::issue_token;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Development CLI for the Rocket API gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint a signed bearer token for local testing
    Token {
        #[arg(long, env = "JWT_SECRET")]
        secret: String,
        #[arg(long)]
        user_id: String,
        #[arg(long, default_value_t = 3600)]
        ttl_secs: u64,
    },
    /// Check dependency health
    Health,
    /// Call the public ping endpoint
    Ping,
    /// Show the identity behind a token
    Me {
        #[arg(long)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Token { secret, user_id, ttl_secs } => {
            let token = issue_token(&secret, &user_id, Duration::from_secs(ttl_secs))?;
            println!("{}", token);
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Ping => {
            let res = client.get(format!("{}/api/v1/ping", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Me { token } => {
            let mut headers = HeaderMap::new();
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
            let res = client.get(format!("{}/api/v1/me", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let body = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&body) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => body,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("Response: {}", rendered);
    }
    Ok(())
}
