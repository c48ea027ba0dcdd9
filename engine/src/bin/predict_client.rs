// Sends one prediction request and prints the response.
//
// Usage:
//   predict-client                                  # reference payload to the local server
//   predict-client -f payload.json --show           # payload from file, echoed first
//   predict-client --envelope --url https://.../predict
//                                                   # wrap the payload as {"body": "<json>"}

use anyhow::Context;
use clap::Parser;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "predict-client")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Prediction endpoint URL
    #[arg(long, default_value = "http://localhost:8000/predict")]
    url: String,

    /// Path to a JSON file with the payload
    #[arg(short = 'f', long, value_name = "FILE", conflicts_with = "data")]
    payload_file: Option<PathBuf>,

    /// Inline JSON payload string
    #[arg(short, long)]
    data: Option<String>,

    /// Print the request payload before sending
    #[arg(long)]
    show: bool,

    /// Wrap the payload in a gateway envelope and always print the status
    #[arg(long)]
    envelope: bool,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,
}

fn reference_payload() -> Value {
    json!({
        "age": 21,
        "gender": "Female",
        "academic_level": "University",
        "avg_daily_usage_hours": 5.5,
        "most_used_platform": "Instagram",
        "sleep_hours_per_night": 6,
        "mental_health_score": 65,
        "conflicts_over_social_media": 3,
        "affects_academic_performance": "Yes",
        "relationship_status": "Single"
    })
}

fn load_payload(cli: &Cli) -> anyhow::Result<Value> {
    if let Some(path) = &cli.payload_file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return serde_json::from_str(&raw).context("payload file is not valid JSON");
    }
    if let Some(data) = &cli.data {
        return serde_json::from_str(data).context("--data is not valid JSON");
    }
    Ok(reference_payload())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let payload = match load_payload(&cli) {
        Ok(payload) => payload,
        Err(err) => {
            eprintln!("error: {:#}", err);
            return ExitCode::from(2);
        }
    };

    if cli.show {
        println!("Request payload:");
        println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    }

    let body = if cli.envelope {
        json!({ "body": payload.to_string() })
    } else {
        payload
    };

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout_secs))
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            eprintln!("Request failed: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let resp = match client.post(&cli.url).json(&body).send().await {
        Ok(resp) => resp,
        Err(err) => {
            println!("Request failed: {}", err);
            return ExitCode::from(if cli.envelope { 3 } else { 1 });
        }
    };

    let status = resp.status();
    if !cli.envelope && !status.is_success() {
        println!("Request failed: HTTP {}", status);
        if let Ok(text) = resp.text().await {
            println!("{}", text);
        }
        return ExitCode::FAILURE;
    }
    if cli.envelope {
        println!("Status: {}", status.as_u16());
    }

    let text = match resp.text().await {
        Ok(text) => text,
        Err(err) => {
            println!("Request failed: {}", err);
            return ExitCode::FAILURE;
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => println!(
            "{}",
            serde_json::to_string_pretty(&value).unwrap_or(text)
        ),
        Err(_) => println!("Non-JSON response:\n{}", text),
    }
    ExitCode::SUCCESS
}
