use std::io::Write;

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use serde_json::json;

use vigil_types::Violation;

#[derive(Parser)]
#[command(name = "vigil")]
struct Cli {
    /// Base URL of the violation service.
    #[arg(long, default_value = "http://localhost:3000")]
    api: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a detection report.
    Report {
        #[arg(long)]
        video_id: String,
        #[arg(long)]
        violation_type: String,
        #[arg(long, default_value_t = 0.9)]
        confidence: f64,
        #[arg(long)]
        speed: Option<f64>,
        #[arg(long)]
        plate: Option<String>,
        #[arg(long, default_value = "")]
        evidence: String,
        #[arg(long, default_value = "UNKNOWN")]
        vehicle_type: String,
        #[arg(long, default_value = "")]
        timestamp: String,
    },
    /// List all recorded violations, newest first.
    List,
    /// Approve a violation and download its challan PDF.
    Challan {
        id: i64,
        #[arg(long)]
        out: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Command::Report {
            video_id,
            violation_type,
            confidence,
            speed,
            plate,
            evidence,
            vehicle_type,
            timestamp,
        } => {
            let body = json!({
                "video_id": video_id,
                "violation_type": violation_type,
                "timestamp": timestamp,
                "confidence": confidence,
                "speed": speed,
                "vehicle_number": plate,
                "evidence_image": evidence,
                "vehicle_type": vehicle_type,
            });
            let resp = client
                .post(format!("{}/violations", cli.api))
                .json(&body)
                .send()
                .await?;
            if !resp.status().is_success() {
                anyhow::bail!("report rejected: {}", resp.text().await?);
            }
            let stored: Violation = resp.json().await?;
            println!("recorded violation {} ({})", stored.id, stored.violation_type);
        }
        Command::List => {
            let all: Vec<Violation> = client
                .get(format!("{}/violations", cli.api))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            for v in all {
                println!(
                    "{:>4}  {:<8}  {:<13}  {:<12}  {}",
                    v.id,
                    v.status.to_string(),
                    v.violation_type.to_string(),
                    v.vehicle_plate.as_deref().unwrap_or("UNKNOWN"),
                    v.video_id,
                );
            }
        }
        Command::Challan { id, out } => {
            let resp = client
                .post(format!("{}/violations/{id}/challan", cli.api))
                .send()
                .await?;
            if !resp.status().is_success() {
                anyhow::bail!("challan not issued: {}", resp.text().await?);
            }

            let out = out
                .or_else(|| attachment_filename(&resp))
                .unwrap_or_else(|| format!("Challan_{id}.pdf"));

            let mut file = std::fs::File::create(&out)?;
            let mut stream = resp.bytes_stream();
            while let Some(chunk) = stream.next().await {
                file.write_all(&chunk?)?;
            }
            println!("challan saved to {out}");
        }
    }

    Ok(())
}

/// Pull the server-derived name out of `Content-Disposition`, if present.
fn attachment_filename(resp: &reqwest::Response) -> Option<String> {
    let value = resp
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)?
        .to_str()
        .ok()?;
    let name = value.split("filename=").nth(1)?.trim_matches('"');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
