use chrono::{DateTime, TimeDelta, Utc};
use clap::{Parser, Subcommand};
use reqwest::{StatusCode, Url};

use telemetry_core::{HeartbeatRequest, StatsResponse, UploadRequest};

#[derive(Parser, Debug)]
#[command(name = "telemetry", about = "Device telemetry CLI")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Telemetry server URL
    #[arg(short, long, default_value = "http://localhost:8080", env = "TELEMETRY_URL", global = true)]
    url: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Post a heartbeat for a device
    Heartbeat {
        device_id: String,
        /// RFC 3339 timestamp (defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Post an upload-time sample for a device
    Upload {
        device_id: String,
        #[arg(allow_negative_numbers = true)]
        upload_time: i64,
        /// RFC 3339 timestamp (defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Show uptime and average upload time for a device
    Stats { device_id: String },
    /// Post many heartbeats to one device concurrently and verify none are lost
    Flood {
        device_id: String,
        /// Number of concurrent heartbeats
        #[arg(short, long, default_value = "100")]
        count: u32,
    },
}

/// `{base}/devices/{id}/{endpoint}`, with the id escaped as a path segment.
fn device_url(base: &str, device_id: &str, endpoint: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("URL cannot be a base: {base}"))?
        .pop_if_empty()
        .extend(["devices", device_id, endpoint]);
    Ok(url)
}

/// Pass the response through if it has the expected status, otherwise fail
/// with the status and the server's message.
async fn expect_status(
    resp: reqwest::Response,
    expected: StatusCode,
) -> anyhow::Result<reqwest::Response> {
    let status = resp.status();
    if status == expected {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    anyhow::bail!("server returned {status}: {}", body.trim())
}

async fn fetch_stats(
    client: &reqwest::Client,
    base: &str,
    device_id: &str,
) -> anyhow::Result<StatsResponse> {
    let resp = client
        .get(device_url(base, device_id, "stats")?)
        .send()
        .await?;
    let stats = expect_status(resp, StatusCode::OK).await?.json().await?;
    Ok(stats)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = reqwest::Client::new();
    let base = args.url.as_str();

    match args.command {
        Commands::Heartbeat { device_id, at } => {
            let body = HeartbeatRequest {
                sent_at: at.unwrap_or_else(Utc::now),
            };
            let resp = client
                .post(device_url(base, &device_id, "heartbeat")?)
                .json(&body)
                .send()
                .await?;
            expect_status(resp, StatusCode::CREATED).await?;
            println!("Heartbeat recorded for {} at {}", device_id, body.sent_at.to_rfc3339());
        }
        Commands::Upload {
            device_id,
            upload_time,
            at,
        } => {
            let body = UploadRequest {
                sent_at: at.unwrap_or_else(Utc::now),
                upload_time,
            };
            let resp = client
                .post(device_url(base, &device_id, "stats")?)
                .json(&body)
                .send()
                .await?;
            expect_status(resp, StatusCode::CREATED).await?;
            println!("Upload sample {} recorded for {}", upload_time, device_id);
        }
        Commands::Stats { device_id } => {
            let stats = fetch_stats(&client, base, &device_id).await?;
            println!("Device {}", device_id);
            println!("══════════════════════════════");
            println!("  Uptime:          {:.2}%", stats.uptime);
            println!("  Avg upload time: {}", stats.avg_upload_time);
        }
        Commands::Flood { device_id, count } => {
            let url = device_url(base, &device_id, "heartbeat")?;
            let before = fetch_stats(&client, base, &device_id).await?;
            let start = Utc::now();

            println!("Posting {} concurrent heartbeats to {}...", count, device_id);
            let mut handles = Vec::with_capacity(count as usize);
            for i in 0..count {
                let client = client.clone();
                let url = url.clone();
                // One second apart so the span, and therefore uptime, is non-zero.
                let body = HeartbeatRequest {
                    sent_at: start + TimeDelta::seconds(i64::from(i)),
                };
                handles.push(tokio::spawn(async move {
                    match client.post(url).json(&body).send().await {
                        Ok(resp) => resp.status() == StatusCode::CREATED,
                        Err(_) => false,
                    }
                }));
            }

            let mut created = 0u32;
            for handle in handles {
                if handle.await.unwrap_or(false) {
                    created += 1;
                }
            }

            let after = fetch_stats(&client, base, &device_id).await?;
            println!("Flood");
            println!("══════════════════════════════");
            println!("  Created:     {}/{}", created, count);
            println!("  Uptime:      {:.2}% (was {:.2}%)", after.uptime, before.uptime);
            println!("  Avg upload:  {}", after.avg_upload_time);

            if created != count {
                anyhow::bail!("{} of {} heartbeats were rejected", count - created, count);
            }
        }
    }

    Ok(())
}
