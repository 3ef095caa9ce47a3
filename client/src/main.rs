use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::debug;
use rashtracore::detection::DetectionRecord;
use reqwest::{multipart, Client, Response};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about = "Talks to a running RASHTRA detection service")]
struct Args {
    /// Base URL of the service
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    server: String,
    /// Print raw JSON instead of a summary
    #[arg(long, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a photo for classification
    Upload {
        file: PathBuf,
        #[arg(long)]
        lat: Option<String>,
        #[arg(long)]
        lon: Option<String>,
    },
    /// Show accepted detections
    MainList,
    /// Show uploads no model could classify
    WaitingList,
    /// Show upload counters
    Stats,
}

fn endpoint(server: &str, path: &str) -> String {
    format!("{}/{}", server.trim_end_matches('/'), path.trim_start_matches('/'))
}

async fn ensure_success(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    bail!("{}: {}", status, text)
}

async fn upload_image(
    client: &Client,
    server: &str,
    file: &Path,
    lat: Option<String>,
    lon: Option<String>,
) -> anyhow::Result<DetectionRecord> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.jpg".into());

    let part = multipart::Part::bytes(bytes).file_name(file_name);
    let mut form = multipart::Form::new().part("file", part);
    if let Some(lat) = lat {
        form = form.text("lat", lat);
    }
    if let Some(lon) = lon {
        form = form.text("lon", lon);
    }

    let url = endpoint(server, "api/detect/smart");
    debug!("POST {}", url);
    let response = client
        .post(&url)
        .multipart(form)
        .send()
        .await
        .with_context(|| format!("sending upload to {}", url))?;
    ensure_success(response)
        .await?
        .json::<DetectionRecord>()
        .await
        .context("parsing detection record")
}

async fn fetch_json(client: &Client, url: &str) -> anyhow::Result<serde_json::Value> {
    debug!("GET {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("requesting {}", url))?;
    ensure_success(response)
        .await?
        .json()
        .await
        .with_context(|| format!("parsing response from {}", url))
}

fn summarize(record: &DetectionRecord) -> String {
    format!(
        "{}  {}  {:<12} {:.2}  {}  lat={} lon={}",
        record.id,
        record.time,
        record.label,
        record.confidence,
        record.model,
        record.lat.as_deref().unwrap_or("-"),
        record.lon.as_deref().unwrap_or("-"),
    )
}

fn print_records(value: serde_json::Value, raw: bool) -> anyhow::Result<()> {
    if raw {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    let records: Vec<DetectionRecord> =
        serde_json::from_value(value).context("parsing record list")?;
    if records.is_empty() {
        println!("(empty)");
    }
    for record in &records {
        println!("{}", summarize(record));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let client = Client::new();

    match args.command {
        Command::Upload { file, lat, lon } => {
            let record = upload_image(&client, &args.server, &file, lat, lon).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("{:?}: {}", record.status, summarize(&record));
            }
        }
        Command::MainList => {
            let value = fetch_json(&client, &endpoint(&args.server, "api/main-list")).await?;
            print_records(value, args.json)?;
        }
        Command::WaitingList => {
            let value = fetch_json(&client, &endpoint(&args.server, "api/waiting-list")).await?;
            print_records(value, args.json)?;
        }
        Command::Stats => {
            let value = fetch_json(&client, &endpoint(&args.server, "api/stats")).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rashtracore::detection::UploadContext;

    #[test]
    fn endpoint_joins_without_double_slashes() {
        assert_eq!(
            endpoint("http://127.0.0.1:5000/", "/api/main-list"),
            "http://127.0.0.1:5000/api/main-list"
        );
        assert_eq!(
            endpoint("http://host:1", "api/stats"),
            "http://host:1/api/stats"
        );
    }

    #[test]
    fn summary_marks_missing_coordinates() {
        let context =
            UploadContext::with_id("id-1".into(), Some("17.4".into()), None, "x.jpg".into());
        let record = context.unclassified("STREET".into());
        let line = summarize(&record);
        assert!(line.starts_with("id-1"));
        assert!(line.contains("Unknown"));
        assert!(line.contains("lat=17.4 lon=-"));
    }

    #[test]
    fn cli_parses_upload_subcommand() {
        let args = Args::try_parse_from([
            "rashtra-client",
            "--server",
            "http://10.0.0.2:5000",
            "upload",
            "road.jpg",
            "--lat",
            "17.4",
        ])
        .unwrap();
        assert_eq!(args.server, "http://10.0.0.2:5000");
        match args.command {
            Command::Upload { file, lat, lon } => {
                assert_eq!(file, PathBuf::from("road.jpg"));
                assert_eq!(lat.as_deref(), Some("17.4"));
                assert!(lon.is_none());
            }
            _ => panic!("expected upload"),
        }
    }
}
