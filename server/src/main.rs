use anyhow::Context;
use backends::build_classifier;
use clap::Parser;
use log::info;
use rashtracore::detection::{ImageFrame, UploadContext};
use rashtracore::store::RecordStore;
use service::{Pipeline, ServiceConfig};
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;

mod backends;
mod http;
mod service;

#[derive(Parser)]
#[command(author, version, about = "RASHTRA road-damage detection service")]
struct Args {
    /// Load the service config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Address to listen on, overriding the config
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Directory uploads are written to, overriding the config
    #[arg(long)]
    upload_dir: Option<PathBuf>,
    /// Classify a single local image, print the record as JSON and exit
    #[arg(long)]
    offline: Option<PathBuf>,
    #[arg(long, requires = "offline")]
    lat: Option<String>,
    #[arg(long, requires = "offline")]
    lon: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match args.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    }
    .with_overrides(args.bind, args.upload_dir);

    // Built outside the runtime: blocking HTTP clients must not be dropped
    // from async context.
    let classifier = Arc::new(build_classifier(&config)?);
    info!(
        "classifier chain: {}",
        classifier
            .stages()
            .iter()
            .map(|stage| format!("{} (> {:.2})", stage.tag, stage.threshold))
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    if let Some(image_path) = args.offline {
        let frame = ImageFrame::load(&image_path)?;
        let context = UploadContext::new(args.lat, args.lon, image_path.display().to_string());
        let record = classifier.classify(&frame, context)?;
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    fs::create_dir_all(&config.upload_dir)
        .with_context(|| format!("creating upload dir {}", config.upload_dir.display()))?;

    let pipeline = Arc::new(Pipeline::new(
        classifier.clone(),
        Arc::new(RecordStore::new()),
        config.upload_dir.clone(),
    ));

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating server runtime")?;
    runtime.block_on(http::serve(pipeline, config.bind, config.max_upload_bytes))?;

    Ok(())
}
