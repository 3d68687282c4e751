use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pixfetch::domain::entities::{ImageSource, ResourceId};
use pixfetch::domain::ports::{ResolutionContext, SizeHint};
use pixfetch::infrastructure::{
    AppConfig, CliArgs, DeliveryOutcome, DiskStore, HttpImageSource, ImagePipeline, LoadOutcome,
    StorageManager,
};
use pixfetch::presentation::Gallery;

const CELL_SIZE: u32 = 256;
const SCREEN_WIDTH: u32 = 1920;
const SCREEN_HEIGHT: u32 = 1080;

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    config.pipeline.validate()?;
    Ok(config)
}

fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read URL list {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn collect_urls(args: &CliArgs) -> Result<Vec<ResourceId>> {
    let mut urls = args.urls.clone();
    if let Some(input) = &args.input {
        urls.extend(read_url_list(input)?);
    }
    Ok(urls.into_iter().map(ResourceId::from).collect())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    info!(version = pixfetch::VERSION, "Starting {}", pixfetch::NAME);

    let urls = collect_urls(&args)?;
    if urls.is_empty() {
        warn!("No URLs given, nothing to load");
        return Ok(());
    }

    let source = Arc::new(HttpImageSource::new()?);
    let disk = Arc::new(DiskStore::new(config.pipeline.storage_locator()));
    let (pipeline, mut receiver) =
        ImagePipeline::new(config.pipeline.to_pipeline_config(), source, disk);

    let gallery = Gallery::new(
        urls,
        args.slots,
        SizeHint::exact(CELL_SIZE, CELL_SIZE),
        ResolutionContext::screen(SCREEN_WIDTH, SCREEN_HEIGHT),
    );

    let outcomes = gallery.bind_all(&pipeline);
    let mut summary: HashMap<ResourceId, String> = HashMap::new();
    let mut pending = 0usize;
    for (position, outcome) in outcomes.iter().enumerate() {
        let Some(id) = gallery.url(position) else {
            continue;
        };
        match outcome {
            LoadOutcome::MemoryHit => {
                summary.insert(id.clone(), format!("shown ({})", ImageSource::MemoryCache));
            }
            LoadOutcome::Queued => pending += 1,
            LoadOutcome::Rejected => {
                summary.insert(id.clone(), "rejected".to_string());
            }
        }
    }

    while pending > 0 {
        let Some(delivery) = receiver.recv().await else {
            break;
        };
        pending -= 1;
        let id = delivery.id.clone();
        let from = delivery
            .source
            .map_or_else(|| "-".to_string(), |source| source.to_string());
        let status = match delivery.apply() {
            DeliveryOutcome::Applied => format!("shown ({from})"),
            DeliveryOutcome::Stale => format!("loaded ({from}), slot reused"),
            DeliveryOutcome::Empty => "failed".to_string(),
        };
        summary.insert(id, status);
    }

    for position in 0..gallery.len() {
        if let Some(id) = gallery.url(position) {
            let status = summary.get(id).map_or("unknown", String::as_str);
            println!("{position:>4}  {status:<28} {id}");
        }
    }
    for (index, slot) in gallery.slots().iter().enumerate() {
        if let (Some(tag), Some(image)) = (slot.tag(), slot.image()) {
            println!("slot {index}: {}x{} {tag}", image.width(), image.height());
        }
    }
    println!("{}", pipeline.memory_cache().stats());
    info!(peak_workers = pipeline.worker_pool().peak_running(), "Finished");

    Ok(())
}
