//! Command-line front end for the band site's event galleries.

mod config;

use clap::{Parser, Subcommand};
use drive_client::{DriveClient, DriveUrls};
use events::{default_events, generate_slug, load_stubs, EventCatalog, ResolvedEvent};
use gallery::{
    candidates_for, default_file_name, DownloadOutcome, Downloader, GalleryView,
    ReachabilityValidator, ValidationUpdate,
};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bandsite", author, version, about = "Band event photo galleries")]
struct Cli {
    /// Override log level (e.g. info, debug)
    #[arg(long)]
    log_level: Option<String>,
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// TOML file with [[events]] to use instead of the built-in list
    #[arg(long)]
    events_file: Option<PathBuf>,
    /// Images probed per validation batch
    #[arg(long)]
    batch_size: Option<usize>,
    /// Images revealed per scroll page
    #[arg(long)]
    page_size: Option<usize>,
    /// Timeout for a single image probe, in seconds
    #[arg(long)]
    probe_timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all events, newest first
    Events,
    /// Show one event and its resolved image URLs
    Event {
        /// Event slug, as printed by `events`
        slug: String,
    },
    /// Validate an event's images and show the gallery window
    Validate {
        slug: String,
        /// Number of scroll triggers to simulate after validation
        #[arg(long, default_value_t = 0)]
        pages: usize,
    },
    /// Download one validated image of an event
    Download {
        slug: String,
        /// Position of the image in the validated gallery
        index: usize,
        /// Destination file (defaults to foto-<millis>.jpg in the data dir)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Do not fall back to opening the image in a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Print the slug for a title
    Slug { title: String },
    /// Write the effective configuration to the config file
    InitConfig,
}

struct Context {
    cfg: config::AppConfig,
    client: DriveClient,
    urls: DriveUrls,
    catalog: EventCatalog,
}

impl Context {
    fn new(cfg: config::AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let stubs = match &cfg.events_file {
            Some(path) => load_stubs(path)?,
            None => default_events(),
        };
        let client = DriveClient::with_base_url(cfg.drive_api_key.clone(), cfg.drive_api_base.clone());
        if !client.has_api_key() {
            tracing::warn!("DRIVE_API_KEY is not set; galleries will be empty");
        }
        let urls = DriveUrls::with_base(&cfg.drive_web_base);
        Ok(Self {
            cfg,
            client,
            urls,
            catalog: EventCatalog::new(stubs),
        })
    }

    async fn event(&self, slug: &str) -> Option<ResolvedEvent> {
        self.catalog.initialize(&self.client, &self.urls).await;
        self.catalog.find_by_slug(slug)
    }

    fn validator(&self) -> ReachabilityValidator {
        ReachabilityValidator::with_timeout(
            self.urls.clone(),
            Duration::from_secs(self.cfg.probe_timeout_secs),
        )
            .batch_size(self.cfg.batch_size)
            .batch_delay(Duration::from_millis(self.cfg.batch_delay_ms))
    }

    /// Open `event` in a fresh view and drive validation to completion.
    async fn validated_view(&self, event: &ResolvedEvent, report: bool) -> GalleryView {
        let mut view = GalleryView::new(self.cfg.page_size);
        let generation = view.open(&event.id);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = self.validator().spawn(generation, candidates_for(event), tx);

        while let Some(update) = rx.recv().await {
            let first = matches!(update, ValidationUpdate::Batch { first: true, .. });
            view.apply(update);
            if report {
                let (checked, total) = view.progress();
                if total > 0 {
                    println!("{} of {} images verified", checked, total);
                }
                if first {
                    println!("First page ready: {} images", view.visible().len());
                }
            }
        }
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Validation task failed");
        }
        view
    }
}

fn print_event_summary(event: &ResolvedEvent) {
    println!("{} | {} | {}", event.slug(), event.date, event.title);
    println!("    {}", event.location);
    println!("    preview: {}", event.preview_image);
    println!("    images: {}", event.images.len());
}

#[cfg_attr(feature = "trace-spans", tracing::instrument)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = config::AppConfigOverrides {
        log_level: cli.log_level.clone(),
        events_file: cli.events_file.clone(),
        batch_size: cli.batch_size,
        page_size: cli.page_size,
        probe_timeout_secs: cli.probe_timeout_secs,
    };
    let cfg = config::AppConfig::load_from(cli.config.clone()).apply_overrides(&overrides);
    std::fs::create_dir_all(&cfg.data_dir)?;
    let file_appender = rolling::daily(&cfg.data_dir, "bandsite.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cfg.log_level.clone()))
        .with_writer(std::io::stderr.and(file_writer))
        .init();

    match cli.command {
        Commands::Slug { title } => {
            println!("{}", generate_slug(&title));
        }
        Commands::InitConfig => {
            let path = cfg.save_to(cli.config.clone())?;
            println!("Config written to {:?}", path);
        }
        Commands::Events => {
            let ctx = Context::new(cfg)?;
            ctx.catalog.initialize(&ctx.client, &ctx.urls).await;
            let events = ctx.catalog.sorted_newest_first();
            if events.is_empty() {
                println!("No events registered yet");
            }
            for event in &events {
                print_event_summary(event);
            }
        }
        Commands::Event { slug } => {
            let ctx = Context::new(cfg)?;
            let Some(event) = ctx.event(&slug).await else {
                println!("Event not found: {}", slug);
                return Ok(());
            };
            print_event_summary(&event);
            println!("    {}", event.description);
            for (i, url) in event.images.iter().enumerate() {
                println!("[{}] {}", i, url);
            }
        }
        Commands::Validate { slug, pages } => {
            let ctx = Context::new(cfg)?;
            let Some(event) = ctx.event(&slug).await else {
                println!("Event not found: {}", slug);
                return Ok(());
            };
            let mut view = ctx.validated_view(&event, true).await;
            for _ in 0..pages {
                view.load_more();
            }
            println!(
                "Validated {} images, showing {}",
                view.validated().len(),
                view.visible().len()
            );
            for url in view.visible() {
                println!("{}", url);
            }
        }
        Commands::Download {
            slug,
            index,
            out,
            no_browser,
        } => {
            let ctx = Context::new(cfg)?;
            let Some(event) = ctx.event(&slug).await else {
                println!("Event not found: {}", slug);
                return Ok(());
            };
            let mut view = ctx.validated_view(&event, false).await;
            if view.select_index(index).is_none() {
                println!(
                    "No image at index {} ({} validated images)",
                    index,
                    view.validated().len()
                );
                return Ok(());
            }
            let dest = out.unwrap_or_else(|| ctx.cfg.data_dir.join(default_file_name()));
            let mut downloader = Downloader::new(ctx.urls.clone());
            if no_browser {
                downloader = downloader.without_browser();
            }
            if let Some(result) = downloader.download_selected(&view, &dest).await {
                match result? {
                    DownloadOutcome::Saved(path) => println!("Saved to {:?}", path),
                    DownloadOutcome::OpenedExternally(url) => println!("Opened in browser: {}", url),
                }
            }
        }
    }

    Ok(())
}
