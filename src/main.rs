use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use yt_ultra_lib::downloader::models::{ThumbnailVariant, QUALITY_OPTIONS};
use yt_ultra_lib::downloader::utils;
use yt_ultra_lib::downloader::{
    DownloadEvent, DownloadOrchestrator, HistoryItem, HistoryStore, HttpTransfer,
    JsonHistoryStore, MetadataPipeline, OrchestratorConfig, ProgressEmitter, ResolverConfig,
    SessionState,
};

#[derive(Parser, Debug)]
#[command(name = "yt-ultra")]
#[command(about = "Resolve YouTube metadata and run a download session", long_about = None)]
struct Cli {
    /// YouTube URL or 11-character video id
    #[arg(value_name = "URL_OR_ID")]
    input: Option<String>,

    /// Format to download, e.g. "MP4 1080p" or "MP3 320kbps"
    #[arg(short, long)]
    format: Option<String>,

    /// Extraction backend base URL
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// SOCKS5/HTTP proxy for outbound requests
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// History file (defaults to the user data directory)
    #[arg(long, value_name = "FILE")]
    history_file: Option<PathBuf>,

    /// Print download history and exit
    #[arg(long)]
    history: bool,

    /// Remove every history entry and exit
    #[arg(long)]
    clear_history: bool,

    /// Remove one history entry by id and exit
    #[arg(long, value_name = "ID")]
    forget: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

fn format_timestamp(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| millis.to_string())
}

fn print_history(items: &[HistoryItem]) {
    if items.is_empty() {
        println!("No downloads yet.");
        return;
    }
    for item in items {
        println!(
            "{}  {}  {}  {}",
            item.id,
            format_timestamp(item.timestamp),
            item.format,
            item.title
        );
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    yt_ultra_lib::init_logging(cli.verbose);

    let history_path = match cli.history_file.clone() {
        Some(path) => path,
        None => match JsonHistoryStore::default_path() {
            Ok(path) => path,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
    };
    let history = match JsonHistoryStore::open(&history_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Could not load history from {}: {}", history_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if cli.clear_history {
        return match history.clear() {
            Ok(()) => {
                println!("History cleared.");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("{}", e);
                ExitCode::FAILURE
            }
        };
    }
    if let Some(id) = &cli.forget {
        return match history.remove(id) {
            Ok(true) => {
                println!("Removed {}.", id);
                ExitCode::SUCCESS
            }
            Ok(false) => {
                println!("No history entry {}.", id);
                ExitCode::FAILURE
            }
            Err(e) => {
                error!("{}", e);
                ExitCode::FAILURE
            }
        };
    }
    if cli.history {
        print_history(&history.items());
        return ExitCode::SUCCESS;
    }

    let Some(input) = cli.input.as_deref() else {
        eprintln!("Please provide a valid YouTube URL or ID.");
        return ExitCode::FAILURE;
    };

    let mut resolver_config = ResolverConfig::from_env();
    if let Some(base) = &cli.api_base {
        resolver_config = resolver_config.with_api_base(base.clone());
    }
    if cli.proxy.is_some() {
        resolver_config = resolver_config.with_proxy(cli.proxy.clone());
    }

    let pipeline = match MetadataPipeline::from_config(&resolver_config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("Could not build metadata sources: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Sources: {}", pipeline.source_names().join(" -> "));

    let metadata = match pipeline.resolve(input).await {
        Ok(metadata) => metadata,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    println!("{}", metadata.title);
    println!("  Channel:   {}", metadata.channel);
    println!("  Duration:  {}", metadata.duration);
    println!("  Views:     {}", metadata.views);
    println!("  Thumbnail: {}", metadata.thumbnail_url);
    println!("Thumbnails:");
    for variant in ThumbnailVariant::DOWNLOADABLE {
        println!(
            "  {:<4} {}  ->  {}",
            variant.label(),
            utils::thumbnail_url(&metadata.id, variant),
            utils::thumbnail_file_name(&metadata.id, variant)
        );
    }
    println!("Available formats:");
    for option in QUALITY_OPTIONS.iter() {
        let hd = if option.hd { " [HD]" } else { "" };
        println!("  {:<14} {:>9}{}", option.label(), option.size, hd);
    }

    let Some(format) = cli.format.as_deref() else {
        return ExitCode::SUCCESS;
    };

    let mut orchestrator_config = OrchestratorConfig::from_env();
    if let Some(base) = &cli.api_base {
        orchestrator_config = orchestrator_config.with_retrieval_base(base.clone());
    }
    let transfer = match HttpTransfer::new(&resolver_config) {
        Ok(transfer) => Arc::new(transfer),
        Err(e) => {
            error!("Could not build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (emitter, mut events) = ProgressEmitter::channel();
    let mut orchestrator =
        DownloadOrchestrator::new(orchestrator_config, transfer, history.clone(), emitter);

    let session_id = match orchestrator.request(Some(&metadata), format) {
        Ok(handle) => handle.session_id().to_string(),
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let printer = tokio::spawn(async move {
        let mut printed_logs = 0;
        while let Some(event) = events.recv().await {
            if event.session_id() != session_id {
                continue;
            }
            match event {
                DownloadEvent::Progress { progress, .. } => {
                    for line in progress.logs.iter().skip(printed_logs) {
                        println!("{}", line);
                    }
                    printed_logs = progress.logs.len();
                    println!("[{:>3}%] {}", progress.progress, progress.format);
                }
                DownloadEvent::StateChanged {
                    state: SessionState::Finalizing,
                    ..
                } => {
                    println!("Finalizing...");
                }
                DownloadEvent::StateChanged {
                    state: SessionState::Idle,
                    ..
                } => break,
                DownloadEvent::Completed { item, .. } => {
                    println!("Saved {} ({})", item.title, item.format);
                }
                DownloadEvent::Aborted { message, .. } => {
                    eprintln!("{}", message);
                    break;
                }
                DownloadEvent::Cancelled { .. } => break,
                DownloadEvent::StateChanged { .. } => {}
            }
        }
    });

    let outcome = orchestrator.wait().await;
    drop(orchestrator);
    let _ = printer.await;

    match outcome {
        Some(Ok(_)) => ExitCode::SUCCESS,
        Some(Err(e)) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
        None => ExitCode::FAILURE,
    }
}
