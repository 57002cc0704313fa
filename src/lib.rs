pub mod downloader;

pub use downloader::{
    DownloadEvent, DownloadOrchestrator, HttpTransfer, JsonHistoryStore, MetadataPipeline,
    OrchestratorConfig, ProgressEmitter, ResolverConfig, VideoMetadata,
};

/// Install the global logger. RUST_LOG still wins over the default level.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
