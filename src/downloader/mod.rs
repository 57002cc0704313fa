// Downloader module - metadata resolution, download sessions and history

pub mod config;
pub mod errors;
pub mod history;
pub mod identifier;
pub mod models;
pub mod orchestrator;
pub mod sources;
pub mod traits;
pub mod transfer;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use config::{ConcurrentRequestPolicy, FallbackPolicy, OrchestratorConfig, ResolverConfig};
pub use errors::{DownloadError, HistoryError, ResolveError, SourceFailure};
pub use history::{HistoryStore, JsonHistoryStore, MemoryHistoryStore, HISTORY_LIMIT};
pub use identifier::{ResolvedId, ResourceId};
pub use models::{
    DownloadProgress, HistoryItem, QualityOption, SessionState, VideoMetadata, QUALITY_OPTIONS,
};
pub use orchestrator::{DownloadOrchestrator, SessionHandle};
pub use sources::MetadataPipeline;
pub use traits::{DownloadEvent, MetadataSource, ProgressEmitter, TransferHandler};
pub use transfer::HttpTransfer;
