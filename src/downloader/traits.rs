// Seams between the core and its collaborators

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::errors::SourceFailure;
use super::identifier::ResourceId;
use super::models::{DownloadProgress, HistoryItem, RetrievalReference, SessionState, VideoMetadata};

/// What every metadata source receives
#[derive(Debug, Clone, Copy)]
pub struct LookupRequest<'a> {
    /// Raw user input, forwarded to backends that re-parse it
    pub input: &'a str,
    pub id: &'a ResourceId,
}

/// Trait for metadata source implementations
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Name of the source (for logging)
    fn name(&self) -> &'static str;

    /// Resolve metadata for one video
    async fn fetch(&self, request: LookupRequest<'_>) -> Result<VideoMetadata, SourceFailure>;
}

/// Trait for the mechanism that actually moves the file
#[async_trait]
pub trait TransferHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Hand the reference over; the response body is not inspected
    async fn transfer(&self, reference: &RetrievalReference) -> Result<(), String>;
}

/// Events published by a download session, in order. Every event names the
/// session it belongs to; a replaced session may still finish in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    StateChanged {
        session_id: String,
        state: SessionState,
    },
    Progress {
        session_id: String,
        progress: DownloadProgress,
    },
    Completed {
        session_id: String,
        item: HistoryItem,
    },
    /// Finalize failed; carries user-facing text
    Aborted {
        session_id: String,
        message: String,
    },
    Cancelled {
        session_id: String,
    },
}

impl DownloadEvent {
    pub fn session_id(&self) -> &str {
        match self {
            Self::StateChanged { session_id, .. }
            | Self::Progress { session_id, .. }
            | Self::Completed { session_id, .. }
            | Self::Aborted { session_id, .. }
            | Self::Cancelled { session_id } => session_id,
        }
    }
}

/// Progress emitter helper
#[derive(Clone)]
pub struct ProgressEmitter {
    sender: Option<mpsc::UnboundedSender<DownloadEvent>>,
}

impl ProgressEmitter {
    pub fn new(sender: mpsc::UnboundedSender<DownloadEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Emitter that drops every event
    pub fn silent() -> Self {
        Self { sender: None }
    }

    /// Emitter plus the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DownloadEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit(&self, event: DownloadEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}
