// Common data models for metadata resolution and downloads

use serde::{Deserialize, Serialize};

use super::identifier::ResourceId;
use super::utils;

/// One resolved video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub id: ResourceId,
    pub title: String,
    pub channel: String,
    pub duration: String,
    pub views: String,
    pub thumbnail_url: String,
    /// User input as entered
    pub url: String,
}

/// The four descriptive fields every source must provide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptive {
    pub title: String,
    pub channel: String,
    pub duration: String,
    pub views: String,
}

impl VideoMetadata {
    pub fn from_descriptive(id: ResourceId, descriptive: Descriptive, url: &str) -> Self {
        Self {
            thumbnail_url: utils::thumbnail_url(&id, ThumbnailVariant::MaxRes),
            id,
            title: descriptive.title,
            channel: descriptive.channel,
            duration: descriptive.duration,
            views: descriptive.views,
            url: url.to_string(),
        }
    }

    /// Fill in the derived thumbnail when a source left it empty
    pub fn with_derived_thumbnail(mut self) -> Self {
        if self.thumbnail_url.trim().is_empty() {
            self.thumbnail_url = utils::thumbnail_url(&self.id, ThumbnailVariant::MaxRes);
        }
        self
    }
}

/// Thumbnail sizes published for every video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThumbnailVariant {
    Sd,
    Hq,
    Mq,
    MaxRes,
}

impl ThumbnailVariant {
    /// Variants offered for direct thumbnail download
    pub const DOWNLOADABLE: [ThumbnailVariant; 3] = [Self::Sd, Self::Hq, Self::MaxRes];

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Sd => "sddefault",
            Self::Hq => "hqdefault",
            Self::Mq => "mqdefault",
            Self::MaxRes => "maxresdefault",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sd => "SD",
            Self::Hq => "HD",
            Self::Mq => "MQ",
            Self::MaxRes => "Max",
        }
    }
}

/// Media kind of a quality option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

/// One entry of the offered quality catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityOption {
    pub kind: MediaKind,
    pub quality: &'static str,
    pub size: &'static str,
    pub hd: bool,
}

impl QualityOption {
    /// Format descriptor handed to the orchestrator, e.g. "MP4 1080p"
    pub fn label(&self) -> String {
        let container = match self.kind {
            MediaKind::Video => "MP4",
            MediaKind::Audio => "MP3",
        };
        format!("{} {}", container, self.quality)
    }
}

/// The closed set of formats offered to the user
pub const QUALITY_OPTIONS: [QualityOption; 8] = [
    QualityOption { kind: MediaKind::Video, quality: "144p", size: "2.4 MB", hd: false },
    QualityOption { kind: MediaKind::Video, quality: "360p", size: "12.8 MB", hd: false },
    QualityOption { kind: MediaKind::Video, quality: "720p", size: "48.2 MB", hd: true },
    QualityOption { kind: MediaKind::Video, quality: "1080p", size: "120.5 MB", hd: true },
    QualityOption { kind: MediaKind::Video, quality: "4K", size: "450.0 MB", hd: true },
    QualityOption { kind: MediaKind::Audio, quality: "128kbps", size: "4.2 MB", hd: false },
    QualityOption { kind: MediaKind::Audio, quality: "192kbps", size: "6.8 MB", hd: false },
    QualityOption { kind: MediaKind::Audio, quality: "320kbps", size: "11.5 MB", hd: true },
];

/// Look up an offered format by its label (case-insensitive)
pub fn find_quality(format: &str) -> Option<QualityOption> {
    let wanted = format.trim();
    QUALITY_OPTIONS
        .iter()
        .copied()
        .find(|q| q.label().eq_ignore_ascii_case(wanted))
}

/// Lifecycle state of a download session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Requested,
    Running,
    Finalizing,
    Complete,
    Aborted,
}

/// Snapshot of a running session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub format: String,
    /// 0..=100, never decreases within a session
    pub progress: u8,
    pub logs: Vec<String>,
    pub state: SessionState,
}

/// One finished download, as kept by the history store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    /// Session id, unrelated to the video id
    pub id: String,
    /// Unix milliseconds
    pub timestamp: i64,
    pub title: String,
    pub thumbnail: String,
    pub format: String,
}

/// What the finalize step hands to the transfer mechanism
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalReference {
    pub url: String,
    pub file_name: String,
}
