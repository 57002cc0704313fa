// Error taxonomy for metadata resolution and download sessions

use thiserror::Error;

/// How the pipeline should react to a failed source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Source-level problem: try the next source
    Retryable,
    /// Resource-level problem: stop and report
    Fatal,
}

/// Classified failure of a single metadata source call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceFailure {
    /// Connection refused, DNS failure, timeout...
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// Response was not JSON (typically an HTML error page)
    #[error("Unexpected content type {content_type:?} (HTTP {status})")]
    UnexpectedContentType {
        status: u16,
        content_type: Option<String>,
    },

    /// Declared JSON but the body did not parse
    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    /// Upstream refused the request (bot check, rate limit, 403)
    #[error("Upstream blocked the request (HTTP {status}): {reason}")]
    UpstreamBlocked { status: u16, reason: String },

    /// Upstream reported a problem with the requested resource
    #[error("Upstream error (HTTP {status}): {message}")]
    UpstreamError { status: u16, message: String },
}

impl SourceFailure {
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::TransportFailure(_)
            | Self::UnexpectedContentType { .. }
            | Self::UpstreamBlocked { .. } => Disposition::Retryable,
            Self::MalformedBody(_) | Self::UpstreamError { .. } => Disposition::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.disposition() == Disposition::Retryable
    }
}

impl From<reqwest::Error> for SourceFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::TransportFailure(format!("timed out: {}", err));
        }
        if err.is_decode() {
            return Self::MalformedBody(err.to_string());
        }
        Self::TransportFailure(err.to_string())
    }
}

/// Error returned by the metadata pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Input rejected before any network call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A source reported a resource-level failure
    #[error("Extraction failed: {0}")]
    Extraction(SourceFailure),

    /// Every configured source failed with a retryable error
    #[error("All metadata sources failed, last error: {0}")]
    SourcesExhausted(SourceFailure),
}

impl ResolveError {
    /// Short text suitable for showing inline next to the input box
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(_) => "Please provide a valid YouTube URL or ID.".to_string(),
            Self::Extraction(SourceFailure::UpstreamError { message, .. }) => {
                format!("Extraction failed: {}", message)
            }
            Self::Extraction(_) => "Extraction failed: the backend returned an unreadable response."
                .to_string(),
            Self::SourcesExhausted(_) => "Backend connection timeout. Please try again.".to_string(),
        }
    }
}

/// Error raised by the download orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    #[error("No resolved metadata to download")]
    NoMetadata,

    #[error("A download session is already running")]
    SessionActive,

    #[error("Format not offered: {0}")]
    UnknownFormat(String),

    /// The transfer step after 100% failed
    #[error("Tunnel error: {0}")]
    FinalizeFailure(String),

    #[error("Download session was cancelled")]
    Cancelled,
}

/// Error raised by persisted history stores
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("History serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("No data directory available for history storage")]
    NoDataDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_level_failures_are_retryable() {
        assert!(SourceFailure::TransportFailure("refused".into()).is_retryable());
        assert!(SourceFailure::UnexpectedContentType {
            status: 200,
            content_type: Some("text/html".into())
        }
        .is_retryable());
        assert!(SourceFailure::UpstreamBlocked {
            status: 403,
            reason: "bot".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_resource_level_failures_are_fatal() {
        assert_eq!(
            SourceFailure::MalformedBody("eof".into()).disposition(),
            Disposition::Fatal
        );
        assert_eq!(
            SourceFailure::UpstreamError {
                status: 404,
                message: "Video unavailable".into()
            }
            .disposition(),
            Disposition::Fatal
        );
    }

    #[test]
    fn test_user_message_for_upstream_error() {
        let err = ResolveError::Extraction(SourceFailure::UpstreamError {
            status: 500,
            message: "Private video".into(),
        });
        assert_eq!(err.user_message(), "Extraction failed: Private video");
        assert_eq!(
            ResolveError::InvalidInput("x".into()).user_message(),
            "Please provide a valid YouTube URL or ID."
        );
    }
}
