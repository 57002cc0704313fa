// Blocking diagnostics - reads upstream error payloads
//
// Separates "the upstream refused us" (anti-automation, rate limits, 403)
// from "the video itself is the problem" (private, removed, age-gated).
// Only the former lets the pipeline fall back to another source.

use serde::{Deserialize, Serialize};

/// Reasons an upstream error payload may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockingReason {
    /// HTTP 403 Forbidden - general access denied
    Http403Forbidden,

    /// PO Token (Proof of Origin) required
    PoTokenRequired,

    /// Rate limiting (429 or similar)
    RateLimited,

    /// Bot detection / captcha challenge
    BotDetection,

    /// Age-restricted content requiring login
    AgeRestricted,

    /// Private video requiring authorization
    PrivateVideo,

    /// Video deleted or unavailable
    VideoUnavailable,

    /// Geographic restriction
    GeoBlocked,
}

impl BlockingReason {
    /// Whether the upstream blocked the request rather than rejecting the video
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::Http403Forbidden | Self::PoTokenRequired | Self::RateLimited | Self::BotDetection
        )
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::PoTokenRequired => "Proof of Origin token required",
            Self::RateLimited => "Rate limited by YouTube",
            Self::BotDetection => "Bot detection triggered",
            Self::AgeRestricted => "Age-restricted content",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::GeoBlocked => "Geographic restriction",
        }
    }
}

/// Analyze an upstream error message together with its HTTP status
pub fn diagnose_error(status: u16, message: &str) -> Option<BlockingReason> {
    let lower = message.to_lowercase();

    // Resource-level reasons win: a private video stays private behind any proxy

    if lower.contains("private video")
        || lower.contains("video is private")
        || lower.contains("sign in if you've been granted access")
    {
        return Some(BlockingReason::PrivateVideo);
    }

    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("this video is no longer available")
        || lower.contains("video is unavailable")
    {
        return Some(BlockingReason::VideoUnavailable);
    }

    if lower.contains("age-restricted")
        || lower.contains("sign in to confirm your age")
        || lower.contains("age_verification")
    {
        return Some(BlockingReason::AgeRestricted);
    }

    if lower.contains("not available in your country")
        || lower.contains("blocked in your country")
        || lower.contains("geographic restriction")
    {
        return Some(BlockingReason::GeoBlocked);
    }

    // Upstream refusing automated access

    if lower.contains("po token") || lower.contains("proof of origin") {
        return Some(BlockingReason::PoTokenRequired);
    }

    if status == 429
        || lower.contains("429")
        || lower.contains("rate limit")
        || lower.contains("too many requests")
    {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("not a bot")
        || lower.contains("bot detection")
        || lower.contains("captcha")
        || lower.contains("unusual traffic")
        || lower.contains("automated")
    {
        return Some(BlockingReason::BotDetection);
    }

    if status == 403 || lower.contains("http error 403") || lower.contains("forbidden") {
        return Some(BlockingReason::Http403Forbidden);
    }

    None
}

/// Shortcut used by response negotiation
pub fn blocking_reason(status: u16, message: &str) -> Option<BlockingReason> {
    diagnose_error(status, message).filter(BlockingReason::is_blocking)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_check_is_blocking() {
        let error = "ERROR: [youtube] dQw4w9WgXcQ: Sign in to confirm you're not a bot";
        assert_eq!(diagnose_error(500, error), Some(BlockingReason::BotDetection));
        assert!(blocking_reason(500, error).is_some());
    }

    #[test]
    fn test_403_detection() {
        assert_eq!(
            diagnose_error(500, "ERROR: HTTP Error 403: Forbidden"),
            Some(BlockingReason::Http403Forbidden)
        );
        assert_eq!(diagnose_error(403, ""), Some(BlockingReason::Http403Forbidden));
    }

    #[test]
    fn test_rate_limit_detection() {
        assert_eq!(diagnose_error(429, ""), Some(BlockingReason::RateLimited));
        assert_eq!(
            diagnose_error(500, "HTTP Error 429: Too Many Requests"),
            Some(BlockingReason::RateLimited)
        );
    }

    #[test]
    fn test_po_token_detection() {
        let error = "mweb client https formats require a GVS PO Token";
        assert_eq!(diagnose_error(500, error), Some(BlockingReason::PoTokenRequired));
    }

    #[test]
    fn test_resource_reasons_are_not_blocking() {
        let private = "ERROR: Private video. Sign in if you've been granted access";
        assert_eq!(diagnose_error(403, private), Some(BlockingReason::PrivateVideo));
        assert!(blocking_reason(403, private).is_none());

        let gone = "ERROR: Video unavailable";
        assert_eq!(diagnose_error(404, gone), Some(BlockingReason::VideoUnavailable));
        assert!(blocking_reason(404, gone).is_none());

        assert!(blocking_reason(500, "Sign in to confirm your age").is_none());
    }

    #[test]
    fn test_plain_errors_have_no_reason() {
        assert_eq!(diagnose_error(400, "No URL provided"), None);
        assert_eq!(diagnose_error(500, "Unsupported URL: https://example.com"), None);
    }
}
