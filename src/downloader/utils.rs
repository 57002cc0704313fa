// Helper functions shared by sources and the orchestrator

use std::time::Duration;

use reqwest::Url;

use super::identifier::ResourceId;
use super::models::{RetrievalReference, ThumbnailVariant};

const THUMBNAIL_HOST: &str = "https://img.youtube.com";

/// Build an HTTP client with timeout and optional proxy; no proxy means a direct connection
pub fn build_http_client(
    timeout: Duration,
    proxy: Option<&str>,
) -> Result<reqwest::Client, reqwest::Error> {
    let builder = reqwest::Client::builder().timeout(timeout);

    let builder = match proxy {
        Some(proxy_url) => match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => builder.proxy(proxy),
            Err(e) => {
                log::warn!("[Http] Invalid proxy URL {}: {}, using direct connection", proxy_url, e);
                builder
            }
        },
        None => builder.no_proxy(),
    };

    builder.build()
}

/// Deterministic thumbnail URL for a video id
pub fn thumbnail_url(id: &ResourceId, variant: ThumbnailVariant) -> String {
    format!("{}/vi/{}/{}.jpg", THUMBNAIL_HOST, id, variant.suffix())
}

/// Suggested file name for a downloaded thumbnail
pub fn thumbnail_file_name(id: &ResourceId, variant: ThumbnailVariant) -> String {
    format!("YT_Ultra_Thumb_{}_{}.jpg", id, variant.label())
}

/// Build the retrieval reference for a finished session
pub fn retrieval_reference(
    base_url: &str,
    id: &ResourceId,
    format: &str,
) -> Result<RetrievalReference, String> {
    let endpoint = format!("{}/api/download", base_url.trim_end_matches('/'));
    let url = Url::parse_with_params(&endpoint, &[("id", id.as_str()), ("format", format)])
        .map_err(|e| format!("Invalid retrieval endpoint {}: {}", endpoint, e))?;

    let format_slug: String = format
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    Ok(RetrievalReference {
        url: url.to_string(),
        file_name: format!("YT_Ultra_{}_{}.mp4", id, format_slug),
    })
}

/// Seconds to `m:ss`
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// View count with thousands separators, "N/A" for zero
pub fn format_views(views: u64) -> String {
    if views == 0 {
        return "N/A".to_string();
    }
    let digits = views.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
