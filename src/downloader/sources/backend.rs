// Backend source - the authoritative extraction service
//
// POST {api_base}/api/extract with {"url": <raw input>}, JSON back.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::negotiate::classify_response;
use crate::downloader::config::ResolverConfig;
use crate::downloader::errors::SourceFailure;
use crate::downloader::models::{Descriptive, VideoMetadata};
use crate::downloader::traits::{LookupRequest, MetadataSource};
use crate::downloader::utils;

/// Backends send either preformatted text or raw numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(f64),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackendRecord {
    #[serde(default)]
    id: Option<String>,
    title: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    duration: Option<TextOrNumber>,
    #[serde(default)]
    views: Option<TextOrNumber>,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

/// HTTP client for the extraction backend
pub struct BackendSource {
    client: reqwest::Client,
    extract_url: String,
}

impl BackendSource {
    pub fn new(config: &ResolverConfig) -> Result<Self, SourceFailure> {
        let client = utils::build_http_client(config.timeout(), config.proxy.as_deref())
            .map_err(|e| SourceFailure::TransportFailure(format!("HTTP client: {}", e)))?;
        Ok(Self::with_client(client, config.extract_url()))
    }

    pub fn with_client(client: reqwest::Client, extract_url: String) -> Self {
        Self {
            client,
            extract_url,
        }
    }

    /// Turn a successful payload into a record
    fn parse_record(payload: Value, request: LookupRequest<'_>) -> Result<VideoMetadata, SourceFailure> {
        let record: BackendRecord = serde_json::from_value(payload)
            .map_err(|e| SourceFailure::MalformedBody(format!("Unexpected metadata shape: {}", e)))?;

        if let Some(backend_id) = record.id.as_deref() {
            if backend_id != request.id.as_str() {
                log::debug!(
                    "[Backend] Backend id {} differs from canonical id {}, keeping canonical",
                    backend_id,
                    request.id
                );
            }
        }

        let duration = match record.duration {
            Some(TextOrNumber::Text(s)) => s,
            Some(TextOrNumber::Number(n)) => utils::format_duration(n.max(0.0) as u64),
            None => "0:00".to_string(),
        };
        let views = match record.views {
            Some(TextOrNumber::Text(s)) => s,
            Some(TextOrNumber::Number(n)) => utils::format_views(n.max(0.0) as u64),
            None => "N/A".to_string(),
        };
        let channel = record
            .channel
            .or(record.uploader)
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        let mut meta = VideoMetadata::from_descriptive(
            request.id.clone(),
            Descriptive {
                title: record.title,
                channel,
                duration,
                views,
            },
            request.input,
        );
        if let Some(thumb) = record.thumbnail_url.filter(|t| !t.trim().is_empty()) {
            meta.thumbnail_url = thumb;
        }
        Ok(meta)
    }
}

#[async_trait]
impl MetadataSource for BackendSource {
    fn name(&self) -> &'static str {
        "backend"
    }

    async fn fetch(&self, request: LookupRequest<'_>) -> Result<VideoMetadata, SourceFailure> {
        log::debug!("[Backend] POST {} for {}", self.extract_url, request.id);

        let response = self
            .client
            .post(&self.extract_url)
            .json(&serde_json::json!({ "url": request.input }))
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| SourceFailure::TransportFailure(format!("Reading body: {}", e)))?;

        let payload = classify_response(status, content_type.as_deref(), &body)?;
        Self::parse_record(payload, request)
    }
}
