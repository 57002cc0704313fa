// Default transfer handler: hit the retrieval endpoint over HTTP

use async_trait::async_trait;

use super::config::ResolverConfig;
use super::models::RetrievalReference;
use super::traits::TransferHandler;
use super::utils;

pub struct HttpTransfer {
    client: reqwest::Client,
}

impl HttpTransfer {
    pub fn new(config: &ResolverConfig) -> Result<Self, reqwest::Error> {
        let client = utils::build_http_client(config.timeout(), config.proxy.as_deref())?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TransferHandler for HttpTransfer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn transfer(&self, reference: &RetrievalReference) -> Result<(), String> {
        log::info!("[Transfer] GET {} as {}", reference.url, reference.file_name);
        let response = self
            .client
            .get(&reference.url)
            .send()
            .await
            .map_err(|e| format!("Could not reach retrieval endpoint: {}", e))?;
        log::debug!("[Transfer] Retrieval endpoint answered HTTP {}", response.status());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::test_support::{dead_endpoint, serve_once};

    #[tokio::test]
    async fn test_transfer_issues_get() {
        let (base, seen) = serve_once(200, Some("application/json"), r#"{"status":"Ready"}"#).await;
        let reference = RetrievalReference {
            url: format!("{}/api/download?id=dQw4w9WgXcQ&format=MP4+720p", base),
            file_name: "YT_Ultra_dQw4w9WgXcQ_MP4_720p.mp4".into(),
        };

        HttpTransfer::new(&ResolverConfig::default().with_timeout(5))
            .unwrap()
            .transfer(&reference)
            .await
            .unwrap();

        let seen = seen.await.unwrap();
        assert!(seen
            .head
            .starts_with("GET /api/download?id=dQw4w9WgXcQ&format=MP4+720p"));
    }

    #[tokio::test]
    async fn test_transfer_fails_when_unreachable() {
        let reference = RetrievalReference {
            url: format!("{}/api/download?id=x", dead_endpoint().await),
            file_name: "f.mp4".into(),
        };
        let err = HttpTransfer::new(&ResolverConfig::default().with_timeout(5))
            .unwrap()
            .transfer(&reference)
            .await
            .unwrap_err();
        assert!(err.starts_with("Could not reach retrieval endpoint"));
    }
}
