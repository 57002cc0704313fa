// Metadata pipeline with ordered fallback
//
// Sources are tried strictly in the order they were added, one at a time.
// Each attempt is reduced to a SourceOutcome; the loop only looks at the tag.

use super::backend::BackendSource;
use super::synthesis::SynthesisSource;
use crate::downloader::config::{FallbackPolicy, ResolverConfig};
use crate::downloader::errors::{Disposition, ResolveError, SourceFailure};
use crate::downloader::identifier;
use crate::downloader::models::VideoMetadata;
use crate::downloader::traits::{LookupRequest, MetadataSource};

/// Tagged result of one source attempt
#[derive(Debug)]
pub enum SourceOutcome {
    Ok(VideoMetadata),
    Retryable(SourceFailure),
    Fatal(SourceFailure),
}

impl SourceOutcome {
    pub fn classify(result: Result<VideoMetadata, SourceFailure>, policy: FallbackPolicy) -> Self {
        match result {
            Ok(meta) => Self::Ok(meta),
            Err(failure @ SourceFailure::MalformedBody(_))
                if policy == FallbackPolicy::AnyParseFailure =>
            {
                Self::Retryable(failure)
            }
            Err(failure) => match failure.disposition() {
                Disposition::Retryable => Self::Retryable(failure),
                Disposition::Fatal => Self::Fatal(failure),
            },
        }
    }
}

pub struct MetadataPipeline {
    sources: Vec<Box<dyn MetadataSource>>,
    policy: FallbackPolicy,
}

impl MetadataPipeline {
    pub fn new(policy: FallbackPolicy) -> Self {
        Self {
            sources: Vec::new(),
            policy,
        }
    }

    /// Backend first, synthesis second
    pub fn from_config(config: &ResolverConfig) -> Result<Self, SourceFailure> {
        let mut pipeline = Self::new(config.fallback_policy);
        pipeline.add_source(Box::new(BackendSource::new(config)?));
        pipeline.add_source(Box::new(SynthesisSource::new(config)?));
        Ok(pipeline)
    }

    pub fn add_source(&mut self, source: Box<dyn MetadataSource>) {
        self.sources.push(source);
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn resolve(&self, raw_input: &str) -> Result<VideoMetadata, ResolveError> {
        let input = raw_input.trim();
        if !identifier::looks_like_video_reference(input) {
            return Err(ResolveError::InvalidInput(input.to_string()));
        }

        let resolved = identifier::resolve_with_origin(input);
        if resolved.is_sentinel() {
            log::warn!(
                "[Pipeline] No video id found in {:?}, continuing with sentinel {}",
                input,
                resolved.id
            );
        }
        let request = LookupRequest {
            input,
            id: &resolved.id,
        };

        let mut last_failure = None;
        for source in &self.sources {
            log::info!("[Pipeline] Trying source: {}", source.name());

            match SourceOutcome::classify(source.fetch(request).await, self.policy) {
                SourceOutcome::Ok(mut meta) => {
                    log::info!("[Pipeline] ✓ {} resolved {}", source.name(), resolved.id);
                    meta.id = resolved.id.clone();
                    return Ok(meta.with_derived_thumbnail());
                }
                SourceOutcome::Retryable(failure) => {
                    log::warn!("[Pipeline] ✗ {} failed, falling back: {}", source.name(), failure);
                    last_failure = Some(failure);
                }
                SourceOutcome::Fatal(failure) => {
                    log::error!("[Pipeline] ✗ {} failed fatally: {}", source.name(), failure);
                    return Err(ResolveError::Extraction(failure));
                }
            }
        }

        Err(ResolveError::SourcesExhausted(last_failure.unwrap_or_else(|| {
            SourceFailure::TransportFailure("no metadata sources configured".to_string())
        })))
    }
}
