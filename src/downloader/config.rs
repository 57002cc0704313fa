// Configuration for metadata resolution and download sessions

use std::ops::RangeInclusive;
use std::time::Duration;

/// Which primary failures may be masked by the synthesis source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Transport failures, HTML responses and blocked requests only
    #[default]
    BlockedOnly,
    /// Additionally fall back when a JSON body fails to parse
    AnyParseFailure,
}

/// What to do when a download is requested while another is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrentRequestPolicy {
    /// Refuse the new request with `DownloadError::SessionActive`
    Reject,
    /// Cancel the running session and start the new one
    #[default]
    Restart,
}

/// Configuration for the metadata pipeline
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Base URL of the extraction backend
    pub api_base: String,
    /// Path of the extract route on the backend
    pub extract_path: String,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    pub fallback_policy: FallbackPolicy,
    /// Generation endpoint base for the synthesis source
    pub synthesis_base: String,
    pub synthesis_model: String,
    /// Credential for the synthesis source; None forces the static record
    pub synthesis_api_key: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000".to_string(),
            extract_path: "/api/extract".to_string(),
            proxy: None,
            timeout_seconds: 15,
            fallback_policy: FallbackPolicy::BlockedOnly,
            synthesis_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            synthesis_model: "gemini-3-flash-preview".to_string(),
            synthesis_api_key: None,
        }
    }
}

impl ResolverConfig {
    /// Defaults overridden by YT_ULTRA_* and GEMINI_API_KEY / API_KEY
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base) = std::env::var("YT_ULTRA_API_BASE") {
            config.api_base = base;
        }
        if let Ok(proxy) = std::env::var("YT_ULTRA_PROXY") {
            if !proxy.trim().is_empty() {
                config.proxy = Some(proxy);
            }
        }
        if let Some(seconds) = std::env::var("YT_ULTRA_TIMEOUT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            config.timeout_seconds = seconds;
        }
        if let Ok(model) = std::env::var("YT_ULTRA_MODEL") {
            config.synthesis_model = model;
        }
        config.synthesis_api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());
        config
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }

    pub fn with_synthesis_base(mut self, base: impl Into<String>) -> Self {
        self.synthesis_base = base.into();
        self
    }

    pub fn with_synthesis_api_key(mut self, key: Option<String>) -> Self {
        self.synthesis_api_key = key;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_seconds))
    }

    pub fn extract_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            self.extract_path.trim_start_matches('/')
        )
    }
}

/// Non-empty range starting at 1 or more; a zero step would never reach 100
pub fn clamp_increment(increment: &RangeInclusive<u8>) -> RangeInclusive<u8> {
    let low = (*increment.start()).max(1);
    let high = (*increment.end()).max(low);
    low..=high
}

/// Configuration for simulated download sessions
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Timer period between progress ticks
    pub tick_interval: Duration,
    /// Progress added per tick, picked uniformly
    pub increment: RangeInclusive<u8>,
    /// A log line is appended each time progress crosses a multiple of this
    pub log_threshold: u8,
    /// Delay between the transfer hand-off and the history record
    pub settle_delay: Duration,
    pub concurrent_policy: ConcurrentRequestPolicy,
    /// Base URL for retrieval references
    pub retrieval_base: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(180),
            increment: 2..=9,
            log_threshold: 12,
            settle_delay: Duration::from_millis(500),
            concurrent_policy: ConcurrentRequestPolicy::Restart,
            retrieval_base: "http://localhost:5000".to_string(),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base) = std::env::var("YT_ULTRA_API_BASE") {
            config.retrieval_base = base;
        }
        config
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_increment(mut self, increment: RangeInclusive<u8>) -> Self {
        self.increment = clamp_increment(&increment);
        self
    }

    pub fn with_log_threshold(mut self, threshold: u8) -> Self {
        self.log_threshold = threshold.max(1);
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_concurrent_policy(mut self, policy: ConcurrentRequestPolicy) -> Self {
        self.concurrent_policy = policy;
        self
    }

    pub fn with_retrieval_base(mut self, base: impl Into<String>) -> Self {
        self.retrieval_base = base.into();
        self
    }
}
