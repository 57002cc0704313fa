// IdentifierResolver - turns free-form input into a canonical 11-character video id
//
// Never fails: unparseable input resolves to SENTINEL_ID so thumbnail and
// retrieval URLs can always be built. Callers check `ResolvedId::origin`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Id returned when nothing in the input looks like a video id
pub const SENTINEL_ID: &str = "dQw4w9WgXcQ";

/// Length of a canonical id
pub const ID_LEN: usize = 11;

lazy_static::lazy_static! {
    // youtu.be/ID, /v/ID, /vi/ID, /u/<user>/ID, /embed/ID, /shorts/ID, ?v=ID, &vi=ID
    static ref URL_SHAPE_RE: Regex = Regex::new(
        r"(?:youtu\.be/|/vi?/|/u/\w+/|/embed/|/shorts/|[?&]vi?=)([^#&?/\s]*)"
    ).unwrap();
    static ref LOOSE_TOKEN_RE: Regex = Regex::new(
        r"(?:^|[^A-Za-z0-9_-])([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)"
    ).unwrap();
    static ref BARE_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
}

/// Canonical video id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn sentinel() -> Self {
        Self(SENTINEL_ID.to_string())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which rule produced the id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdOrigin {
    /// Matched a known URL shape
    UrlShape,
    /// Found as a standalone 11-character token
    LooseToken,
    /// Nothing matched; the id is SENTINEL_ID
    Sentinel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedId {
    pub id: ResourceId,
    pub origin: IdOrigin,
}

impl ResolvedId {
    pub fn is_sentinel(&self) -> bool {
        self.origin == IdOrigin::Sentinel
    }
}

fn is_canonical(candidate: &str) -> bool {
    BARE_ID_RE.is_match(candidate)
}

/// Resolve input to a canonical id, reporting which rule matched
pub fn resolve_with_origin(input: &str) -> ResolvedId {
    let input = input.trim();

    // Structured URL shapes first
    for caps in URL_SHAPE_RE.captures_iter(input) {
        if let Some(m) = caps.get(1) {
            if is_canonical(m.as_str()) {
                return ResolvedId {
                    id: ResourceId(m.as_str().to_string()),
                    origin: IdOrigin::UrlShape,
                };
            }
        }
    }

    // Any standalone 11-character token
    if let Some(m) = LOOSE_TOKEN_RE.captures(input).and_then(|caps| caps.get(1)) {
        return ResolvedId {
            id: ResourceId(m.as_str().to_string()),
            origin: IdOrigin::LooseToken,
        };
    }

    ResolvedId {
        id: ResourceId::sentinel(),
        origin: IdOrigin::Sentinel,
    }
}

/// Resolve input to a canonical id
pub fn resolve(input: &str) -> ResourceId {
    resolve_with_origin(input).id
}

/// Cheap pre-network check: mentions a YouTube host or is a bare id
pub fn looks_like_video_reference(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return false;
    }
    let lower = trimmed.to_lowercase();
    lower.contains("youtube.com") || lower.contains("youtu.be") || is_canonical(trimmed)
}
