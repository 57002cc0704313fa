// Metadata sources
//
// - backend: the authoritative extraction service (JSON over HTTP)
// - synthesis: schema-constrained generation, never fails
// - pipeline: tries them in order and decides when to fall back

mod backend;
mod diagnostics;
mod negotiate;
mod pipeline;
mod synthesis;

pub use backend::BackendSource;
pub use diagnostics::{blocking_reason, diagnose_error, BlockingReason};
pub use negotiate::{classify_response, is_json_content_type};
pub use pipeline::{MetadataPipeline, SourceOutcome};
pub use synthesis::{static_descriptive, SynthesisSource};
