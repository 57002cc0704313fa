// Response negotiation for JSON metadata endpoints
//
// Order matters: content type is checked before the body is touched,
// the body is parsed before the status is judged.

use serde_json::Value;

use super::diagnostics::blocking_reason;
use crate::downloader::errors::SourceFailure;

/// Whether a Content-Type header declares JSON
pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    let Some(value) = content_type else {
        return false;
    };
    let mime = value
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

/// Pull a readable message out of an error payload
fn error_message(status: u16, payload: &Value) -> String {
    payload
        .get("error")
        .or_else(|| payload.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Failed to extract metadata")
                .to_string()
        })
}

/// Classify a completed HTTP exchange
pub fn classify_response(
    status: u16,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Value, SourceFailure> {
    if !is_json_content_type(content_type) {
        return Err(SourceFailure::UnexpectedContentType {
            status,
            content_type: content_type.map(str::to_string),
        });
    }

    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| SourceFailure::MalformedBody(format!("Invalid JSON: {}", e)))?;

    if !(200..300).contains(&status) {
        let message = error_message(status, &payload);
        if let Some(reason) = blocking_reason(status, &message) {
            return Err(SourceFailure::UpstreamBlocked {
                status,
                reason: format!("{}: {}", reason.description(), message),
            });
        }
        return Err(SourceFailure::UpstreamError { status, message });
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_content_types() {
        assert!(is_json_content_type(Some("application/json")));
        assert!(is_json_content_type(Some("Application/JSON; charset=utf-8")));
        assert!(is_json_content_type(Some("application/problem+json")));
        assert!(!is_json_content_type(Some("text/html; charset=utf-8")));
        assert!(!is_json_content_type(None));
    }

    #[test]
    fn test_html_is_never_parsed() {
        // 200 with an HTML body, as served by a catch-all route
        let err = classify_response(200, Some("text/html"), b"<!doctype html>").unwrap_err();
        assert_eq!(
            err,
            SourceFailure::UnexpectedContentType {
                status: 200,
                content_type: Some("text/html".into())
            }
        );

        let err = classify_response(500, Some("text/html"), b"{\"error\":\"x\"}").unwrap_err();
        assert!(matches!(err, SourceFailure::UnexpectedContentType { status: 500, .. }));
    }

    #[test]
    fn test_missing_content_type_is_unexpected() {
        let err = classify_response(200, None, b"{}").unwrap_err();
        assert!(matches!(
            err,
            SourceFailure::UnexpectedContentType { content_type: None, .. }
        ));
    }

    #[test]
    fn test_bad_json_is_malformed() {
        let err = classify_response(200, Some("application/json"), b"{\"title\":").unwrap_err();
        assert!(matches!(err, SourceFailure::MalformedBody(_)));

        let err = classify_response(500, Some("application/json"), b"oops").unwrap_err();
        assert!(matches!(err, SourceFailure::MalformedBody(_)));
    }

    #[test]
    fn test_blocked_payload() {
        let body = br#"{"error":"Sign in to confirm you're not a bot"}"#;
        let err = classify_response(500, Some("application/json"), body).unwrap_err();
        match err {
            SourceFailure::UpstreamBlocked { status, reason } => {
                assert_eq!(status, 500);
                assert!(reason.contains("not a bot"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_resource_error_payload() {
        let body = br#"{"error":"Video unavailable"}"#;
        let err = classify_response(404, Some("application/json"), body).unwrap_err();
        assert_eq!(
            err,
            SourceFailure::UpstreamError {
                status: 404,
                message: "Video unavailable".into()
            }
        );
    }

    #[test]
    fn test_error_without_message_uses_status_text() {
        let err = classify_response(400, Some("application/json"), b"{}").unwrap_err();
        assert_eq!(
            err,
            SourceFailure::UpstreamError {
                status: 400,
                message: "Bad Request".into()
            }
        );
    }

    #[test]
    fn test_success_returns_payload() {
        let body = br#"{"title":"Never Gonna Give You Up"}"#;
        let payload = classify_response(200, Some("application/json"), body).unwrap();
        assert_eq!(payload["title"], "Never Gonna Give You Up");
    }
}
