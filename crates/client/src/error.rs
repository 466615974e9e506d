//! Error types for calls to the Upvote backend.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Decoded body of an error response.
///
/// The backend answers errors in three shapes: a JSON object whose values
/// are messages (`{"error": ..., "message": ...}` or a field → message map
/// from request validation), plain text, or nothing at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ErrorBody {
    /// No body.
    #[default]
    Empty,
    /// A plain-text message.
    Text(String),
    /// Key → message pairs, ordered by key.
    Fields(Vec<(String, String)>),
}

impl ErrorBody {
    /// Decode a raw response body.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::Empty;
        }

        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Object(map)) => Self::Fields(
                map.into_iter()
                    .filter_map(|(key, value)| match value {
                        serde_json::Value::Null => None,
                        serde_json::Value::String(s) => Some((key, s)),
                        other => Some((key, other.to_string())),
                    })
                    .collect(),
            ),
            Ok(serde_json::Value::String(s)) => Self::Text(s),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// Look up a single field of an object body.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Self::Fields(fields) => fields
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// The human-readable message: the `message` field of an object body,
    /// or the whole text of a plain body.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Text(text) => Some(text),
            Self::Fields(_) => self.field("message"),
        }
    }

    /// Every message in the body joined with `", "`.
    ///
    /// `None` for an empty body or an object without values.
    #[must_use]
    pub fn joined(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(text) => Some(text.clone()),
            Self::Fields(fields) if fields.is_empty() => None,
            Self::Fields(fields) => Some(
                fields
                    .iter()
                    .map(|(_, value)| value.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.joined() {
            Some(text) => f.write_str(&text),
            None => f.write_str("(no details)"),
        }
    }
}

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401: the credentials were rejected. The session has already been
    /// cleared by the time a caller sees this.
    #[error("authentication required: session expired or credentials rejected")]
    AuthExpired,

    /// 409: the request violates a one-time or uniqueness rule.
    #[error("conflict: {0}")]
    Conflict(ErrorBody),

    /// 404: the target does not exist (any more).
    #[error("not found: {0}")]
    NotFound(ErrorBody),

    /// Any other non-success status.
    #[error("request rejected ({status}): {body}")]
    Rejected {
        /// HTTP status returned.
        status: StatusCode,
        /// Decoded body.
        body: ErrorBody,
    },

    /// Transport failure (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A success response whose body could not be decoded.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// A request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The credential could not be encoded as a header.
    #[error("invalid credential header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl ApiError {
    /// Classify a non-success response.
    #[must_use]
    pub fn from_status(status: StatusCode, raw_body: &str) -> Self {
        let body = ErrorBody::parse(raw_body);
        match status {
            StatusCode::UNAUTHORIZED => Self::AuthExpired,
            StatusCode::CONFLICT => Self::Conflict(body),
            StatusCode::NOT_FOUND => Self::NotFound(body),
            _ => Self::Rejected { status, body },
        }
    }

    #[must_use]
    pub const fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }

    /// The decoded error body, for errors that carry one.
    #[must_use]
    pub const fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::Conflict(body) | Self::NotFound(body) | Self::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_body() {
        assert_eq!(ErrorBody::parse(""), ErrorBody::Empty);
        assert_eq!(ErrorBody::parse("  \n"), ErrorBody::Empty);
    }

    #[test]
    fn test_parse_plain_text() {
        let body = ErrorBody::parse("Username already exists");
        assert_eq!(body, ErrorBody::Text("Username already exists".to_string()));
        assert_eq!(body.message(), Some("Username already exists"));
        assert_eq!(body.joined().as_deref(), Some("Username already exists"));
    }

    #[test]
    fn test_parse_error_object() {
        let body = ErrorBody::parse(r#"{"error": "Not found", "message": "Idea not found"}"#);
        assert_eq!(body.field("error"), Some("Not found"));
        assert_eq!(body.message(), Some("Idea not found"));
    }

    #[test]
    fn test_field_map_joined() {
        let body = ErrorBody::parse(
            r#"{"description": "must not be blank", "title": "size must be between 0 and 200"}"#,
        );
        assert_eq!(
            body.joined().as_deref(),
            Some("must not be blank, size must be between 0 and 200")
        );
    }

    #[test]
    fn test_non_string_values_are_stringified() {
        let body = ErrorBody::parse(r#"{"ideaId": 5, "title": null}"#);
        assert_eq!(body.field("ideaId"), Some("5"));
        assert_eq!(body.field("title"), None);
    }

    #[test]
    fn test_from_status_classification() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_auth_expired());
        assert!(matches!(
            ApiError::from_status(StatusCode::CONFLICT, "{}"),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::NotFound(ErrorBody::Empty)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"title": "required"}"#),
            ApiError::Rejected {
                status: StatusCode::BAD_REQUEST,
                ..
            }
        ));
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(
            err.to_string(),
            "request rejected (500 Internal Server Error): (no details)"
        );
    }
}
