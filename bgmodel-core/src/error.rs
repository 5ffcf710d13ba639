//! Error types for building requests and fetching results.

use thiserror::Error;

/// Input errors. Raised while building an [`ObservationRequest`](crate::ObservationRequest)
/// and never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{year} is not between 2018 and 2029. Please try another date.")]
    DateRange { year: i32 },
}

/// Failures downstream of the request: transport, decoding, and extraction.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("service returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("malformed XML response: {0}")]
    Xml(String),

    #[error("service reported status '{status}'{}", suffix(.message))]
    StatusNotOk { status: String, message: Option<String> },

    #[error("response has no field '{0}'")]
    MissingField(String),

    #[error("field '{field}' has no numeric value: '{text}'")]
    NoNumber { field: String, text: String },

    #[error("field '{field}' value '{text}' is not a number")]
    InvalidNumber { field: String, text: String },
}

fn suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RequestError::DateRange { year: 2030 };
        assert_eq!(
            err.to_string(),
            "2030 is not between 2018 and 2029. Please try another date."
        );

        let err = FetchError::StatusNotOk { status: "error".into(), message: None };
        assert_eq!(err.to_string(), "service reported status 'error'");

        let err = FetchError::StatusNotOk {
            status: "error".into(),
            message: Some("bad locstr".into()),
        };
        assert_eq!(err.to_string(), "service reported status 'error': bad locstr");

        let err = FetchError::NoNumber { field: "zody".into(), text: "N/A".into() };
        assert!(err.to_string().contains("'zody'"));
    }
}
