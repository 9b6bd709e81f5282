// Errors from talking to the analysis service

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused, DNS failure, timeout, broken body stream
    #[error("Analysis service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Analysis service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered 2xx but the body was not what we expected
    #[error("Invalid response from analysis service: {0}")]
    Decode(String),
}

impl BackendError {
    /// Upstream status code, when the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_carries_upstream_body() {
        let err = BackendError::Status {
            status: 500,
            body: "parse failure: not a zip file".to_string(),
        };
        assert_eq!(err.status(), Some(500));
        assert_eq!(
            err.to_string(),
            "Analysis service returned 500: parse failure: not a zip file"
        );
    }

    #[test]
    fn test_decode_error_has_no_status() {
        let err = BackendError::Decode("expected JSON".to_string());
        assert_eq!(err.status(), None);
    }
}
