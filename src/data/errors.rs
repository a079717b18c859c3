use thiserror::Error;

/// Error taxonomy for vendor calls and downstream data handling
#[derive(Error, Debug)]
pub enum DataError {
    #[error("{vendor} request failed: {source}")]
    Vendor {
        vendor: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{vendor} returned {status}: {message}")]
    Api {
        vendor: &'static str,
        status: u16,
        message: String,
    },

    #[error("{vendor} rate limit exceeded, retry after {retry_after} seconds")]
    RateLimit {
        vendor: &'static str,
        retry_after: u64,
    },

    #[error("{vendor} call timed out after {timeout_seconds}s")]
    Timeout {
        vendor: &'static str,
        timeout_seconds: u64,
    },

    /// Model output did not match the required shape. Carries the raw text
    /// so the caller can log it for diagnosis; fields are never guessed.
    #[error("failed to parse {expected}: {message}")]
    Parse {
        expected: &'static str,
        message: String,
        raw: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for data operations
pub type DataResult<T> = Result<T, DataError>;

impl DataError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::Vendor { source, .. } => source.is_timeout() || source.is_connect(),
            DataError::RateLimit { .. } => true,
            DataError::Timeout { .. } => true,
            DataError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Wrap a reqwest error for a named vendor, classifying client timeouts
    pub fn from_reqwest(vendor: &'static str, timeout_seconds: u64, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            DataError::Timeout {
                vendor,
                timeout_seconds,
            }
        } else {
            DataError::Vendor { vendor, source }
        }
    }

    /// Create a parse error with the offending raw text attached
    pub fn parse_error<M: Into<String>, R: Into<String>>(
        expected: &'static str,
        message: M,
        raw: R,
    ) -> Self {
        DataError::Parse {
            expected,
            message: message.into(),
            raw: raw.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let err = DataError::Api {
            vendor: "moralis",
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(err.is_retryable());

        let err = DataError::Api {
            vendor: "moralis",
            status: 401,
            message: "bad key".to_string(),
        };
        assert!(!err.is_retryable());

        let err = DataError::RateLimit {
            vendor: "bitquery",
            retry_after: 60,
        };
        assert!(err.is_retryable());

        let err = DataError::parse_error("JSON report", "unexpected token", "not json");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_error_keeps_raw_text() {
        let err = DataError::parse_error("verdict", "missing fields", "garbled output");
        match err {
            DataError::Parse { raw, .. } => assert_eq!(raw, "garbled output"),
            _ => panic!("expected parse error"),
        }
    }
}
