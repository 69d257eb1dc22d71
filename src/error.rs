use std::fmt;

/// Error type for Prism Central and Move operations
#[derive(Debug)]
pub enum PrismError {
    /// HTTP request failed before a response was received
    Http(reqwest::Error),
    /// API returned an error response that has no dedicated variant
    Api { status: u16, message: String },
    /// Every endpoint candidate answered 404 for this resource type
    NoCompatibleEndpoint { resource: String, tried: Vec<String> },
    /// Credentials were rejected (401/403); never retried
    AuthenticationFailed { status: u16, message: String },
    /// Server rejected filter/select/order-by, or the query spec is invalid
    InvalidQuery(String),
    /// Sustained 429 responses exhausted the retry budget
    RateLimitExceeded { resource: String, retries: u32 },
    /// Network or server errors exhausted the retry budget
    TransientFetchFailure {
        resource: String,
        attempts: u32,
        message: String,
    },
    /// Missing or unreadable credentials
    Credentials(String),
    /// Host not provided and could not be prompted for
    HostNotFound(String),
    /// JSON parsing error
    Json(String),
    /// Configuration error
    Config(String),
    /// User input rejected before any request was sent
    Validation(String),
    /// A multi-step workflow could not continue
    Workflow(String),
}

impl fmt::Display for PrismError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrismError::Http(e) => write!(f, "HTTP request failed: {}", e),
            PrismError::Api { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            PrismError::NoCompatibleEndpoint { resource, tried } => write!(
                f,
                "No compatible API endpoint for {} (tried: {})",
                resource,
                tried.join(", ")
            ),
            PrismError::AuthenticationFailed { status, message } => {
                write!(f, "Authentication failed (status {}): {}", status, message)
            }
            PrismError::InvalidQuery(msg) => write!(f, "Invalid query: {}", msg),
            PrismError::RateLimitExceeded { resource, retries } => write!(
                f,
                "Rate limit exceeded while fetching {} (gave up after {} retries)",
                resource, retries
            ),
            PrismError::TransientFetchFailure {
                resource,
                attempts,
                message,
            } => write!(
                f,
                "Failed to fetch {} after {} attempts: {}",
                resource, attempts, message
            ),
            PrismError::Credentials(msg) => write!(f, "{}", msg),
            PrismError::HostNotFound(msg) => write!(f, "{}", msg),
            PrismError::Json(msg) => write!(f, "JSON error: {}", msg),
            PrismError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PrismError::Validation(msg) => write!(f, "Invalid input: {}", msg),
            PrismError::Workflow(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for PrismError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PrismError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PrismError {
    fn from(err: reqwest::Error) -> Self {
        PrismError::Http(err)
    }
}

impl From<serde_json::Error> for PrismError {
    fn from(err: serde_json::Error) -> Self {
        PrismError::Json(err.to_string())
    }
}

impl From<std::io::Error> for PrismError {
    fn from(err: std::io::Error) -> Self {
        PrismError::Credentials(err.to_string())
    }
}

impl From<csv::Error> for PrismError {
    fn from(err: csv::Error) -> Self {
        PrismError::Credentials(format!("Could not read credential mapping: {}", err))
    }
}

/// Result type alias for Prism operations
pub type Result<T> = std::result::Result<T, PrismError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = PrismError::Api {
            status: 409,
            message: "Conflict".to_string(),
        };
        assert!(err.to_string().contains("409"));
        assert!(err.to_string().contains("Conflict"));
    }

    #[test]
    fn test_no_compatible_endpoint_lists_versions() {
        let err = PrismError::NoCompatibleEndpoint {
            resource: "vmm.vms".to_string(),
            tried: vec!["v4.1".to_string(), "v4.0".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("vmm.vms"));
        assert!(msg.contains("v4.1, v4.0"));
    }

    #[test]
    fn test_rate_limit_display() {
        let err = PrismError::RateLimitExceeded {
            resource: "iam.users".to_string(),
            retries: 5,
        };
        assert!(err.to_string().contains("5 retries"));
    }

    #[test]
    fn test_transient_failure_display() {
        let err = PrismError::TransientFetchFailure {
            resource: "iam.roles".to_string(),
            attempts: 4,
            message: "HTTP 503".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("4 attempts"));
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn test_invalid_query_passes_message_through() {
        let err = PrismError::InvalidQuery("Unknown field 'colour'".to_string());
        assert!(err.to_string().contains("Unknown field 'colour'"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PrismError>();
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: PrismError = json_err.into();
        match err {
            PrismError::Json(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected PrismError::Json"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PrismError = io_err.into();
        match err {
            PrismError::Credentials(msg) => assert!(msg.contains("file not found")),
            _ => panic!("Expected PrismError::Credentials"),
        }
    }

    #[test]
    fn test_error_source_only_for_http() {
        use std::error::Error;
        let err = PrismError::AuthenticationFailed {
            status: 401,
            message: "bad password".to_string(),
        };
        assert!(err.source().is_none());
    }
}
