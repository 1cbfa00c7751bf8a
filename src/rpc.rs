use alloy::rpc::json_rpc::ErrorPayload;
use alloy::transports::TransportError;
use displaydoc::Display;
use thiserror::Error;

/// Represents errors that can occur while talking to the RPC node.
/// Used to wrap and describe errors from RPC requests and response decoding.
#[derive(Debug, Display, Error)]
pub enum Error {
    /// Failed to send the RPC request: {message}
    RpcRequestError { message: String, code: Option<i64> },
    /// Failed to decode the RPC response: {0}
    DecodeError(String),
    /// Unexpected error occurred: {0}
    UnexpectedError(String),
}

impl Error {
    /// Wraps any displayable transport error as a request error without an error code.
    pub fn request(err: impl std::fmt::Display) -> Self {
        Error::RpcRequestError {
            message: err.to_string(),
            code: None,
        }
    }

    /// JSON-RPC error code the node or wallet answered with, if any.
    pub fn code(&self) -> Option<i64> {
        match self {
            Error::RpcRequestError { code, .. } => *code,
            _ => None,
        }
    }

    /// Translates this error into one of the three outcomes reported to callers.
    /// Only request errors are inspected; decoding problems are always internal.
    pub fn failure(&self) -> RpcFailure {
        match self {
            Error::RpcRequestError { message, .. } => RpcFailure::classify(message),
            Error::DecodeError(_) | Error::UnexpectedError(_) => RpcFailure::Internal,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        let code = error_payload(&err).map(|payload| payload.code);
        Error::RpcRequestError {
            message: err.to_string(),
            code,
        }
    }
}

/// JSON-RPC error object carried by `err`, if the node answered with one.
pub fn error_payload(err: &anyhow::Error) -> Option<&ErrorPayload> {
    err.downcast_ref::<TransportError>()?.as_error_resp()
}

/// Outcome of translating an RPC error for the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcFailure {
    /// The node did not answer in time. Retrying later may succeed.
    Timeout,
    /// The node could not be reached.
    Unavailable,
    /// Anything else.
    Internal,
}

const TIMEOUT_MARKERS: &[&str] = &["timeout", "timed out"];

const UNAVAILABLE_MARKERS: &[&str] = &[
    "network",
    "fetch",
    "failed",
    "error sending request",
    "connection refused",
    "http error",
];

impl RpcFailure {
    /// Maps an error message to an outcome by substring, timeout first.
    /// Matching ignores case, so "Failed to ..." counts as unavailable where a
    /// case-sensitive match on "failed" would report it as internal.
    pub fn classify(message: &str) -> Self {
        let message = message.to_lowercase();
        if TIMEOUT_MARKERS.iter().any(|m| message.contains(m)) {
            RpcFailure::Timeout
        } else if UNAVAILABLE_MARKERS.iter().any(|m| message.contains(m)) {
            RpcFailure::Unavailable
        } else {
            RpcFailure::Internal
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, RpcFailure::Timeout)
    }

    /// HTTP status code this outcome is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            RpcFailure::Timeout | RpcFailure::Unavailable => 503,
            RpcFailure::Internal => 500,
        }
    }

    /// Message shown to the caller in place of the raw node error.
    pub fn message(&self) -> &'static str {
        match self {
            RpcFailure::Timeout => "RPC timeout. Please try again in a moment.",
            RpcFailure::Unavailable => "Unable to connect to the blockchain RPC.",
            RpcFailure::Internal => "An error occurred while reading blockchain data.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_timeout() {
        assert_eq!(RpcFailure::classify("request timeout"), RpcFailure::Timeout);
        assert_eq!(
            RpcFailure::classify("error sending request for url: operation timed out"),
            RpcFailure::Timeout
        );
        assert!(RpcFailure::Timeout.is_retryable());
        assert_eq!(RpcFailure::Timeout.status_code(), 503);
    }

    #[test]
    fn test_classify_unavailable() {
        for message in [
            "Network is unreachable",
            "fetch failed",
            "get_logs failed after 3 attempts",
            "error sending request for url (http://127.0.0.1:1/)",
            "HTTP error 503 with body: service unavailable",
            "HTTP error 429 with body: Too Many Requests",
            "Failed to connect to node",
        ] {
            assert_eq!(RpcFailure::classify(message), RpcFailure::Unavailable, "{message}");
        }
        assert!(!RpcFailure::Unavailable.is_retryable());
        assert_eq!(RpcFailure::Unavailable.status_code(), 503);
    }

    #[test]
    fn test_classify_internal() {
        let failure =
            RpcFailure::classify("server returned an error response: error code 3: execution reverted");
        assert_eq!(failure, RpcFailure::Internal);
        assert_eq!(failure.status_code(), 500);
        assert_eq!(
            failure.message(),
            "An error occurred while reading blockchain data."
        );
    }

    #[test]
    fn test_decode_errors_are_internal() {
        let err = Error::DecodeError("failed to decode network response".to_string());
        assert_eq!(err.failure(), RpcFailure::Internal);

        let err = Error::request("connection timeout");
        assert_eq!(err.failure(), RpcFailure::Timeout);
    }

    #[test]
    fn test_error_code_is_kept() {
        let payload: ErrorPayload = ErrorPayload {
            code: 4001,
            message: "User rejected the request.".into(),
            data: None,
        };
        let err = Error::from(anyhow::Error::new(TransportError::ErrorResp(payload)));
        assert_eq!(err.code(), Some(4001));
        assert_eq!(err.failure(), RpcFailure::Internal);

        assert_eq!(Error::request("boom").code(), None);
    }
}
