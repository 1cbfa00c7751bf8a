use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, ResponseError};
use displaydoc::Display;
use serde::Serialize;
use simple_storage_sdk::RpcFailure;
use simple_storage_sdk::client;
use thiserror::Error;

/// {message}
#[derive(Debug, Display, Error)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    /// Seconds a client should wait before retrying, sent as `Retry-After`.
    retry_after_secs: Option<u64>,
}

/// `Retry-After` sent with failures that may succeed when retried.
const RETRY_AFTER_SECS: u64 = 5;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    status_code: u16,
    message: &'a str,
    error: &'a str,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            retry_after_secs: None,
        }
    }

    fn from_failure(failure: RpcFailure) -> Self {
        Self {
            status: StatusCode::from_u16(failure.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: failure.message().to_string(),
            retry_after_secs: failure.is_retryable().then_some(RETRY_AFTER_SECS),
        }
    }
}

impl From<client::Error> for ApiError {
    fn from(err: client::Error) -> Self {
        match err {
            client::Error::InvalidQuery(e) => ApiError::bad_request(e.to_string()),
            client::Error::Rpc(e) => {
                let failure = e.failure();
                log::error!("RPC error ({failure:?}): {e}");
                ApiError::from_failure(failure)
            }
            other => {
                log::error!("Unexpected error: {other}");
                ApiError::from_failure(RpcFailure::Internal)
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status);
        if let Some(secs) = self.retry_after_secs {
            response.insert_header((header::RETRY_AFTER, secs.to_string()));
        }
        response.json(ErrorBody {
            status_code: self.status.as_u16(),
            message: &self.message,
            error: self.status.canonical_reason().unwrap_or("Error"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_storage_sdk::events::QueryError;
    use simple_storage_sdk::rpc;

    #[test]
    fn test_status_mapping() {
        let err = ApiError::from(client::Error::InvalidQuery(QueryError::InvalidPage));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Page must be >= 1.");

        let err = ApiError::from(client::Error::Rpc(rpc::Error::request(
            "get_logs request timeout after 10000ms",
        )));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "RPC timeout. Please try again in a moment.");
        assert_eq!(
            err.error_response().headers().get(header::RETRY_AFTER),
            Some(&header::HeaderValue::from_static("5"))
        );

        let err = ApiError::from(client::Error::Rpc(rpc::Error::request("connection refused")));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.error_response().headers().get(header::RETRY_AFTER).is_none());

        let err = ApiError::from(client::Error::Rpc(rpc::Error::DecodeError("bad".into())));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "An error occurred while reading blockchain data."
        );
    }
}
