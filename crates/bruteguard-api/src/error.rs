use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use bruteguard_types::OkResponse;

use crate::bucket::limiter::RateLimiterError;
use crate::cidr::CidrError;
use crate::list_store::ListStoreError;

/// Taxonomy of kinds a decision can fail with (§7 of the design).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid ip: {0}")]
    InputInvalid(String),

    #[error("{0}")]
    ListRulePolicy(#[from] ListStoreError),

    #[error("rate limiter busy, retries exhausted")]
    RateLimiterBusy,

    #[error("bucket store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("unsupported address family")]
    UnsupportedFamily,

    #[error("decision deadline elapsed")]
    Cancelled,
}

impl From<CidrError> for ApiError {
    fn from(err: CidrError) -> Self {
        match err {
            CidrError::UnsupportedFamily => ApiError::UnsupportedFamily,
            CidrError::Malformed(text) => ApiError::InputInvalid(text),
        }
    }
}

impl From<RateLimiterError> for ApiError {
    fn from(err: RateLimiterError) -> Self {
        match err {
            RateLimiterError::Busy => ApiError::RateLimiterBusy,
            RateLimiterError::Store(msg) => ApiError::StoreUnavailable(msg),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InputInvalid(_) | ApiError::UnsupportedFamily => StatusCode::BAD_REQUEST,
            ApiError::ListRulePolicy(_) => StatusCode::OK,
            ApiError::RateLimiterBusy | ApiError::StoreUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        tracing::warn!(error = %self, "request failed");
        HttpResponse::build(self.status_code()).json(OkResponse::fail(self.to_string()))
    }
}
