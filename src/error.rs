use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;
use serde_json::json;

use crate::leave::backend::BackendError;
use crate::leave::gate::GateError;
use crate::leave::validator::ValidationError;

#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    Validation(ValidationError),
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "Draft not found")]
    DraftNotFound,
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "{}", _0)]
    Unauthorized(String),
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    Upstream(String),
    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::DraftNotFound | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(error) => json!({ "message": error.to_string(), "error": error }),
            other => json!({ "message": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<GateError> for ApiError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::Rejected(error) => ApiError::Validation(error),
            GateError::UnknownCategory(_) => ApiError::BadRequest(e.to_string()),
            GateError::SubmissionInFlight | GateError::AlreadySubmitted => {
                ApiError::Conflict(e.to_string())
            }
            GateError::SubmissionFailed(_) => ApiError::Upstream(e.to_string()),
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        tracing::error!(error = %e, "Leave backend call failed");
        match e {
            BackendError::Unavailable(_) => ApiError::Upstream("Leave data unavailable".into()),
            BackendError::Database(_) => ApiError::Internal,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "Database query failed");
        ApiError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn maps_gate_errors_to_status() {
        let cases = [
            (GateError::Rejected(ValidationError::MissingApprover), StatusCode::UNPROCESSABLE_ENTITY),
            (GateError::UnknownCategory(9), StatusCode::BAD_REQUEST),
            (GateError::SubmissionInFlight, StatusCode::CONFLICT),
            (GateError::AlreadySubmitted, StatusCode::CONFLICT),
            (GateError::SubmissionFailed("down".into()), StatusCode::BAD_GATEWAY),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status_code(), status);
        }
    }

    #[actix_web::test]
    async fn validation_body_carries_code() {
        let response = ApiError::Validation(ValidationError::InvertedRange).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"]["code"], "inverted_range");
        assert_eq!(json["message"], "To date cannot be before from date");
    }
}
