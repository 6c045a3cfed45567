use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use crate::newsletter::DispatchError;
use crate::routes::helpers::{error_chain_fmt, json_error};

#[derive(thiserror::Error)]
pub enum PublishError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for PublishError {
    fn status_code(&self) -> StatusCode {
        match self {
            PublishError::ValidationError(_) => StatusCode::BAD_REQUEST,
            PublishError::NotFound(_) => StatusCode::NOT_FOUND,
            PublishError::Dispatch(DispatchError::NoRecipients) => StatusCode::BAD_REQUEST,
            PublishError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PublishError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            PublishError::Dispatch(DispatchError::AllSendsFailed {
                failures,
                log_error,
            }) => HttpResponse::build(self.status_code()).json(serde_json::json!({
                "error": self.to_string(),
                "details": failures,
                "firstError": failures.first().map(|f| &f.error),
                "logSaved": log_error.is_none(),
                "logError": log_error,
            })),
            PublishError::UnexpectedError(_) => {
                json_error(self.status_code(), "An unexpected error occurred.")
            }
            _ => json_error(self.status_code(), &self.to_string()),
        }
    }
}
