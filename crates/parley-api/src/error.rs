use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use parley_types::api::ErrorResponse;

/// Legacy token-rejection status carried over from the original client
/// contract (not a registered HTTP status).
const INVALID_TOKEN: u16 = 498;

/// Everything a handler can fail with. Each variant renders the uniform
/// `{success: false, message}` envelope; nothing else crosses the REST
/// boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidToken => {
                StatusCode::from_u16(INVALID_TOKEN).unwrap_or(StatusCode::UNAUTHORIZED)
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(err) = &self {
            // Log the cause server-side; the client gets a generic message.
            error!("internal error: {:#}", err);
        }

        let body = ErrorResponse {
            success: false,
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
