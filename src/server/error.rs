use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::Error;
use crate::presenters::ErrorResponse;

impl Error {
    /// HTTP status for the error. Resources of other users look missing.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::Ownership { .. } | Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Error::Persistence(e) => {
                tracing::error!("Request failed: {}", e);
                "internal server error".to_string()
            }
            Error::Ownership { kind, uuid } => {
                Error::not_found(*kind, uuid.clone()).to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResourceKind;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::validation("limit", "too big").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::ownership(ResourceKind::Note, "x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::not_found(ResourceKind::Book, "x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Conflict("js".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::Persistence(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_ownership_looks_like_not_found() {
        let response = Error::ownership(ResourceKind::Note, "abc").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
