use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Transport-level failures only. Domain outcomes (rejected or failed
/// orders) are structured 200 bodies; this type is for internal invariant
/// violations.
pub enum ApiError {
    InternalServerError(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::InternalServerError(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InternalServerError(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_map_to_500() {
        let error: ApiError = anyhow::anyhow!("fleet/grid mismatch").into();
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
